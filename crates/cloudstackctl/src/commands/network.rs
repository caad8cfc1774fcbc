//! Network commands

use cloudstack::NetworkHandler;
use cloudstack::services::networks::{DeleteNetworkRequest, ListNetworksRequest, Network};
use cloudstackctl_core::PortForward;
use serde_json::json;
use tabled::Tabled;
use tracing::info;

use super::CommandContext;
use super::async_utils::{AsyncOperationArgs, handle_pending, spinner, spinner_callback};
use super::resolve;
use super::utils::{
    DetailRow, Describe, confirm_unless_forced, format_state, or_dash, print_detail, print_list,
    structured_format,
};
use crate::cli::NetworkCommands;
use crate::error::Result as CliResult;
use crate::output::print_output;

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    network_type: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "CIDR")]
    cidr: String,
    #[tabled(rename = "ZONE")]
    zone: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl NetworkRow {
    fn new(network: &Network) -> Self {
        Self {
            name: network.name.clone(),
            network_type: or_dash(network.network_type.as_deref()),
            state: format_state(network.state.as_deref()),
            cidr: or_dash(network.cidr.as_deref()),
            zone: or_dash(network.zonename.as_deref()),
            id: network.id.clone(),
        }
    }
}

impl Describe for Network {
    fn detail_rows(&self) -> Vec<DetailRow> {
        vec![
            DetailRow::new("ID", self.id.clone()),
            DetailRow::new("Name", self.name.clone()),
            DetailRow::new("Type", or_dash(self.network_type.as_deref())),
            DetailRow::new("State", format_state(self.state.as_deref())),
            DetailRow::new("CIDR", or_dash(self.cidr.as_deref())),
            DetailRow::new("Gateway", or_dash(self.gateway.as_deref())),
            DetailRow::new("Zone", or_dash(self.zonename.as_deref())),
            DetailRow::new("Offering", or_dash(self.networkofferingname.as_deref())),
            DetailRow::new("Default", self.isdefault.to_string()),
        ]
    }
}

fn print_port_forward(
    forward: &PortForward,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let rule = &forward.rule;
    match structured_format(ctx.output, ctx.query) {
        Some(fmt) => {
            let data = json!({
                "ipaddressid": forward.ip_address.id,
                "ipaddress": forward.ip_address.ipaddress,
                "ruleid": rule.id,
                "protocol": rule.protocol,
                "publicport": rule.publicport,
                "privateport": rule.privateport,
                "virtualmachineid": rule.virtualmachineid,
            });
            print_output(data, fmt, ctx.query)?;
        }
        None => {
            let port = |p: Option<i64>| p.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            println!(
                "Forwarding {}:{} -> {}:{} ({})",
                forward.ip_address.ipaddress,
                port(rule.publicport),
                or_dash(rule.virtualmachinename.as_deref()),
                port(rule.privateport),
                or_dash(rule.protocol.as_deref()),
            );
            println!("IP Address ID: {}", forward.ip_address.id);
            println!("Rule ID: {}", rule.id);
        }
    }
    Ok(())
}

pub async fn handle_network_command(
    ctx: &CommandContext<'_>,
    command: &NetworkCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    let networks = NetworkHandler::new(client.clone());

    match command {
        NetworkCommands::List { zone } => {
            let mut request = ListNetworksRequest::new();
            if let Some(zone) = zone {
                request = request.zone_id(resolve::zone(&client, zone).await?);
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }
            let response = networks.list(request).await?;
            print_list(
                &response.items,
                ctx.output,
                ctx.query,
                "No networks found",
                NetworkRow::new,
            )
        }

        NetworkCommands::Delete {
            network,
            force,
            async_ops,
        } => {
            let id = resolve::network(&client, network).await?;
            if !confirm_unless_forced(*force, &format!("delete network {}", network))? {
                return Ok(());
            }
            let mut request = DeleteNetworkRequest::new(id);
            if *force {
                request = request.forced(true);
            }
            let pending = networks.delete(request).await?;
            handle_pending(
                &client,
                pending,
                async_ops,
                ctx.output,
                ctx.query,
                "Network deleted",
            )
            .await
        }

        NetworkCommands::ForwardPort {
            network,
            vm,
            protocol,
            public_port,
            private_port,
            wait_timeout,
            wait_interval,
        } => {
            let network_id = resolve::network(&client, network).await?;
            let vm_id = resolve::vm(&client, vm).await?;
            let async_ops = AsyncOperationArgs {
                wait: true,
                wait_timeout: *wait_timeout,
                wait_interval: *wait_interval,
            };

            let pb = spinner(format!("Forwarding port {} to {}", public_port, vm));
            let result = cloudstackctl_core::acquire_ip_and_forward_port(
                &client,
                &network_id,
                &vm_id,
                protocol,
                *public_port,
                *private_port,
                async_ops.timeout(&client),
                async_ops.interval(&client),
                Some(spinner_callback(&pb)),
            )
            .await;
            pb.finish_and_clear();
            let forward = result?;
            info!(
                ip = %forward.ip_address.ipaddress,
                rule_id = %forward.rule.id,
                "Port forwarding created"
            );
            print_port_forward(&forward, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_detail_rows() {
        let network: Network = serde_json::from_value(json!({
            "id": "net-1",
            "name": "frontend",
            "type": "Isolated",
            "cidr": "10.1.1.0/24",
            "isdefault": true
        }))
        .unwrap();
        let rows = network.detail_rows();
        assert_eq!(rows[0].value, "net-1");
        assert_eq!(rows[2].value, "Isolated");
        assert_eq!(rows[4].value, "10.1.1.0/24");
        assert_eq!(rows[8].value, "true");
    }
}
