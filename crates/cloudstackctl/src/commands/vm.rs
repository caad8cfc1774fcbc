//! Virtual machine commands

use cloudstack::VirtualMachineHandler;
use cloudstack::services::virtual_machines::{
    DeployVirtualMachineRequest, DestroyVirtualMachineRequest, ListVirtualMachinesRequest,
    StartVirtualMachineRequest, StopVirtualMachineRequest, VirtualMachine,
};
use tabled::Tabled;
use tracing::{debug, info};

use super::CommandContext;
use super::async_utils::{handle_pending, print_submitted, spinner, spinner_callback};
use super::resolve;
use super::utils::{
    DetailRow, Describe, confirm_unless_forced, format_date, format_memory, format_state,
    or_dash, print_detail, print_list, read_file_input,
};
use crate::cli::VmCommands;
use crate::error::{CloudStackCtlError, Result as CliResult};

/// Table row for VM list
#[derive(Tabled)]
struct VmRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "ZONE")]
    zone: String,
    #[tabled(rename = "OFFERING")]
    offering: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl VmRow {
    fn new(vm: &VirtualMachine) -> Self {
        Self {
            name: vm.name.clone(),
            state: format_state(vm.state.as_deref()),
            ip: or_dash(vm.ip_address()),
            zone: or_dash(vm.zonename.as_deref()),
            offering: or_dash(vm.serviceofferingname.as_deref()),
            id: vm.id.clone(),
        }
    }
}

impl Describe for VirtualMachine {
    fn detail_rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![
            DetailRow::new("ID", self.id.clone()),
            DetailRow::new("Name", self.name.clone()),
            DetailRow::new("State", format_state(self.state.as_deref())),
            DetailRow::new("IP Address", or_dash(self.ip_address())),
            DetailRow::new("Zone", or_dash(self.zonename.as_deref())),
            DetailRow::new("Template", or_dash(self.templatename.as_deref())),
            DetailRow::new("Offering", or_dash(self.serviceofferingname.as_deref())),
            DetailRow::new(
                "CPUs",
                self.cpunumber
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            DetailRow::new("Memory", format_memory(self.memory)),
            DetailRow::new("Hypervisor", or_dash(self.hypervisor.as_deref())),
            DetailRow::new("Created", format_date(self.created.as_deref())),
        ];
        if let Some(keypair) = &self.keypair {
            rows.push(DetailRow::new("Key Pair", keypair.clone()));
        }
        if let Some(password) = &self.password {
            rows.push(DetailRow::new("Password", password.clone()));
        }
        for nic in &self.nic {
            rows.push(DetailRow::new(
                "NIC",
                format!(
                    "{} {}{}",
                    or_dash(nic.networkname.as_deref()),
                    or_dash(nic.ipaddress.as_deref()),
                    if nic.isdefault { " (default)" } else { "" }
                ),
            ));
        }
        rows
    }
}

pub async fn handle_vm_command(ctx: &CommandContext<'_>, command: &VmCommands) -> CliResult<()> {
    let client = ctx.client()?;
    let vms = VirtualMachineHandler::new(client.clone());

    match command {
        VmCommands::List {
            state,
            zone,
            keyword,
            all,
        } => {
            let mut request = ListVirtualMachinesRequest::new();
            if let Some(state) = state {
                request = request.state(state);
            }
            if let Some(zone) = zone {
                request = request.zone_id(resolve::zone(&client, zone).await?);
            }
            if let Some(keyword) = keyword {
                request = request.keyword(keyword);
            }
            if *all {
                request = request.list_all(true);
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }

            let response = vms.list(request).await?;
            debug!(count = response.count, "Listed VMs");
            print_list(
                &response.items,
                ctx.output,
                ctx.query,
                "No virtual machines found",
                VmRow::new,
            )
        }

        VmCommands::Get { vm } => {
            let vm = if resolve::looks_like_id(vm) {
                vms.get(vm).await?
            } else {
                vms.get_by_name(vm).await?
            };
            print_detail(&vm, ctx.output, ctx.query)
        }

        VmCommands::Deploy {
            name,
            zone,
            template,
            offering,
            networks,
            keypair,
            disk_offering,
            size,
            user_data,
            no_start,
            async_ops,
        } => {
            let zone_id =
                resolve::zone_or_default(&client, zone.as_deref(), ctx.default_zone())
                    .await?
                    .ok_or_else(|| CloudStackCtlError::InvalidInput {
                        message: "--zone is required when the profile has no default zone"
                            .to_string(),
                    })?;
            let template_id = resolve::template(&client, template, Some(zone_id.as_str())).await?;
            let offering_id = resolve::service_offering(&client, offering).await?;

            let mut request = DeployVirtualMachineRequest::new(offering_id, template_id, zone_id);
            if let Some(name) = name {
                request = request.name(name);
            }
            if !networks.is_empty() {
                let mut network_ids = Vec::with_capacity(networks.len());
                for network in networks {
                    network_ids.push(resolve::network(&client, network).await?);
                }
                request = request.network_ids(network_ids);
            }
            if let Some(keypair) = keypair {
                request = request.key_pair(keypair);
            }
            if let Some(disk_offering) = disk_offering {
                let offering_id = resolve::disk_offering(&client, disk_offering).await?;
                request = request.disk_offering_id(offering_id);
            }
            if let Some(size) = size {
                request = request.size(*size);
            }
            if let Some(user_data) = user_data {
                request = request.user_data(read_file_input(user_data)?);
            }
            if *no_start {
                request = request.start_vm(false);
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }

            if async_ops.wait {
                let pb = spinner("Deploying virtual machine".to_string());
                let result = cloudstackctl_core::deploy_vm_and_wait(
                    &client,
                    request,
                    async_ops.timeout(&client),
                    async_ops.interval(&client),
                    Some(spinner_callback(&pb)),
                )
                .await;
                pb.finish_and_clear();
                let vm = result?;
                info!(vm_id = %vm.id, "VM deployed");
                print_detail(&vm, ctx.output, ctx.query)
            } else {
                let pending = vms.deploy(request).await?;
                print_submitted(
                    pending.job_id(),
                    pending.resource_id(),
                    ctx.output,
                    ctx.query,
                    "Deployment submitted",
                )
            }
        }

        VmCommands::Start { vm, async_ops } => {
            let id = resolve::vm(&client, vm).await?;
            let pending = vms.start(StartVirtualMachineRequest::new(id)).await?;
            handle_pending(&client, pending, async_ops, ctx.output, ctx.query, "VM started").await
        }

        VmCommands::Stop {
            vm,
            forced,
            async_ops,
        } => {
            let id = resolve::vm(&client, vm).await?;
            let mut request = StopVirtualMachineRequest::new(id);
            if *forced {
                request = request.forced(true);
            }
            let pending = vms.stop(request).await?;
            handle_pending(&client, pending, async_ops, ctx.output, ctx.query, "VM stopped").await
        }

        VmCommands::Reboot { vm, async_ops } => {
            let id = resolve::vm(&client, vm).await?;
            let pending = vms.reboot(&id).await?;
            handle_pending(&client, pending, async_ops, ctx.output, ctx.query, "VM rebooted").await
        }

        VmCommands::Destroy {
            vm,
            expunge,
            force,
            async_ops,
        } => {
            let id = resolve::vm(&client, vm).await?;
            let action = if *expunge {
                format!("destroy and expunge VM {}", vm)
            } else {
                format!("destroy VM {}", vm)
            };
            if !confirm_unless_forced(*force, &action)? {
                return Ok(());
            }

            if async_ops.wait {
                let pb = spinner(format!("Destroying {}", vm));
                let result = cloudstackctl_core::destroy_vm_and_wait(
                    &client,
                    &id,
                    *expunge,
                    async_ops.timeout(&client),
                    async_ops.interval(&client),
                    Some(spinner_callback(&pb)),
                )
                .await;
                pb.finish_and_clear();
                result?;
                match super::utils::structured_format(ctx.output, ctx.query) {
                    Some(fmt) => crate::output::print_output(
                        serde_json::json!({ "id": id, "destroyed": true, "expunged": expunge }),
                        fmt,
                        ctx.query,
                    )?,
                    None => println!("VM {} destroyed", vm),
                }
                Ok(())
            } else {
                let pending = vms
                    .destroy(DestroyVirtualMachineRequest::new(&id).expunge(*expunge))
                    .await?;
                print_submitted(
                    pending.job_id(),
                    pending.resource_id(),
                    ctx.output,
                    ctx.query,
                    "Destroy submitted",
                )
            }
        }
    }
}
