//! Volume commands

use cloudstack::VolumeHandler;
use cloudstack::services::volumes::{
    AttachVolumeRequest, CreateVolumeRequest, ListVolumesRequest, Volume,
};
use tabled::Tabled;
use tracing::info;

use super::CommandContext;
use super::async_utils::{handle_pending, print_submitted, spinner, spinner_callback};
use super::resolve;
use super::utils::{
    DetailRow, Describe, confirm_unless_forced, format_date, format_gib, format_state, or_dash,
    print_detail, print_list,
};
use crate::cli::VolumeCommands;
use crate::error::{CloudStackCtlError, Result as CliResult};

#[derive(Tabled)]
struct VolumeRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    volume_type: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "VM")]
    vm: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl VolumeRow {
    fn new(volume: &Volume) -> Self {
        Self {
            name: volume.name.clone(),
            volume_type: or_dash(volume.volume_type.as_deref()),
            state: format_state(volume.state.as_deref()),
            size: format_gib(volume.size),
            vm: or_dash(volume.vmname.as_deref()),
            id: volume.id.clone(),
        }
    }
}

impl Describe for Volume {
    fn detail_rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![
            DetailRow::new("ID", self.id.clone()),
            DetailRow::new("Name", self.name.clone()),
            DetailRow::new("Type", or_dash(self.volume_type.as_deref())),
            DetailRow::new("State", format_state(self.state.as_deref())),
            DetailRow::new("Size", format_gib(self.size)),
            DetailRow::new("Zone", or_dash(self.zonename.as_deref())),
            DetailRow::new("Disk Offering", or_dash(self.diskofferingname.as_deref())),
            DetailRow::new("Created", format_date(self.created.as_deref())),
        ];
        if let Some(vm) = &self.vmname {
            let device = self
                .deviceid
                .map(|d| format!(" (device {})", d))
                .unwrap_or_default();
            rows.push(DetailRow::new("Attached To", format!("{}{}", vm, device)));
        }
        rows
    }
}

pub async fn handle_volume_command(
    ctx: &CommandContext<'_>,
    command: &VolumeCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    let volumes = VolumeHandler::new(client.clone());

    match command {
        VolumeCommands::List { vm, volume_type } => {
            let mut request = ListVolumesRequest::new();
            if let Some(vm) = vm {
                request = request.virtual_machine_id(resolve::vm(&client, vm).await?);
            }
            if let Some(volume_type) = volume_type {
                request = request.volume_type(volume_type.to_uppercase());
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }
            let response = volumes.list(request).await?;
            print_list(
                &response.items,
                ctx.output,
                ctx.query,
                "No volumes found",
                VolumeRow::new,
            )
        }

        VolumeCommands::Create {
            name,
            disk_offering,
            zone,
            size,
            attach,
            async_ops,
        } => {
            let zone_id =
                resolve::zone_or_default(&client, zone.as_deref(), ctx.default_zone())
                    .await?
                    .ok_or_else(|| CloudStackCtlError::InvalidInput {
                        message: "--zone is required when the profile has no default zone"
                            .to_string(),
                    })?;
            let offering_id = resolve::disk_offering(&client, disk_offering).await?;

            let mut request = CreateVolumeRequest::new(name)
                .zone_id(zone_id)
                .disk_offering_id(offering_id);
            if let Some(size) = size {
                request = request.size(*size);
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }

            if let Some(vm) = attach {
                let vm_id = resolve::vm(&client, vm).await?;
                let pb = spinner(format!("Creating {} and attaching it to {}", name, vm));
                let result = cloudstackctl_core::create_volume_and_attach(
                    &client,
                    request,
                    &vm_id,
                    async_ops.timeout(&client),
                    async_ops.interval(&client),
                    Some(spinner_callback(&pb)),
                )
                .await;
                pb.finish_and_clear();
                let volume = result?;
                info!(volume_id = %volume.id, vm_id = %vm_id, "Volume created and attached");
                return print_detail(&volume, ctx.output, ctx.query);
            }

            let pending = volumes.create(request).await?;
            handle_pending(
                &client,
                pending,
                async_ops,
                ctx.output,
                ctx.query,
                "Volume created",
            )
            .await
        }

        VolumeCommands::Attach {
            volume,
            vm,
            async_ops,
        } => {
            let volume_id = resolve::volume(&client, volume).await?;
            let vm_id = resolve::vm(&client, vm).await?;
            let pending = volumes
                .attach(AttachVolumeRequest::new(volume_id, vm_id))
                .await?;
            handle_pending(
                &client,
                pending,
                async_ops,
                ctx.output,
                ctx.query,
                "Volume attached",
            )
            .await
        }

        VolumeCommands::Detach { volume, async_ops } => {
            let volume_id = resolve::volume(&client, volume).await?;
            let pending = volumes.detach(&volume_id).await?;
            handle_pending(
                &client,
                pending,
                async_ops,
                ctx.output,
                ctx.query,
                "Volume detached",
            )
            .await
        }

        VolumeCommands::Delete { volume, force } => {
            let volume_id = resolve::volume(&client, volume).await?;
            if !confirm_unless_forced(*force, &format!("delete volume {}", volume))? {
                return Ok(());
            }
            let response = volumes.delete(&volume_id).await?;
            if !response.success {
                return Err(CloudStackCtlError::ApiError {
                    message: response
                        .displaytext
                        .unwrap_or_else(|| format!("Failed to delete volume {}", volume)),
                });
            }
            match super::utils::structured_format(ctx.output, ctx.query) {
                Some(_) => print_detail(&response, ctx.output, ctx.query),
                None => {
                    println!("Volume {} deleted", volume);
                    Ok(())
                }
            }
        }
    }
}
