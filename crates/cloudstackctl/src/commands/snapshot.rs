//! Volume snapshot commands

use cloudstack::SnapshotHandler;
use cloudstack::services::snapshots::{CreateSnapshotRequest, ListSnapshotsRequest, Snapshot};
use tabled::Tabled;
use tracing::info;

use super::CommandContext;
use super::async_utils::{handle_pending, print_submitted, spinner, spinner_callback};
use super::resolve;
use super::utils::{
    DetailRow, Describe, confirm_unless_forced, format_date, format_gib, format_state, or_dash,
    print_detail, print_list,
};
use crate::cli::SnapshotCommands;
use crate::error::Result as CliResult;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "VOLUME")]
    volume: String,
    #[tabled(rename = "TYPE")]
    snapshot_type: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl SnapshotRow {
    fn new(snapshot: &Snapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            state: format_state(snapshot.state.as_deref()),
            volume: or_dash(snapshot.volumename.as_deref()),
            snapshot_type: or_dash(snapshot.snapshottype.as_deref()),
            created: format_date(snapshot.created.as_deref()),
            id: snapshot.id.clone(),
        }
    }
}

impl Describe for Snapshot {
    fn detail_rows(&self) -> Vec<DetailRow> {
        vec![
            DetailRow::new("ID", self.id.clone()),
            DetailRow::new("Name", self.name.clone()),
            DetailRow::new("State", format_state(self.state.as_deref())),
            DetailRow::new("Volume", or_dash(self.volumename.as_deref())),
            DetailRow::new("Volume Type", or_dash(self.volumetype.as_deref())),
            DetailRow::new("Type", or_dash(self.snapshottype.as_deref())),
            DetailRow::new("Physical Size", format_gib(self.physicalsize)),
            DetailRow::new("Created", format_date(self.created.as_deref())),
        ]
    }
}

pub async fn handle_snapshot_command(
    ctx: &CommandContext<'_>,
    command: &SnapshotCommands,
) -> CliResult<()> {
    let client = ctx.client()?;
    let snapshots = SnapshotHandler::new(client.clone());

    match command {
        SnapshotCommands::List { volume } => {
            let mut request = ListSnapshotsRequest::new();
            if let Some(volume) = volume {
                request = request.volume_id(resolve::volume(&client, volume).await?);
            }
            if let Some(project) = ctx.project_id() {
                request = request.project_id(project);
            }
            let response = snapshots.list(request).await?;
            print_list(
                &response.items,
                ctx.output,
                ctx.query,
                "No snapshots found",
                SnapshotRow::new,
            )
        }

        SnapshotCommands::Create {
            volume,
            name,
            async_ops,
        } => {
            let volume_id = resolve::volume(&client, volume).await?;
            let mut request = CreateSnapshotRequest::new(volume_id);
            if let Some(name) = name {
                request = request.name(name);
            }

            if async_ops.wait {
                let pb = spinner(format!("Snapshotting {}", volume));
                let result = cloudstackctl_core::snapshot_volume_and_wait(
                    &client,
                    request,
                    async_ops.timeout(&client),
                    async_ops.interval(&client),
                    Some(spinner_callback(&pb)),
                )
                .await;
                pb.finish_and_clear();
                let snapshot = result?;
                info!(snapshot_id = %snapshot.id, "Snapshot backed up");
                print_detail(&snapshot, ctx.output, ctx.query)
            } else {
                let pending = snapshots.create(request).await?;
                print_submitted(
                    pending.job_id(),
                    pending.resource_id(),
                    ctx.output,
                    ctx.query,
                    "Snapshot submitted",
                )
            }
        }

        SnapshotCommands::Delete {
            snapshot,
            force,
            async_ops,
        } => {
            if !confirm_unless_forced(*force, &format!("delete snapshot {}", snapshot))? {
                return Ok(());
            }
            let pending = snapshots.delete(snapshot).await?;
            handle_pending(
                &client,
                pending,
                async_ops,
                ctx.output,
                ctx.query,
                "Snapshot deleted",
            )
            .await
        }
    }
}
