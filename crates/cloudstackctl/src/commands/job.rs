//! Async job commands

use std::time::Duration;

use cloudstack::jobs::ListAsyncJobsRequest;
use futures::future::join_all;
use tracing::{debug, warn};

use super::CommandContext;
use super::async_utils::{JobRow, spinner, wait_for_job};
use super::utils::{print_detail, print_list};
use crate::cli::JobCommands;
use crate::error::Result as CliResult;

pub async fn handle_job_command(ctx: &CommandContext<'_>, command: &JobCommands) -> CliResult<()> {
    let client = ctx.client()?;

    match command {
        JobCommands::Get { job_id } => {
            let job = client.jobs().query(job_id).await?;
            print_detail(&job, ctx.output, ctx.query)
        }

        JobCommands::Wait {
            job_ids,
            wait_timeout,
            wait_interval,
        } => {
            let timeout = wait_timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| client.async_timeout());
            let interval = wait_interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| client.poll_interval());

            if let [job_id] = job_ids.as_slice() {
                let job = wait_for_job(&client, job_id, timeout, interval).await?;
                return print_detail(&job, ctx.output, ctx.query);
            }

            debug!(count = job_ids.len(), "Waiting for jobs");
            let pb = spinner(format!("Waiting for {} jobs", job_ids.len()));
            let results = join_all(job_ids.iter().map(|job_id| {
                cloudstackctl_core::poll_job(&client, job_id, timeout, interval, None)
            }))
            .await;
            pb.finish_and_clear();

            let mut jobs = Vec::with_capacity(results.len());
            let mut first_error = None;
            for (job_id, result) in job_ids.iter().zip(results) {
                match result {
                    Ok(job) => jobs.push(job),
                    Err(e) => {
                        warn!(job_id = %job_id, error = %e, "Job did not succeed");
                        first_error.get_or_insert(e);
                    }
                }
            }

            print_list(&jobs, ctx.output, ctx.query, "No jobs succeeded", JobRow::from_job)?;
            match first_error {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        }

        JobCommands::List => {
            let response = client.jobs().list(ListAsyncJobsRequest::default()).await?;
            print_list(
                &response.items,
                ctx.output,
                ctx.query,
                "No recent jobs",
                JobRow::from_job,
            )
        }
    }
}
