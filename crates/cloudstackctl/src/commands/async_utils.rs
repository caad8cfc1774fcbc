//! Shared handling for asynchronous CloudStack commands with --wait support
//!
//! Wraps the core crate's `poll_job`/`wait_for` with an indicatif spinner and
//! CLI-specific formatting.

use std::time::Duration;

use clap::Args;
use cloudstack::{AsyncJob, CloudStackClient, JobStatus, PendingJob};
use cloudstackctl_core::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::commands::utils::{
    DetailRow, Describe, format_date, or_dash, print_detail, structured_format,
};
use crate::error::Result as CliResult;
use crate::output::print_output;

/// Common CLI arguments for async operations
#[derive(Args, Debug, Clone, Default)]
pub struct AsyncOperationArgs {
    /// Wait for the job to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds (defaults to the profile's async timeout)
    #[arg(long)]
    pub wait_timeout: Option<u64>,

    /// Polling interval in seconds (defaults to the profile's poll interval)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub wait_interval: Option<u64>,
}

impl AsyncOperationArgs {
    pub fn timeout(&self, client: &CloudStackClient) -> Duration {
        self.wait_timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| client.async_timeout())
    }

    pub fn interval(&self, client: &CloudStackClient) -> Duration {
        self.wait_interval
            .map(Duration::from_secs)
            .unwrap_or_else(|| client.poll_interval())
    }
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(message);
    pb
}

/// Progress callback that drives a spinner
pub fn spinner_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { job_id } => {
            pb.set_message(format!("Job {} started", job_id));
        }
        ProgressEvent::Polling { job_id, status, .. } => {
            pb.set_message(format!("Job {}: {}", job_id, format_job_status(*status)));
        }
        ProgressEvent::Completed {
            job_id,
            resource_id,
        } => {
            let suffix = resource_id
                .as_deref()
                .map(|id| format!(" ({})", id))
                .unwrap_or_default();
            pb.finish_with_message(format!(
                "Job {}: {}{}",
                job_id,
                format_job_status(JobStatus::Succeeded),
                suffix
            ));
        }
        ProgressEvent::Failed { job_id, error } => {
            pb.finish_with_message(format!("Job {} failed: {}", job_id, error));
        }
    })
}

/// Format job status for display with status icons
pub fn format_job_status(status: JobStatus) -> String {
    match status {
        JobStatus::Succeeded => format!("\u{2713} {}", status),
        JobStatus::Failed => format!("\u{2717} {}", status),
        JobStatus::Pending => format!("\u{21bb} {}", status),
    }
}

/// Handle a submitted async command, optionally waiting for its result
///
/// Without `--wait` the job id is printed together with the command to wait
/// for it later.
pub async fn handle_pending<T>(
    client: &CloudStackClient,
    pending: PendingJob<T>,
    async_ops: &AsyncOperationArgs,
    output_format: OutputFormat,
    query: Option<&str>,
    success_message: &str,
) -> CliResult<()>
where
    T: DeserializeOwned + Serialize + Describe,
{
    if !async_ops.wait {
        return print_submitted(
            pending.job_id(),
            pending.resource_id(),
            output_format,
            query,
            success_message,
        );
    }

    let pb = spinner(format!("Waiting for {} ({})", pending.command(), pending.job_id()));
    let result = cloudstackctl_core::wait_for(
        pending,
        async_ops.timeout(client),
        async_ops.interval(client),
        Some(spinner_callback(&pb)),
    )
    .await;
    pb.finish_and_clear();

    let resource = result?;
    if structured_format(output_format, query).is_none() {
        println!("{}", success_message);
    }
    print_detail(&resource, output_format, query)
}

/// Print the id of a job that was submitted but not waited for
pub fn print_submitted(
    job_id: &str,
    resource_id: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
    success_message: &str,
) -> CliResult<()> {
    match structured_format(output_format, query) {
        Some(fmt) => {
            let mut data = json!({ "jobid": job_id });
            if let Some(id) = resource_id {
                data["id"] = json!(id);
            }
            print_output(data, fmt, query)?;
        }
        None => {
            println!("{}", success_message);
            println!("Job ID: {}", job_id);
            if let Some(id) = resource_id {
                println!("Resource ID: {}", id);
            }
            println!(
                "To wait for completion, run: cloudstackctl job wait {}",
                job_id
            );
        }
    }
    Ok(())
}

/// Wait for a job by id and print it
pub async fn wait_for_job(
    client: &CloudStackClient,
    job_id: &str,
    timeout: Duration,
    interval: Duration,
) -> CliResult<AsyncJob> {
    let pb = spinner(format!("Waiting for job {}", job_id));
    let result = cloudstackctl_core::poll_job(
        client,
        job_id,
        timeout,
        interval,
        Some(spinner_callback(&pb)),
    )
    .await;
    pb.finish_and_clear();
    Ok(result?)
}

/// Table row for async jobs
#[derive(Tabled)]
pub struct JobRow {
    #[tabled(rename = "JOB ID")]
    pub id: String,
    #[tabled(rename = "COMMAND")]
    pub command: String,
    #[tabled(rename = "STATUS")]
    pub status: String,
    #[tabled(rename = "RESOURCE")]
    pub resource: String,
    #[tabled(rename = "CREATED")]
    pub created: String,
}

impl JobRow {
    pub fn from_job(job: &AsyncJob) -> Self {
        Self {
            id: job.jobid.clone(),
            command: short_command(job.cmd.as_deref()),
            status: format_job_status(job.status()),
            resource: match (&job.jobinstancetype, &job.jobinstanceid) {
                (Some(kind), Some(id)) => format!("{} {}", kind, id),
                (None, Some(id)) => id.clone(),
                _ => "-".to_string(),
            },
            created: format_date(job.created.as_deref()),
        }
    }
}

/// `org.apache.cloudstack.api.command.user.vm.StartVMCmd` -> `StartVMCmd`
fn short_command(cmd: Option<&str>) -> String {
    cmd.and_then(|c| c.rsplit('.').next())
        .unwrap_or("-")
        .to_string()
}

impl Describe for AsyncJob {
    fn detail_rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![
            DetailRow::new("Job ID", self.jobid.clone()),
            DetailRow::new("Command", short_command(self.cmd.as_deref())),
            DetailRow::new("Status", format_job_status(self.status())),
            DetailRow::new(
                "Resource Type",
                or_dash(self.jobinstancetype.as_deref()),
            ),
            DetailRow::new("Resource ID", or_dash(self.jobinstanceid.as_deref())),
            DetailRow::new("Created", format_date(self.created.as_deref())),
        ];
        if let Some(completed) = &self.completed {
            rows.push(DetailRow::new("Completed", format_date(Some(completed))));
        }
        if let Some((code, text)) = self.failure() {
            rows.push(DetailRow::new("Error", format!("{} ({})", text, code)));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_command() {
        assert_eq!(
            short_command(Some(
                "org.apache.cloudstack.api.command.user.vm.DeployVMCmd"
            )),
            "DeployVMCmd"
        );
        assert_eq!(short_command(None), "-");
    }

    #[test]
    fn test_args_fall_back_to_client_settings() {
        let client = CloudStackClient::builder()
            .api_url("http://localhost:8080/client/api")
            .api_key("key")
            .secret_key("secret")
            .async_timeout(Duration::from_secs(90))
            .poll_interval(Duration::from_secs(3))
            .build()
            .unwrap();

        let args = AsyncOperationArgs::default();
        assert_eq!(args.timeout(&client), Duration::from_secs(90));
        assert_eq!(args.interval(&client), Duration::from_secs(3));

        let args = AsyncOperationArgs {
            wait: true,
            wait_timeout: Some(10),
            wait_interval: Some(1),
        };
        assert_eq!(args.timeout(&client), Duration::from_secs(10));
        assert_eq!(args.interval(&client), Duration::from_secs(1));
    }
}
