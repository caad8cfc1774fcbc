//! Raw API command: call any CloudStack command by name

use cloudstack::Params;
use serde_json::Value;
use tracing::{debug, info};

use super::CommandContext;
use super::async_utils::{AsyncOperationArgs, wait_for_job};
use super::utils::read_file_input;
use crate::cli::OutputFormat;
use crate::error::{CloudStackCtlError, Result as CliResult};
use crate::output::{self, print_output};

/// Build request parameters from `key=value` pairs and an optional JSON object
///
/// Pairs given on the command line override keys from `--data`.
pub fn build_params(pairs: &[(String, String)], data: Option<&str>) -> CliResult<Params> {
    let mut params = Params::new();

    if let Some(data) = data {
        let content = read_file_input(data)?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| CloudStackCtlError::InvalidInput {
                message: format!("--data must be a JSON object: {}", e),
            })?;
        let Value::Object(map) = value else {
            return Err(CloudStackCtlError::InvalidInput {
                message: "--data must be a JSON object".to_string(),
            });
        };
        for (key, value) in map {
            let value = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            params.set(&key, value);
        }
    }

    for (key, value) in pairs {
        params.set(key, value.clone());
    }
    Ok(params)
}

pub async fn handle_api_command(
    ctx: &CommandContext<'_>,
    command: &str,
    pairs: &[(String, String)],
    data: Option<&str>,
    wait: bool,
) -> CliResult<()> {
    let client = ctx.client()?;
    let params = build_params(pairs, data)?;
    debug!(command, params = params.len(), "Executing raw API command");

    let response = client.execute_raw(command, &params).await?;

    let job_id = response
        .get("jobid")
        .and_then(Value::as_str)
        .map(str::to_string);
    let result = match job_id {
        Some(job_id) if wait => {
            info!(job_id = %job_id, "Waiting for async command");
            let async_ops = AsyncOperationArgs::default();
            let job = wait_for_job(
                &client,
                &job_id,
                async_ops.timeout(&client),
                async_ops.interval(&client),
            )
            .await?;
            job.jobresult.unwrap_or(Value::Null)
        }
        _ => response,
    };

    // Raw responses have no fixed shape, so auto means JSON here
    let fmt = match ctx.output {
        OutputFormat::Yaml => output::OutputFormat::Yaml,
        OutputFormat::Table => output::OutputFormat::Table,
        OutputFormat::Json | OutputFormat::Auto => output::OutputFormat::Json,
    };
    print_output(result, fmt, ctx.query)?;
    Ok(())
}
