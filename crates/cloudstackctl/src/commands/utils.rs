//! Shared utilities for command implementations

use anyhow::Context;
use chrono::{DateTime, FixedOffset};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;
use crate::error::{CloudStackCtlError, Result as CliResult};
use crate::output::{self, print_output};

/// Row structure for vertical table display (used by get commands)
#[derive(Tabled)]
pub struct DetailRow {
    #[tabled(rename = "FIELD")]
    pub field: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl DetailRow {
    pub fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Resources that can be shown as a FIELD/VALUE table
pub trait Describe {
    fn detail_rows(&self) -> Vec<DetailRow>;
}

impl Describe for cloudstack::SuccessResponse {
    fn detail_rows(&self) -> Vec<DetailRow> {
        let mut rows = vec![DetailRow::new("Success", self.success.to_string())];
        if let Some(text) = &self.displaytext {
            rows.push(DetailRow::new("Message", text.clone()));
        }
        rows
    }
}

/// The structured format to print in, or `None` for the human table view
///
/// `auto` shows tables until a query is given, since a query result rarely
/// has the shape of the table rows.
pub fn structured_format(
    output_format: OutputFormat,
    query: Option<&str>,
) -> Option<output::OutputFormat> {
    match (output_format, query) {
        (OutputFormat::Json, _) => Some(output::OutputFormat::Json),
        (OutputFormat::Yaml, _) => Some(output::OutputFormat::Yaml),
        (OutputFormat::Table, Some(_)) => Some(output::OutputFormat::Table),
        (OutputFormat::Auto, Some(_)) => Some(output::OutputFormat::Json),
        (OutputFormat::Table | OutputFormat::Auto, None) => None,
    }
}

/// Print a list as tabled rows, or in the requested structured format
pub fn print_list<T, R, F>(
    items: &[T],
    output_format: OutputFormat,
    query: Option<&str>,
    empty_message: &str,
    to_row: F,
) -> CliResult<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if let Some(fmt) = structured_format(output_format, query) {
        print_output(items, fmt, query)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("{}", empty_message);
        return Ok(());
    }

    let rows: Vec<R> = items.iter().map(to_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

/// Print one resource as a FIELD/VALUE table, or in a structured format
pub fn print_detail<T: Serialize + Describe>(
    item: &T,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    if let Some(fmt) = structured_format(output_format, query) {
        print_output(item, fmt, query)?;
        return Ok(());
    }

    let mut table = Table::new(item.detail_rows());
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

/// Optional text or a dash
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Format a resource state with color coding
pub fn format_state(state: Option<&str>) -> String {
    let Some(state) = state else {
        return "-".to_string();
    };
    match state.to_lowercase().as_str() {
        "running" | "ready" | "allocated" | "backedup" | "implemented" | "enabled" => {
            state.green().to_string()
        }
        "starting" | "stopping" | "creating" | "backingup" | "migrating" | "expunging" => {
            state.yellow().to_string()
        }
        "stopped" | "destroyed" => state.dimmed().to_string(),
        "error" | "failed" => state.red().to_string(),
        _ => state.to_string(),
    }
}

/// Format CloudStack timestamps (`2024-01-15T10:00:00+0000`) as
/// `2024-01-15 10:00`, leaving anything unparseable as it was
pub fn format_date(date: Option<&str>) -> String {
    let Some(date) = date else {
        return "-".to_string();
    };
    DateTime::<FixedOffset>::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(date))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Format a size in bytes as GiB
pub fn format_gib(bytes: Option<i64>) -> String {
    match bytes {
        Some(b) => format!("{} GiB", b / (1024 * 1024 * 1024)),
        None => "-".to_string(),
    }
}

/// Format memory in MiB
pub fn format_memory(mib: Option<i64>) -> String {
    match mib {
        Some(m) if m >= 1024 && m % 1024 == 0 => format!("{} GiB", m / 1024),
        Some(m) => format!("{} MiB", m),
        None => "-".to_string(),
    }
}

/// Prompts the user for confirmation
pub fn confirm_action(message: &str) -> CliResult<bool> {
    print!("Are you sure you want to {}? [y/N]: ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}

/// Ask before a destructive action unless `force` is set
///
/// Returns false if the user declined.
pub fn confirm_unless_forced(force: bool, message: &str) -> CliResult<bool> {
    if force {
        return Ok(true);
    }
    if confirm_action(message)? {
        Ok(true)
    } else {
        println!("Operation cancelled");
        Ok(false)
    }
}

/// Read file input, supporting @filename notation
pub fn read_file_input(input: &str) -> CliResult<String> {
    if let Some(filename) = input.strip_prefix('@') {
        fs::read_to_string(filename)
            .with_context(|| format!("Failed to read file: {}", filename))
            .map_err(|e| CloudStackCtlError::FileError {
                path: filename.to_string(),
                message: format!("{:#}", e),
            })
    } else {
        Ok(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_structured_format_selection() {
        assert_eq!(structured_format(OutputFormat::Auto, None), None);
        assert_eq!(structured_format(OutputFormat::Table, None), None);
        assert_eq!(
            structured_format(OutputFormat::Auto, Some("[0]")),
            Some(output::OutputFormat::Json)
        );
        assert_eq!(
            structured_format(OutputFormat::Table, Some("[0]")),
            Some(output::OutputFormat::Table)
        );
        assert_eq!(
            structured_format(OutputFormat::Yaml, None),
            Some(output::OutputFormat::Yaml)
        );
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(Some("2024-01-15T10:05:00+0000")),
            "2024-01-15 10:05"
        );
        assert_eq!(
            format_date(Some("2024-01-15T10:05:00+01:00")),
            "2024-01-15 10:05"
        );
        assert_eq!(format_date(Some("yesterday")), "yesterday");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_format_sizes() {
        assert_eq!(format_gib(Some(21_474_836_480)), "20 GiB");
        assert_eq!(format_gib(None), "-");
        assert_eq!(format_memory(Some(2048)), "2 GiB");
        assert_eq!(format_memory(Some(512)), "512 MiB");
    }

    #[test]
    fn test_format_state_plain_for_unknown() {
        assert_eq!(format_state(Some("Shutdown")), "Shutdown");
        assert_eq!(format_state(None), "-");
    }

    #[test]
    fn test_read_file_input() {
        assert_eq!(read_file_input("inline").unwrap(), "inline");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "#cloud-config").unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(read_file_input(&arg).unwrap(), "#cloud-config");

        let err = read_file_input("@/nonexistent/user-data").unwrap_err();
        assert!(matches!(err, CloudStackCtlError::FileError { .. }));
    }
}
