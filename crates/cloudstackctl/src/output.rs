use anyhow::{Context, Result};
use comfy_table::Table;
use jpx_core::Runtime;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Global JMESPath runtime with extended functions
static JMESPATH_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the JMESPath runtime with extended functions
pub fn get_jmespath_runtime() -> &'static Runtime {
    JMESPATH_RUNTIME.get_or_init(|| Runtime::builder().with_all_extensions().build())
}

/// Normalize backtick literals in JMESPath expressions.
///
/// JMESPath allows elided quotes in backtick literals, so `` `Running` `` means
/// `` `"Running"` ``. The compiler wants valid JSON inside backticks, so bare
/// words are quoted here. Numbers, booleans, null and quoted strings pass
/// through unchanged.
fn normalize_backtick_literals(query: &str) -> String {
    static BACKTICK_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = BACKTICK_RE
        .get_or_init(|| Regex::new(r"`([^`\\]*(?:\\.[^`\\]*)*)`").ok())
        .as_ref()
    else {
        return query.to_string();
    };

    re.replace_all(query, |caps: &regex::Captures| {
        let content = &caps[1];
        let trimmed = content.trim();

        if serde_json::from_str::<Value>(trimmed).is_ok() {
            format!("`{}`", content)
        } else {
            let escaped = trimmed.replace('\\', "\\\\").replace('"', "\\\"");
            format!("`\"{}\"`", escaped)
        }
    })
    .into_owned()
}

/// Compile a JMESPath expression using the extended runtime.
pub fn compile_jmespath(
    query: &str,
) -> Result<jpx_core::Expression<'static>, jpx_core::JmespathError> {
    let normalized = normalize_backtick_literals(query);
    get_jmespath_runtime().compile(&normalized)
}

/// Apply a JMESPath query to a JSON value
pub fn apply_jmespath(data: &Value, query: &str) -> Result<Value> {
    let expr = compile_jmespath(query)
        .with_context(|| format!("Invalid JMESPath expression: {}", query))?;
    expr.search(data)
        .with_context(|| format!("Failed to apply JMESPath query: {}", query))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

pub fn print_output<T: Serialize>(
    data: T,
    format: OutputFormat,
    query: Option<&str>,
) -> Result<()> {
    let mut json_value = serde_json::to_value(data)?;

    if let Some(query_str) = query {
        json_value = apply_jmespath(&json_value, query_str)?;
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            println!("{}", render_table(&json_value));
        }
    }

    Ok(())
}

/// Render any JSON value as a table
///
/// Arrays of objects use the first object's keys as columns; a single object
/// becomes key/value rows.
pub fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(&headers);

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_value(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_value(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Key", "Value"]);

            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_value(val)]);
            }

            table.to_string()
        }
        _ => format_value(value),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_backtick_unquoted_string() {
        assert_eq!(
            normalize_backtick_literals(r#"[?state==`Running`]"#),
            r#"[?state==`"Running"`]"#
        );
    }

    #[test]
    fn test_normalize_backtick_json_literals_unchanged() {
        for query in [
            r#"[?state==`"Running"`]"#,
            r#"[?cpunumber==`2`]"#,
            r#"[?haenable==`true`]"#,
            r#"[?group==`null`]"#,
            r#"`[1, 2, 3]`"#,
        ] {
            assert_eq!(normalize_backtick_literals(query), query);
        }
    }

    #[test]
    fn test_normalize_multiple_backticks() {
        assert_eq!(
            normalize_backtick_literals(r#"[?state==`Running` && zonename==`zone1`]"#),
            r#"[?state==`"Running"` && zonename==`"zone1"`]"#
        );
    }

    #[test]
    fn test_apply_jmespath_filters_vms() {
        let data = json!([
            {"name": "web-1", "state": "Running"},
            {"name": "web-2", "state": "Stopped"}
        ]);
        let result = apply_jmespath(&data, "[?state==`Running`].name").unwrap();
        assert_eq!(result, json!(["web-1"]));
    }

    #[test]
    fn test_invalid_jmespath_is_an_error() {
        let err = apply_jmespath(&json!({}), "[?").unwrap_err();
        assert!(err.to_string().contains("Invalid JMESPath expression"));
    }

    #[test]
    fn test_render_table_object() {
        let rendered = render_table(&json!({"id": "vm-1", "cpunumber": 2}));
        assert!(rendered.contains("Key"));
        assert!(rendered.contains("vm-1"));
        assert!(rendered.contains('2'));
    }

    #[test]
    fn test_render_table_array_uses_first_keys() {
        let rendered = render_table(&json!([
            {"id": "a", "name": "one"},
            {"id": "b", "name": "two", "extra": true}
        ]));
        assert!(rendered.contains("name"));
        assert!(rendered.contains("two"));
        assert!(!rendered.contains("extra"));
    }
}
