use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::{FilterValue, ListQuery};
use crate::transport::Upload;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print a value: pretty JSON, or `key: value` lines for an object
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match (output_format, value) {
        (OutputFormat::Text, Value::Object(map)) => {
            for (key, field) in map {
                println!("{}: {}", key, text_of(field));
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Print list rows; text mode shows one `id  name` line per row
pub fn output_rows(output_format: &OutputFormat, rows: &[Value], total: u64, page: u64) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                "data": rows,
                "total": total,
                "page": page,
            }))?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No records found");
                return Ok(());
            }
            for row in rows {
                let id = row.get("id").map(text_of).unwrap_or_default();
                let label = row
                    .get("name")
                    .or_else(|| row.get("username"))
                    .or_else(|| row.get("title"))
                    .map(text_of)
                    .unwrap_or_default();
                println!("{:>6}  {}", id, label);
            }
            println!("-- page {}, {} of {} records", page, rows.len(), total);
        }
    }
    Ok(())
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Turn a client failure into the operator-facing message
pub fn failure(err: ClientError, fallback: &str) -> anyhow::Error {
    anyhow::Error::new(CliFailure {
        code: err.error_code(),
        message: err.display_message(fallback),
    })
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliFailure {
    pub code: &'static str,
    pub message: String,
}

pub fn error_code_of(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<CliFailure>().map(|f| f.code)
}

/// Build a list query from CLI flags
pub fn build_query(
    page: Option<u32>,
    page_size: Option<u32>,
    sort: Option<&str>,
    filters: &[String],
) -> anyhow::Result<ListQuery> {
    let mut query = ListQuery::new();
    query.page = page;
    query.page_size = page_size;
    if let Some(token) = sort {
        query.sort = Some(FilterOrder::parse(token)?);
    }
    for expr in filters {
        let (name, value): (String, FilterValue) = FilterValue::parse_assignment(expr)?;
        query.filters.insert(name, value);
    }
    Ok(query)
}

/// Read a JSON document from stdin
pub fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        return Err(anyhow::anyhow!("Expected a JSON object on stdin"));
    }
    Ok(serde_json::from_str(&input)?)
}

/// Load a file for upload, guessing its content type from the extension
pub fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file path: {}", path.display()))?
        .to_string();
    let mime = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => Some("image/jpeg".to_string()),
        Some("png") => Some("image/png".to_string()),
        Some("webp") => Some("image/webp".to_string()),
        Some("gif") => Some("image/gif".to_string()),
        _ => None,
    };
    Ok(Upload { file_name, mime, bytes })
}
