//! Validation of query-result JSON documents against a table schema.
//!
//! Accepted documents are a JSON array of row objects, a single row object,
//! or newline-delimited JSON (one object per line), which covers both
//! `bench query --format json` output and `bq` exports.

use serde::Serialize;
use serde_json::{Map, Value};

use super::Field;
use crate::error::{AppResult, validation_error};

/// A single schema mismatch found in a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Zero-based row index in the document
    pub row:     usize,
    /// Dotted field path, with `[i]` for repeated elements
    pub path:    String,
    pub message: String
}

/// Outcome of validating a result document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub rows_checked: usize,
    pub issues:       Vec<ValidationIssue>
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parse a result document into individual row values
pub fn parse_rows(text: &str) -> AppResult<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(validation_error("Result document is empty"));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(row @ Value::Object(_)) => Ok(vec![row]),
        Ok(other) => Err(validation_error(format!(
            "Result document must be an array of rows or an object, found {}",
            json_kind(&other)
        ))),
        Err(whole_err) => {
            // Newline-delimited JSON
            let mut rows = Vec::new();
            for (idx, line) in trimmed.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(line).map_err(|e| {
                    validation_error(format!(
                        "Invalid JSON in result document (line {}): {}; as a single document: {}",
                        idx + 1,
                        e,
                        whole_err
                    ))
                })?;
                rows.push(row);
            }
            Ok(rows)
        }
    }
}

/// Check every row against the schema
pub fn validate_rows(fields: &[Field], rows: &[Value]) -> ValidationReport {
    let mut report = ValidationReport {
        rows_checked: rows.len(),
        issues:       Vec::new()
    };
    for (row_idx, row) in rows.iter().enumerate() {
        match row {
            Value::Object(obj) => check_object(fields, obj, "", row_idx, &mut report.issues),
            other => report.issues.push(ValidationIssue {
                row:     row_idx,
                path:    String::new(),
                message: format!("row must be a JSON object, found {}", json_kind(other))
            })
        }
    }
    report
}

fn check_object(
    fields: &[Field],
    obj: &Map<String, Value>,
    prefix: &str,
    row: usize,
    issues: &mut Vec<ValidationIssue>
) {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);
        match obj.get(&field.name) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    issues.push(ValidationIssue {
                        row,
                        path,
                        message: "missing value for REQUIRED field".to_string()
                    });
                }
            }
            Some(Value::Array(items)) if field.is_repeated() => {
                for (idx, item) in items.iter().enumerate() {
                    check_value(field, item, &format!("{}[{}]", path, idx), row, issues);
                }
            }
            Some(other) if field.is_repeated() => issues.push(ValidationIssue {
                row,
                path,
                message: format!("REPEATED field expects an array, found {}", json_kind(other))
            }),
            Some(value) => check_value(field, value, &path, row, issues)
        }
    }
    for key in obj.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            issues.push(ValidationIssue {
                row,
                path: format!("{}{}", prefix, key),
                message: "field is not defined in the schema".to_string()
            });
        }
    }
}

fn check_value(
    field: &Field,
    value: &Value,
    path: &str,
    row: usize,
    issues: &mut Vec<ValidationIssue>
) {
    if value.is_null() {
        return;
    }
    if field.is_record() {
        match value {
            Value::Object(obj) => {
                check_object(&field.fields, obj, &format!("{}.", path), row, issues)
            }
            other => issues.push(ValidationIssue {
                row,
                path: path.to_string(),
                message: format!("expected {}, found {}", field.field_type, json_kind(other))
            })
        }
        return;
    }
    if !value_matches_type(&field.field_type, value) {
        issues.push(ValidationIssue {
            row,
            path: path.to_string(),
            message: format!(
                "expected {}, found {} {}",
                field.field_type,
                json_kind(value),
                truncate(&value.to_string(), 40)
            )
        });
    }
}

/// Whether a non-null JSON value is an acceptable encoding of a column type.
///
/// Numeric columns also accept numeric strings since BigQuery renders
/// INT64 and NUMERIC as strings in JSON exports.
pub fn value_matches_type(field_type: &str, value: &Value) -> bool {
    match field_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            Value::String(s) => s.trim().parse::<i64>().is_ok(),
            _ => false
        },
        "FLOAT" | "FLOAT64" => match value {
            Value::Number(_) => true,
            Value::String(s) => {
                s.trim().parse::<f64>().is_ok()
                    || matches!(s.as_str(), "NaN" | "Infinity" | "-Infinity")
            }
            _ => false
        },
        "NUMERIC" | "BIGNUMERIC" | "DECIMAL" | "BIGDECIMAL" => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok(),
            _ => false
        },
        "BOOLEAN" | "BOOL" => value.is_boolean(),
        "TIMESTAMP" => value.is_string() || value.is_number(),
        "STRING" | "BYTES" | "DATE" | "DATETIME" | "TIME" | "GEOGRAPHY" | "INTERVAL" => {
            value.is_string()
        }
        _ => true
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object"
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}
