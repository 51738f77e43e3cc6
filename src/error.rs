pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    if source.kind() == std::io::ErrorKind::NotFound {
        return AppError::bad_request(format!("File {} not found", path));
    }
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create file write error
pub fn file_write_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to write file '{}': {}", path, source))
}

/// Create query parse error with optional position info
pub fn query_parse_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(syntax_error_message(&message.into()))
}

/// Render a parser/tokenizer message as a user-facing syntax error
pub fn syntax_error_message(message: &str) -> String {
    format_sql_error("Syntax error", message)
}

/// Create BigQuery API error
pub fn bigquery_api_error(message: impl Into<String>) -> AppError {
    AppError::service(message.into())
}

/// Create HTTP error
pub fn http_error(err: reqwest::Error) -> AppError {
    let msg = if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else if err.is_status() {
        format!("HTTP error {}: {}", err.status().unwrap_or_default(), err)
    } else {
        err.to_string()
    };
    AppError::service(msg)
}

/// Create authentication error
pub fn auth_error(message: impl Into<String>) -> AppError {
    AppError::service(format!("Authentication failed: {}", message.into()))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create table reference error
pub fn table_id_error() -> AppError {
    AppError::bad_request(
        "Invalid table_id format. Use 'dataset.table' or 'project.dataset.table'."
    )
}

/// Create error for malformed input documents (result JSON, config values)
pub fn validation_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Text shown to the user for an error: the constructor's message, or the
/// kind label when none was attached
pub fn error_message(err: &AppError) -> String {
    err.render_message().into_owned()
}

/// Format SQL error with position highlighting
fn format_sql_error(prefix: &str, message: &str) -> String {
    // sqlparser format: "... at Line: X, Column: Y" (older releases omit the
    // second colon)
    if let Some(pos) = extract_position(message) {
        format!(
            "{} at line {}, column {}: {}",
            prefix, pos.line, pos.column, message
        )
    } else {
        format!("{}: {}", prefix, message)
    }
}

#[derive(Debug, PartialEq)]
struct SqlPosition {
    line:   usize,
    column: usize
}

fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let col_marker = ", Column";

    let line_start = message.find(line_marker)? + line_marker.len();
    let col_offset = message[line_start..].find(col_marker)?;
    let line_str = &message[line_start..line_start + col_offset];

    let rest = &message[line_start + col_offset + col_marker.len()..];
    let rest = rest.trim_start_matches(':').trim_start();
    let col_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    let line = line_str.trim().parse().ok()?;
    let column = rest[..col_end].parse().ok()?;
    Some(SqlPosition {
        line,
        column
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_position_with_colon() {
        let pos = extract_position("Expected: an expression, found: EOF at Line: 3, Column: 14");
        assert_eq!(
            pos,
            Some(SqlPosition {
                line:   3,
                column: 14
            })
        );
    }

    #[test]
    fn test_extract_position_legacy_format() {
        let pos = extract_position("Expected identifier at Line: 1, Column 8");
        assert_eq!(
            pos,
            Some(SqlPosition {
                line:   1,
                column: 8
            })
        );
    }

    #[test]
    fn test_extract_position_missing() {
        assert_eq!(extract_position("no position here"), None);
    }

    #[test]
    fn test_format_sql_error_with_position() {
        let msg = format_sql_error("Syntax error", "Expected: end of statement at Line: 2, Column: 5");
        assert!(msg.starts_with("Syntax error at line 2, column 5"));
    }

    #[test]
    fn test_format_sql_error_without_position() {
        assert_eq!(format_sql_error("Syntax error", "oops"), "Syntax error: oops");
    }
}
