//! SQL input handling shared by `query` and `dryrun`.
//!
//! Covers resolving where the SQL comes from, the local syntax check a dry run
//! falls back to, and the byte/cost helpers used in summaries.

use std::{
    fs,
    io::{self, IsTerminal, Read},
    path::Path
};

use sqlparser::{dialect::BigQueryDialect, parser::Parser};

use crate::error::{AppResult, config_error, file_read_error, syntax_error_message};

/// Bytes in one tebibyte, the unit BigQuery bills on-demand queries by
pub const TIB: f64 = 1_099_511_627_776.0;

const NO_SQL_MESSAGE: &str = "No SQL provided. Use a SQL string, --file, or pipe SQL to stdin.";

/// Resolve the SQL text for a command.
///
/// A `--file` wins over the positional argument; stdin is only consulted
/// when neither is given. Blank input counts as missing.
pub fn resolve_sql<F>(sql: Option<&str>, file: Option<&Path>, stdin: F) -> AppResult<String>
where
    F: FnOnce() -> Option<String>
{
    let text = match (file, sql) {
        (Some(path), _) => fs::read_to_string(path)
            .map_err(|e| file_read_error(&path.display().to_string(), e))?,
        (None, Some(sql)) => sql.to_string(),
        (None, None) => stdin().unwrap_or_default()
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(config_error(NO_SQL_MESSAGE));
    }
    Ok(trimmed.to_string())
}

/// Read all of stdin when it is piped, `None` on a terminal
pub fn read_piped_stdin() -> Option<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).ok()?;
    Some(buf)
}

/// Parse SQL with the BigQuery dialect.
///
/// Returns the number of statements, or a user-facing syntax error message
/// with the parser's line and column.
pub fn check_syntax(sql: &str) -> Result<usize, String> {
    let dialect = BigQueryDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(statements) if statements.is_empty() => {
            Err(syntax_error_message("query contains no statements"))
        }
        Ok(statements) => Ok(statements.len()),
        Err(e) => Err(syntax_error_message(&e.to_string()))
    }
}

/// Human readable byte count using binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// On-demand cost in USD for scanning `bytes`
pub fn estimate_cost(bytes: u64, price_per_tib: f64) -> f64 {
    bytes as f64 / TIB * price_per_tib
}
