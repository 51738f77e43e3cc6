use std::time::Duration;

use colored::{ColoredString, Colorize};
use comfy_table::{Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    bigquery::{DryRunOutcome, QueryResults},
    diff::SchemaDiff,
    lint::{LintReport, Severity},
    query::{estimate_cost, format_bytes},
    schema::{SchemaDocument, TableMetadata, flatten_fields, validate::ValidationReport}
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Rich,
    Text,
    Json,
    Csv,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Table,
            colored: true
        }
    }
}

fn paint(text: &str, opts: &OutputOptions, style: impl Fn(&str) -> ColoredString) -> String {
    if opts.colored {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

/// Group digits in threes: `1234567` → `1,234,567`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render one result cell for a table
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string()
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string()
    };
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Format the rows of a completed query, at most `limit` of them
pub fn format_query_results(results: &QueryResults, limit: usize, opts: &OutputOptions) -> String {
    let rows = &results.rows[..results.rows.len().min(limit)];
    match opts.format {
        OutputFormat::Json => to_json(rows),
        OutputFormat::Csv => {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            let header: Vec<Value> = results
                .schema
                .iter()
                .map(|f| Value::String(f.name.clone()))
                .collect();
            lines.push(header.iter().map(csv_field).collect::<Vec<_>>().join(","));
            for row in rows {
                lines.push(row.values().map(csv_field).collect::<Vec<_>>().join(","));
            }
            lines.join("\n")
        }
        _ if rows.is_empty() => {
            "Query executed successfully but returned no results.".to_string()
        }
        _ => {
            let total = results.total_rows.max(results.rows.len() as u64);
            let title = format!(
                "Query Results (showing {} of {} rows)",
                rows.len(),
                format_thousands(total)
            );
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(results.schema.iter().map(|f| f.name.as_str()));
            for row in rows {
                table.add_row(row.values().map(cell_text));
            }
            format!("{}\n{}", paint(&title, opts, |s| s.bold()), table)
        }
    }
}

/// Execution summary printed after query results
pub fn format_query_summary(
    results: &QueryResults,
    elapsed: Duration,
    price_per_tib: f64,
    opts: &OutputOptions
) -> String {
    let mut lines = vec![
        format!("Execution time: {:.2} seconds", elapsed.as_secs_f64()),
        format!("Bytes processed: {}", format_bytes(results.bytes_processed)),
        format!(
            "Estimated cost: ${:.5}",
            estimate_cost(results.bytes_processed, price_per_tib)
        ),
        format!("Rows returned: {}", results.total_rows),
    ];
    if let Some(affected) = results.dml_affected_rows {
        lines.push(format!("Rows affected: {}", affected));
    }
    if results.cache_hit {
        lines.push("Served from cache".to_string());
    }
    let body = lines.join("\n");
    if opts.colored { body.dimmed().to_string() } else { body }
}

/// Format a dry-run outcome
pub fn format_dry_run(
    outcome: &DryRunOutcome,
    sql: &str,
    price_per_tib: f64,
    opts: &OutputOptions
) -> String {
    match (outcome, opts.format) {
        (DryRunOutcome::Valid { bytes_processed, .. }, OutputFormat::Json) => to_json(&json!({
            "valid": true,
            "bytes_to_be_processed": bytes_processed,
            "estimated_cost": estimate_cost(*bytes_processed, price_per_tib)
        })),
        (DryRunOutcome::Invalid { error }, OutputFormat::Json) => to_json(&json!({
            "valid": false,
            "error": error
        })),
        (DryRunOutcome::Valid { bytes_processed, .. }, _) => {
            let hint = format!(
                "Run with: bench query \"{}\" to execute this query",
                sql.replace('"', "\\\"")
            );
            [
                paint("✓ Query valid", opts, |s| s.green().bold()),
                format!("Bytes to be processed: {}", format_bytes(*bytes_processed)),
                format!(
                    "Estimated cost: ${:.5}",
                    estimate_cost(*bytes_processed, price_per_tib)
                ),
                String::new(),
                paint(&hint, opts, |s| s.dimmed()),
            ]
            .join("\n")
        }
        (DryRunOutcome::Invalid { error }, _) => [
            paint("✗ Query invalid", opts, |s| s.red().bold()),
            format!("Error: {}", error),
        ]
        .join("\n")
    }
}

fn timestamp_or_unknown(ts: Option<String>) -> String {
    ts.unwrap_or_else(|| "Unknown".to_string())
}

/// Format a table schema
pub fn format_schema(table: &TableMetadata, detailed: bool, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => to_json(&SchemaDocument::from_metadata(table, detailed)),
        OutputFormat::Yaml => to_yaml(&SchemaDocument::from_metadata(table, detailed)),
        _ => {
            let fields = if detailed {
                flatten_fields(&table.schema)
            } else {
                table.schema.clone()
            };
            let mut grid = Table::new();
            grid.load_preset(UTF8_BORDERS_ONLY);
            if detailed {
                grid.set_header(["Name", "Type", "Mode", "Description"]);
            } else {
                grid.set_header(["Name", "Type", "Mode"]);
            }
            for field in &fields {
                let mut row = vec![
                    field.name.clone(),
                    field.field_type.clone(),
                    field.effective_mode().to_string(),
                ];
                if detailed {
                    row.push(field.description.clone().unwrap_or_default());
                }
                grid.add_row(row);
            }
            let title = format!("Schema for {}", table.reference.full_table_id());
            let info = [
                paint("Table Info:", opts, |s| s.bold()),
                format!(
                    "  Created: {}",
                    timestamp_or_unknown(table.created.map(|t| t.to_rfc3339()))
                ),
                format!(
                    "  Last modified: {}",
                    timestamp_or_unknown(table.modified.map(|t| t.to_rfc3339()))
                ),
                format!(
                    "  Rows: {}",
                    table.num_rows.map(format_thousands).unwrap_or_else(|| "Unknown".into())
                ),
                format!(
                    "  Size: {}",
                    table
                        .num_bytes
                        .map(|b| format!("{} bytes", format_thousands(b)))
                        .unwrap_or_else(|| "Unknown".into())
                ),
            ];
            format!(
                "{}\n{}\n\n{}",
                paint(&title, opts, |s| s.cyan().bold()),
                grid,
                info.join("\n")
            )
        }
    }
}

/// Format the result of validating a document against a schema
pub fn format_validation(report: &ValidationReport, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        _ => {
            if report.is_valid() {
                return paint(
                    &format!("✓ {} rows match schema", report.rows_checked),
                    opts,
                    |s| s.green()
                );
            }
            let mut lines = vec![paint(
                &format!(
                    "✗ {} issue(s) in {} rows",
                    report.issues.len(),
                    report.rows_checked
                ),
                opts,
                |s| s.red().bold()
            )];
            for issue in &report.issues {
                lines.push(format!(
                    "  Row {}: {}: {}",
                    issue.row + 1,
                    issue.path,
                    issue.message
                ));
            }
            lines.join("\n")
        }
    }
}

/// Format a schema diff
pub fn format_diff(diff: &SchemaDiff, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => to_json(diff),
        OutputFormat::Yaml => to_yaml(diff),
        OutputFormat::Text => format_diff_text(diff),
        _ => format_diff_rich(diff, opts)
    }
}

fn diff_counts(diff: &SchemaDiff) -> [String; 4] {
    [
        format!("Added fields: {}", diff.added.len()),
        format!("Removed fields: {}", diff.removed.len()),
        format!("Changed fields: {}", diff.changed.len()),
        format!("Unchanged fields: {}", diff.unchanged),
    ]
}

fn format_diff_text(diff: &SchemaDiff) -> String {
    let mut lines = vec![format!("Schema diff: {} → {}", diff.table1, diff.table2)];
    lines.extend(diff_counts(diff).iter().map(|c| format!("  {}", c)));
    if !diff.added.is_empty() {
        lines.push(String::new());
        lines.push("Added fields:".to_string());
        for entry in &diff.added {
            lines.push(format!("  + {} {}", entry.field, entry.details));
        }
    }
    if !diff.removed.is_empty() {
        lines.push(String::new());
        lines.push("Removed fields:".to_string());
        for entry in &diff.removed {
            lines.push(format!("  - {} {}", entry.field, entry.details));
        }
    }
    if !diff.changed.is_empty() {
        lines.push(String::new());
        lines.push("Changed fields:".to_string());
        for change in &diff.changed {
            lines.push(format!("  ~ {}: {} → {}", change.field, change.from, change.to));
        }
    }
    lines.join("\n")
}

fn format_diff_rich(diff: &SchemaDiff, opts: &OutputOptions) -> String {
    let mut out = vec![paint(
        &format!("Schema diff: {} → {}", diff.table1, diff.table2),
        opts,
        |s| s.cyan().bold()
    )];
    let [added, removed, changed, unchanged] = diff_counts(diff);
    out.push(format!(
        "{}  {}  {}  {}",
        paint(&added, opts, |s| s.green()),
        paint(&removed, opts, |s| s.red()),
        paint(&changed, opts, |s| s.yellow()),
        unchanged
    ));
    if !diff.has_differences() {
        out.push(String::new());
        out.push(paint("✓ Schemas are identical", opts, |s| s.green()));
        return out.join("\n");
    }
    for (title, entries) in [("Added fields", &diff.added), ("Removed fields", &diff.removed)] {
        if entries.is_empty() {
            continue;
        }
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["Field", "Type", "Mode"]);
        for entry in entries {
            table.add_row([
                entry.field.as_str(),
                entry.details.field_type.as_str(),
                entry.details.mode.as_str()
            ]);
        }
        out.push(String::new());
        out.push(paint(title, opts, |s| s.bold()));
        out.push(table.to_string());
    }
    if !diff.changed.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(["Field", "Before", "After"]);
        for change in &diff.changed {
            table.add_row([
                change.field.clone(),
                change.from.to_string(),
                change.to.to_string()
            ]);
        }
        out.push(String::new());
        out.push(paint("Changed fields", opts, |s| s.bold()));
        out.push(table.to_string());
    }
    out.join("\n")
}

fn severity_label(severity: Severity, opts: &OutputOptions) -> String {
    let label = severity.to_string();
    match severity {
        Severity::Error => paint(&label, opts, |s| s.red().bold()),
        Severity::Warning => paint(&label, opts, |s| s.yellow()),
        Severity::Info => paint(&label, opts, |s| s.blue())
    }
}

/// Format a lint report; file names prefix each line when `multi_file`
pub fn format_lint_report(report: &LintReport, multi_file: bool, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        _ => {
            if !report.has_issues() {
                return paint("✓ No issues found", opts, |s| s.green());
            }
            let mut lines = Vec::with_capacity(report.violations.len() + 2);
            for v in &report.violations {
                let location = match (&v.file, multi_file) {
                    (Some(file), true) => format!("{}:Line {}", file, v.line),
                    _ => format!("Line {}", v.line)
                };
                lines.push(format!(
                    "{}: {} [{}] {}",
                    location,
                    severity_label(v.severity, opts),
                    v.rule_id,
                    v.message
                ));
                if let Some(suggestion) = &v.suggestion {
                    lines.push(paint(&format!("    → {}", suggestion), opts, |s| s.dimmed()));
                }
            }
            lines.push(String::new());
            let mut summary = format!(
                "{} issue(s): {} error(s), {} warning(s), {} info",
                report.violations.len(),
                report.error_count(),
                report.warning_count(),
                report.info_count()
            );
            let fixable = report.fixable_count();
            if fixable > 0 {
                summary.push_str(&format!(" ({} fixable with --fix)", fixable));
            }
            lines.push(paint(&summary, opts, |s| s.bold()));
            lines.join("\n")
        }
    }
}
