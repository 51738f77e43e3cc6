//! Application types for CLI commands.
//!
//! Each subcommand takes a parameter struct built by the binary from the
//! parsed command line, and every command produces a [`CommandOutput`].

use std::path::PathBuf;

use crate::{
    bigquery::TableRef,
    cli::{DiffFormat, DryRunFormat, LintFormat, QueryFormat, SchemaFormat}
};

/// Parameters for the query command.
///
/// # Example
///
/// ```
/// use bench::{app::QueryParams, cli::QueryFormat};
///
/// let params = QueryParams {
///     sql:      "SELECT 1".to_string(),
///     dataset:  None,
///     limit:    10,
///     format:   QueryFormat::Table,
///     no_color: true
/// };
/// ```
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub sql:      String,
    /// Default dataset, `project.dataset` or bare `dataset`
    pub dataset:  Option<String>,
    /// Rows to display
    pub limit:    usize,
    pub format:   QueryFormat,
    pub no_color: bool
}

/// Parameters for the dryrun command.
#[derive(Debug, Clone)]
pub struct DryRunParams {
    pub sql:         String,
    pub dataset:     Option<String>,
    pub format:      DryRunFormat,
    /// Fall back to a local parse when BigQuery cannot be asked
    pub local_check: bool,
    pub no_color:    bool
}

/// Parameters for the schema command.
#[derive(Debug, Clone)]
pub struct SchemaParams {
    pub table:    TableRef,
    pub format:   SchemaFormat,
    pub detailed: bool,
    /// Query-result JSON document to validate against the schema
    pub validate: Option<PathBuf>,
    pub no_color: bool
}

/// Parameters for the diff command.
#[derive(Debug, Clone)]
pub struct DiffParams {
    pub table1:       TableRef,
    pub table2:       TableRef,
    pub format:       DiffFormat,
    pub nested:       bool,
    /// Exit with status 1 when the schemas differ
    pub fail_on_diff: bool,
    pub no_color:     bool
}

/// Parameters for the lint command.
#[derive(Debug, Clone)]
pub struct LintParams {
    /// Files to lint; empty or `-` reads stdin
    pub files:    Vec<PathBuf>,
    pub fix:      bool,
    /// Destination for fixed SQL
    pub output:   Option<PathBuf>,
    pub format:   LintFormat,
    pub no_color: bool
}

/// Output from CLI command execution.
///
/// # Example
///
/// ```
/// use bench::app::CommandOutput;
///
/// let output = CommandOutput {
///     exit_code: 0,
///     stdout:    vec!["✓ No issues found".to_string()],
///     stderr:    Vec::new()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code for the process
    pub exit_code: i32,
    /// Lines to print to stdout
    pub stdout:    Vec<String>,
    /// Lines to print to stderr
    pub stderr:    Vec<String>
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: Vec<String>) -> Self {
        Self {
            exit_code,
            stdout,
            stderr: Vec::new()
        }
    }
}
