//! Application logic for the bench CLI.
//!
//! Commands are separated from the binary entry point so they can be
//! exercised without a terminal or network: every command that talks to
//! BigQuery is generic over [`Warehouse`](crate::bigquery::Warehouse), and
//! each returns a [`CommandOutput`] carrying its exit code.
//!
//! - [`run_query`] - execute a query and render rows plus a summary
//! - [`run_dryrun`] - validate a query and estimate its cost
//! - [`run_schema`] - show a table schema or validate results against it
//! - [`run_diff`] - compare two table schemas
//! - [`run_lint`] - lint, fix and format SQL

mod convert;
mod diff;
mod dryrun;
mod helpers;
mod lint;
mod query;
mod schema;
mod types;

pub use convert::{
    convert_diff_format, convert_dry_run_format, convert_lint_format, convert_query_format,
    convert_schema_format, create_output_options
};
pub use diff::run_diff;
pub use dryrun::{local_syntax_outcome, run_dryrun};
pub use helpers::{
    LintInput, effective_project, lint_exit_code, qualify_dataset, read_lint_inputs,
    require_project, spinner
};
pub use lint::run_lint;
pub use query::run_query;
pub use schema::run_schema;
pub use types::{CommandOutput, DiffParams, DryRunParams, LintParams, QueryParams, SchemaParams};
