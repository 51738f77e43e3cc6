//! # bench
//!
//! A minimal BigQuery utility toolkit: run queries, dry-run them for cost,
//! inspect and diff table schemas, and lint SQL files.
//!
//! # Quick Start
//!
//! ```bash
//! # Run a query
//! bench query "SELECT name FROM `bigquery-public-data.usa_names.usa_1910_2013` LIMIT 5"
//!
//! # Validate and estimate cost (exit status 1 when invalid)
//! bench dryrun -f report.sql
//!
//! # Inspect and compare schemas
//! bench schema analytics.events --detailed
//! bench diff analytics.events staging.events --exit-code
//!
//! # Lint and fix SQL
//! bench lint queries/*.sql
//! bench lint report.sql --fix -o report.fixed.sql
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`BENCH_PROJECT`, `BENCH_DATASET`,
//!    `BENCH_ACCESS_TOKEN`, ...)
//! 3. `.bench.toml` in current directory
//! 4. `~/.config/bench/config.toml`
//!
//! ```toml
//! [bigquery]
//! project = "my-project"
//! dataset = "analytics"
//! location = "EU"
//!
//! [retry]
//! max_retries = 3
//!
//! [dryrun]
//! local_syntax_check = true
//!
//! [lint]
//! disabled = ["STYLE003"]
//!
//! [lint.severity]
//! STYLE001 = "error"
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - Error, invalid query (`dryrun`), remaining lint issues (`lint`),
//!   failed validation (`schema --validate`) or differing schemas
//!   (`diff --exit-code`)
//!
//! # Modules
//!
//! - [`app`] - Command orchestration
//! - [`bigquery`] - REST client and the [`bigquery::Warehouse`] trait
//! - [`auth`] - Credential discovery and OAuth2 tokens
//! - [`lint`] - Rule engine, fixer and formatter
//! - [`schema`] - Field model and result validation
//! - [`diff`] - Schema comparison
//! - [`query`] - SQL input and local syntax checks
//! - [`output`] - Rendering for every output format
//! - [`config`] - Configuration loading
//! - [`error`] - Error constructors

pub mod app;
pub mod auth;
pub mod bigquery;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod lint;
pub mod output;
pub mod query;
pub mod schema;
