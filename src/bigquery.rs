//! BigQuery access layer.
//!
//! [`Warehouse`] is the seam the command layer talks to. The production
//! implementation is [`BigQueryClient`], which speaks the v2 REST API with
//! OAuth2 bearer tokens from [`crate::auth`].
//!
//! # Example
//!
//! ```no_run
//! use bench::{
//!     bigquery::{BigQueryClient, QuerySpec, Warehouse},
//!     config::Config
//! };
//!
//! # async fn run() -> masterror::AppResult<()> {
//! let config = Config::load()?;
//! let client = BigQueryClient::from_config(&config, "my-project")?;
//! let results = client.run_query(&QuerySpec::new("SELECT 1 AS one")).await?;
//! assert_eq!(results.rows.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod table_ref;
pub mod wire;

use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value;

pub use self::{client::BigQueryClient, table_ref::TableRef};
use crate::{error::AppResult, schema::{Field, TableMetadata}};

/// One result row: column name to decoded JSON value, in schema order
pub type Row = IndexMap<String, Value>;

/// A query submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub sql:             String,
    /// `dataset` or `project.dataset` used for unqualified table names
    pub default_dataset: Option<String>,
    /// Maximum rows returned with the results
    pub max_results:     Option<u32>
}

impl QuerySpec {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Default::default()
        }
    }

    pub fn with_dataset(mut self, dataset: Option<String>) -> Self {
        self.default_dataset = dataset;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

/// Results of a completed query job.
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    pub job_id:            Option<String>,
    pub schema:            Vec<Field>,
    /// At most `max_results` rows
    pub rows:              Vec<Row>,
    /// Rows in the full result set
    pub total_rows:        u64,
    pub bytes_processed:   u64,
    pub cache_hit:         bool,
    pub dml_affected_rows: Option<u64>
}

/// Result of a dry run.
#[derive(Debug, Clone, PartialEq)]
pub enum DryRunOutcome {
    Valid {
        bytes_processed: u64,
        schema:          Vec<Field>
    },
    /// Rejected by the local parser or by BigQuery
    Invalid { error: String }
}

impl DryRunOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Operations the commands need from a data warehouse.
pub trait Warehouse {
    /// Run a query and wait for it to complete
    fn run_query(&self, spec: &QuerySpec) -> impl Future<Output = AppResult<QueryResults>>;

    /// Validate a query and estimate the bytes it would scan.
    ///
    /// Queries rejected by BigQuery are an `Ok(DryRunOutcome::Invalid)`;
    /// `Err` is reserved for transport and authentication failures.
    fn dry_run(&self, spec: &QuerySpec) -> impl Future<Output = AppResult<DryRunOutcome>>;

    /// Fetch table metadata including its schema
    fn get_table(&self, table: &TableRef) -> impl Future<Output = AppResult<TableMetadata>>;
}
