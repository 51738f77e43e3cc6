//! Query execution.

use std::time::Instant;

use super::{
    convert::{convert_query_format, create_output_options},
    helpers::spinner,
    types::{CommandOutput, QueryParams}
};
use crate::{
    bigquery::{QuerySpec, Warehouse},
    config::Config,
    error::AppResult,
    output::{OutputFormat, format_query_results, format_query_summary}
};

/// Runs a query and renders its results followed by an execution summary.
///
/// # Errors
///
/// Returns an error when BigQuery rejects the query or cannot be reached.
///
/// # Example
///
/// ```no_run
/// use bench::{
///     app::{QueryParams, run_query},
///     bigquery::BigQueryClient,
///     cli::QueryFormat,
///     config::Config
/// };
///
/// # async fn example() -> masterror::AppResult<()> {
/// let config = Config::load()?;
/// let client = BigQueryClient::from_config(&config, "my-project")?;
/// let params = QueryParams {
///     sql:      "SELECT 1 AS one".to_string(),
///     dataset:  None,
///     limit:    10,
///     format:   QueryFormat::Table,
///     no_color: false
/// };
/// let output = run_query(&client, params, &config).await?;
/// for line in output.stdout {
///     println!("{}", line);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_query<W: Warehouse>(
    warehouse: &W,
    params: QueryParams,
    config: &Config
) -> AppResult<CommandOutput> {
    let opts = create_output_options(convert_query_format(params.format), params.no_color);
    let spec = QuerySpec::new(params.sql)
        .with_dataset(params.dataset)
        .with_max_results(u32::try_from(params.limit).unwrap_or(u32::MAX));

    let pb = spinner("Running query...");
    let started = Instant::now();
    let result = warehouse.run_query(&spec).await;
    let elapsed = started.elapsed();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let results = result?;
    tracing::info!(
        job_id = results.job_id.as_deref().unwrap_or("-"),
        rows = results.total_rows,
        bytes = results.bytes_processed,
        "query finished"
    );

    let rendered = format_query_results(&results, params.limit, &opts);
    let summary = format_query_summary(&results, elapsed, config.bigquery.price_per_tib, &opts);
    // Machine formats keep stdout parseable
    if opts.format == OutputFormat::Table {
        Ok(CommandOutput::new(0, vec![rendered, String::new(), summary]))
    } else {
        Ok(CommandOutput {
            exit_code: 0,
            stdout:    vec![rendered],
            stderr:    vec![summary]
        })
    }
}
