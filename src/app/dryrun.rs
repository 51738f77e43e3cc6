//! Query validation and cost estimation.

use super::{
    convert::{convert_dry_run_format, create_output_options},
    helpers::spinner,
    types::{CommandOutput, DryRunParams}
};
use crate::{
    bigquery::{DryRunOutcome, QuerySpec, Warehouse},
    config::Config,
    error::{AppResult, error_message},
    output::format_dry_run,
    query::check_syntax
};

/// Parse the SQL locally; `Some` when it is rejected
pub fn local_syntax_outcome(sql: &str) -> Option<DryRunOutcome> {
    match check_syntax(sql) {
        Ok(statements) => {
            tracing::debug!(statements, "local syntax check passed");
            None
        }
        Err(error) => Some(DryRunOutcome::Invalid {
            error
        })
    }
}

/// Validates a query without running it.
///
/// BigQuery has the final word whenever it can be reached. The local
/// BigQuery-dialect parse is a fallback: when it rejects the SQL and no
/// warehouse answers (no project or credentials, or the dry run request
/// fails), the local syntax error is reported instead. An invalid query
/// exits with status 1.
///
/// # Errors
///
/// Returns an error when the SQL parses locally (or the local check is
/// off) but connecting to or reaching BigQuery fails.
pub async fn run_dryrun<W, F>(
    params: DryRunParams,
    config: &Config,
    connect: F
) -> AppResult<CommandOutput>
where
    W: Warehouse,
    F: FnOnce() -> AppResult<W>
{
    let opts = create_output_options(convert_dry_run_format(params.format), params.no_color);
    let local = if params.local_check {
        local_syntax_outcome(&params.sql)
    } else {
        None
    };
    let spec = QuerySpec::new(params.sql.clone()).with_dataset(params.dataset);
    let outcome = match local {
        None => {
            let warehouse = connect()?;
            remote_dry_run(&warehouse, &spec).await?
        }
        Some(local) => match connect() {
            Ok(warehouse) => match remote_dry_run(&warehouse, &spec).await {
                Ok(outcome) => {
                    if outcome.is_valid() {
                        tracing::info!("BigQuery accepted SQL the local parser rejected");
                    }
                    outcome
                }
                Err(e) => {
                    tracing::warn!(
                        error = %error_message(&e),
                        "dry run failed, reporting the local syntax error"
                    );
                    local
                }
            },
            Err(e) => {
                tracing::debug!(
                    error = %error_message(&e),
                    "no warehouse available, reporting the local syntax error"
                );
                local
            }
        }
    };
    let exit_code = if outcome.is_valid() { 0 } else { 1 };
    let rendered = format_dry_run(&outcome, &params.sql, config.bigquery.price_per_tib, &opts);
    Ok(CommandOutput::new(exit_code, vec![rendered]))
}

async fn remote_dry_run<W: Warehouse>(warehouse: &W, spec: &QuerySpec) -> AppResult<DryRunOutcome> {
    let pb = spinner("Validating query...");
    let result = warehouse.dry_run(spec).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_syntax_outcome() {
        assert!(local_syntax_outcome("SELECT 1").is_none());
        assert!(matches!(
            local_syntax_outcome("SELEC 1"),
            Some(DryRunOutcome::Invalid { .. })
        ));
    }
}
