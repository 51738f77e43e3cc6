//! Schema comparison between two tables.

use super::{
    convert::{convert_diff_format, create_output_options},
    helpers::spinner,
    types::{CommandOutput, DiffParams}
};
use crate::{
    bigquery::{TableRef, Warehouse},
    diff::diff_schemas,
    error::{AppResult, error_message},
    output::format_diff,
    schema::TableMetadata
};

/// Fetches both tables concurrently and renders their schema diff.
///
/// A table that cannot be fetched is reported on stderr as
/// `Error getting schema for <table>: <message>` with exit status 1.
/// With `fail_on_diff`, differing schemas also exit with status 1.
pub async fn run_diff<W: Warehouse>(
    warehouse: &W,
    params: DiffParams
) -> AppResult<CommandOutput> {
    let opts = create_output_options(convert_diff_format(params.format), params.no_color);

    let pb = spinner("Fetching schemas...");
    let (first, second) = tokio::join!(
        warehouse.get_table(&params.table1),
        warehouse.get_table(&params.table2)
    );
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut errors = Vec::new();
    let first = collect_error(first, &params.table1, &mut errors);
    let second = collect_error(second, &params.table2, &mut errors);
    let (Some(first), Some(second)) = (first, second) else {
        return Ok(CommandOutput {
            exit_code: 1,
            stdout:    Vec::new(),
            stderr:    errors
        });
    };

    let diff = diff_schemas(
        params.table1.to_string(),
        &first.schema,
        params.table2.to_string(),
        &second.schema,
        params.nested
    );
    tracing::debug!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        changed = diff.changed.len(),
        "schemas compared"
    );
    let exit_code = if params.fail_on_diff && diff.has_differences() { 1 } else { 0 };
    Ok(CommandOutput::new(exit_code, vec![format_diff(&diff, &opts)]))
}

fn collect_error(
    result: AppResult<TableMetadata>,
    table: &TableRef,
    errors: &mut Vec<String>
) -> Option<TableMetadata> {
    match result {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            errors.push(format!(
                "Error getting schema for {}: {}",
                table,
                error_message(&e)
            ));
            None
        }
    }
}
