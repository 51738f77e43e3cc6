//! Table schema inspection and result validation.

use std::fs;

use super::{
    convert::{convert_schema_format, create_output_options},
    helpers::spinner,
    types::{CommandOutput, SchemaParams}
};
use crate::{
    bigquery::Warehouse,
    error::{AppResult, file_read_error},
    output::{format_schema, format_validation},
    schema::validate::{parse_rows, validate_rows}
};

/// Shows a table's schema, or validates a result document against it
/// when `validate` is set. Validation issues exit with status 1.
///
/// # Errors
///
/// Returns an error when the table cannot be fetched or the document
/// cannot be read or parsed.
pub async fn run_schema<W: Warehouse>(
    warehouse: &W,
    params: SchemaParams
) -> AppResult<CommandOutput> {
    let opts = create_output_options(convert_schema_format(params.format), params.no_color);
    // Read the document first so a bad path fails without a round trip
    let document = match &params.validate {
        Some(path) => Some(
            fs::read_to_string(path)
                .map_err(|e| file_read_error(&path.display().to_string(), e))?
        ),
        None => None
    };

    let pb = spinner("Fetching table metadata...");
    let result = warehouse.get_table(&params.table).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let table = result?;

    match document {
        Some(text) => {
            let rows = parse_rows(&text)?;
            let report = validate_rows(&table.schema, &rows);
            let exit_code = if report.is_valid() { 0 } else { 1 };
            Ok(CommandOutput::new(
                exit_code,
                vec![format_validation(&report, &opts)]
            ))
        }
        None => Ok(CommandOutput::new(
            0,
            vec![format_schema(&table, params.detailed, &opts)]
        ))
    }
}
