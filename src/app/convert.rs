//! Conversion of CLI format flags to output options.

use crate::{
    cli::{DiffFormat, DryRunFormat, LintFormat, QueryFormat, SchemaFormat},
    output::{OutputFormat, OutputOptions}
};

pub fn convert_query_format(format: QueryFormat) -> OutputFormat {
    match format {
        QueryFormat::Table => OutputFormat::Table,
        QueryFormat::Json => OutputFormat::Json,
        QueryFormat::Csv => OutputFormat::Csv
    }
}

pub fn convert_dry_run_format(format: DryRunFormat) -> OutputFormat {
    match format {
        DryRunFormat::Table => OutputFormat::Table,
        DryRunFormat::Json => OutputFormat::Json
    }
}

pub fn convert_schema_format(format: SchemaFormat) -> OutputFormat {
    match format {
        SchemaFormat::Table => OutputFormat::Table,
        SchemaFormat::Json => OutputFormat::Json,
        SchemaFormat::Yaml => OutputFormat::Yaml
    }
}

pub fn convert_diff_format(format: DiffFormat) -> OutputFormat {
    match format {
        DiffFormat::Rich => OutputFormat::Rich,
        DiffFormat::Text => OutputFormat::Text,
        DiffFormat::Json => OutputFormat::Json
    }
}

pub fn convert_lint_format(format: LintFormat) -> OutputFormat {
    match format {
        LintFormat::Text => OutputFormat::Text,
        LintFormat::Json => OutputFormat::Json,
        LintFormat::Yaml => OutputFormat::Yaml
    }
}

/// Create output options; machine formats are never colored
pub fn create_output_options(format: OutputFormat, no_color: bool) -> OutputOptions {
    let machine = matches!(
        format,
        OutputFormat::Json | OutputFormat::Csv | OutputFormat::Yaml
    );
    OutputOptions {
        format,
        colored: !no_color && !machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_formats() {
        assert_eq!(convert_query_format(QueryFormat::Csv), OutputFormat::Csv);
        assert_eq!(convert_dry_run_format(DryRunFormat::Table), OutputFormat::Table);
        assert_eq!(convert_schema_format(SchemaFormat::Yaml), OutputFormat::Yaml);
        assert_eq!(convert_diff_format(DiffFormat::Rich), OutputFormat::Rich);
        assert_eq!(convert_lint_format(LintFormat::Text), OutputFormat::Text);
    }

    #[test]
    fn test_output_options_color() {
        assert!(create_output_options(OutputFormat::Table, false).colored);
        assert!(!create_output_options(OutputFormat::Table, true).colored);
        assert!(!create_output_options(OutputFormat::Json, false).colored);
    }
}
