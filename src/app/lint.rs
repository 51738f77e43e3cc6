//! SQL linting and fixing.

use std::{fs, path::Path};

use super::{
    convert::{convert_lint_format, create_output_options},
    helpers::{LintInput, lint_exit_code, read_lint_inputs},
    types::{CommandOutput, LintParams}
};
use crate::{
    config::Config,
    error::{AppResult, config_error, file_write_error},
    lint::{RuleRunner, SqlSource, fix_source},
    output::format_lint_report
};

/// Lints SQL files or stdin.
///
/// With `fix`, fixable issues are applied and the SQL reformatted; the
/// result goes to `output`, else back into the input file, else (stdin)
/// to stdout. The fixed SQL is linted again and the remaining issues are
/// reported. Any remaining issue exits with status 1.
///
/// # Errors
///
/// Returns an error when an input cannot be read, tokenized or written.
///
/// # Example
///
/// ```
/// use bench::{
///     app::{LintParams, run_lint},
///     cli::LintFormat,
///     config::Config
/// };
///
/// let params = LintParams {
///     files:    Vec::new(),
///     fix:      false,
///     output:   None,
///     format:   LintFormat::Text,
///     no_color: true
/// };
/// let output = run_lint(params, &Config::default(), || Some("DELETE FROM t".into())).unwrap();
///
/// assert_eq!(output.exit_code, 1);
/// assert!(output.stdout[0].contains("SEC002"));
/// ```
pub fn run_lint<F>(params: LintParams, config: &Config, stdin: F) -> AppResult<CommandOutput>
where
    F: FnOnce() -> Option<String>
{
    let opts = create_output_options(convert_lint_format(params.format), params.no_color);
    let inputs = read_lint_inputs(&params.files, stdin)?;
    if params.output.is_some() && inputs.len() > 1 {
        return Err(config_error("--output can only be used with a single input"));
    }
    let runner = RuleRunner::with_config(config.lint.clone());
    let mut sources = parse_sources(&inputs)?;
    let multi_file = sources.len() > 1;
    let mut output = CommandOutput::default();

    if params.fix {
        let mut fixed_inputs = Vec::with_capacity(inputs.len());
        for (input, source) in inputs.iter().zip(&sources) {
            let report = runner.lint(std::slice::from_ref(source));
            let fixed = fix_source(source, &report.violations)?;
            let target = params.output.as_deref().or(input.path.as_deref());
            match target {
                Some(path) => {
                    write_fixed(path, &fixed)?;
                    tracing::info!(path = %path.display(), "wrote fixed SQL");
                    output
                        .stderr
                        .push(format!("Fixed SQL written to {}", path.display()));
                }
                None => output.stdout.push(fixed.clone())
            }
            fixed_inputs.push(LintInput {
                path: input.path.clone(),
                text: fixed
            });
        }
        sources = parse_sources(&fixed_inputs)?;
    }

    let report = runner.lint(&sources);
    let rendered = format_lint_report(&report, multi_file, &opts);
    // Fixed SQL on stdout must stay clean
    if params.fix && !output.stdout.is_empty() {
        output.stderr.push(rendered);
    } else {
        output.stdout.push(rendered);
    }
    output.exit_code = lint_exit_code(&report);
    Ok(output)
}

fn parse_sources(inputs: &[LintInput]) -> AppResult<Vec<SqlSource>> {
    inputs
        .iter()
        .map(|input| SqlSource::parse(&input.text, input.name().as_deref()))
        .collect()
}

fn write_fixed(path: &Path, sql: &str) -> AppResult<()> {
    let mut content = sql.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    fs::write(path, content).map_err(|e| file_write_error(&path.display().to_string(), e))
}
