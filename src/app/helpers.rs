//! Helper functions for CLI operations.
//!
//! Project and dataset resolution, reading lint inputs, and the progress
//! spinner shown while BigQuery works.

use std::{
    fs,
    io::{self, IsTerminal},
    path::{Path, PathBuf},
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    auth::Credentials,
    config::Config,
    error::{AppResult, config_error, file_read_error},
    lint::LintReport
};

const NO_PROJECT_MESSAGE: &str =
    "No project specified. Use --project, set BENCH_PROJECT, or add project to [bigquery] config.";

const NO_LINT_INPUT_MESSAGE: &str = "No SQL provided. Use a file path or pipe SQL to stdin.";

/// Resolves the project: flag, then config (which already includes the
/// environment), then the project named by the credentials.
///
/// # Example
///
/// ```
/// use bench::{app::effective_project, auth::Credentials, config::Config};
///
/// let mut config = Config::default();
/// config.bigquery.project = Some("from-config".into());
/// let creds = Credentials::AccessToken("token".into());
///
/// assert_eq!(
///     effective_project(Some("from-flag"), &config, &creds).as_deref(),
///     Some("from-flag")
/// );
/// assert_eq!(
///     effective_project(None, &config, &creds).as_deref(),
///     Some("from-config")
/// );
/// ```
pub fn effective_project(
    flag: Option<&str>,
    config: &Config,
    credentials: &Credentials
) -> Option<String> {
    flag.map(String::from)
        .or_else(|| config.bigquery.project.clone())
        .or_else(|| credentials.project_id().map(String::from))
        .filter(|p| !p.trim().is_empty())
}

/// Fail with a hint when no project could be resolved
pub fn require_project(project: Option<String>) -> AppResult<String> {
    project.ok_or_else(|| config_error(NO_PROJECT_MESSAGE))
}

/// Default dataset from the flag or config, qualified with the project
/// when it is bare and a project is known
pub fn qualify_dataset(
    flag: Option<String>,
    config: &Config,
    project: Option<&str>
) -> Option<String> {
    let dataset = flag
        .or_else(|| config.bigquery.dataset.clone())
        .filter(|d| !d.trim().is_empty())?;
    match project {
        Some(project) if !dataset.contains('.') => Some(format!("{}.{}", project, dataset)),
        _ => Some(dataset)
    }
}

/// A source of SQL to lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintInput {
    /// `None` for stdin
    pub path: Option<PathBuf>,
    pub text: String
}

impl LintInput {
    pub fn name(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.display().to_string())
    }
}

/// Read lint inputs; no files (or `-`) reads stdin via `stdin`
pub fn read_lint_inputs<F>(files: &[PathBuf], stdin: F) -> AppResult<Vec<LintInput>>
where
    F: FnOnce() -> Option<String>
{
    let wants_stdin = files.is_empty() || files.iter().any(|f| f == Path::new("-"));
    let mut inputs = Vec::with_capacity(files.len().max(1));
    let mut stdin = Some(stdin);
    for path in files {
        if path == Path::new("-") {
            continue;
        }
        let text = fs::read_to_string(path)
            .map_err(|e| file_read_error(&path.display().to_string(), e))?;
        inputs.push(LintInput {
            path: Some(path.clone()),
            text
        });
    }
    if wants_stdin {
        let text = stdin
            .take()
            .and_then(|read| read())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| config_error(NO_LINT_INPUT_MESSAGE))?;
        inputs.push(LintInput {
            path: None,
            text
        });
    }
    Ok(inputs)
}

/// Exit status for a lint run: any remaining issue fails
pub fn lint_exit_code(report: &LintReport) -> i32 {
    if report.has_issues() { 1 } else { 0 }
}

/// Spinner on stderr, only when stderr is a terminal
pub fn spinner(message: &str) -> Option<ProgressBar> {
    if !io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::auth::ServiceAccountKey;

    #[test]
    fn test_project_from_credentials() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email": "a@b.iam", "private_key": "k", "project_id": "from-key"}"#
        )
        .unwrap();
        let creds = Credentials::ServiceAccount(key);
        assert_eq!(
            effective_project(None, &Config::default(), &creds).as_deref(),
            Some("from-key")
        );
    }

    #[test]
    fn test_require_project() {
        assert!(require_project(None).is_err());
        assert_eq!(require_project(Some("p".into())).unwrap(), "p");
    }

    #[test]
    fn test_qualify_dataset() {
        let config = Config::default();
        assert_eq!(
            qualify_dataset(Some("sales".into()), &config, Some("p")).as_deref(),
            Some("p.sales")
        );
        assert_eq!(
            qualify_dataset(Some("other.sales".into()), &config, Some("p")).as_deref(),
            Some("other.sales")
        );
        assert_eq!(
            qualify_dataset(Some("sales".into()), &config, None).as_deref(),
            Some("sales")
        );
        assert_eq!(qualify_dataset(None, &config, Some("p")), None);
    }

    #[test]
    fn test_qualify_dataset_from_config() {
        let mut config = Config::default();
        config.bigquery.dataset = Some("cfg".into());
        assert_eq!(
            qualify_dataset(None, &config, Some("p")).as_deref(),
            Some("p.cfg")
        );
    }

    #[test]
    fn test_read_lint_inputs_files() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "SELECT 1").unwrap();
        let inputs =
            read_lint_inputs(&[file.path().to_path_buf()], || panic!("stdin read")).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].text, "SELECT 1");
        assert!(inputs[0].name().is_some());
    }

    #[test]
    fn test_read_lint_inputs_stdin() {
        let inputs = read_lint_inputs(&[], || Some("DELETE FROM t".into())).unwrap();
        assert_eq!(inputs[0].path, None);
        let dash = read_lint_inputs(&[PathBuf::from("-")], || Some("SELECT 2".into())).unwrap();
        assert_eq!(dash[0].text, "SELECT 2");
    }

    #[test]
    fn test_read_lint_inputs_errors() {
        assert!(read_lint_inputs(&[], || None).is_err());
        assert!(read_lint_inputs(&[], || Some("  \n".into())).is_err());
        assert!(read_lint_inputs(&[PathBuf::from("/nonexistent/q.sql")], || None).is_err());
    }
}
