//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.bench.toml` in current directory
//! 4. `~/.config/bench/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [bigquery]
//! project = "my-project"
//! dataset = "analytics"
//! location = "EU"
//! price_per_tib = 6.25
//!
//! [retry]
//! max_retries = 3
//! initial_delay_ms = 500
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
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `BENCH_PROJECT` / `GOOGLE_CLOUD_PROJECT` | Default GCP project |
//! | `BENCH_DATASET` | Default dataset for unqualified tables |
//! | `BENCH_LOCATION` | Job location (e.g. `US`, `EU`) |
//! | `BENCH_ACCESS_TOKEN` | Pre-issued OAuth2 access token |
//! | `BENCH_API_ENDPOINT` | BigQuery REST endpoint override |

use std::{collections::HashMap, env, fs, path::Path, path::PathBuf};

use serde::Deserialize;
use toml::{Table, Value};

use crate::error::{AppResult, config_error};

/// Default BigQuery REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Default Google OAuth2 token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bigquery: BigQueryConfig,
    #[serde(default)]
    pub retry:    RetryConfig,
    #[serde(default)]
    pub dryrun:   DryRunConfig,
    #[serde(default)]
    pub lint:     RulesConfig
}

/// BigQuery connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BigQueryConfig {
    pub project:          Option<String>,
    pub dataset:          Option<String>,
    pub location:         Option<String>,
    pub endpoint:         String,
    pub token_uri:        String,
    pub access_token:     Option<String>,
    /// Per-request HTTP timeout
    pub timeout_secs:     u64,
    /// Delay between `getQueryResults` polls for long-running jobs
    pub poll_interval_ms: u64,
    /// On-demand price in USD per TiB scanned
    pub price_per_tib:    f64
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            project:          None,
            dataset:          None,
            location:         None,
            endpoint:         String::from(DEFAULT_ENDPOINT),
            token_uri:        String::from(DEFAULT_TOKEN_URI),
            access_token:     None,
            timeout_secs:     120,
            poll_interval_ms: 1000,
            price_per_tib:    5.0
        }
    }
}

/// Retry configuration for BigQuery and OAuth requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries:      u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms:     u64,
    pub backoff_factor:   f64
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries:      3,
            initial_delay_ms: 500,
            max_delay_ms:     10000,
            backoff_factor:   2.0
        }
    }
}

/// Dry run behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DryRunConfig {
    /// Report the local parser's syntax error when BigQuery cannot be asked
    pub local_syntax_check: bool
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            local_syntax_check: true
        }
    }
}

/// Lint rules configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesConfig {
    /// Disabled rule IDs
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Severity overrides (rule_id -> severity)
    #[serde(default)]
    pub severity: HashMap<String, String>
}

impl Config {
    /// Load configuration from files and environment
    pub fn load() -> AppResult<Self> {
        let mut layers = Vec::new();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("bench")
                .join("config.toml");
            if home_config.exists() {
                layers.push(read_config_file(&home_config)?);
            }
        }

        let local_config = PathBuf::from(".bench.toml");
        if local_config.exists() {
            layers.push(read_config_file(&local_config)?);
        }

        let layers: Vec<&str> = layers.iter().map(String::as_str).collect();
        let mut config = Self::from_toml_layers(&layers)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        Self::from_toml(&read_config_file(path)?)
    }

    /// Merge TOML documents key by key, later layers winning, then parse
    /// the result
    pub fn from_toml_layers(layers: &[&str]) -> AppResult<Self> {
        let mut merged = Table::new();
        for layer in layers {
            let table: Table = toml::from_str(layer)
                .map_err(|e| config_error(format!("Invalid config file: {}", e)))?;
            merge_tables(&mut merged, table);
        }
        merged
            .try_into()
            .map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override values from environment lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>
    {
        if let Some(project) = lookup("BENCH_PROJECT").or_else(|| lookup("GOOGLE_CLOUD_PROJECT")) {
            self.bigquery.project = Some(project);
        }
        if let Some(dataset) = lookup("BENCH_DATASET") {
            self.bigquery.dataset = Some(dataset);
        }
        if let Some(location) = lookup("BENCH_LOCATION") {
            self.bigquery.location = Some(location);
        }
        if let Some(token) = lookup("BENCH_ACCESS_TOKEN") {
            self.bigquery.access_token = Some(token);
        }
        if let Some(endpoint) = lookup("BENCH_API_ENDPOINT") {
            self.bigquery.endpoint = endpoint;
        }
    }
}

fn read_config_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).map_err(|e| {
        config_error(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Nested tables merge recursively; any other value is replaced
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_layer_merges_over_home() {
        let home = r#"
            [bigquery]
            project = "home-project"
            location = "EU"

            [lint]
            disabled = ["STYLE003"]
        "#;
        let local = r#"
            [bigquery]
            project = "local-project"

            [retry]
            max_retries = 0
        "#;
        let config = Config::from_toml_layers(&[home, local]).unwrap();
        assert_eq!(config.bigquery.project.as_deref(), Some("local-project"));
        assert_eq!(config.bigquery.location.as_deref(), Some("EU"));
        assert_eq!(config.lint.disabled, vec!["STYLE003".to_string()]);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.initial_delay_ms, RetryConfig::default().initial_delay_ms);
    }

    #[test]
    fn test_no_layers_is_default() {
        let config = Config::from_toml_layers(&[]).unwrap();
        assert_eq!(config.bigquery.endpoint, DEFAULT_ENDPOINT);
        assert!(config.dryrun.local_syntax_check);
    }

    #[test]
    fn test_partial_bigquery_section_keeps_defaults() {
        let config = Config::from_toml("[bigquery]\nproject = \"p1\"\n").unwrap();
        assert_eq!(config.bigquery.project.as_deref(), Some("p1"));
        assert_eq!(config.bigquery.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.bigquery.price_per_tib, 5.0);
        assert!(config.dryrun.local_syntax_check);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml("[bigquery\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "GOOGLE_CLOUD_PROJECT" => Some("from-gcloud".to_string()),
            "BENCH_LOCATION" => Some("EU".to_string()),
            _ => None
        });
        assert_eq!(config.bigquery.project.as_deref(), Some("from-gcloud"));
        assert_eq!(config.bigquery.location.as_deref(), Some("EU"));
        assert!(config.bigquery.access_token.is_none());
    }

    #[test]
    fn test_bench_project_wins_over_gcloud_project() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "BENCH_PROJECT" => Some("bench".to_string()),
            "GOOGLE_CLOUD_PROJECT" => Some("gcloud".to_string()),
            _ => None
        });
        assert_eq!(config.bigquery.project.as_deref(), Some("bench"));
    }

    #[test]
    fn test_lint_section() {
        let config = Config::from_toml(
            "[lint]\ndisabled = [\"STYLE003\"]\n[lint.severity]\nSTYLE001 = \"error\"\n"
        )
        .unwrap();
        assert_eq!(config.lint.disabled, vec!["STYLE003".to_string()]);
        assert_eq!(config.lint.severity.get("STYLE001").unwrap(), "error");
    }
}
