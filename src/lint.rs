//! SQL lint engine for BigQuery scripts.
//!
//! Sources are tokenized once into a [`SqlSource`]; every enabled [`Rule`]
//! then inspects the source and reports [`Violation`]s. Rules and sources
//! are processed in parallel using [`rayon`].
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  SqlSource  │────▶│  RuleRunner  │────▶│ LintReport  │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │                    │
//!                     ┌──────┴──────┐      ┌──────┴──────┐
//!                     │   Rules     │      │ fix + format│
//!                     │  (parallel) │      └─────────────┘
//!                     └─────────────┘
//! ```
//!
//! # Rules
//!
//! | ID | Default | Detects |
//! |----|---------|---------|
//! | `SEC001` | error | UPDATE without WHERE |
//! | `SEC002` | error | DELETE without WHERE |
//! | `SEC003` | error | TRUNCATE TABLE |
//! | `SEC004` | error | DROP statements |
//! | `STYLE001` | warning | `SELECT *` |
//! | `STYLE002` | info | table without alias (fixable) |
//! | `STYLE003` | info | mixed backtick quoting in a SELECT list |
//!
//! # Configuration
//!
//! ```toml
//! [lint]
//! disabled = ["STYLE003"]
//!
//! [lint.severity]
//! STYLE001 = "error"
//! ```

mod fix;
mod format;
mod security;
mod source;
mod style;
mod types;

use std::collections::HashMap;

pub use fix::{apply_fixes, fix_source};
pub use format::format_sql;
use rayon::prelude::*;
pub use source::{SourceToken, SqlSource, Statement};
pub use types::{Fix, LintReport, RuleCategory, RuleInfo, Severity, Violation};

use crate::config::RulesConfig;

/// Trait for implementing lint rules.
///
/// Rules are stateless and must be `Send + Sync` for parallel execution.
/// Lines reported are one-based; the runner fills in the file name.
///
/// # Example
///
/// ```
/// use bench::lint::{Rule, RuleCategory, RuleInfo, Severity, SqlSource, Violation};
///
/// struct NoLimit;
///
/// impl Rule for NoLimit {
///     fn info(&self) -> RuleInfo {
///         RuleInfo {
///             id:       "CUSTOM001",
///             name:     "Query without LIMIT",
///             severity: Severity::Info,
///             category: RuleCategory::Style
///         }
///     }
///
///     fn check(&self, source: &SqlSource) -> Vec<Violation> {
///         let info = self.info();
///         source
///             .statements()
///             .iter()
///             .filter(|s| !source.statement_text(s).to_uppercase().contains("LIMIT"))
///             .map(|s| Violation::new(&info, "no LIMIT", s.line))
///             .collect()
///     }
/// }
///
/// let source = SqlSource::parse("SELECT 1", None).unwrap();
/// assert_eq!(NoLimit.check(&source).len(), 1);
/// ```
pub trait Rule: Send + Sync {
    /// Returns metadata about this rule.
    fn info(&self) -> RuleInfo;

    /// Inspects a source and returns any violations found.
    fn check(&self, source: &SqlSource) -> Vec<Violation>;
}

/// Parallel rule execution engine.
///
/// # Example
///
/// ```
/// use bench::{
///     config::RulesConfig,
///     lint::{RuleRunner, SqlSource}
/// };
///
/// let config = RulesConfig {
///     disabled: vec!["STYLE001".into()],
///     ..Default::default()
/// };
///
/// let runner = RuleRunner::with_config(config);
/// let source = SqlSource::parse("SELECT * FROM t AS t", None).unwrap();
/// let report = runner.lint(&[source]);
///
/// assert!(!report.has_issues());
/// ```
pub struct RuleRunner {
    rules:          Vec<Box<dyn Rule>>,
    severity_cache: HashMap<&'static str, Severity>
}

impl Default for RuleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRunner {
    /// Create a new runner with all default rules
    pub fn new() -> Self {
        Self::with_config(RulesConfig::default())
    }

    /// Create a new runner, dropping disabled rules and applying severity
    /// overrides
    pub fn with_config(config: RulesConfig) -> Self {
        let all_rules: Vec<Box<dyn Rule>> = vec![
            Box::new(security::MissingWhereInUpdate),
            Box::new(security::MissingWhereInDelete),
            Box::new(security::TruncateDetected),
            Box::new(security::DropDetected),
            Box::new(style::SelectStar),
            Box::new(style::MissingTableAlias),
            Box::new(style::InconsistentQuoting),
        ];
        let rules: Vec<Box<dyn Rule>> = all_rules
            .into_iter()
            .filter(|r| {
                !config
                    .disabled
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(r.info().id))
            })
            .collect();
        let mut severity_cache = HashMap::new();
        for rule in &rules {
            let rule_id = rule.info().id;
            let configured = config
                .severity
                .iter()
                .find(|(id, _)| id.eq_ignore_ascii_case(rule_id))
                .map(|(_, sev)| sev);
            if let Some(sev_str) = configured {
                match parse_severity(sev_str) {
                    Some(sev) => {
                        severity_cache.insert(rule_id, sev);
                    }
                    None => tracing::warn!(
                        rule = rule_id,
                        severity = %sev_str,
                        "ignoring unknown severity override"
                    )
                }
            }
        }
        Self {
            rules,
            severity_cache
        }
    }

    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }

    /// Run all rules on the provided sources (parallel execution)
    ///
    /// Violations are ordered by source, then line, then severity.
    pub fn lint(&self, sources: &[SqlSource]) -> LintReport {
        let mut report = LintReport::new(sources.len(), self.rules.len());
        let mut violations: Vec<(usize, Violation)> = sources
            .par_iter()
            .enumerate()
            .flat_map(|(idx, source)| {
                self.rules
                    .par_iter()
                    .flat_map(|rule| rule.check(source))
                    .map(move |mut v| {
                        v.file = source.name().map(String::from);
                        (idx, v)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        violations.sort_by(|(ia, a), (ib, b)| {
            ia.cmp(ib)
                .then_with(|| a.line.cmp(&b.line))
                .then_with(|| b.severity.cmp(&a.severity))
                .then_with(|| a.rule_id.cmp(b.rule_id))
        });
        for (_, mut violation) in violations {
            if let Some(&severity) = self.severity_cache.get(violation.rule_id) {
                violation.severity = severity;
            }
            report.add_violation(violation);
        }
        tracing::debug!(
            sources = report.files_count,
            rules = report.rules_count,
            violations = report.violations.len(),
            "lint finished"
        );
        report
    }
}

/// Parse severity string to enum
fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_lowercase().as_str() {
        "error" => Some(Severity::Error),
        "warning" | "warn" => Some(Severity::Warning),
        "info" => Some(Severity::Info),
        _ => None
    }
}
