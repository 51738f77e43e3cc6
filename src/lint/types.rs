//! Type definitions for the lint rule system.
//!
//! - [`Severity`] - Violation severity levels (Info, Warning, Error)
//! - [`RuleCategory`] - Rule categories (Style, Security)
//! - [`Violation`] - Individual rule violations with location and fix
//! - [`LintReport`] - Complete lint results

use std::ops::Range;

use serde::Serialize;

/// Severity level of a rule violation.
///
/// Ordered from lowest to highest severity for sorting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Suggestion, e.g. a missing alias
    Info,
    /// Likely problem, e.g. `SELECT *`
    Warning,
    /// Potentially destructive statement
    Error
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Category of a rule for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleCategory {
    /// Readability and consistency
    Style,
    /// Statements that can destroy data
    Security
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Style => write!(f, "Style"),
            Self::Security => write!(f, "Security")
        }
    }
}

/// A text edit that resolves a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    /// Byte range in the linted text to replace (empty for insertions)
    pub range:       Range<usize>,
    pub replacement: String
}

/// A single rule violation found in a SQL source.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// Unique rule identifier (e.g., "SEC001", "STYLE002")
    pub rule_id:    &'static str,
    /// Human-readable rule name
    pub rule_name:  &'static str,
    pub message:    String,
    pub severity:   Severity,
    pub category:   RuleCategory,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// One-based line in the source
    pub line:       usize,
    /// Source file, `None` for stdin
    pub file:       Option<String>,
    #[serde(skip)]
    pub fix:        Option<Fix>
}

impl Violation {
    /// Violation with the rule's default severity and category
    pub fn new(info: &RuleInfo, message: impl Into<String>, line: usize) -> Self {
        Self {
            rule_id: info.id,
            rule_name: info.name,
            message: message.into(),
            severity: info.severity,
            category: info.category,
            suggestion: None,
            line,
            file: None,
            fix: None
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}

/// Metadata about a rule for identification and configuration.
#[derive(Debug, Clone)]
pub struct RuleInfo {
    /// Unique rule identifier (e.g., "SEC001")
    pub id:       &'static str,
    /// Human-readable rule name
    pub name:     &'static str,
    /// Default severity level
    pub severity: Severity,
    pub category: RuleCategory
}

/// Complete lint report containing all violations.
#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub violations:  Vec<Violation>,
    /// Number of sources linted
    pub files_count: usize,
    /// Number of rules executed
    pub rules_count: usize
}

impl LintReport {
    pub fn new(files_count: usize, rules_count: usize) -> Self {
        Self {
            violations: Vec::new(),
            files_count,
            rules_count
        }
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn has_issues(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    pub fn fixable_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_fixable()).count()
    }

    fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}
