use std::{
    collections::{HashMap, HashSet},
    sync::LazyLock
};

use regex::Regex;
use sqlparser::{keywords::Keyword, tokenizer::Token};

use super::{Fix, Rule, RuleCategory, RuleInfo, Severity, SourceToken, SqlSource, Violation};

static SELECT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bSELECT\s+(?:DISTINCT\s+)?\*\s+FROM\b").expect("valid regex")
});

static TABLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+(`[^`]+`|[A-Za-z_][\w-]*(?:\.[A-Za-z_][\w-]*)*)")
        .expect("valid regex")
});

/// What may directly follow a table reference that has no alias
static ALIAS_TERMINATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\s*;|\s*$|\s+(?:INNER|LEFT|RIGHT|FULL|CROSS|JOIN|WHERE|GROUP|ORDER|LIMIT|ON|USING|QUALIFY|WINDOW|HAVING|UNION|INTERSECT|EXCEPT)\b)"
    )
    .expect("valid regex")
});

static SELECT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bSELECT\s+(.*?)\s+FROM\b").expect("valid regex"));

/// SELECT * reads every column
pub struct SelectStar;

impl Rule for SelectStar {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "STYLE001",
            name:     "SELECT * usage",
            severity: Severity::Warning,
            category: RuleCategory::Style
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        let info = self.info();
        SELECT_STAR
            .find_iter(source.text())
            .filter(|m| source.is_code_at(m.start()))
            .map(|m| {
                Violation::new(
                    &info,
                    "Use of SELECT * (consider specifying columns explicitly)",
                    source.line_at(m.start())
                )
                .with_suggestion("List the columns you need; BigQuery bills every column read")
            })
            .collect()
    }
}

/// Tables in FROM/JOIN without an alias
pub struct MissingTableAlias;

impl Rule for MissingTableAlias {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "STYLE002",
            name:     "Missing table alias",
            severity: Severity::Info,
            category: RuleCategory::Style
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        let info = self.info();
        let mut used: HashMap<Option<usize>, HashSet<String>> = HashMap::new();
        let mut violations = Vec::new();
        for caps in TABLE_REFERENCE.captures_iter(source.text()) {
            let (Some(whole), Some(table)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !ALIAS_TERMINATOR.is_match(&source.text()[table.end()..]) {
                continue;
            }
            let Some(keyword_idx) = source.token_at(whole.start()) else {
                continue;
            };
            if source.tokens()[keyword_idx].word().is_none() || follows_delete(source, keyword_idx)
            {
                continue;
            }
            let table_name = table.as_str().trim_matches('`');
            let statement = source.statement_of(keyword_idx);
            let taken = used.entry(statement).or_default();
            let alias = suggest_alias(table_name, taken);
            taken.insert(alias.clone());
            let violation = Violation::new(
                &info,
                format!("Table '{}' has no alias (suggestion: '{}')", table_name, alias),
                source.line_at(whole.start())
            );
            // Columns written as `orders.id` would no longer resolve once
            // the table is aliased, so those references are left unfixed
            let segment = table_name.rsplit('.').next().unwrap_or(table_name);
            if used_as_qualifier(source, statement, segment) {
                violations.push(violation.with_suggestion(format!(
                    "Write `{} AS {}` and qualify its columns as `{}.column`",
                    table.as_str(),
                    alias,
                    alias
                )));
                continue;
            }
            violations.push(
                violation
                    .with_suggestion(format!("Write `{} AS {}`", table.as_str(), alias))
                    .with_fix(Fix {
                        range:       table.end()..table.end(),
                        replacement: format!(" AS {}", alias)
                    })
            );
        }
        violations
    }
}

/// `DELETE FROM t` takes no alias
fn follows_delete(source: &SqlSource, idx: usize) -> bool {
    source
        .prev_code(idx)
        .is_some_and(|prev| source.tokens()[prev].is_keyword(Keyword::DELETE))
}

/// Whether `name.` prefixes a column anywhere in the statement
fn used_as_qualifier(source: &SqlSource, statement: Option<usize>, name: &str) -> bool {
    let Some(statement) = statement.and_then(|idx| source.statements().get(idx)) else {
        return false;
    };
    let code: Vec<&SourceToken> = source.code_tokens(statement).collect();
    code.windows(2).any(|pair| {
        matches!(pair[1].token, Token::Period)
            && matches!(&pair[0].token, Token::Word(w) if w.value.eq_ignore_ascii_case(name))
    })
}

/// Lower-cased first letter of the last path segment, numbered when the
/// letter is already taken in the statement
fn suggest_alias(table_name: &str, taken: &HashSet<String>) -> String {
    let base = table_name
        .rsplit('.')
        .next()
        .and_then(|segment| segment.chars().find(|c| c.is_ascii_alphabetic()))
        .map(|c| c.to_ascii_lowercase().to_string())
        .unwrap_or_else(|| "t".to_string());
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

/// Mixed backtick quoting of plain columns within a SELECT list
pub struct InconsistentQuoting;

impl Rule for InconsistentQuoting {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "STYLE003",
            name:     "Inconsistent column quoting",
            severity: Severity::Info,
            category: RuleCategory::Style
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        let info = self.info();
        let mut violations = Vec::new();
        for stmt in source.statements() {
            let text = source.statement_text(stmt);
            if !text.contains('`') {
                continue;
            }
            let Some(caps) = SELECT_LIST.captures(text) else {
                continue;
            };
            let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let (mut quoted, mut unquoted) = (0, 0);
            for column in list.as_str().split(',').map(str::trim) {
                if column.is_empty() || column.contains(['(', '+', '-', '*', '/']) {
                    continue;
                }
                if column.contains('`') {
                    quoted += 1;
                } else {
                    unquoted += 1;
                }
            }
            if quoted > 0 && unquoted > 0 {
                violations.push(
                    Violation::new(
                        &info,
                        "Inconsistent column quoting (use backticks consistently for all columns)",
                        source.line_at(source.statement_offset(stmt) + whole.start())
                    )
                    .with_suggestion("Quote all plain columns with backticks, or none of them")
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(rule: &dyn Rule, sql: &str) -> Vec<Violation> {
        rule.check(&SqlSource::parse(sql, None).unwrap())
    }

    #[test]
    fn test_select_star_each_occurrence() {
        let sql = "SELECT * FROM a;\nSELECT id FROM b;\nselect distinct *\nfrom c";
        let v = run(&SelectStar, sql);
        let lines: Vec<usize> = v.iter().map(|v| v.line).collect();
        assert_eq!(lines, [1, 3]);
        assert_eq!(v[0].severity, Severity::Warning);
    }

    #[test]
    fn test_select_star_in_comment_ignored() {
        assert!(run(&SelectStar, "-- SELECT * FROM a\nSELECT id FROM a").is_empty());
        assert!(run(&SelectStar, "SELECT COUNT(*) FROM a").is_empty());
    }

    #[test]
    fn test_missing_alias_suggestion_and_fix() {
        let sql = "SELECT id FROM `proj.ds.orders` WHERE id > 1";
        let v = run(&MissingTableAlias, sql);
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].message,
            "Table 'proj.ds.orders' has no alias (suggestion: 'o')"
        );
        let fix = v[0].fix.clone().unwrap();
        let mut fixed = sql.to_string();
        fixed.replace_range(fix.range, &fix.replacement);
        assert_eq!(fixed, "SELECT id FROM `proj.ds.orders` AS o WHERE id > 1");
    }

    #[test]
    fn test_aliased_tables_pass() {
        assert!(run(&MissingTableAlias, "SELECT o.id FROM orders o WHERE o.id > 1").is_empty());
        assert!(run(&MissingTableAlias, "SELECT o.id FROM orders AS o").is_empty());
        assert!(run(&MissingTableAlias, "SELECT 1 FROM UNNEST([1, 2])").is_empty());
        assert!(run(&MissingTableAlias, "SELECT EXTRACT(DAY FROM ts) AS d FROM t AS x").is_empty());
    }

    #[test]
    fn test_join_and_end_of_input() {
        let v = run(
            &MissingTableAlias,
            "SELECT 1 FROM orders\nJOIN order_items ON x = y\nJOIN ds.offers"
        );
        let messages: Vec<&str> = v.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Table 'orders' has no alias (suggestion: 'o')",
                "Table 'order_items' has no alias (suggestion: 'o2')",
                "Table 'ds.offers' has no alias (suggestion: 'o3')"
            ]
        );
        assert_eq!(v[2].line, 3);
    }

    #[test]
    fn test_delete_from_is_not_flagged() {
        assert!(run(&MissingTableAlias, "DELETE FROM t WHERE id = 1").is_empty());
    }

    #[test]
    fn test_inconsistent_quoting() {
        let v = run(&InconsistentQuoting, "SELECT `id`, name, COUNT(*) FROM t");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].line, 1);
        assert!(run(&InconsistentQuoting, "SELECT `id`, `name` FROM t").is_empty());
        assert!(run(&InconsistentQuoting, "SELECT id, name FROM `t`").is_empty());
    }
}
