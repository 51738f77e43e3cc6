use sqlparser::{keywords::Keyword, tokenizer::Token};

use super::{Rule, RuleCategory, RuleInfo, Severity, SqlSource, Statement, Violation};

/// UPDATE without WHERE affects all rows
pub struct MissingWhereInUpdate;

impl Rule for MissingWhereInUpdate {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "SEC001",
            name:     "UPDATE without WHERE",
            severity: Severity::Error,
            category: RuleCategory::Security
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        missing_where(self, source, Keyword::UPDATE, "UPDATE")
    }
}

/// DELETE without WHERE removes all rows
pub struct MissingWhereInDelete;

impl Rule for MissingWhereInDelete {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "SEC002",
            name:     "DELETE without WHERE",
            severity: Severity::Error,
            category: RuleCategory::Security
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        missing_where(self, source, Keyword::DELETE, "DELETE")
    }
}

fn missing_where(
    rule: &dyn Rule,
    source: &SqlSource,
    keyword: Keyword,
    label: &str
) -> Vec<Violation> {
    let info = rule.info();
    source
        .statements()
        .iter()
        .filter(|stmt| source.leading_keyword(stmt) == Some(keyword))
        .filter(|stmt| !source.has_top_level_keyword(stmt, Keyword::WHERE))
        .map(|stmt| {
            Violation::new(
                &info,
                format!(
                    "{} statement without WHERE clause (potential table-wide operation)",
                    label
                ),
                stmt.line
            )
            .with_suggestion("Add WHERE clause to limit affected rows")
        })
        .collect()
}

/// Detects TRUNCATE TABLE, which empties a table in one step
pub struct TruncateDetected;

impl Rule for TruncateDetected {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "SEC003",
            name:     "TRUNCATE statement detected",
            severity: Severity::Error,
            category: RuleCategory::Security
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        let info = self.info();
        source
            .statements()
            .iter()
            .filter(|stmt| source.leading_keyword(stmt) == Some(Keyword::TRUNCATE))
            .map(|stmt| {
                let target = object_name(source, stmt, &[Keyword::TRUNCATE, Keyword::TABLE]);
                Violation::new(
                    &info,
                    format!("TRUNCATE removes all rows from table '{}'", target),
                    stmt.line
                )
                .with_suggestion(
                    "Use DELETE with WHERE for targeted removal, or make sure a snapshot exists"
                )
            })
            .collect()
    }
}

/// Detects DROP statements which permanently destroy data
pub struct DropDetected;

impl Rule for DropDetected {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            id:       "SEC004",
            name:     "DROP statement detected",
            severity: Severity::Error,
            category: RuleCategory::Security
        }
    }

    fn check(&self, source: &SqlSource) -> Vec<Violation> {
        let info = self.info();
        source
            .statements()
            .iter()
            .filter(|stmt| source.leading_keyword(stmt) == Some(Keyword::DROP))
            .map(|stmt| {
                let object_type = source
                    .code_tokens(stmt)
                    .nth(1)
                    .and_then(|t| t.word())
                    .map(|w| w.value.to_uppercase())
                    .unwrap_or_else(|| "object".to_string());
                let target = object_name(
                    source,
                    stmt,
                    &[
                        Keyword::DROP,
                        Keyword::EXTERNAL,
                        Keyword::MATERIALIZED,
                        Keyword::TABLE,
                        Keyword::VIEW,
                        Keyword::SCHEMA,
                        Keyword::FUNCTION,
                        Keyword::IF,
                        Keyword::EXISTS
                    ]
                );
                Violation::new(
                    &info,
                    format!("DROP {} '{}' permanently destroys data and schema", object_type, target),
                    stmt.line
                )
                .with_suggestion("Ensure this is intentional and a backup exists before dropping")
            })
            .collect()
    }
}

/// Dotted name following the leading `skip` keywords of a statement
fn object_name(source: &SqlSource, stmt: &Statement, skip: &[Keyword]) -> String {
    let mut name = String::new();
    for token in source
        .code_tokens(stmt)
        .skip_while(|t| t.word().is_some_and(|w| skip.contains(&w.keyword)))
    {
        match &token.token {
            Token::Word(w) => name.push_str(&w.value),
            Token::Period => name.push('.'),
            Token::Minus => name.push('-'),
            _ => break
        }
    }
    if name.is_empty() { "unknown".to_string() } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(rule: &dyn Rule, sql: &str) -> Vec<Violation> {
        rule.check(&SqlSource::parse(sql, None).unwrap())
    }

    #[test]
    fn test_update_without_where() {
        let v = run(&MissingWhereInUpdate, "SELECT 1;\nUPDATE t SET a = 1");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].line, 2);
        assert_eq!(
            v[0].message,
            "UPDATE statement without WHERE clause (potential table-wide operation)"
        );
        assert!(run(&MissingWhereInUpdate, "UPDATE t SET a = 1 WHERE id = 2").is_empty());
    }

    #[test]
    fn test_delete_without_where() {
        let v = run(&MissingWhereInDelete, "DELETE FROM t");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule_id, "SEC002");
        assert_eq!(v[0].line, 1);
        assert!(run(&MissingWhereInDelete, "delete from t where true").is_empty());
    }

    #[test]
    fn test_where_inside_subquery_does_not_count() {
        let v = run(
            &MissingWhereInDelete,
            "DELETE FROM t USING (SELECT id FROM u WHERE x)"
        );
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_keywords_in_comments_and_strings_ignored() {
        assert!(run(&MissingWhereInDelete, "-- DELETE FROM t\nSELECT 'DELETE FROM t'").is_empty());
    }

    #[test]
    fn test_truncate() {
        let v = run(&TruncateDetected, "TRUNCATE TABLE proj.ds.events");
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("proj.ds.events"));
    }

    #[test]
    fn test_drop() {
        let v = run(&DropDetected, "DROP TABLE IF EXISTS `ds.events`");
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].message,
            "DROP TABLE 'ds.events' permanently destroys data and schema"
        );
        assert!(run(&DropDetected, "SELECT 'drop'").is_empty());
    }
}
