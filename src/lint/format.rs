//! Token-based SQL formatter used by `bench lint --fix`.
//!
//! Layout rules:
//!
//! | Element | Output |
//! |---------|--------|
//! | Reserved keywords | upper case, unless quoted or qualified (`t.order`) |
//! | Top-level clauses (`FROM`, `WHERE`, `GROUP BY`, joins, ...) | start a new line |
//! | SELECT list | one item per line, continuation items indented 4 spaces |
//! | Statements | separated by a blank line |
//! | Comments | kept verbatim |
//!
//! Identifiers, literals and anything inside parentheses keep their text;
//! only the whitespace between tokens is rewritten.
//!
//! # Example
//!
//! ```
//! use bench::lint::{SqlSource, format_sql};
//!
//! let source = SqlSource::parse("select a, b from t where x = 1", None).unwrap();
//! assert_eq!(format_sql(&source), "SELECT a,\n    b\nFROM t\nWHERE x = 1");
//! ```

use sqlparser::tokenizer::{Token, Whitespace};

use super::{SourceToken, SqlSource};

const INDENT: &str = "    ";

/// BigQuery reserved keywords plus the DML/DDL verbs and `OFFSET`, sorted
const UPPERCASE_WORDS: &[&str] = &[
    "ALL", "AND", "ANY", "ARRAY", "AS", "ASC", "ASSERT_ROWS_MODIFIED", "AT", "BETWEEN", "BY",
    "CASE", "CAST", "COLLATE", "CONTAINS", "CREATE", "CROSS", "CUBE", "CURRENT", "DEFAULT",
    "DEFINE", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "ENUM", "ESCAPE", "EXCEPT",
    "EXCLUDE", "EXISTS", "EXTRACT", "FALSE", "FETCH", "FOLLOWING", "FOR", "FROM", "FULL",
    "GROUP", "GROUPING", "GROUPS", "HASH", "HAVING", "IF", "IGNORE", "IN", "INNER", "INSERT",
    "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN", "LATERAL", "LEFT", "LIKE", "LIMIT", "LOOKUP",
    "MATCHED", "MERGE", "NATURAL", "NEW", "NO", "NOT", "NULL", "NULLS", "OF", "OFFSET", "ON",
    "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRECEDING", "PROTO", "QUALIFY", "RANGE",
    "RECURSIVE", "RESPECT", "RIGHT", "ROLLUP", "ROWS", "SELECT", "SET", "SOME", "STRUCT",
    "TABLE", "TABLESAMPLE", "THEN", "TO", "TREAT", "TRUE", "TRUNCATE", "UNBOUNDED", "UNION",
    "UNNEST", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WINDOW", "WITH", "WITHIN"
];

/// Keywords written like function calls, without a space before `(`
const CALL_LIKE: &[&str] = &[
    "ARRAY", "CAST", "EXTRACT", "GROUPING", "IF", "LEFT", "OFFSET", "RIGHT", "STRUCT", "UNNEST"
];

const JOIN_MODIFIERS: &[&str] = &["CROSS", "FULL", "INNER", "LEFT", "NATURAL", "OUTER", "RIGHT"];

/// Format every statement of a source
pub fn format_sql(source: &SqlSource) -> String {
    let mut formatter = Formatter::new(source);
    for idx in 0..source.tokens().len() {
        formatter.visit(idx);
    }
    formatter.out.trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Break {
    Line { indent: bool },
    Blank
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Last {
    Nothing,
    Comment,
    Token(usize)
}

struct Formatter<'a> {
    source:          &'a SqlSource,
    out:             String,
    pending:         Option<Break>,
    last:            Last,
    in_select_list:  bool,
    statement_start: bool,
    /// A newline was seen in the source since the last emitted token
    newline_seen:    bool,
    /// The last token was a unary sign
    unary:           bool
}

impl<'a> Formatter<'a> {
    fn new(source: &'a SqlSource) -> Self {
        Self {
            source,
            out: String::new(),
            pending: None,
            last: Last::Nothing,
            in_select_list: false,
            statement_start: true,
            newline_seen: true,
            unary: false
        }
    }

    fn tokens(&self) -> &'a [SourceToken] {
        self.source.tokens()
    }

    fn visit(&mut self, idx: usize) {
        let token = &self.tokens()[idx];
        match &token.token {
            Token::Whitespace(Whitespace::Newline) => self.newline_seen = true,
            Token::Whitespace(Whitespace::SingleLineComment { .. }) => {
                self.comment(idx);
                self.request(Break::Line {
                    indent: false
                });
                self.newline_seen = true;
            }
            Token::Whitespace(Whitespace::MultiLineComment(_)) => self.comment(idx),
            Token::Whitespace(_) | Token::EOF => {}
            Token::SemiColon => {
                self.out.push(';');
                self.in_select_list = false;
                self.statement_start = true;
                self.pending = Some(Break::Blank);
                self.last = Last::Nothing;
                self.newline_seen = false;
            }
            _ => self.code(idx)
        }
    }

    fn comment(&mut self, idx: usize) {
        let text = self.slice(idx).trim_end();
        if !self.out.is_empty() {
            if self.newline_seen {
                let brk = self.pending.take().unwrap_or(Break::Line {
                    indent: false
                });
                self.apply(brk);
            } else {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
        self.last = Last::Comment;
        self.newline_seen = false;
    }

    fn code(&mut self, idx: usize) {
        let token = &self.tokens()[idx];
        let upper = self.upper_word(idx);

        if token.depth == 0 && !self.statement_start && self.starts_clause(idx) {
            self.in_select_list = false;
            self.request(Break::Line {
                indent: false
            });
        }

        if let Some(brk) = self.pending.take() {
            if !self.out.is_empty() {
                self.apply(brk);
            }
        } else if self.space_before(idx) {
            self.out.push(' ');
        }

        match &upper {
            Some(word) => self.out.push_str(word),
            None => self.out.push_str(self.slice(idx))
        }

        self.unary = matches!(token.token, Token::Minus | Token::Plus) && self.is_unary_position();
        if token.depth == 0 {
            if upper.as_deref() == Some("SELECT") {
                self.in_select_list = true;
            } else if token.token == Token::Comma && self.in_select_list {
                self.request(Break::Line {
                    indent: true
                });
            }
        }
        self.statement_start = false;
        self.newline_seen = false;
        self.last = Last::Token(idx);
    }

    fn request(&mut self, brk: Break) {
        self.pending = Some(match self.pending {
            Some(existing) if existing > brk => existing,
            _ => brk
        });
    }

    fn apply(&mut self, brk: Break) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        match brk {
            Break::Blank => self.out.push_str("\n\n"),
            Break::Line {
                indent
            } => {
                self.out.push('\n');
                if indent {
                    self.out.push_str(INDENT);
                }
            }
        }
    }

    fn slice(&self, idx: usize) -> &'a str {
        let token = &self.tokens()[idx];
        &self.source.text()[token.start..token.end]
    }

    /// Upper-cased text when the token is a keyword to normalize
    fn upper_word(&self, idx: usize) -> Option<String> {
        let word = self.tokens()[idx].word()?;
        let upper = word.value.to_ascii_uppercase();
        if UPPERCASE_WORDS.binary_search(&upper.as_str()).is_err() {
            return None;
        }
        let qualified = |other: Option<usize>| {
            other.is_some_and(|i| self.tokens()[i].token == Token::Period)
        };
        if qualified(self.source.prev_code(idx)) || qualified(self.source.next_code(idx)) {
            return None;
        }
        Some(upper)
    }

    fn code_upper(&self, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| self.tokens()[i].word())
            .map(|w| w.value.to_ascii_uppercase())
    }

    /// Whether a depth-0 token begins a new clause line
    fn starts_clause(&self, idx: usize) -> bool {
        let Some(word) = self.upper_word(idx) else {
            return false;
        };
        let prev = self.code_upper(self.source.prev_code(idx));
        let next_idx = self.source.next_code(idx);
        let next = self.code_upper(next_idx);
        let next_is_paren = next_idx.is_some_and(|i| self.tokens()[i].token == Token::LParen);
        match word.as_str() {
            "FROM" => !matches!(prev.as_deref(), Some("DELETE" | "DISTINCT")),
            "WHERE" | "HAVING" | "QUALIFY" | "WINDOW" | "LIMIT" | "SET" | "VALUES" | "UNION"
            | "INTERSECT" | "SELECT" => true,
            "GROUP" | "ORDER" => next.as_deref() == Some("BY"),
            "EXCEPT" => matches!(next.as_deref(), Some("DISTINCT" | "ALL")),
            "JOIN" => !prev
                .as_deref()
                .is_some_and(|p| JOIN_MODIFIERS.contains(&p)),
            "INNER" | "CROSS" | "FULL" | "NATURAL" => true,
            "LEFT" | "RIGHT" => !next_is_paren,
            _ => false
        }
    }

    fn is_unary_position(&self) -> bool {
        match self.last {
            Last::Nothing | Last::Comment => true,
            Last::Token(prev) => {
                let prev_token = &self.tokens()[prev];
                is_operator(&prev_token.token)
                    || matches!(
                        prev_token.token,
                        Token::LParen | Token::Comma | Token::LBracket
                    )
                    || self.upper_word(prev).is_some()
            }
        }
    }

    fn space_before(&self, idx: usize) -> bool {
        let token = &self.tokens()[idx].token;
        let prev = match self.last {
            Last::Nothing => return false,
            Last::Comment => return true,
            Last::Token(prev) => prev
        };
        if matches!(
            token,
            Token::Comma | Token::RParen | Token::Period | Token::RBracket
        ) {
            return false;
        }
        let prev_token = &self.tokens()[prev].token;
        if matches!(prev_token, Token::LParen | Token::Period | Token::LBracket) || self.unary {
            return false;
        }
        match token {
            Token::LParen => match prev_token {
                Token::Word(_) => match self.upper_word(prev) {
                    Some(upper) => !CALL_LIKE.contains(&upper.as_str()),
                    None => self.names_table(prev)
                },
                _ => true
            },
            // `arr[0]` and `ARRAY[1]` index or construct; `SELECT [1]` is a literal
            Token::LBracket => match prev_token {
                Token::Word(_) => self
                    .upper_word(prev)
                    .is_some_and(|upper| !CALL_LIKE.contains(&upper.as_str())),
                Token::RParen | Token::RBracket => false,
                _ => true
            },
            _ => true
        }
    }

    /// Word directly after INTO/TABLE, where `(` opens a column list
    fn names_table(&self, idx: usize) -> bool {
        matches!(
            self.code_upper(self.source.prev_code(idx)).as_deref(),
            Some("INTO" | "TABLE")
        )
    }
}

fn is_operator(token: &Token) -> bool {
    matches!(
        token,
        Token::Eq
            | Token::DoubleEq
            | Token::Neq
            | Token::Lt
            | Token::Gt
            | Token::LtEq
            | Token::GtEq
            | Token::Plus
            | Token::Minus
            | Token::Mul
            | Token::Div
            | Token::Mod
            | Token::StringConcat
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(sql: &str) -> String {
        format_sql(&SqlSource::parse(sql, None).unwrap())
    }

    #[test]
    fn test_uppercase_words_sorted() {
        assert!(UPPERCASE_WORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_basic_layout() {
        assert_eq!(
            fmt("select a, b from t where x = 1"),
            "SELECT a,\n    b\nFROM t\nWHERE x = 1"
        );
    }

    #[test]
    fn test_clauses_and_joins() {
        let sql = "select o.id, count(*) as n from `p.d.orders` as o left join items as i on o.id = i.oid \
                   where o.ts > 0 group by o.id having n > 1 order by n desc limit 10";
        assert_eq!(
            fmt(sql),
            "SELECT o.id,\n    count(*) AS n\nFROM `p.d.orders` AS o\nLEFT JOIN items AS i ON o.id = i.oid\n\
             WHERE o.ts > 0\nGROUP BY o.id\nHAVING n > 1\nORDER BY n DESC\nLIMIT 10"
        );
    }

    #[test]
    fn test_statements_separated_by_blank_line() {
        assert_eq!(
            fmt("delete from t where id = 1; select 1"),
            "DELETE FROM t\nWHERE id = 1;\n\nSELECT 1"
        );
    }

    #[test]
    fn test_comments_preserved() {
        assert_eq!(
            fmt("-- daily totals\nselect a -- the key\nfrom t"),
            "-- daily totals\nSELECT a -- the key\nFROM t"
        );
    }

    #[test]
    fn test_nested_and_qualified_words_untouched() {
        assert_eq!(
            fmt("select t.order, if(x, 1, -1) from (select * from u) as t"),
            "SELECT t.order,\n    IF(x, 1, -1)\nFROM (SELECT * FROM u) AS t"
        );
    }

    #[test]
    fn test_literals_keep_text() {
        assert_eq!(
            fmt("select 'from x', arr[offset(0)] from t"),
            "SELECT 'from x',\n    arr[OFFSET(0)]\nFROM t"
        );
    }

    #[test]
    fn test_array_literals_stay_on_one_line() {
        assert_eq!(
            fmt("select [1, 2] as a, array[3, 4] as b from t"),
            "SELECT [1, 2] AS a,\n    ARRAY[3, 4] AS b\nFROM t"
        );
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(
            fmt("select a from t order by a limit 10 offset 20"),
            "SELECT a\nFROM t\nORDER BY a\nLIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_union_and_insert() {
        assert_eq!(
            fmt("insert into t (a, b) select 1, 2 union all select 3, 4"),
            "INSERT INTO t (a, b)\nSELECT 1,\n    2\nUNION ALL\nSELECT 3,\n    4"
        );
    }

    #[test]
    fn test_except_columns_is_not_a_clause() {
        assert_eq!(
            fmt("select * except (a) from t"),
            "SELECT * EXCEPT (a)\nFROM t"
        );
    }
}
