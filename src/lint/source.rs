//! Tokenized SQL text with byte offsets, lines and statement boundaries.
//!
//! Rules work on raw text but consult the token stream so that matches
//! inside comments and string literals are ignored.

use std::ops::Range;

use sqlparser::{
    dialect::BigQueryDialect,
    keywords::Keyword,
    tokenizer::{Location, Token, Tokenizer, Word}
};

use crate::error::{AppResult, query_parse_error};

/// A token with its byte span and bracket depth.
#[derive(Debug, Clone)]
pub struct SourceToken {
    pub token: Token,
    pub start: usize,
    pub end:   usize,
    /// Open parentheses and square brackets enclosing the token; a bracket
    /// itself sits at the outer depth
    pub depth: usize
}

impl SourceToken {
    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self.token, Token::Whitespace(_))
    }

    /// Unquoted word
    pub fn word(&self) -> Option<&Word> {
        match &self.token {
            Token::Word(w) if w.quote_style.is_none() => Some(w),
            _ => None
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.word().is_some_and(|w| w.keyword == keyword)
    }
}

/// One `;`-separated statement.
#[derive(Debug, Clone)]
pub struct Statement {
    /// Indices into [`SqlSource::tokens`], trailing semicolon excluded
    pub tokens: Range<usize>,
    /// One-based line of the first code token
    pub line:   usize
}

/// SQL text prepared for linting.
#[derive(Debug, Clone)]
pub struct SqlSource {
    name:        Option<String>,
    text:        String,
    tokens:      Vec<SourceToken>,
    statements:  Vec<Statement>,
    line_starts: Vec<usize>
}

impl SqlSource {
    /// Tokenize `text`; `name` is the file it came from.
    ///
    /// CRLF line endings are normalized first.
    pub fn parse(text: &str, name: Option<&str>) -> AppResult<Self> {
        let text = text.replace("\r\n", "\n");
        let line_starts = line_starts(&text);
        let dialect = BigQueryDialect {};
        let spanned = Tokenizer::new(&dialect, &text)
            .tokenize_with_location()
            .map_err(|e| query_parse_error(e.to_string()))?;

        let starts: Vec<usize> = spanned
            .iter()
            .map(|t| offset_of(&text, &line_starts, t.span.start))
            .collect();
        let mut tokens = Vec::with_capacity(spanned.len());
        let mut depth = 0usize;
        for (idx, t) in spanned.into_iter().enumerate() {
            let start = starts[idx];
            let end = starts.get(idx + 1).copied().unwrap_or(text.len());
            let token_depth = match t.token {
                Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    depth
                }
                Token::LParen | Token::LBracket => {
                    depth += 1;
                    depth - 1
                }
                _ => depth
            };
            tokens.push(SourceToken {
                token: t.token,
                start,
                end,
                depth: token_depth
            });
        }

        let mut source = Self {
            name: name.map(String::from),
            text,
            tokens,
            statements: Vec::new(),
            line_starts
        };
        source.statements = source.split_statements();
        Ok(source)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[SourceToken] {
        &self.tokens
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// One-based line containing a byte offset
    pub fn line_at(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Index of the token starting exactly at `offset`
    pub fn token_at(&self, offset: usize) -> Option<usize> {
        self.tokens.binary_search_by_key(&offset, |t| t.start).ok()
    }

    /// Whether a code token (not comment, string or quoted identifier)
    /// starts at `offset`
    pub fn is_code_at(&self, offset: usize) -> bool {
        self.token_at(offset)
            .is_some_and(|idx| self.tokens[idx].word().is_some())
    }

    /// Statement containing the token at `idx`
    pub fn statement_of(&self, idx: usize) -> Option<usize> {
        self.statements
            .iter()
            .position(|s| s.tokens.start <= idx && idx < s.tokens.end)
    }

    /// Previous non-trivia token before `idx`
    pub fn prev_code(&self, idx: usize) -> Option<usize> {
        (0..idx).rev().find(|&i| !self.tokens[i].is_trivia())
    }

    /// Next non-trivia token after `idx`
    pub fn next_code(&self, idx: usize) -> Option<usize> {
        (idx + 1..self.tokens.len()).find(|&i| !self.tokens[i].is_trivia())
    }

    /// Code tokens of a statement
    pub fn code_tokens<'a>(
        &'a self,
        statement: &'a Statement
    ) -> impl Iterator<Item = &'a SourceToken> + 'a {
        self.tokens[statement.tokens.clone()]
            .iter()
            .filter(|t| !t.is_trivia())
    }

    /// Keyword the statement starts with
    pub fn leading_keyword(&self, statement: &Statement) -> Option<Keyword> {
        self.code_tokens(statement)
            .next()
            .and_then(|t| t.word())
            .map(|w| w.keyword)
    }

    /// Whether the statement has `keyword` outside any parentheses
    pub fn has_top_level_keyword(&self, statement: &Statement, keyword: Keyword) -> bool {
        self.code_tokens(statement)
            .any(|t| t.depth == 0 && t.is_keyword(keyword))
    }

    /// Source text of a statement, without the trailing semicolon
    pub fn statement_text(&self, statement: &Statement) -> &str {
        let start = self.tokens[statement.tokens.start].start;
        let end = self.tokens[statement.tokens.end - 1].end;
        &self.text[start..end]
    }

    /// Byte offset where a statement's text starts
    pub fn statement_offset(&self, statement: &Statement) -> usize {
        self.tokens[statement.tokens.start].start
    }

    fn split_statements(&self) -> Vec<Statement> {
        let mut statements = Vec::new();
        let mut first_code: Option<usize> = None;
        for (idx, token) in self.tokens.iter().enumerate() {
            match token.token {
                Token::SemiColon if token.depth == 0 => {
                    if let Some(start) = first_code.take() {
                        statements.push(self.statement(start, idx));
                    }
                }
                Token::EOF => {}
                _ if token.is_trivia() => {}
                _ => {
                    first_code.get_or_insert(idx);
                }
            }
        }
        if let Some(start) = first_code {
            statements.push(self.statement(start, self.tokens.len()));
        }
        statements
    }

    /// Statement from its first code token up to the last code token
    /// before `limit`
    fn statement(&self, start: usize, limit: usize) -> Statement {
        let end = (start..limit)
            .rev()
            .find(|&i| !self.tokens[i].is_trivia())
            .map_or(limit, |i| i + 1);
        Statement {
            tokens: start..end,
            line:   self.line_at(self.tokens[start].start)
        }
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Convert a one-based line/column (columns count chars) to a byte offset
fn offset_of(text: &str, line_starts: &[usize], location: Location) -> usize {
    let line_idx = (location.line as usize).saturating_sub(1);
    let Some(&line_start) = line_starts.get(line_idx) else {
        return text.len();
    };
    let column = (location.column as usize).saturating_sub(1);
    text[line_start..]
        .char_indices()
        .nth(column)
        .map(|(i, _)| line_start + i)
        .unwrap_or(text.len())
}
