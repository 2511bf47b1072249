// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQL template scanner.
//!
//! Not a SQL parser. The scanner splits a template into literal text and
//! placeholders, skipping string literals, quoted identifiers and comments,
//! and keeps a coarse token list for two questions the compiler asks:
//! which kind of statement is this, and which tables does it touch.
//!
//! # Placeholders
//!
//! | Syntax | Variant |
//! |--------|---------|
//! | `?` | [`Placeholder::Anonymous`] |
//! | `?3` | [`Placeholder::Numbered`] |
//! | `:name`, `@name`, `$name` | [`Placeholder::Named`] |

use std::{fmt, iter::Peekable, str::Chars};

/// A placeholder as written in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Anonymous,

    /// `?NNN`
    Numbered(usize),

    /// `:name`, `@name` or `$name`.
    Named {
        /// Leading sigil.
        prefix: char,
        /// Name without the sigil.
        name:   String
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("?"),
            Self::Numbered(n) => write!(f, "?{n}"),
            Self::Named {
                prefix,
                name
            } => write!(f, "{prefix}{name}")
        }
    }
}

/// Piece of a split template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Literal SQL text.
    Text(String),

    /// Placeholder to bind.
    Placeholder(Placeholder)
}

/// Coarse statement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`, `VALUES` or a `WITH` query.
    Select,

    /// `INSERT` or `REPLACE`.
    Insert,

    /// `UPDATE`.
    Update,

    /// `DELETE`.
    Delete,

    /// Anything else (`PRAGMA`, DDL, ...).
    Other
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Literal,
    Symbol(char)
}

/// A scanned SQL template.
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    source:   String,
    sections: Vec<Section>,
    tokens:   Vec<Token>
}

impl SqlTemplate {
    /// Scan `sql`.
    pub fn parse(sql: &str) -> Self {
        let mut lexer = Lexer {
            chars:    sql.chars().peekable(),
            text:     String::new(),
            sections: Vec::new(),
            tokens:   Vec::new()
        };
        lexer.run();
        lexer.flush();
        Self {
            source:   sql.to_owned(),
            sections: lexer.sections,
            tokens:   lexer.tokens
        }
    }

    /// Template as given.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Text and placeholders in order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Placeholders in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.sections.iter().filter_map(|section| match section {
            Section::Placeholder(p) => Some(p),
            Section::Text(_) => None
        })
    }

    /// Template with every placeholder rewritten to `?`.
    pub fn render_positional(&self) -> String {
        self.sections
            .iter()
            .map(|section| match section {
                Section::Text(text) => text.as_str(),
                Section::Placeholder(_) => "?"
            })
            .collect()
    }

    /// Statement kind from the leading keyword.
    pub fn kind(&self) -> StatementKind {
        let Some(first) = self.tokens.iter().find_map(keyword) else {
            return StatementKind::Other;
        };
        if first != "WITH" {
            return kind_of(&first);
        }
        let mut depth = 0_usize;
        for token in &self.tokens {
            match token {
                Token::Symbol('(') => depth += 1,
                Token::Symbol(')') => depth = depth.saturating_sub(1),
                Token::Word(_) if depth == 0 => {
                    if let Some(word) = keyword(token) {
                        let kind = kind_of(&word);
                        if kind != StatementKind::Other {
                            return kind;
                        }
                    }
                }
                _ => {}
            }
        }
        StatementKind::Other
    }

    /// Tables named after `FROM`, `JOIN`, `INTO` and `UPDATE`.
    ///
    /// Names are deduplicated case-insensitively, first spelling wins.
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        let mut push = |name: String| {
            if !tables.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
                tables.push(name);
            }
        };

        for (i, token) in self.tokens.iter().enumerate() {
            let Some(word) = keyword(token) else {
                continue;
            };
            let mut j = i + 1;
            match word.as_str() {
                "UPDATE" => {
                    if self.keyword_at(j).as_deref() == Some("OR") {
                        j += 2;
                    }
                    if let Some((name, _)) = self.name_at(j) {
                        push(name);
                    }
                }
                "INTO" | "JOIN" => {
                    if let Some((name, _)) = self.name_at(j) {
                        push(name);
                    }
                }
                "FROM" => {
                    while let Some((name, next)) = self.name_at(j) {
                        push(name);
                        j = self.skip_alias(next);
                        if self.tokens.get(j) != Some(&Token::Symbol(',')) {
                            break;
                        }
                        j += 1;
                    }
                }
                _ => {}
            }
        }
        tables
    }

    fn keyword_at(&self, index: usize) -> Option<String> {
        self.tokens.get(index).and_then(keyword)
    }

    /// Table name at `index`, schema qualifier dropped, with the index
    /// after it.
    fn name_at(&self, index: usize) -> Option<(String, usize)> {
        let name = self.plain_name(index)?;
        if self.tokens.get(index + 1) == Some(&Token::Symbol('.'))
            && let Some(qualified) = self.plain_name(index + 2)
        {
            return Some((qualified, index + 3));
        }
        Some((name, index + 1))
    }

    fn plain_name(&self, index: usize) -> Option<String> {
        match self.tokens.get(index)? {
            Token::Quoted(name) => Some(name.clone()),
            Token::Word(word) if !is_reserved(word) => Some(word.clone()),
            _ => None
        }
    }

    fn skip_alias(&self, index: usize) -> usize {
        if self.keyword_at(index).as_deref() == Some("AS") {
            return index + 2;
        }
        if self.plain_name(index).is_some() {
            return index + 1;
        }
        index
    }
}

fn keyword(token: &Token) -> Option<String> {
    match token {
        Token::Word(word) => Some(word.to_ascii_uppercase()),
        _ => None
    }
}

fn kind_of(word: &str) -> StatementKind {
    match word {
        "SELECT" | "VALUES" => StatementKind::Select,
        "INSERT" | "REPLACE" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        _ => StatementKind::Other
    }
}

fn is_reserved(word: &str) -> bool {
    const RESERVED: &[&str] = &[
        "AS", "CROSS", "DEFAULT", "EXCEPT", "FROM", "GROUP", "HAVING", "INDEXED", "INNER",
        "INTERSECT", "JOIN", "LEFT", "LIMIT", "NATURAL", "NOT", "OFFSET", "ON", "ORDER", "OUTER",
        "RETURNING", "RIGHT", "SELECT", "SET", "UNION", "USING", "VALUES", "WHERE", "WINDOW",
        "WITH", "FULL"
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}

struct Lexer<'a> {
    chars:    Peekable<Chars<'a>>,
    text:     String,
    sections: Vec<Section>,
    tokens:   Vec<Token>
}

impl Lexer<'_> {
    fn run(&mut self) {
        while let Some(c) = self.chars.next() {
            match c {
                '\'' => {
                    self.text.push(c);
                    self.quoted('\'');
                    self.tokens.push(Token::Literal);
                }
                '"' | '`' => {
                    self.text.push(c);
                    let name = self.quoted(c);
                    self.tokens.push(Token::Quoted(name));
                }
                '[' => {
                    self.text.push(c);
                    let name = self.quoted(']');
                    self.tokens.push(Token::Quoted(name));
                }
                '-' if self.chars.peek() == Some(&'-') => {
                    self.text.push(c);
                    self.line_comment();
                }
                '/' if self.chars.peek() == Some(&'*') => {
                    self.text.push(c);
                    self.block_comment();
                }
                '?' => {
                    let digits = self.take_while(|c| c.is_ascii_digit());
                    let placeholder = if digits.is_empty() {
                        Placeholder::Anonymous
                    } else {
                        Placeholder::Numbered(digits.parse().unwrap_or(usize::MAX))
                    };
                    self.placeholder(placeholder);
                }
                ':' if self.chars.peek() == Some(&':') => {
                    self.chars.next();
                    self.text.push_str("::");
                    self.tokens.push(Token::Symbol(':'));
                    self.tokens.push(Token::Symbol(':'));
                }
                ':' | '@' | '$'
                    if !self.follows_word() && self.chars.peek().is_some_and(|&n| is_ident_start(n)) =>
                {
                    let name = self.take_while(is_ident_continue);
                    self.placeholder(Placeholder::Named {
                        prefix: c,
                        name
                    });
                }
                c if is_ident_start(c) => {
                    let mut word = c.to_string();
                    word.push_str(&self.take_while(is_ident_continue));
                    self.text.push_str(&word);
                    self.tokens.push(Token::Word(word));
                }
                c if c.is_ascii_digit() => {
                    self.text.push(c);
                    let rest = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.');
                    self.text.push_str(&rest);
                    self.tokens.push(Token::Literal);
                }
                c if c.is_whitespace() => self.text.push(c),
                other => {
                    self.text.push(other);
                    self.tokens.push(Token::Symbol(other));
                }
            }
        }
    }

    /// Consume up to the closing delimiter; a doubled delimiter is an
    /// escaped one. Returns the unescaped content.
    fn quoted(&mut self, close: char) -> String {
        let mut content = String::new();
        while let Some(c) = self.chars.next() {
            self.text.push(c);
            if c == close {
                if close != ']' && self.chars.peek() == Some(&close) {
                    self.chars.next();
                    self.text.push(close);
                    content.push(close);
                    continue;
                }
                break;
            }
            content.push(c);
        }
        content
    }

    fn line_comment(&mut self) {
        for c in self.chars.by_ref() {
            self.text.push(c);
            if c == '\n' {
                break;
            }
        }
    }

    fn block_comment(&mut self) {
        // The opening `*` must not pair with a following `/`.
        if let Some(opening) = self.chars.next() {
            self.text.push(opening);
        }
        let mut previous = ' ';
        for c in self.chars.by_ref() {
            self.text.push(c);
            if previous == '*' && c == '/' {
                break;
            }
            previous = c;
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(&c) = self.chars.peek() {
            if !predicate(c) {
                break;
            }
            taken.push(c);
            self.chars.next();
        }
        taken
    }

    /// Whether the pending text ends inside an identifier, as in `a$b`.
    fn follows_word(&self) -> bool {
        self.text.chars().next_back().is_some_and(is_ident_continue)
    }

    fn placeholder(&mut self, placeholder: Placeholder) {
        self.flush();
        self.tokens.push(Token::Literal);
        self.sections.push(Section::Placeholder(placeholder));
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            self.sections
                .push(Section::Text(std::mem::take(&mut self.text)));
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Placeholder {
        Placeholder::Named {
            prefix: ':',
            name:   name.into()
        }
    }

    #[test]
    fn splits_text_and_placeholders() {
        let sql = SqlTemplate::parse("SELECT * FROM users WHERE id = :id AND age > ?");
        assert_eq!(
            sql.sections(),
            &[
                Section::Text("SELECT * FROM users WHERE id = ".into()),
                Section::Placeholder(named("id")),
                Section::Text(" AND age > ".into()),
                Section::Placeholder(Placeholder::Anonymous),
            ]
        );
        assert_eq!(
            sql.render_positional(),
            "SELECT * FROM users WHERE id = ? AND age > ?"
        );
    }

    #[test]
    fn numbered_and_prefixed_placeholders() {
        let sql = SqlTemplate::parse("SELECT ?2, ?1, @a, $b");
        let found: Vec<_> = sql.placeholders().map(ToString::to_string).collect();
        assert_eq!(found, ["?2", "?1", "@a", "$b"]);
    }

    #[test]
    fn literals_and_comments_are_skipped() {
        let sql = SqlTemplate::parse(
            "SELECT ':no', \"a?\" -- what?\nFROM t /* :skip ? */ WHERE x = 'it''s ?' AND y = ?"
        );
        assert_eq!(sql.placeholders().count(), 1);
        assert_eq!(sql.tables(), ["t"]);
    }

    #[test]
    fn double_colon_is_not_a_placeholder() {
        let sql = SqlTemplate::parse("SELECT a::text FROM t");
        assert_eq!(sql.placeholders().count(), 0);
        assert_eq!(sql.render_positional(), "SELECT a::text FROM t");
        assert_eq!(sql.tables(), ["t"]);

        let sql = SqlTemplate::parse("SELECT a::text FROM t WHERE b = :b");
        let found: Vec<_> = sql.placeholders().map(ToString::to_string).collect();
        assert_eq!(found, [":b"]);
    }

    #[test]
    fn sigil_inside_a_word_is_text() {
        let sql = SqlTemplate::parse("SELECT price$usd, a@b FROM t WHERE id = $id");
        let found: Vec<_> = sql.placeholders().map(ToString::to_string).collect();
        assert_eq!(found, ["$id"]);
    }

    #[test]
    fn statement_kinds() {
        assert_eq!(SqlTemplate::parse("select 1").kind(), StatementKind::Select);
        assert_eq!(
            SqlTemplate::parse("  INSERT INTO t VALUES (1)").kind(),
            StatementKind::Insert
        );
        assert_eq!(
            SqlTemplate::parse("REPLACE INTO t VALUES (1)").kind(),
            StatementKind::Insert
        );
        assert_eq!(
            SqlTemplate::parse("-- note\nDELETE FROM t").kind(),
            StatementKind::Delete
        );
        assert_eq!(
            SqlTemplate::parse("WITH x AS (SELECT 1) UPDATE t SET a = 1").kind(),
            StatementKind::Update
        );
        assert_eq!(
            SqlTemplate::parse("WITH x AS (DELETE FROM t) SELECT 1").kind(),
            StatementKind::Select
        );
        assert_eq!(SqlTemplate::parse("PRAGMA foo").kind(), StatementKind::Other);
    }

    #[test]
    fn tables_from_every_clause() {
        let sql = SqlTemplate::parse(
            "SELECT * FROM main.users AS u, `posts` p JOIN tags ON 1 WHERE u.id IN (SELECT id FROM Users)"
        );
        assert_eq!(sql.tables(), ["users", "posts", "tags"]);
        assert_eq!(
            SqlTemplate::parse("UPDATE OR REPLACE items SET a = 1").tables(),
            ["items"]
        );
        assert_eq!(
            SqlTemplate::parse("INSERT OR IGNORE INTO [logs] (a) VALUES (?)").tables(),
            ["logs"]
        );
    }

    #[test]
    fn subquery_in_from_is_not_a_table() {
        let sql = SqlTemplate::parse("SELECT * FROM (SELECT * FROM inner_t) WHERE 1");
        assert_eq!(sql.tables(), ["inner_t"]);
    }
}
