// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Clause-level scanning and editing of plan segments.
//!
//! Only literal SQL segments are read. Quoted text and comments are
//! skipped, and so are bracketed identifiers where the dialect quotes with
//! `[`/`]`. A run-time `if` block is one token carrying the top-level words
//! of both branches; every other segment is one opaque token. Edits shift
//! positions, so callers scan again after each edit.

use sqlstencil_core::dialect::DialectSpec;

use crate::plan::{Segment, extend, push_sql};

/// Words that end a `WHERE` clause.
pub const CLAUSE_END: &[&str] = &[
    "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "FETCH", "UNION", "EXCEPT", "INTERSECT",
    "RETURNING", "FOR", "WINDOW"
];

/// Position inside a segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Pos {
    /// Segment index; the list length means "after everything".
    pub segment: usize,

    /// Byte offset inside a SQL segment.
    pub offset: usize
}

/// What a token is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    /// Keyword or identifier, upper-cased.
    Word(String),

    /// `(`
    Open,

    /// `)`
    Close,

    /// `;`
    Semicolon,

    /// A run-time `if` block and the top-level words of its branches.
    Block(Vec<String>),

    /// Any other non-SQL segment.
    Segment
}

/// One token with its nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token class.
    pub lexeme: Lexeme,

    /// First byte.
    pub start: Pos,

    /// Past the last byte.
    pub end: Pos,

    /// Parenthesis depth; a `(` and its `)` share the outer depth.
    pub depth: usize
}

impl Token {
    /// Top-level keyword `word`.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.depth == 0 && matches!(&self.lexeme, Lexeme::Word(w) if w == word)
    }

    /// Top-level `if` block with `word` at the top level of a branch.
    #[must_use]
    pub fn holds(&self, word: &str) -> bool {
        self.depth == 0 && matches!(&self.lexeme, Lexeme::Block(held) if held.iter().any(|w| w == word))
    }

    fn is_word_in(&self, words: &[&str]) -> bool {
        self.depth == 0
            && match &self.lexeme {
                Lexeme::Word(w) => words.contains(&w.as_str()),
                Lexeme::Block(held) => held.iter().any(|w| words.contains(&w.as_str())),
                _ => false
            }
    }
}

/// Tokenize `segments` for `spec`.
#[must_use]
pub fn tokens(segments: &[Segment], spec: &DialectSpec) -> Vec<Token> {
    let brackets = spec.quote.0 == "[";
    let mut out = Vec::new();
    let mut depth = 0_usize;
    for (index, segment) in segments.iter().enumerate() {
        let Segment::Sql(sql) = segment else {
            let lexeme = match segment {
                Segment::Conditional {
                    then,
                    otherwise,
                    ..
                } => Lexeme::Block(
                    [then, otherwise]
                        .into_iter()
                        .flat_map(|branch| top_level_words(branch, spec))
                        .collect()
                ),
                _ => Lexeme::Segment
            };
            out.push(Token {
                lexeme,
                start: Pos {
                    segment: index,
                    offset:  0
                },
                end: Pos {
                    segment: index + 1,
                    offset:  0
                },
                depth
            });
            continue;
        };
        let bytes = sql.as_bytes();
        let pos = |offset| Pos {
            segment: index,
            offset
        };
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            match c {
                b'\'' | b'"' | b'`' => i = skip_past(bytes, i + 1, c),
                b'[' if brackets => i = skip_past(bytes, i + 1, b']'),
                b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b'\n'),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = sql[i + 2..].find("*/").map_or(bytes.len(), |at| i + 2 + at + 2);
                }
                b'(' => {
                    out.push(Token {
                        lexeme: Lexeme::Open,
                        start: pos(i),
                        end: pos(i + 1),
                        depth
                    });
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    depth = depth.saturating_sub(1);
                    out.push(Token {
                        lexeme: Lexeme::Close,
                        start: pos(i),
                        end: pos(i + 1),
                        depth
                    });
                    i += 1;
                }
                b';' => {
                    out.push(Token {
                        lexeme: Lexeme::Semicolon,
                        start: pos(i),
                        end: pos(i + 1),
                        depth
                    });
                    i += 1;
                }
                c if c.is_ascii_alphabetic() || c == b'_' => {
                    let start = i;
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                        i += 1;
                    }
                    out.push(Token {
                        lexeme: Lexeme::Word(sql[start..i].to_ascii_uppercase()),
                        start: pos(start),
                        end: pos(i),
                        depth
                    });
                }
                c if c.is_ascii_digit() => {
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.') {
                        i += 1;
                    }
                }
                _ => i += 1
            }
        }
    }
    out
}

fn top_level_words(segments: &[Segment], spec: &DialectSpec) -> Vec<String> {
    tokens(segments, spec)
        .into_iter()
        .filter(|t| t.depth == 0)
        .flat_map(|t| match t.lexeme {
            Lexeme::Word(word) => vec![word],
            Lexeme::Block(held) => held,
            _ => Vec::new()
        })
        .collect()
}

fn skip_past(bytes: &[u8], from: usize, close: u8) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| *b == close)
        .map_or(bytes.len(), |at| from + at + 1)
}

/// Index of the first top-level `word` at or after token `from`.
#[must_use]
pub fn find_word(tokens: &[Token], word: &str, from: usize) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| t.is_word(word))
        .map(|at| from + at)
}

/// Index of the `)` closing the `(` at `open`.
#[must_use]
pub fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let depth = tokens.get(open)?.depth;
    tokens
        .iter()
        .skip(open + 1)
        .position(|t| t.lexeme == Lexeme::Close && t.depth == depth)
        .map(|at| open + 1 + at)
}

/// Position after the last segment.
#[must_use]
pub fn end(segments: &[Segment]) -> Pos {
    Pos {
        segment: segments.len(),
        offset:  0
    }
}

/// Start of the first top-level token at or after `from` that is one of
/// `words`, an `if` block holding one of them, a `;`, or a runtime sort;
/// the end when there is none.
#[must_use]
pub fn boundary(segments: &[Segment], tokens: &[Token], from: usize, words: &[&str]) -> Pos {
    tokens
        .iter()
        .skip(from)
        .find(|t| {
            t.depth == 0
                && (t.is_word_in(words)
                    || t.lexeme == Lexeme::Semicolon
                    || (t.lexeme == Lexeme::Segment
                        && matches!(segments[t.start.segment], Segment::Sort { .. })))
        })
        .map_or_else(|| end(segments), |t| t.start)
}

/// Move `pos` back over whitespace.
#[must_use]
pub fn trim_back(segments: &[Segment], pos: Pos) -> Pos {
    let mut pos = pos;
    if pos.offset == 0
        && pos.segment > 0
        && let Some(Segment::Sql(sql)) = segments.get(pos.segment - 1)
    {
        pos = Pos {
            segment: pos.segment - 1,
            offset:  sql.len()
        };
    }
    if let Some(Segment::Sql(sql)) = segments.get(pos.segment) {
        let kept = sql[..pos.offset].trim_end().len();
        pos.offset = kept;
    }
    pos
}

/// Move `pos` forward over whitespace.
#[must_use]
pub fn skip_ws(segments: &[Segment], pos: Pos) -> Pos {
    let mut pos = pos;
    if let Some(Segment::Sql(sql)) = segments.get(pos.segment) {
        let rest = &sql[pos.offset..];
        pos.offset += rest.len() - rest.trim_start().len();
        if pos.offset == sql.len() {
            pos = Pos {
                segment: pos.segment + 1,
                offset:  0
            };
        }
    }
    pos
}

/// Insert `more` at `at`.
pub fn insert(segments: &mut Vec<Segment>, at: Pos, more: Vec<Segment>) {
    let tail = segments.split_off(at.segment.min(segments.len()));
    let mut out = std::mem::take(segments);
    let mut rest = tail.into_iter();
    match rest.next() {
        Some(Segment::Sql(sql)) => {
            let (before, after) = sql.split_at(at.offset.min(sql.len()));
            push_sql(&mut out, before);
            extend(&mut out, more);
            push_sql(&mut out, after);
        }
        Some(other) => {
            extend(&mut out, more);
            out.push(other);
        }
        None => extend(&mut out, more)
    }
    extend(&mut out, rest.collect());
    *segments = out;
}

/// Remove everything from `start` up to `end`.
pub fn remove(segments: &mut Vec<Segment>, start: Pos, end: Pos) {
    let old = std::mem::take(segments);
    for (index, segment) in old.into_iter().enumerate() {
        if index < start.segment || index > end.segment {
            extend(segments, vec![segment]);
            continue;
        }
        match segment {
            Segment::Sql(sql) => {
                let head = if index == start.segment { &sql[..start.offset] } else { "" };
                let tail = if index == end.segment { &sql[end.offset.min(sql.len())..] } else { "" };
                push_sql(segments, head);
                push_sql(segments, tail);
            }
            other if index == end.segment => segments.push(other),
            _ => {}
        }
    }
}

/// Replace the text between `start` and `end` inside one SQL segment.
pub fn replace(segments: &mut [Segment], start: Pos, end: Pos, text: &str) {
    if start.segment != end.segment {
        return;
    }
    if let Some(Segment::Sql(sql)) = segments.get_mut(start.segment) {
        sql.replace_range(start.offset..end.offset, text);
    }
}

/// Remove whitespace and semicolons after the last statement.
pub fn trim_end(segments: &mut Vec<Segment>) {
    if let Some(Segment::Sql(sql)) = segments.last_mut() {
        let kept = sql.trim_end_matches(|c: char| c.is_whitespace() || c == ';').len();
        sql.truncate(kept);
        if sql.is_empty() {
            segments.pop();
        }
    }
}

/// SQL text between two positions; runtime segments read as `?`.
#[must_use]
pub fn text_between(segments: &[Segment], start: Pos, end: Pos) -> String {
    let mut text = String::new();
    for index in start.segment..end.segment.saturating_add(1).min(segments.len()) {
        let from = if index == start.segment { start.offset } else { 0 };
        match &segments[index] {
            Segment::Sql(sql) => {
                let to = if index == end.segment { end.offset } else { sql.len() };
                if from < to {
                    text.push_str(&sql[from..to]);
                }
            }
            _ if index < end.segment => text.push('?'),
            _ => {}
        }
    }
    text
}

/// Conjoin `condition` to the top-level `WHERE`, adding one if missing.
///
/// `WHERE a OR b` becomes `WHERE (a OR b) AND condition`. When the `WHERE`
/// sits inside an `if` block, each branch is conjoined on its own.
pub fn conjoin(segments: &mut Vec<Segment>, condition: Vec<Segment>, spec: &DialectSpec) {
    let scanned = tokens(segments, spec);
    if let Some(index) = scanned.iter().position(|t| t.is_word("WHERE")) {
        let stop = trim_back(segments, boundary(segments, &scanned, index + 1, CLAUSE_END));
        let start = skip_ws(segments, scanned[index].end);
        let mut tail = vec![Segment::Sql(") AND ".to_string())];
        tail.extend(condition);
        insert(segments, stop, tail);
        insert(segments, start, vec![Segment::Sql("(".to_string())]);
        return;
    }
    if let Some(block) = scanned.iter().find(|t| t.holds("WHERE")) {
        if let Some(Segment::Conditional {
            then,
            otherwise,
            ..
        }) = segments.get_mut(block.start.segment)
        {
            conjoin(then, condition.clone(), spec);
            conjoin(otherwise, condition, spec);
        }
        return;
    }
    let at = trim_back(segments, boundary(segments, &scanned, 0, CLAUSE_END));
    let mut clause = vec![Segment::Sql(" WHERE ".to_string())];
    clause.extend(condition);
    if let Some(Segment::Sql(sql)) = segments.get(at.segment)
        && sql[at.offset..].starts_with(|c: char| !c.is_whitespace())
    {
        clause.push(Segment::Sql(" ".to_string()));
    }
    insert(segments, at, clause);
}

/// Column names assigned at the top level of `text`, unquoted.
#[must_use]
pub fn assigned_columns(text: &str) -> Vec<String> {
    split_top_level(text)
        .iter()
        .filter_map(|part| part.split_once('='))
        .map(|(left, _)| unquote(left.rsplit('.').next().unwrap_or(left)))
        .collect()
}

/// Comma-separated top-level items of `text`, unquoted.
#[must_use]
pub fn listed_columns(text: &str) -> Vec<String> {
    split_top_level(text)
        .iter()
        .map(|part| unquote(part.rsplit('.').next().unwrap_or(part)))
        .collect()
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(name: &str) -> String {
    name.trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
        .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use sqlstencil_core::Dialect;

    use super::*;
    use crate::plan::CondKind;

    const PG: &DialectSpec = Dialect::Postgres.spec();

    fn sql(text: &str) -> Vec<Segment> {
        vec![Segment::Sql(text.to_string())]
    }

    fn block(then: &str, otherwise: &str) -> Segment {
        Segment::Conditional {
            param:     "name".into(),
            kind:      CondKind::NotNull,
            then:      sql(then),
            otherwise: if otherwise.is_empty() { Vec::new() } else { sql(otherwise) }
        }
    }

    fn branches(segments: &[Segment]) -> (String, String) {
        let Some(Segment::Conditional {
            then,
            otherwise,
            ..
        }) = segments.iter().find(|s| matches!(s, Segment::Conditional { .. }))
        else {
            panic!("no conditional segment");
        };
        (render(then), render(otherwise))
    }

    fn render(segments: &[Segment]) -> String {
        text_between(segments, Pos::default(), end(segments))
    }

    #[test]
    fn words_skip_quotes_and_nesting() {
        let found: Vec<String> = tokens(&sql("SELECT 'WHERE' FROM (SELECT 1 WHERE x) t -- WHERE"), PG)
            .into_iter()
            .filter(|t| t.depth == 0)
            .filter_map(|t| match t.lexeme {
                Lexeme::Word(w) => Some(w),
                _ => None
            })
            .collect();
        assert_eq!(found, vec!["SELECT", "FROM", "T"]);
    }

    #[test]
    fn conjoin_adds_where() {
        let mut segments = sql("SELECT * FROM t ORDER BY a");
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(render(&segments), "SELECT * FROM t WHERE f = 0 ORDER BY a");
    }

    #[test]
    fn conjoin_wraps_existing_predicate() {
        let mut segments = vec![
            Segment::Sql("SELECT * FROM t WHERE a = ".into()),
            Segment::Param(0),
            Segment::Sql(" OR b = 1 ".into()),
        ];
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(render(&segments), "SELECT * FROM t WHERE (a = ? OR b = 1) AND f = 0 ");
    }

    #[test]
    fn conjoin_stops_before_runtime_sort() {
        let mut segments = vec![
            Segment::Sql("SELECT * FROM t ".into()),
            Segment::Sort {
                param:    "s".into(),
                columns:  Vec::new(),
                fallback: None
            },
        ];
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(render(&segments[..1]), "SELECT * FROM t WHERE f = 0 ");
    }

    #[test]
    fn nested_where_is_not_the_statement_where() {
        let mut segments = sql("SELECT * FROM t WHERE id IN (SELECT id FROM u WHERE x = 1)");
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(
            render(&segments),
            "SELECT * FROM t WHERE (id IN (SELECT id FROM u WHERE x = 1)) AND f = 0"
        );
    }

    #[test]
    fn trailing_semicolon_is_removed() {
        let mut segments = sql("DELETE FROM t ;\n");
        trim_end(&mut segments);
        assert_eq!(render(&segments), "DELETE FROM t");
    }

    #[test]
    fn column_lists() {
        assert_eq!(listed_columns("\"a\", [B], t.`c`"), vec!["a", "B", "c"]);
        assert_eq!(assigned_columns("\"a\" = ?, b = f(1, 2)"), vec!["a", "b"]);
    }

    #[test]
    fn matching_parentheses() {
        let scanned = tokens(&sql("(a, (b)) VALUES (1)"), PG);
        assert_eq!(matching_close(&scanned, 0), Some(5));
    }

    #[test]
    fn brackets_quote_only_where_the_dialect_does() {
        let words = |spec: &DialectSpec| -> Vec<String> {
            tokens(&sql("SELECT [Order] FROM t WHERE a = ANY(ARRAY[b])"), spec)
                .into_iter()
                .filter_map(|t| match t.lexeme {
                    Lexeme::Word(w) => Some(w),
                    _ => None
                })
                .collect()
        };
        assert!(!words(Dialect::SqlServer.spec()).contains(&"ORDER".to_string()));
        assert!(words(PG).contains(&"B".to_string()));
    }

    #[test]
    fn conjoin_reaches_into_if_blocks() {
        let mut segments = vec![
            Segment::Sql("SELECT * FROM t ".into()),
            block("WHERE name = 1", ""),
            Segment::Sql(" ORDER BY a".into()),
        ];
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(render(&segments[..1]), "SELECT * FROM t ");
        assert_eq!(
            branches(&segments),
            ("WHERE (name = 1) AND f = 0".to_string(), " WHERE f = 0".to_string())
        );
        assert_eq!(render(&segments).matches("WHERE").count(), 0);
    }

    #[test]
    fn conjoin_in_else_branch_stops_before_ordering() {
        let mut segments = vec![
            Segment::Sql("SELECT * FROM t ".into()),
            block("WHERE name = 1", "ORDER BY a"),
        ];
        conjoin(&mut segments, sql("f = 0"), PG);
        assert_eq!(branches(&segments).1, " WHERE f = 0 ORDER BY a");
    }

    #[test]
    fn boundary_stops_at_block_holding_a_word() {
        let segments = vec![Segment::Sql("SET a = 1 ".into()), block("WHERE id = 2", "")];
        let scanned = tokens(&segments, PG);
        assert!(scanned[2].holds("WHERE"));
        assert_eq!(
            boundary(&segments, &scanned, 1, &["WHERE"]),
            Pos {
                segment: 1,
                offset:  0
            }
        );
    }
}
