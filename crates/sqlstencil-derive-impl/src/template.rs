// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Template parser.
//!
//! Splits a query template into literal text, placeholders and conditional
//! blocks. The parser knows nothing about placeholder semantics: unknown
//! names are the resolver's business, not a parse error.
//!
//! # Micro-syntax
//!
//! ```text
//! SELECT {{columns --exclude password}} FROM {{table}}
//!        └─────────────┬─────────────┘
//!          name: "columns", options: "--exclude password"
//!
//! {{if notnull=email}} AND email = @email {{else}} AND email IS NULL {{/if}}
//!   └────── Conditional { kind: "notnull", param: "email", body, otherwise }
//! ```
//!
//! Placeholders open at the open delimiter and close at the *next* close
//! delimiter; they do not nest lexically. Conditional blocks nest.

#[cfg(test)]
mod tests;

use std::fmt;

/// Open and close placeholder delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    /// Opening delimiter, `{{` by default.
    pub open: String,

    /// Closing delimiter, `}}` by default.
    pub close: String
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open:  "{{".to_string(),
            close: "}}".to_string()
        }
    }
}

/// A placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// First whitespace-delimited token.
    pub name: String,

    /// Raw option text after the name, trimmed.
    pub options: String,

    /// Byte offset of `options` in the template.
    pub options_offset: usize,

    /// Byte offset of the open delimiter.
    pub offset: usize,

    /// Full source text including delimiters.
    pub source: String
}

/// A `{{if kind=param}} … {{else}} … {{/if}}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    /// Test kind, e.g. `notnull`.
    pub kind: String,

    /// Tested parameter.
    pub param: String,

    /// Nodes emitted when the test holds.
    pub body: Vec<TemplateNode>,

    /// Nodes emitted otherwise.
    pub otherwise: Vec<TemplateNode>,

    /// Byte offset of the `if` header.
    pub offset: usize,

    /// Source text of the `if` header.
    pub source: String
}

/// One parsed template element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Literal SQL text.
    Text {
        /// The text.
        text: String,

        /// Byte offset in the template.
        offset: usize
    },

    /// A placeholder.
    Placeholder(Placeholder),

    /// A conditional block.
    Conditional(Conditional)
}

/// Why a template failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An open delimiter without a close delimiter.
    Unclosed,

    /// A placeholder with no name.
    Empty,

    /// `else` outside of an `if` block.
    StrayElse,

    /// `/if` without an open `if`.
    StrayEndIf,

    /// An `if` block never closed.
    UnclosedIf,

    /// An `if` header that is not `kind=param`, or a second `else`.
    MalformedIf
}

/// Parse failure with the offending location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Failure kind.
    pub kind: ParseErrorKind,

    /// Byte offset of the offending construct.
    pub offset: usize,

    /// Source text of the offending construct.
    pub text: String
}

impl ParseError {
    /// Diagnostic code for this failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::Unclosed => "TPL-UNCLOSED",
            ParseErrorKind::Empty => "TPL-EMPTY",
            ParseErrorKind::StrayElse
            | ParseErrorKind::StrayEndIf
            | ParseErrorKind::UnclosedIf
            | ParseErrorKind::MalformedIf => "TPL-BLOCK"
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            ParseErrorKind::Unclosed => "placeholder is never closed",
            ParseErrorKind::Empty => "placeholder has no name",
            ParseErrorKind::StrayElse => "`else` outside of an `if` block",
            ParseErrorKind::StrayEndIf => "`/if` without a matching `if`",
            ParseErrorKind::UnclosedIf => "`if` block is never closed with `/if`",
            ParseErrorKind::MalformedIf => "`if` block header must be `if <kind>=<param>`"
        };
        f.write_str(message)
    }
}

struct Block {
    kind:      String,
    param:     String,
    offset:    usize,
    source:    String,
    then:      Option<Vec<TemplateNode>>,
    collected: Vec<TemplateNode>
}

/// Parse `template` using `delimiters`.
///
/// # Errors
///
/// The first structural problem found, scanning left to right.
pub fn parse(template: &str, delimiters: &Delimiters) -> Result<Vec<TemplateNode>, ParseError> {
    let open = delimiters.open.as_str();
    let close = delimiters.close.as_str();
    let mut root: Vec<TemplateNode> = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut pos = 0;

    while pos < template.len() {
        let Some(found) = template[pos..].find(open) else {
            push_text(&mut root, &mut blocks, &template[pos..], pos);
            break;
        };
        let start = pos + found;
        if start > pos {
            push_text(&mut root, &mut blocks, &template[pos..start], pos);
        }
        let inner_start = start + open.len();
        let Some(close_at) = template[inner_start..].find(close) else {
            return Err(ParseError {
                kind:   ParseErrorKind::Unclosed,
                offset: start,
                text:   template[start..].to_string()
            });
        };
        let inner_end = inner_start + close_at;
        let end = inner_end + close.len();
        let source = &template[start..end];
        let inner = &template[inner_start..inner_end];
        let lead = inner.len() - inner.trim_start().len();
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            return Err(ParseError {
                kind:   ParseErrorKind::Empty,
                offset: start,
                text:   source.to_string()
            });
        }
        let name_len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let name = &trimmed[..name_len];
        let rest = &trimmed[name_len..];
        let rest_lead = rest.len() - rest.trim_start().len();
        let options = rest.trim();
        let options_offset = inner_start + lead + name_len + rest_lead;

        match name {
            "if" => {
                let (kind, param) = split_header(options).ok_or_else(|| ParseError {
                    kind:   ParseErrorKind::MalformedIf,
                    offset: start,
                    text:   source.to_string()
                })?;
                blocks.push(Block {
                    kind,
                    param,
                    offset: start,
                    source: source.to_string(),
                    then: None,
                    collected: Vec::new()
                });
            }
            "else" => {
                let Some(block) = blocks.last_mut() else {
                    return Err(ParseError {
                        kind:   ParseErrorKind::StrayElse,
                        offset: start,
                        text:   source.to_string()
                    });
                };
                if block.then.is_some() || !options.is_empty() {
                    return Err(ParseError {
                        kind:   ParseErrorKind::MalformedIf,
                        offset: start,
                        text:   source.to_string()
                    });
                }
                block.then = Some(std::mem::take(&mut block.collected));
            }
            "/if" => {
                let Some(block) = blocks.pop() else {
                    return Err(ParseError {
                        kind:   ParseErrorKind::StrayEndIf,
                        offset: start,
                        text:   source.to_string()
                    });
                };
                let (body, otherwise) = match block.then {
                    Some(then) => (then, block.collected),
                    None => (block.collected, Vec::new())
                };
                let node = TemplateNode::Conditional(Conditional {
                    kind: block.kind,
                    param: block.param,
                    body,
                    otherwise,
                    offset: block.offset,
                    source: block.source
                });
                current(&mut root, &mut blocks).push(node);
            }
            _ => {
                let node = TemplateNode::Placeholder(Placeholder {
                    name: name.to_string(),
                    options: options.to_string(),
                    options_offset,
                    offset: start,
                    source: source.to_string()
                });
                current(&mut root, &mut blocks).push(node);
            }
        }
        pos = end;
    }

    if let Some(block) = blocks.pop() {
        return Err(ParseError {
            kind:   ParseErrorKind::UnclosedIf,
            offset: block.offset,
            text:   block.source
        });
    }
    Ok(root)
}

fn current<'a>(root: &'a mut Vec<TemplateNode>, blocks: &'a mut [Block]) -> &'a mut Vec<TemplateNode> {
    match blocks.last_mut() {
        Some(block) => &mut block.collected,
        None => root
    }
}

fn push_text(root: &mut Vec<TemplateNode>, blocks: &mut [Block], text: &str, offset: usize) {
    if text.is_empty() {
        return;
    }
    current(root, blocks).push(TemplateNode::Text {
        text: text.to_string(),
        offset
    });
}

fn split_header(options: &str) -> Option<(String, String)> {
    if options.contains(char::is_whitespace) {
        return None;
    }
    let (kind, param) = options.split_once('=')?;
    if kind.is_empty() || param.is_empty() || param.contains('=') {
        return None;
    }
    Some((kind.to_string(), param.to_string()))
}

/// First keyword of the template, upper-cased; placeholders are skipped.
#[must_use]
pub fn leading_keyword(nodes: &[TemplateNode]) -> Option<String> {
    nodes.iter().find_map(|node| match node {
        TemplateNode::Text {
            text, ..
        } => text
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|word| !word.is_empty())
            .map(str::to_ascii_uppercase),
        _ => None
    })
}
