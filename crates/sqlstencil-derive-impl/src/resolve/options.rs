// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Placeholder option text.
//!
//! ```text
//! {{columns --exclude password secret --prefix u}}
//!           └──────────┬─────────────┘└───┬────┘
//!               flag "exclude"        flag "prefix"
//!
//! {{orderby name created_at:desc}}
//!           └──── positional ─────┘
//! ```
//!
//! Tokens before the first `--flag` are positional; tokens after a flag are
//! its arguments.

use crate::diagnostics::{Anchor, Diagnostics};

/// Every flag any placeholder understands.
pub const KNOWN_FLAGS: &[&str] = &["exclude", "only", "prefix", "param", "desc"];

/// One option token with its template offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text.
    pub text: String,

    /// Byte offset in the template.
    pub offset: usize
}

/// One `--flag arg ...` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    /// Flag name without dashes.
    pub name: String,

    /// Arguments.
    pub args: Vec<Token>,

    /// Byte offset of the flag.
    pub offset: usize
}

/// Parsed option text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Tokens before the first flag.
    pub positional: Vec<Token>,

    /// Flags in source order.
    pub flags: Vec<Flag>
}

impl Options {
    /// Split `text`, which starts at byte `offset` of the template.
    #[must_use]
    pub fn parse(text: &str, offset: usize) -> Self {
        let mut out = Self::default();
        let mut start = None;
        let bytes = text.char_indices().chain(std::iter::once((text.len(), ' ')));
        for (index, c) in bytes {
            match (c.is_whitespace(), start) {
                (false, None) => start = Some(index),
                (true, Some(from)) => {
                    out.push(&text[from..index], offset + from);
                    start = None;
                }
                _ => {}
            }
        }
        out
    }

    fn push(&mut self, token: &str, offset: usize) {
        if let Some(name) = token.strip_prefix("--") {
            self.flags.push(Flag {
                name: name.to_string(),
                args: Vec::new(),
                offset
            });
            return;
        }
        let token = Token {
            text: token.to_string(),
            offset
        };
        match self.flags.last_mut() {
            Some(flag) => flag.args.push(token),
            None => self.positional.push(token)
        }
    }

    /// The flag named `name`, if given.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    /// Whether `name` was given.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.flag(name).is_some()
    }

    /// Report unknown flags (`OPT-UNKNOWN`) and known flags `accepted`
    /// does not list (`OPT-IGNORED`).
    pub fn check(&self, placeholder: &str, accepted: &[&str], sink: &Diagnostics) {
        for flag in &self.flags {
            let anchor = Anchor::Template {
                offset: flag.offset,
                text:   format!("--{}", flag.name)
            };
            if !KNOWN_FLAGS.contains(&flag.name.as_str()) {
                let message = super::suggest::with_hint(
                    format!("unknown option `--{}` on `{placeholder}`", flag.name),
                    &flag.name,
                    accepted.iter().copied()
                );
                sink.error("OPT-UNKNOWN", anchor, message);
            } else if !accepted.contains(&flag.name.as_str()) {
                sink.warning(
                    "OPT-IGNORED",
                    anchor,
                    format!("`--{}` has no effect on `{placeholder}`", flag.name)
                );
            }
        }
    }

    /// The single argument of `--name`.
    ///
    /// Reports `OPT-MISSING` when the flag has no argument and
    /// `OPT-INVALID` when it has several.
    pub fn single(&self, name: &str, sink: &Diagnostics) -> Option<&Token> {
        let flag = self.flag(name)?;
        match flag.args.as_slice() {
            [one] => Some(one),
            [] => {
                sink.error(
                    "OPT-MISSING",
                    Anchor::Template {
                        offset: flag.offset,
                        text:   format!("--{name}")
                    },
                    format!("`--{name}` needs an argument")
                );
                None
            }
            [_, extra, ..] => {
                sink.error(
                    "OPT-INVALID",
                    Anchor::Template {
                        offset: extra.offset,
                        text:   extra.text.clone()
                    },
                    format!("`--{name}` takes one argument")
                );
                None
            }
        }
    }

    /// Arguments of `--name`; reports `OPT-MISSING` when empty.
    pub fn list(&self, name: &str, sink: &Diagnostics) -> Option<&[Token]> {
        let flag = self.flag(name)?;
        if flag.args.is_empty() {
            sink.error(
                "OPT-MISSING",
                Anchor::Template {
                    offset: flag.offset,
                    text:   format!("--{name}")
                },
                format!("`--{name}` needs at least one member")
            );
            return None;
        }
        Some(&flag.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_and_flags() {
        let options = Options::parse("name age:desc --exclude a b --prefix u", 10);
        assert_eq!(options.positional.len(), 2);
        assert_eq!(options.positional[1].text, "age:desc");
        assert_eq!(options.positional[1].offset, 15);
        assert_eq!(options.flags.len(), 2);
        assert_eq!(options.flags[0].name, "exclude");
        assert_eq!(options.flags[0].args.len(), 2);
        assert_eq!(options.flags[1].args[0].text, "u");
        assert_eq!(options.flags[1].offset, 38);
    }

    #[test]
    fn empty_text() {
        assert_eq!(Options::parse("", 0), Options::default());
        assert_eq!(Options::parse("   ", 0), Options::default());
    }

    #[test]
    fn unknown_and_ignored_flags() {
        let sink = Diagnostics::new();
        Options::parse("--exlude a --desc", 0).check("columns", &["exclude", "only"], &sink);
        let found = sink.snapshot();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].code, "OPT-UNKNOWN");
        assert!(found[0].message.contains("`exclude`"));
        assert_eq!(found[1].code, "OPT-IGNORED");
        assert!(!found[1].is_error());
    }

    #[test]
    fn single_argument_rules() {
        let sink = Diagnostics::new();
        let options = Options::parse("--param", 0);
        assert!(options.single("param", &sink).is_none());
        assert!(sink.has_code("OPT-MISSING"));

        let sink = Diagnostics::new();
        let options = Options::parse("--param a b", 0);
        assert!(options.single("param", &sink).is_none());
        assert!(sink.has_code("OPT-INVALID"));

        let sink = Diagnostics::new();
        let options = Options::parse("--param a", 0);
        assert_eq!(options.single("param", &sink).unwrap().text, "a");
        assert!(options.single("prefix", &sink).is_none());
        assert!(sink.snapshot().is_empty());
    }
}
