// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Per-database rendering rules.
//!
//! Every other component asks this table how a dialect spells a construct.
//! The table is plain `'static` data: no state, no side effects, and the same
//! lookup answers the compiler (while resolving templates) and the generated
//! code (while rendering runtime segments).
//!
//! # Supported Dialects
//!
//! | Dialect | Quotes | Parameters | Booleans | Paging | Generated key |
//! |---------|--------|------------|----------|--------|---------------|
//! | PostgreSQL | `"id"` | `$1` | `TRUE`/`FALSE` | `LIMIT`/`OFFSET` | `RETURNING` |
//! | MySQL | `` `id` `` | `?` | `TRUE`/`FALSE` | `LIMIT`/`OFFSET` | `LAST_INSERT_ID()` |
//! | SQLite | `"id"` | `@id` | `1`/`0` | `LIMIT`/`OFFSET` | `RETURNING` |
//! | SQL Server | `[Id]` | `@id` | `1`/`0` | `TOP` / `OFFSET … FETCH` | `OUTPUT INSERTED` |
//! | Oracle | `"ID"` | `:id` | `1`/`0` | `ROWNUM` | unsupported |
//!
//! Adding a dialect means adding a variant and a [`DialectSpec`] entry; the
//! template parser and the entity extractor never branch on the dialect.

/// Target database family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dialect {
    /// PostgreSQL.
    #[default]
    Postgres,

    /// MySQL / MariaDB.
    MySql,

    /// SQLite 3.35+.
    Sqlite,

    /// Microsoft SQL Server 2012+.
    SqlServer,

    /// Oracle Database.
    Oracle
}

/// How bound parameters are spelled inside statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Numbered markers (`$1`, `$2`); one number per distinct parameter.
    Positional {
        /// Marker prefix.
        prefix: &'static str
    },

    /// Bare `?` markers; every occurrence consumes one value.
    Anonymous,

    /// Named markers (`@name`, `:name`); one value per distinct name.
    Named {
        /// Marker prefix.
        prefix: &'static str
    }
}

/// How `LIMIT`/`OFFSET` requests are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStrategy {
    /// Trailing `LIMIT n OFFSET m`.
    LimitOffset {
        /// Clause required in front of a bare `OFFSET`, if the dialect
        /// rejects `OFFSET` without `LIMIT`.
        offset_needs_limit: Option<&'static str>
    },

    /// `SELECT TOP (n)` for a limit alone, `OFFSET m ROWS FETCH NEXT n ROWS
    /// ONLY` otherwise.
    TopOrOffsetFetch,

    /// Wrap the query and filter on `ROWNUM`.
    RowNum
}

/// How an INSERT hands back the generated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyReturn {
    /// Append `RETURNING key`.
    Returning,

    /// Insert `OUTPUT INSERTED.key` before `VALUES`.
    OutputInserted,

    /// Run a follow-up scalar query on the same connection.
    FollowUp(&'static str),

    /// No supported strategy.
    Unsupported
}

/// Case rule applied to member names to obtain column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCase {
    /// `order_id`
    Snake,

    /// `OrderId`
    Pascal,

    /// `ORDER_ID`
    UpperSnake
}

/// Function spellings used by generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Functions {
    /// Current timestamp expression.
    pub current_timestamp: &'static str,

    /// Current database principal, if the dialect has one.
    pub current_actor:     Option<&'static str>,

    /// Row count aggregate.
    pub count:             &'static str,

    /// Lower-case conversion.
    pub lower:             &'static str,

    /// Upper-case conversion.
    pub upper:             &'static str,

    /// Character length.
    pub length:            &'static str,

    /// String concatenation operator or function.
    pub concat:            &'static str
}

/// Rendering rules for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectSpec {
    /// Lower-case dialect name, as accepted by [`Dialect::from_name`].
    pub name:           &'static str,

    /// Identifier quote pair.
    pub quote:          (&'static str, &'static str),

    /// Parameter marker style.
    pub params:         ParamStyle,

    /// `(true, false)` literal spellings.
    pub booleans:       (&'static str, &'static str),

    /// Paging clause strategy.
    pub paging:         PagingStrategy,

    /// Generated-key strategy.
    pub key_return:     KeyReturn,

    /// Function name table.
    pub functions:      Functions,

    /// Case rule for unquoted identifiers.
    pub name_case:      NameCase,

    /// Maximum bind parameters in one statement.
    pub max_parameters: usize,

    /// Escape clause appended to every generated `LIKE`.
    pub like_escape:    &'static str
}

const POSTGRES: DialectSpec = DialectSpec {
    name:           "postgres",
    quote:          ("\"", "\""),
    params:         ParamStyle::Positional {
        prefix: "$"
    },
    booleans:       ("TRUE", "FALSE"),
    paging:         PagingStrategy::LimitOffset {
        offset_needs_limit: None
    },
    key_return:     KeyReturn::Returning,
    functions:      Functions {
        current_timestamp: "CURRENT_TIMESTAMP",
        current_actor:     Some("CURRENT_USER"),
        count:             "COUNT",
        lower:             "LOWER",
        upper:             "UPPER",
        length:            "LENGTH",
        concat:            "||"
    },
    name_case:      NameCase::Snake,
    max_parameters: 65_535,
    like_escape:    " ESCAPE '!'"
};

const MYSQL: DialectSpec = DialectSpec {
    name:           "mysql",
    quote:          ("`", "`"),
    params:         ParamStyle::Anonymous,
    booleans:       ("TRUE", "FALSE"),
    paging:         PagingStrategy::LimitOffset {
        offset_needs_limit: Some("LIMIT 18446744073709551615")
    },
    key_return:     KeyReturn::FollowUp("SELECT LAST_INSERT_ID()"),
    functions:      Functions {
        current_timestamp: "CURRENT_TIMESTAMP",
        current_actor:     Some("CURRENT_USER()"),
        count:             "COUNT",
        lower:             "LOWER",
        upper:             "UPPER",
        length:            "CHAR_LENGTH",
        concat:            "CONCAT"
    },
    name_case:      NameCase::Snake,
    max_parameters: 65_535,
    like_escape:    " ESCAPE '!'"
};

const SQLITE: DialectSpec = DialectSpec {
    name:           "sqlite",
    quote:          ("\"", "\""),
    params:         ParamStyle::Named {
        prefix: "@"
    },
    booleans:       ("1", "0"),
    paging:         PagingStrategy::LimitOffset {
        offset_needs_limit: Some("LIMIT -1")
    },
    key_return:     KeyReturn::Returning,
    functions:      Functions {
        current_timestamp: "CURRENT_TIMESTAMP",
        current_actor:     None,
        count:             "COUNT",
        lower:             "LOWER",
        upper:             "UPPER",
        length:            "LENGTH",
        concat:            "||"
    },
    name_case:      NameCase::Snake,
    max_parameters: 32_766,
    like_escape:    " ESCAPE '!'"
};

const SQLSERVER: DialectSpec = DialectSpec {
    name:           "sqlserver",
    quote:          ("[", "]"),
    params:         ParamStyle::Named {
        prefix: "@"
    },
    booleans:       ("1", "0"),
    paging:         PagingStrategy::TopOrOffsetFetch,
    key_return:     KeyReturn::OutputInserted,
    functions:      Functions {
        current_timestamp: "SYSUTCDATETIME()",
        current_actor:     Some("SUSER_SNAME()"),
        count:             "COUNT",
        lower:             "LOWER",
        upper:             "UPPER",
        length:            "LEN",
        concat:            "+"
    },
    name_case:      NameCase::Pascal,
    max_parameters: 2_100,
    like_escape:    " ESCAPE '!'"
};

const ORACLE: DialectSpec = DialectSpec {
    name:           "oracle",
    quote:          ("\"", "\""),
    params:         ParamStyle::Named {
        prefix: ":"
    },
    booleans:       ("1", "0"),
    paging:         PagingStrategy::RowNum,
    key_return:     KeyReturn::Unsupported,
    functions:      Functions {
        current_timestamp: "SYSTIMESTAMP",
        current_actor:     Some("USER"),
        count:             "COUNT",
        lower:             "LOWER",
        upper:             "UPPER",
        length:            "LENGTH",
        concat:            "||"
    },
    name_case:      NameCase::UpperSnake,
    max_parameters: 65_535,
    like_escape:    " ESCAPE '!'"
};

impl Dialect {
    /// Every supported dialect, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Postgres,
        Self::MySql,
        Self::Sqlite,
        Self::SqlServer,
        Self::Oracle
    ];

    /// Rendering rules for this dialect.
    #[must_use]
    pub const fn spec(self) -> &'static DialectSpec {
        match self {
            Self::Postgres => &POSTGRES,
            Self::MySql => &MYSQL,
            Self::Sqlite => &SQLITE,
            Self::SqlServer => &SQLSERVER,
            Self::Oracle => &ORACLE
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.spec().name
    }

    /// Parse a dialect name, accepting common aliases.
    ///
    /// ```rust
    /// use sqlstencil_core::Dialect;
    ///
    /// assert_eq!(Dialect::from_name("pg"), Some(Dialect::Postgres));
    /// assert_eq!(Dialect::from_name("mssql"), Some(Dialect::SqlServer));
    /// assert_eq!(Dialect::from_name("db2"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "sqlserver" | "mssql" | "tsql" => Some(Self::SqlServer),
            "oracle" => Some(Self::Oracle),
            _ => None
        }
    }
}

impl DialectSpec {
    /// Quote one identifier, doubling embedded closing quotes.
    ///
    /// Dotted names are quoted per segment.
    #[must_use]
    pub fn quote_ident(&self, ident: &str) -> String {
        let (open, close) = self.quote;
        ident
            .split('.')
            .map(|segment| {
                let escaped = segment.replace(close, &format!("{close}{close}"));
                format!("{open}{escaped}{close}")
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Spell the marker for a parameter.
    ///
    /// `position` is the 1-based number used by positional styles; named
    /// styles use `name`, anonymous styles ignore both.
    #[must_use]
    pub fn marker(&self, name: &str, position: usize) -> String {
        match self.params {
            ParamStyle::Positional {
                prefix
            } => format!("{prefix}{position}"),
            ParamStyle::Anonymous => "?".to_string(),
            ParamStyle::Named {
                prefix
            } => format!("{prefix}{name}")
        }
    }

    /// Boolean literal spelling.
    #[must_use]
    pub const fn bool_literal(&self, value: bool) -> &'static str {
        if value { self.booleans.0 } else { self.booleans.1 }
    }

    /// Always-true and always-false predicates.
    #[must_use]
    pub const fn constant_predicate(&self, value: bool) -> &'static str {
        if value { "1 = 1" } else { "1 = 0" }
    }

    /// Quote a string literal for inlining (single quotes doubled).
    #[must_use]
    pub fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Whether every occurrence of a parameter needs its own value.
    #[must_use]
    pub const fn repeats_parameters(&self) -> bool {
        matches!(self.params, ParamStyle::Anonymous)
    }
}
