// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory driver for tests.
//!
//! [`MockConnection`] implements both the sync and the async driver traits.
//! Responses are scripted in FIFO order; every executed command is recorded
//! with its text, parameters, transaction and timeout.
//!
//! ```rust
//! use sqlstencil_core::{Command, Connection, Value, mock::MockConnection};
//!
//! let conn = MockConnection::new();
//! conn.push_affected(3);
//!
//! let mut cmd = Connection::create_command(&conn).unwrap();
//! cmd.set_text("DELETE FROM t");
//! assert_eq!(cmd.execute_non_query().unwrap(), 3);
//! assert_eq!(conn.executed()[0].text, "DELETE FROM t");
//! ```
//!
//! Like several real drivers, [`MockCursor::ordinal`] fails before the first
//! successful `advance()`.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration
};

use async_trait::async_trait;

use crate::{
    AsyncCommand, AsyncConnection, AsyncRowCursor, Command, Connection, Error, Parameter,
    RowAccess, RowCursor, Session, Value
};

/// Scripted response for the next executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// A result set.
    Rows {
        /// Column names.
        columns: Vec<String>,

        /// Row values.
        rows: Vec<Vec<Value>>
    },

    /// An affected row count.
    Affected(u64),

    /// A scalar value.
    Scalar(Value),

    /// A driver failure with the given message.
    Failure(String)
}

/// Which execute method ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteKind {
    /// `execute_non_query`
    NonQuery,

    /// `execute_scalar`
    Scalar,

    /// `execute_reader`
    Reader
}

/// Transaction handle handed out by [`MockConnection::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockTransaction(pub u64);

/// One executed command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCommand {
    /// Statement text.
    pub text: String,

    /// Parameters in the order they were added.
    pub parameters: Vec<Parameter>,

    /// Associated transaction.
    pub transaction: Option<MockTransaction>,

    /// Configured timeout.
    pub timeout: Option<Duration>,

    /// Execute method used.
    pub kind: ExecuteKind
}

impl ExecutedCommand {
    /// Value of the first parameter named `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Failure produced by a scripted [`MockResponse::Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub String);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Default)]
struct State {
    responses:    VecDeque<MockResponse>,
    executed:     Vec<ExecutedCommand>,
    transactions: u64
}

/// In-memory connection; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<State>>
}

impl MockConnection {
    /// Create a connection with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Script a response.
    pub fn push(&self, response: MockResponse) -> &Self {
        self.state().responses.push_back(response);
        self
    }

    /// Script a result set.
    pub fn push_rows<C, S>(&self, columns: C, rows: Vec<Vec<Value>>) -> &Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.push(MockResponse::Rows {
            columns: columns.into_iter().map(Into::into).collect(),
            rows
        })
    }

    /// Script an affected row count.
    pub fn push_affected(&self, rows: u64) -> &Self {
        self.push(MockResponse::Affected(rows))
    }

    /// Script a scalar.
    pub fn push_scalar(&self, value: Value) -> &Self {
        self.push(MockResponse::Scalar(value))
    }

    /// Script a driver failure.
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.push(MockResponse::Failure(message.into()))
    }

    /// Start a new transaction handle.
    #[must_use]
    pub fn begin(&self) -> MockTransaction {
        let mut state = self.state();
        state.transactions += 1;
        MockTransaction(state.transactions)
    }

    /// Snapshot of every executed command.
    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedCommand> {
        self.state().executed.clone()
    }

    /// Number of executed commands.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.state().executed.len()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state().responses.len()
    }

    fn command(&self) -> MockCommand {
        MockCommand {
            state:       Arc::clone(&self.state),
            text:        String::new(),
            parameters:  Vec::new(),
            transaction: None,
            timeout:     None
        }
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session for MockConnection {
    type Transaction = MockTransaction;
}

impl Connection for MockConnection {
    type Command = MockCommand;

    fn create_command(&self) -> Result<MockCommand, Error> {
        Ok(self.command())
    }
}

impl AsyncConnection for MockConnection {
    type Command = MockCommand;

    fn create_command(&self) -> Result<MockCommand, Error> {
        Ok(self.command())
    }
}

/// Command created by [`MockConnection`].
#[derive(Debug)]
pub struct MockCommand {
    state:       Arc<Mutex<State>>,
    text:        String,
    parameters:  Vec<Parameter>,
    transaction: Option<MockTransaction>,
    timeout:     Option<Duration>
}

impl MockCommand {
    fn run(&mut self, kind: ExecuteKind) -> Option<MockResponse> {
        let mut state = lock(&self.state);
        state.executed.push(ExecutedCommand {
            text: self.text.clone(),
            parameters: self.parameters.clone(),
            transaction: self.transaction,
            timeout: self.timeout,
            kind
        });
        state.responses.pop_front()
    }

    fn non_query(&mut self) -> Result<u64, Error> {
        match self.run(ExecuteKind::NonQuery) {
            None => Ok(0),
            Some(MockResponse::Affected(rows)) => Ok(rows),
            Some(MockResponse::Rows {
                rows, ..
            }) => Ok(rows.len() as u64),
            Some(MockResponse::Scalar(_)) => Ok(0),
            Some(MockResponse::Failure(message)) => Err(Error::database(MockError(message)))
        }
    }

    fn scalar(&mut self) -> Result<Value, Error> {
        match self.run(ExecuteKind::Scalar) {
            None | Some(MockResponse::Affected(_)) => Ok(Value::Null),
            Some(MockResponse::Scalar(value)) => Ok(value),
            Some(MockResponse::Rows {
                rows, ..
            }) => Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .unwrap_or_default()),
            Some(MockResponse::Failure(message)) => Err(Error::database(MockError(message)))
        }
    }

    fn reader(&mut self) -> Result<MockCursor, Error> {
        match self.run(ExecuteKind::Reader) {
            None | Some(MockResponse::Affected(_)) => Ok(MockCursor::new(Vec::new(), Vec::new())),
            Some(MockResponse::Rows {
                columns,
                rows
            }) => Ok(MockCursor::new(columns, rows)),
            Some(MockResponse::Scalar(value)) => Ok(MockCursor::new(
                vec!["value".to_string()],
                vec![vec![value]]
            )),
            Some(MockResponse::Failure(message)) => Err(Error::database(MockError(message)))
        }
    }
}

impl Command for MockCommand {
    type Transaction = MockTransaction;
    type Cursor = MockCursor;

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn add_parameter(&mut self, name: &str, value: Value) {
        self.parameters.push(Parameter {
            name: name.to_string(),
            value
        });
    }

    fn set_transaction(&mut self, transaction: &MockTransaction) {
        self.transaction = Some(*transaction);
    }

    fn execute_non_query(&mut self) -> Result<u64, Error> {
        self.non_query()
    }

    fn execute_scalar(&mut self) -> Result<Value, Error> {
        self.scalar()
    }

    fn execute_reader(&mut self) -> Result<MockCursor, Error> {
        self.reader()
    }
}

#[async_trait]
impl AsyncCommand for MockCommand {
    type Transaction = MockTransaction;
    type Cursor = MockCursor;

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn add_parameter(&mut self, name: &str, value: Value) {
        self.parameters.push(Parameter {
            name: name.to_string(),
            value
        });
    }

    fn set_transaction(&mut self, transaction: &MockTransaction) {
        self.transaction = Some(*transaction);
    }

    async fn execute_non_query(&mut self) -> Result<u64, Error> {
        self.non_query()
    }

    async fn execute_scalar(&mut self) -> Result<Value, Error> {
        self.scalar()
    }

    async fn execute_reader(&mut self) -> Result<MockCursor, Error> {
        self.reader()
    }
}

/// Cursor over a scripted result set.
#[derive(Debug, Clone)]
pub struct MockCursor {
    columns: Vec<String>,
    rows:    VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>
}

impl MockCursor {
    fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            current: None
        }
    }

    fn step(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn row(&self) -> Result<&[Value], Error> {
        self.current.as_deref().ok_or(Error::NoCurrentRow)
    }
}

impl RowAccess for MockCursor {
    fn column_count(&self) -> Result<usize, Error> {
        self.row()?;
        Ok(self.columns.len())
    }

    fn column_name(&self, ordinal: usize) -> Result<&str, Error> {
        self.row()?;
        self.columns
            .get(ordinal)
            .map(String::as_str)
            .ok_or(Error::OrdinalOutOfRange {
                ordinal,
                count: self.columns.len()
            })
    }

    fn ordinal(&self, column: &str) -> Result<usize, Error> {
        self.row()?;
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| Error::ColumnNotFound {
                column: column.to_string()
            })
    }

    fn value(&self, ordinal: usize) -> Result<Value, Error> {
        let row = self.row()?;
        row.get(ordinal).cloned().ok_or(Error::OrdinalOutOfRange {
            ordinal,
            count: row.len()
        })
    }
}

impl RowCursor for MockCursor {
    fn advance(&mut self) -> Result<bool, Error> {
        Ok(self.step())
    }
}

#[async_trait]
impl AsyncRowCursor for MockCursor {
    async fn advance(&mut self) -> Result<bool, Error> {
        Ok(self.step())
    }
}
