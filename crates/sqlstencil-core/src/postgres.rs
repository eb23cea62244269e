// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! PostgreSQL driver over `sqlx`.
//!
//! Implements the async driver family for a [`PgPool`]. Commands run on the
//! pool, or on the associated transaction when one is set.
//!
//! ```rust,ignore
//! let conn = PgDriver::new(pool);
//! let mut repo = UserRepoImpl::new(conn.clone());
//!
//! let tx = conn.begin().await?;
//! repo.set_transaction(Some(tx.clone()));
//! repo.delete(7).await?;
//! repo.set_transaction(None);
//! PgDriver::commit(tx).await?;
//! ```
//!
//! # Type Mapping
//!
//! | PostgreSQL | [`Value`] |
//! |------------|-----------|
//! | `BOOL` | `Bool` |
//! | `INT2`, `INT4`, `INT8` | `Int` |
//! | `FLOAT4`, `FLOAT8` | `Float` |
//! | `TEXT`, `VARCHAR`, `BPCHAR`, `NAME`, `CITEXT`, `JSON`, `JSONB` | `Text` |
//! | `NUMERIC` | `Text`, exact decimal |
//! | `TIMESTAMPTZ` | `Text`, RFC 3339 |
//! | `TIMESTAMP`, `DATE`, `TIME` | `Text`, ISO 8601 |
//! | `UUID` | `Text`, hyphenated |
//! | `BYTEA` | `Bytes` |
//!
//! Other column types are read as their raw binary encoding. `Value::Null`
//! is sent without a type, so the server infers it from the statement.

use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Column, PgPool, Postgres, Row, TypeInfo, ValueRef,
    encode::IsNull,
    error::BoxDynError,
    postgres::{PgArgumentBuffer, PgArguments, PgRow, PgTypeInfo, types::Oid},
    query::Query
};
use tokio::sync::Mutex;

use crate::{AsyncCommand, AsyncConnection, AsyncRowCursor, Error, RowAccess, Session, Value};

/// Shared transaction handle.
pub type PgTransaction = Arc<Mutex<sqlx::Transaction<'static, Postgres>>>;

/// Connection backed by a [`PgPool`].
#[derive(Clone)]
pub struct PgDriver {
    pool: PgPool
}

impl fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDriver").finish_non_exhaustive()
    }
}

/// Returned by [`PgDriver::commit`] while repositories still hold the
/// transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionInUse;

impl fmt::Display for TransactionInUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transaction is still associated with a repository")
    }
}

impl std::error::Error for TransactionInUse {}

impl PgDriver {
    /// Wrap a pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool
        }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Driver failures as [`Error::Database`].
    pub async fn begin(&self) -> Result<PgTransaction, Error> {
        let tx = self.pool.begin().await.map_err(Error::database)?;
        Ok(Arc::new(Mutex::new(tx)))
    }

    /// Commit a transaction no repository holds anymore.
    ///
    /// # Errors
    ///
    /// [`TransactionInUse`] while other handles exist; driver failures.
    pub async fn commit(tx: PgTransaction) -> Result<(), Error> {
        let tx = Arc::try_unwrap(tx).map_err(|_| Error::database(TransactionInUse))?;
        tx.into_inner().commit().await.map_err(Error::database)
    }

    /// Roll back a transaction no repository holds anymore.
    ///
    /// # Errors
    ///
    /// [`TransactionInUse`] while other handles exist; driver failures.
    pub async fn rollback(tx: PgTransaction) -> Result<(), Error> {
        let tx = Arc::try_unwrap(tx).map_err(|_| Error::database(TransactionInUse))?;
        tx.into_inner().rollback().await.map_err(Error::database)
    }
}

impl Session for PgDriver {
    type Transaction = PgTransaction;
}

impl AsyncConnection for PgDriver {
    type Command = PgCommand;

    fn create_command(&self) -> Result<PgCommand, Error> {
        Ok(PgCommand {
            pool:        self.pool.clone(),
            text:        String::new(),
            parameters:  Vec::new(),
            transaction: None,
            timeout:     None
        })
    }
}

/// Command created by [`PgDriver`].
pub struct PgCommand {
    pool:        PgPool,
    text:        String,
    parameters:  Vec<Value>,
    transaction: Option<PgTransaction>,
    timeout:     Option<Duration>
}

impl fmt::Debug for PgCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgCommand")
            .field("text", &self.text)
            .field("parameters", &self.parameters.len())
            .field("transaction", &self.transaction.is_some())
            .finish_non_exhaustive()
    }
}

/// `NULL` parameter of unspecified type.
///
/// Binding `Option<String>` would declare the parameter `TEXT`, which the
/// server refuses wherever it expects another type.
#[derive(Debug, Clone, Copy)]
struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl<'q> sqlx::Encode<'q, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(UntypedNull),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone())
    }
}

async fn limited<T, F>(timeout: Option<Duration>, future: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, sqlx::Error>>
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(Error::database)?
            .map_err(Error::database),
        None => future.await.map_err(Error::database)
    }
}

impl PgCommand {
    fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.parameters
            .iter()
            .fold(sqlx::query(&self.text), |query, value| bind(query, value))
    }

    async fn fetch_all(&self) -> Result<Vec<PgRow>, Error> {
        let query = self.query();
        match &self.transaction {
            Some(tx) => {
                let mut guard = tx.lock().await;
                limited(self.timeout, query.fetch_all(&mut **guard)).await
            }
            None => limited(self.timeout, query.fetch_all(&self.pool)).await
        }
    }
}

#[async_trait]
impl AsyncCommand for PgCommand {
    type Transaction = PgTransaction;
    type Cursor = PgCursor;

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn add_parameter(&mut self, _name: &str, value: Value) {
        self.parameters.push(value);
    }

    fn set_transaction(&mut self, transaction: &PgTransaction) {
        self.transaction = Some(Arc::clone(transaction));
    }

    async fn execute_non_query(&mut self) -> Result<u64, Error> {
        let query = self.query();
        let result = match &self.transaction {
            Some(tx) => {
                let mut guard = tx.lock().await;
                limited(self.timeout, query.execute(&mut **guard)).await?
            }
            None => limited(self.timeout, query.execute(&self.pool)).await?
        };
        Ok(result.rows_affected())
    }

    async fn execute_scalar(&mut self) -> Result<Value, Error> {
        let rows = self.fetch_all().await?;
        match rows.first() {
            Some(row) if !row.columns().is_empty() => decode(row, 0),
            _ => Ok(Value::Null)
        }
    }

    async fn execute_reader(&mut self) -> Result<PgCursor, Error> {
        let rows = self.fetch_all().await?;
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let decoded = rows
            .iter()
            .map(|row| (0..row.columns().len()).map(|i| decode(row, i)).collect())
            .collect::<Result<_, Error>>()?;
        Ok(PgCursor {
            columns,
            rows: decoded,
            current: None
        })
    }
}

fn decode(row: &PgRow, ordinal: usize) -> Result<Value, Error> {
    let raw = row.try_get_raw(ordinal).map_err(Error::database)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = row.columns()[ordinal].type_info().name().to_string();
    let typed = |value: Result<Value, sqlx::Error>| value.map_err(Error::database);
    match type_name.as_str() {
        "BOOL" => typed(row.try_get::<bool, _>(ordinal).map(Value::Bool)),
        "INT2" => typed(row.try_get::<i16, _>(ordinal).map(|i| Value::Int(i64::from(i)))),
        "INT4" => typed(row.try_get::<i32, _>(ordinal).map(|i| Value::Int(i64::from(i)))),
        "INT8" => typed(row.try_get::<i64, _>(ordinal).map(Value::Int)),
        "FLOAT4" => typed(row.try_get::<f32, _>(ordinal).map(|f| Value::Float(f64::from(f)))),
        "FLOAT8" => typed(row.try_get::<f64, _>(ordinal).map(Value::Float)),
        "TIMESTAMPTZ" => typed(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(ordinal)
                .map(|t| Value::Text(t.to_rfc3339()))
        ),
        "TIMESTAMP" => typed(
            row.try_get::<chrono::NaiveDateTime, _>(ordinal)
                .map(|t| Value::Text(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        ),
        "DATE" => typed(
            row.try_get::<chrono::NaiveDate, _>(ordinal)
                .map(|d| Value::Text(d.to_string()))
        ),
        "TIME" => typed(
            row.try_get::<chrono::NaiveTime, _>(ordinal)
                .map(|t| Value::Text(t.to_string()))
        ),
        "UUID" => typed(
            row.try_get::<uuid::Uuid, _>(ordinal)
                .map(|u| Value::Text(u.hyphenated().to_string()))
        ),
        _ => {
            let bytes = raw.as_bytes().map_err(Error::Database)?;
            decode_raw(&type_name, bytes).map_err(Error::Database)
        }
    }
}

/// Decode a binary-format value the driver has no typed decoder for.
fn decode_raw(type_name: &str, bytes: &[u8]) -> Result<Value, BoxDynError> {
    let text = |bytes: &[u8]| -> Result<Value, BoxDynError> {
        Ok(Value::Text(std::str::from_utf8(bytes)?.to_string()))
    };
    match type_name {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "JSON" | "XML" => text(bytes),
        "JSONB" => match bytes.split_first() {
            Some((1, document)) => text(document),
            _ => Err(format!("unsupported JSONB version in {} bytes", bytes.len()).into())
        },
        "NUMERIC" => numeric_text(bytes)
            .map(Value::Text)
            .ok_or_else(|| "malformed NUMERIC value".into()),
        _ => Ok(Value::Bytes(bytes.to_vec()))
    }
}

/// Render a binary `NUMERIC` as exact decimal text.
///
/// Layout: digit count, weight, sign, display scale, then base-10000 digits
/// with the first one worth `10000^weight`.
fn numeric_text(bytes: &[u8]) -> Option<String> {
    let word = |at: usize| bytes.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]));
    let count = usize::from(word(0)?);
    let weight = i32::from(i16::from_be_bytes(word(2)?.to_be_bytes()));
    let sign = word(4)?;
    let scale = usize::from(word(6)?);
    match sign {
        0x0000 | 0x4000 => {}
        0xC000 => return Some("NaN".to_string()),
        0xD000 => return Some("Infinity".to_string()),
        0xF000 => return Some("-Infinity".to_string()),
        _ => return None
    }
    let digits = (0..count)
        .map(|i| word(8 + 2 * i))
        .collect::<Option<Vec<u16>>>()?;
    let digit = |index: i32| {
        usize::try_from(index)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for index in 1..=weight {
            out.push_str(&format!("{:04}", digit(index)));
        }
    }
    if scale > 0 {
        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < scale {
            fraction.push_str(&format!("{:04}", digit(index)));
            index += 1;
        }
        fraction.truncate(scale);
        out.push('.');
        out.push_str(&fraction);
    }
    Some(out)
}

/// Buffered cursor over a PostgreSQL result set.
#[derive(Debug)]
pub struct PgCursor {
    columns: Vec<String>,
    rows:    VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>
}

impl PgCursor {
    fn row(&self) -> Result<&[Value], Error> {
        self.current.as_deref().ok_or(Error::NoCurrentRow)
    }
}

impl RowAccess for PgCursor {
    fn column_count(&self) -> Result<usize, Error> {
        Ok(self.columns.len())
    }

    fn column_name(&self, ordinal: usize) -> Result<&str, Error> {
        self.columns
            .get(ordinal)
            .map(String::as_str)
            .ok_or(Error::OrdinalOutOfRange {
                ordinal,
                count: self.columns.len()
            })
    }

    fn ordinal(&self, column: &str) -> Result<usize, Error> {
        self.columns
            .iter()
            .position(|c| c == column)
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

#[async_trait]
impl AsyncRowCursor for PgCursor {
    async fn advance(&mut self) -> Result<bool, Error> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }
}
