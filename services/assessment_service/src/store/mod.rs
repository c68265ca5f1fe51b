//! SQLite implementation of the repository traits.
//!
//! One connection, guarded by a mutex. Each repository call moves onto tokio's blocking pool, takes
//! the lock, runs its statements (inside a transaction when it writes more than one row) and
//! releases it before returning.

mod directory;
mod homework;
mod preferences;
mod quiz;
mod review;
mod schema;

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, ErrorCode, Row, ToSql};
use serde::de::DeserializeOwned;

use crate::domain::{AssignmentStatus, PreferenceValue, SessionStatus};
use crate::repository::StoreError;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`. `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::migrate(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }

    /// Like [`with_conn`](Self::with_conn), but off the async worker threads.
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await?
    }
}

/// SQLite reads a negative OFFSET as zero, so offsets past `i64::MAX` saturate instead of wrapping.
fn sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

/// Maps a constraint violation on insert to `Duplicate`, leaving every other error untouched.
fn duplicate_on_conflict(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
        {
            StoreError::Duplicate
        }
        other => StoreError::Backend(other),
    }
}

/// Reads a JSON document stored as text.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn from_str_column<T>(value: ValueRef<'_>) -> FromSqlResult<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
}

impl FromSql for AssignmentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        from_str_column(value)
    }
}

impl ToSql for AssignmentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value: &str = self.as_ref();
        Ok(ToSqlOutput::from(value))
    }
}

impl FromSql for SessionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        from_str_column(value)
    }
}

impl ToSql for SessionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value: &str = self.as_ref();
        Ok(ToSqlOutput::from(value))
    }
}

impl ToSql for PreferenceValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            PreferenceValue::Flag(flag) => flag.to_sql(),
            PreferenceValue::Time(time) => time.to_sql(),
        }
    }
}
