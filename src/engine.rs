//! The relational engine every test runs against.
//!
//! One in-memory SQLite connection per run. It is never reset between test
//! cases: files build their schema up statement by statement, and later tests
//! rely on what earlier setup scripts created.

use crate::errors::DoctestError;
use crate::value::{Row, Scalar};
use rusqlite::{Batch, Connection, ErrorCode};
use std::time::{Duration, Instant};

// ============================================================================
// ENGINE
// ============================================================================

/// Owns the shared database connection.
pub struct Engine {
    conn: Connection,
}

/// Rows and column names returned by a query, plus how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub elapsed: Duration,
}

impl Engine {
    pub fn open_in_memory() -> Result<Self, DoctestError> {
        let conn = Connection::open_in_memory().map_err(DoctestError::Engine)?;
        Ok(Self { conn })
    }

    /// Runs zero or more statements.
    pub fn run_script(&self, script: &str) -> Result<(), rusqlite::Error> {
        if script.trim().is_empty() {
            return Ok(());
        }
        self.conn.execute_batch(script)
    }

    /// Runs one statement and collects every row it returns.
    ///
    /// Query text holding a second statement is rejected before anything runs.
    pub fn run_query(&self, query: &str) -> Result<QueryOutput, rusqlite::Error> {
        let start = Instant::now();
        let mut batch = Batch::new(&self.conn, query);
        let Some(mut stmt) = batch.next()? else {
            return Ok(QueryOutput {
                columns: Vec::new(),
                rows: Vec::new(),
                elapsed: start.elapsed(),
            });
        };
        // Only blank or comment-only text may follow the statement
        if !matches!(batch.next(), Ok(None)) {
            return Err(rusqlite::Error::MultipleStatement);
        }
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(Scalar::from(row.get_ref(idx)?));
            }
            rows.push(Row::new(values));
        }

        Ok(QueryOutput {
            columns,
            rows,
            elapsed: start.elapsed(),
        })
    }
}

// ============================================================================
// ERROR CAPTURE
// ============================================================================

/// A query failure reduced to something a RAISES annotation can compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub kind: String,
    pub message: String,
}

impl CapturedError {
    /// Names the failure with the DB-API exception names that test files are
    /// written against (`OperationalError`, `IntegrityError`, ...).
    pub fn from_sqlite(err: &rusqlite::Error) -> Self {
        let code = match err {
            rusqlite::Error::SqlInputError { error, .. } => Some(error.code),
            other => other.sqlite_error_code(),
        };
        let kind = match code {
            Some(ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch) => "IntegrityError",
            Some(ErrorCode::TooBig) => "DataError",
            Some(ErrorCode::InternalMalfunction | ErrorCode::NotFound) => "InternalError",
            Some(ErrorCode::OutOfMemory) => "MemoryError",
            Some(ErrorCode::ApiMisuse) => "InterfaceError",
            Some(_) => "OperationalError",
            None if matches!(err, rusqlite::Error::MultipleStatement) => "ProgrammingError",
            None => "InterfaceError",
        };
        let message = match err {
            rusqlite::Error::MultipleStatement => {
                "You can only execute one statement at a time.".to_string()
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
            // Prepare-time failures carry the statement and offset separately
            rusqlite::Error::SqlInputError { msg, .. } => msg.clone(),
            rusqlite::Error::SqliteFailure(code, None) => code.to_string(),
            other => other.to_string(),
        };
        Self {
            kind: kind.to_string(),
            message,
        }
    }
}

impl std::fmt::Display for CapturedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})",
            self.kind,
            Scalar::Text(self.message.clone())
        )
    }
}
