//! Database layer for the hospital administration core.

mod appointments;
mod audit;
mod beds;
mod doctors;
mod invoices;
mod lab;
mod patients;
mod prescriptions;
mod reports;
mod schema;
mod settings;

pub use audit::*;
pub use schema::*;

use std::path::Path;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, ErrorCode, Row, ToSql};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    AppointmentStatus, BedStatus, Gender, LabOrderStatus, PaymentMethod, PaymentStatus,
};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },
}

impl DbError {
    /// Whether this error came from a foreign key, unique or check constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Constraint(_) => true,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Enable foreign keys and bring the schema up to date.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.migrate()?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    ///
    /// When a transaction is already open, `f` joins it and the outer caller
    /// decides whether to commit.
    pub fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        if !self.conn.is_autocommit() {
            return f(self);
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| E::from(DbError::from(e)))?;
        let value = f(self)?;
        tx.commit().map_err(|e| E::from(DbError::from(e)))?;
        Ok(value)
    }
}

/// Read a money column stored as decimal text.
pub(crate) fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Money is stored as text so no precision is lost to REAL.
pub(crate) fn decimal_text(value: &Decimal) -> String {
    value.to_string()
}

/// Store enums by their snake_case names.
macro_rules! text_enum_sql {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )*
    };
}

text_enum_sql!(
    AppointmentStatus,
    BedStatus,
    Gender,
    LabOrderStatus,
    PaymentMethod,
    PaymentStatus,
);
