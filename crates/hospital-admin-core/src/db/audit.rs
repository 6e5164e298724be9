//! Audit log database operations.

use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{Database, DbResult};

/// A stored audit log row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Monotonic position in the chain (assigned by SQLite)
    pub seq: i64,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub actor: String,
    pub details: serde_json::Value,
    /// Hash of the previous entry, `None` for the first
    pub prev_hash: Option<String>,
    pub hash: String,
    pub created_at: String,
}

const AUDIT_COLUMNS: &str = r#"
    seq, action, entity, entity_id, actor, details, prev_hash, hash, created_at
"#;

fn audit_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    let details: String = row.get(5)?;
    Ok(AuditEntry {
        seq: row.get(0)?,
        action: row.get(1)?,
        entity: row.get(2)?,
        entity_id: row.get(3)?,
        actor: row.get(4)?,
        details: serde_json::from_str(&details).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        prev_hash: row.get(6)?,
        hash: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    /// Append an entry. `seq` on the argument is ignored; the assigned one is returned.
    pub fn insert_audit_entry(&self, entry: &AuditEntry) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO audit_log (
                action, entity, entity_id, actor, details, prev_hash, hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.action,
                entry.entity,
                entry.entity_id,
                entry.actor,
                serde_json::to_string(&entry.details)?,
                entry.prev_hash,
                entry.hash,
                entry.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent entry, which the next one chains onto.
    pub fn last_audit_entry(&self) -> DbResult<Option<AuditEntry>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM audit_log ORDER BY seq DESC LIMIT 1",
                    AUDIT_COLUMNS
                ),
                [],
                audit_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The whole chain in append order.
    pub fn list_audit_entries(&self) -> DbResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM audit_log ORDER BY seq",
            AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([], audit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// History of one record, oldest first.
    pub fn list_audit_entries_for(&self, entity: &str, entity_id: &str) -> DbResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM audit_log WHERE entity = ?1 AND entity_id = ?2 ORDER BY seq",
            AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![entity, entity_id], audit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
