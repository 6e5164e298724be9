//! Hash-chained audit trail of mutations.
//!
//! Every entry stores the hash of the entry before it. Its own hash is
//! SHA-256 over the previous hash and its canonical fields, so editing or
//! deleting a stored row breaks every hash after it.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::{AuditEntry, Database, DbResult};

/// Kind of mutation being recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Payment,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Payment => "payment",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of walking the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditVerification {
    pub entries: usize,
    pub valid: bool,
    /// Sequence number of the first entry whose hash or link does not match
    pub first_broken: Option<i64>,
}

/// SHA-256 hex digest of some bytes.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// The hash an entry should carry given its fields and predecessor.
pub fn entry_hash(entry: &AuditEntry) -> String {
    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n{}",
        entry.prev_hash.as_deref().unwrap_or(""),
        entry.action,
        entry.entity,
        entry.entity_id,
        entry.actor,
        entry.details,
        entry.created_at,
    );
    hash_data(canonical.as_bytes())
}

/// Audit operations over a database.
pub struct AuditLog<'a> {
    db: &'a Database,
}

impl<'a> AuditLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append an entry chained onto the current head.
    pub fn record(
        &self,
        action: AuditAction,
        entity: &str,
        entity_id: &str,
        actor: &str,
        details: serde_json::Value,
    ) -> DbResult<AuditEntry> {
        let prev_hash = self.db.last_audit_entry()?.map(|e| e.hash);

        let mut entry = AuditEntry {
            seq: 0,
            action: action.as_str().to_string(),
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            actor: actor.to_string(),
            details,
            prev_hash,
            hash: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        entry.hash = entry_hash(&entry);
        entry.seq = self.db.insert_audit_entry(&entry)?;

        tracing::debug!(
            seq = entry.seq,
            action = %action,
            entity,
            entity_id,
            actor,
            "audit entry recorded"
        );
        Ok(entry)
    }

    pub fn entries(&self) -> DbResult<Vec<AuditEntry>> {
        self.db.list_audit_entries()
    }

    pub fn history(&self, entity: &str, entity_id: &str) -> DbResult<Vec<AuditEntry>> {
        self.db.list_audit_entries_for(entity, entity_id)
    }

    /// Recompute every hash and check each link to its predecessor.
    pub fn verify_chain(&self) -> DbResult<AuditVerification> {
        let entries = self.db.list_audit_entries()?;
        let mut expected_prev: Option<&str> = None;

        for entry in &entries {
            let linked = entry.prev_hash.as_deref() == expected_prev;
            if !linked || entry_hash(entry) != entry.hash {
                tracing::warn!(seq = entry.seq, "audit chain broken");
                return Ok(AuditVerification {
                    entries: entries.len(),
                    valid: false,
                    first_broken: Some(entry.seq),
                });
            }
            expected_prev = Some(&entry.hash);
        }

        Ok(AuditVerification {
            entries: entries.len(),
            valid: true,
            first_broken: None,
        })
    }
}
