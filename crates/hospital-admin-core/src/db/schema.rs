//! SQLite schema as ordered, versioned migrations.
//!
//! The applied version is tracked in `PRAGMA user_version`. Each migration
//! runs in its own transaction exactly once.

use super::{Database, DbError, DbResult};

/// A single schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "core records",
        sql: r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE patients (
    id TEXT PRIMARY KEY,
    patient_number TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    gender TEXT NOT NULL,
    date_of_birth TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    blood_group TEXT,
    emergency_contact TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_patients_name ON patients(name);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE doctors (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    specialization TEXT NOT NULL,
    department TEXT NOT NULL,
    phone TEXT,
    email TEXT,
    consultation_fee TEXT NOT NULL DEFAULT '0',   -- decimal text
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_doctors_department ON doctors(department);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    date TEXT NOT NULL,                           -- YYYY-MM-DD
    time TEXT NOT NULL,                           -- HH:MM
    status TEXT NOT NULL DEFAULT 'scheduled',
    reason TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_appointments_date ON appointments(date);
CREATE INDEX idx_appointments_doctor ON appointments(doctor_id);

-- ============================================================================
-- Beds
-- ============================================================================

CREATE TABLE beds (
    id TEXT PRIMARY KEY,
    bed_number TEXT NOT NULL UNIQUE,
    ward TEXT NOT NULL,
    bed_type TEXT NOT NULL,                       -- key into the configured catalog
    status TEXT NOT NULL DEFAULT 'available',
    patient_id TEXT REFERENCES patients(id),
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK ((status = 'occupied') = (patient_id IS NOT NULL))
);

CREATE INDEX idx_beds_type ON beds(bed_type);

-- ============================================================================
-- Invoices
-- ============================================================================

CREATE TABLE invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    subtotal TEXT NOT NULL,
    tax_amount TEXT NOT NULL,
    discount_amount TEXT NOT NULL,
    total_amount TEXT NOT NULL,
    paid_amount TEXT NOT NULL DEFAULT '0',
    payment_status TEXT NOT NULL DEFAULT 'pending',
    invoice_date TEXT NOT NULL,
    due_date TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_invoices_patient ON invoices(patient_id);
CREATE INDEX idx_invoices_date ON invoices(invoice_date);

CREATE TABLE invoice_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    description TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price TEXT NOT NULL,
    line_total TEXT NOT NULL,
    UNIQUE (invoice_id, position)
);

-- ============================================================================
-- Laboratory
-- ============================================================================

CREATE TABLE lab_tests (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    price TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE lab_orders (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT REFERENCES doctors(id) ON DELETE SET NULL,
    test_code TEXT NOT NULL REFERENCES lab_tests(code),
    status TEXT NOT NULL DEFAULT 'pending',
    result TEXT,
    ordered_on TEXT NOT NULL,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_lab_orders_ordered_on ON lab_orders(ordered_on);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE prescriptions (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    medicine TEXT NOT NULL,
    dosage TEXT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    prescribed_on TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_prescriptions_prescribed_on ON prescriptions(prescribed_on);
"#,
    },
    Migration {
        version: 2,
        description: "payments and audit trail",
        sql: r#"
CREATE TABLE payments (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    amount TEXT NOT NULL,
    method TEXT NOT NULL,
    reference TEXT,
    received_at TEXT NOT NULL
);

CREATE INDEX idx_payments_invoice ON payments(invoice_id);

-- Append-only, hash-chained mutation log
CREATE TABLE audit_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    action TEXT NOT NULL,
    entity TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    actor TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '{}',           -- JSON object
    prev_hash TEXT,
    hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_audit_entity ON audit_log(entity, entity_id);
"#,
    },
    Migration {
        version: 3,
        description: "hospital settings",
        sql: r#"
CREATE TABLE settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    },
];

/// The version a fully migrated database reports.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

impl Database {
    /// Current `PRAGMA user_version`.
    pub fn schema_version(&self) -> DbResult<u32> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version as u32)
    }

    /// Apply pending migrations. Returns the versions that were applied.
    pub fn migrate(&self) -> DbResult<Vec<u32>> {
        let current = self.schema_version()?;
        let mut applied = Vec::new();

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| DbError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
            tx.pragma_update(None, "user_version", migration.version)?;
            tx.commit()?;

            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applied schema migration"
            );
            applied.push(migration.version);
        }

        Ok(applied)
    }
}
