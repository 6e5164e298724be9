//! Prescription database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Prescription;

const PRESCRIPTION_COLUMNS: &str = r#"
    id, patient_id, doctor_id, medicine, dosage, quantity, prescribed_on, notes, created_at
"#;

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        medicine: row.get(3)?,
        dosage: row.get(4)?,
        quantity: row.get(5)?,
        prescribed_on: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    /// Insert a new prescription.
    pub fn insert_prescription(&self, rx: &Prescription) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                id, patient_id, doctor_id, medicine, dosage, quantity, prescribed_on, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                rx.id,
                rx.patient_id,
                rx.doctor_id,
                rx.medicine,
                rx.dosage,
                rx.quantity,
                rx.prescribed_on,
                rx.notes,
                rx.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM prescriptions WHERE id = ?", PRESCRIPTION_COLUMNS),
                [id],
                prescription_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_patient_prescriptions(&self, patient_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM prescriptions WHERE patient_id = ? ORDER BY prescribed_on DESC",
            PRESCRIPTION_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn list_prescriptions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM prescriptions
            WHERE prescribed_on BETWEEN ?1 AND ?2
            ORDER BY prescribed_on, created_at
            "#,
            PRESCRIPTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to], prescription_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_prescription(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM prescriptions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
