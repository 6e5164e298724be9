//! Doctor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{decimal_at, decimal_text, Database, DbResult};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str = r#"
    id, name, specialization, department, phone, email,
    consultation_fee, active, created_at, updated_at
"#;

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        department: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        consultation_fee: decimal_at(row, 6)?,
        active: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (
                id, name, specialization, department, phone, email,
                consultation_fee, active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.specialization,
                doctor.department,
                doctor.phone,
                doctor.email,
                decimal_text(&doctor.consultation_fee),
                doctor.active,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing doctor.
    pub fn update_doctor(&self, doctor: &Doctor) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                name = ?2,
                specialization = ?3,
                department = ?4,
                phone = ?5,
                email = ?6,
                consultation_fee = ?7,
                active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                doctor.id,
                doctor.name,
                doctor.specialization,
                doctor.department,
                doctor.phone,
                doctor.email,
                decimal_text(&doctor.consultation_fee),
                doctor.active,
                doctor.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE id = ?", DOCTOR_COLUMNS),
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List doctors, optionally only active ones.
    pub fn list_doctors(&self, active_only: bool) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM doctors WHERE active = 1 OR ?1 = 0 ORDER BY name",
            DOCTOR_COLUMNS
        ))?;
        let rows = stmt.query_map([active_only], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Distinct departments with at least one doctor.
    pub fn list_departments(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT department FROM doctors ORDER BY department")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a doctor. Fails with a constraint error while history references them.
    pub fn delete_doctor(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM doctors WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
