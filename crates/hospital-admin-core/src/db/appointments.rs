//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Appointment;

const APPOINTMENT_COLUMNS: &str = r#"
    id, patient_id, doctor_id, date, time, status, reason, created_at, updated_at
"#;

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status: row.get(5)?,
        reason: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, doctor_id, date, time, status, reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                appt.id,
                appt.patient_id,
                appt.doctor_id,
                appt.date,
                appt.time,
                appt.status,
                appt.reason,
                appt.created_at,
                appt.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing appointment.
    pub fn update_appointment(&self, appt: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                doctor_id = ?2,
                date = ?3,
                time = ?4,
                status = ?5,
                reason = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                appt.id,
                appt.doctor_id,
                appt.date,
                appt.time,
                appt.status,
                appt.reason,
                appt.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
                [id],
                appointment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Appointments dated within `[from, to]`, earliest first.
    pub fn list_appointments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE date BETWEEN ?1 AND ?2
            ORDER BY date, time
            "#,
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A doctor's appointments on one day, used to reject double booking.
    pub fn list_doctor_appointments_on(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE doctor_id = ?1 AND date = ?2
            ORDER BY time
            "#,
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![doctor_id, date], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A patient's appointment history, newest first.
    pub fn list_patient_appointments(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE patient_id = ?1
            ORDER BY date DESC, time DESC
            "#,
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
