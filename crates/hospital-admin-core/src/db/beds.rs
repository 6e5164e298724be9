//! Bed database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Bed;

const BED_COLUMNS: &str = r#"
    id, bed_number, ward, bed_type, status, patient_id, notes, created_at, updated_at
"#;

fn bed_from_row(row: &Row<'_>) -> rusqlite::Result<Bed> {
    Ok(Bed {
        id: row.get(0)?,
        bed_number: row.get(1)?,
        ward: row.get(2)?,
        bed_type: row.get(3)?,
        status: row.get(4)?,
        patient_id: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    /// Register a new bed.
    pub fn insert_bed(&self, bed: &Bed) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO beds (
                id, bed_number, ward, bed_type, status, patient_id, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                bed.id,
                bed.bed_number,
                bed.ward,
                bed.bed_type,
                bed.status,
                bed.patient_id,
                bed.notes,
                bed.created_at,
                bed.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Persist status, assignment and notes.
    pub fn update_bed(&self, bed: &Bed) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE beds SET
                ward = ?2,
                bed_type = ?3,
                status = ?4,
                patient_id = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                bed.id,
                bed.ward,
                bed.bed_type,
                bed.status,
                bed.patient_id,
                bed.notes,
                bed.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a bed by ID.
    pub fn get_bed(&self, id: &str) -> DbResult<Option<Bed>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM beds WHERE id = ?", BED_COLUMNS),
                [id],
                bed_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a bed by its ward-visible number.
    pub fn get_bed_by_number(&self, bed_number: &str) -> DbResult<Option<Bed>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM beds WHERE bed_number = ?", BED_COLUMNS),
                [bed_number],
                bed_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The bed a patient currently occupies, if any.
    pub fn get_bed_for_patient(&self, patient_id: &str) -> DbResult<Option<Bed>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM beds WHERE patient_id = ?", BED_COLUMNS),
                [patient_id],
                bed_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All registered beds.
    pub fn list_beds(&self) -> DbResult<Vec<Bed>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM beds ORDER BY bed_type, bed_number",
            BED_COLUMNS
        ))?;
        let rows = stmt.query_map([], bed_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of registered beds of one type.
    pub fn count_beds_of_type(&self, bed_type: &str) -> DbResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM beds WHERE bed_type = ?",
            [bed_type],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Remove a bed record.
    pub fn delete_bed(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM beds WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BedStatus, Gender, Patient};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let db = setup_db();
        let bed = Bed::new("ICU-01".into(), "ICU".into(), "icu".into());
        db.insert_bed(&bed).unwrap();

        assert_eq!(db.get_bed(&bed.id).unwrap().unwrap(), bed);
        assert_eq!(db.get_bed_by_number("ICU-01").unwrap().unwrap().id, bed.id);
        assert_eq!(db.count_beds_of_type("icu").unwrap(), 1);
        assert_eq!(db.count_beds_of_type("general").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_bed_number_rejected() {
        let db = setup_db();
        db.insert_bed(&Bed::new("G-1".into(), "A".into(), "general".into()))
            .unwrap();
        let err = db
            .insert_bed(&Bed::new("G-1".into(), "B".into(), "general".into()))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_assignment_persisted() {
        let db = setup_db();
        let patient = Patient::new("Ravi".into(), Gender::Male);
        db.insert_patient(&patient).unwrap();

        let mut bed = Bed::new("G-2".into(), "A".into(), "general".into());
        db.insert_bed(&bed).unwrap();
        bed.assign(patient.id.clone()).unwrap();
        assert!(db.update_bed(&bed).unwrap());

        let occupied = db.get_bed_for_patient(&patient.id).unwrap().unwrap();
        assert_eq!(occupied.status, BedStatus::Occupied);
    }

    #[test]
    fn test_check_constraint_rejects_inconsistent_row() {
        let db = setup_db();
        let mut bed = Bed::new("G-3".into(), "A".into(), "general".into());
        bed.status = BedStatus::Occupied;
        let err = db.insert_bed(&bed).unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
