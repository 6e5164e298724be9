//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = r#"
    id, patient_number, name, gender, date_of_birth, phone, email,
    address, blood_group, emergency_contact, created_at, updated_at
"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        patient_number: row.get(1)?,
        name: row.get(2)?,
        gender: row.get(3)?,
        date_of_birth: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        blood_group: row.get(8)?,
        emergency_contact: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, patient_number, name, gender, date_of_birth, phone, email,
                address, blood_group, emergency_contact, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                patient.id,
                patient.patient_number,
                patient.name,
                patient.gender,
                patient.date_of_birth,
                patient.phone,
                patient.email,
                patient.address,
                patient.blood_group,
                patient.emergency_contact,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                gender = ?3,
                date_of_birth = ?4,
                phone = ?5,
                email = ?6,
                address = ?7,
                blood_group = ?8,
                emergency_contact = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.gender,
                patient.date_of_birth,
                patient.phone,
                patient.email,
                patient.address,
                patient.blood_group,
                patient.emergency_contact,
                patient.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by registration number.
    pub fn get_patient_by_number(&self, patient_number: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM patients WHERE patient_number = ?",
                    PATIENT_COLUMNS
                ),
                [patient_number],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search patients by name, number or phone (substring match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM patients
            WHERE name LIKE ?1 ESCAPE '\'
               OR patient_number LIKE ?1 ESCAPE '\'
               OR phone LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM patients ORDER BY name", PATIENT_COLUMNS))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Amara Okafor".into(), Gender::Female);
        patient.date_of_birth = NaiveDate::from_ymd_opt(1985, 11, 2);
        patient.blood_group = Some("O+".into());

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);

        let by_number = db
            .get_patient_by_number(&patient.patient_number)
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, patient.id);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = Patient::new("John Doe".into(), Gender::Male);
        db.insert_patient(&patient).unwrap();

        patient.phone = Some("555-0100".into());
        patient.address = Some("12 Harbour Rd".into());
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.phone, Some("555-0100".into()));
        assert_eq!(retrieved.address, Some("12 Harbour Rd".into()));
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        let mut with_phone = Patient::new("Luna Park".into(), Gender::Female);
        with_phone.phone = Some("555-0199".into());
        db.insert_patient(&Patient::new("Max Weber".into(), Gender::Male)).unwrap();
        db.insert_patient(&Patient::new("Maxine Ortiz".into(), Gender::Female)).unwrap();
        db.insert_patient(&with_phone).unwrap();

        let results = db.search_patients("Max", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.name == "Max Weber"));
        assert!(results.iter().any(|p| p.name == "Maxine Ortiz"));

        let by_phone = db.search_patients("0199", 10).unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "Luna Park");
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let db = setup_db();
        db.insert_patient(&Patient::new("Ann Lee".into(), Gender::Female)).unwrap();
        db.insert_patient(&Patient::new("Bo_Chen".into(), Gender::Male)).unwrap();

        assert!(db.search_patients("%", 10).unwrap().is_empty());
        assert!(db.search_patients("A_n", 10).unwrap().is_empty());

        let underscore = db.search_patients("_", 10).unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].name, "Bo_Chen");
    }

    #[test]
    fn test_delete_patient() {
        let db = setup_db();
        let patient = Patient::new("Temp".into(), Gender::Other);
        db.insert_patient(&patient).unwrap();

        assert!(db.delete_patient(&patient.id).unwrap());
        assert!(!db.delete_patient(&patient.id).unwrap());
        assert!(db.get_patient(&patient.id).unwrap().is_none());
    }
}
