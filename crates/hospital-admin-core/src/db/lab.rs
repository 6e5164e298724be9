//! Laboratory database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{decimal_at, decimal_text, Database, DbResult};
use crate::models::{LabOrder, LabTest};

const LAB_ORDER_COLUMNS: &str = r#"
    id, patient_id, doctor_id, test_code, status, result, ordered_on,
    completed_at, created_at, updated_at
"#;

fn lab_test_from_row(row: &Row<'_>) -> rusqlite::Result<LabTest> {
    Ok(LabTest {
        code: row.get(0)?,
        name: row.get(1)?,
        price: decimal_at(row, 2)?,
        active: row.get(3)?,
    })
}

fn lab_order_from_row(row: &Row<'_>) -> rusqlite::Result<LabOrder> {
    Ok(LabOrder {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        test_code: row.get(3)?,
        status: row.get(4)?,
        result: row.get(5)?,
        ordered_on: row.get(6)?,
        completed_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl Database {
    /// Insert or replace a catalog test, keyed by code.
    pub fn upsert_lab_test(&self, test: &LabTest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO lab_tests (code, name, price, active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                active = excluded.active
            "#,
            params![test.code, test.name, decimal_text(&test.price), test.active],
        )?;
        Ok(())
    }

    /// Get a catalog test by code.
    pub fn get_lab_test(&self, code: &str) -> DbResult<Option<LabTest>> {
        self.conn
            .query_row(
                "SELECT code, name, price, active FROM lab_tests WHERE code = ?",
                [code],
                lab_test_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// The full test catalog, including retired tests.
    pub fn list_lab_tests(&self) -> DbResult<Vec<LabTest>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, name, price, active FROM lab_tests ORDER BY code")?;
        let rows = stmt.query_map([], lab_test_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a new lab order.
    pub fn insert_lab_order(&self, order: &LabOrder) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO lab_orders (
                id, patient_id, doctor_id, test_code, status, result, ordered_on,
                completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                order.id,
                order.patient_id,
                order.doctor_id,
                order.test_code,
                order.status,
                order.result,
                order.ordered_on,
                order.completed_at,
                order.created_at,
                order.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Persist status and result changes.
    pub fn update_lab_order(&self, order: &LabOrder) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE lab_orders SET
                doctor_id = ?2,
                status = ?3,
                result = ?4,
                completed_at = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                order.id,
                order.doctor_id,
                order.status,
                order.result,
                order.completed_at,
                order.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a lab order by ID.
    pub fn get_lab_order(&self, id: &str) -> DbResult<Option<LabOrder>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM lab_orders WHERE id = ?", LAB_ORDER_COLUMNS),
                [id],
                lab_order_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Orders placed within `[from, to]`.
    pub fn list_lab_orders_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<LabOrder>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM lab_orders
            WHERE ordered_on BETWEEN ?1 AND ?2
            ORDER BY ordered_on, created_at
            "#,
            LAB_ORDER_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to], lab_order_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Orders still waiting for a result, oldest first.
    pub fn list_open_lab_orders(&self) -> DbResult<Vec<LabOrder>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM lab_orders
            WHERE status IN ('pending', 'in_progress')
            ORDER BY ordered_on, created_at
            "#,
            LAB_ORDER_COLUMNS
        ))?;
        let rows = stmt.query_map([], lab_order_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, LabOrderStatus, Patient};
    use rust_decimal::Decimal;

    fn setup() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Omar".into(), Gender::Male);
        db.insert_patient(&patient).unwrap();
        db.upsert_lab_test(&LabTest::new("CBC".into(), "Complete blood count".into(), Decimal::new(1500, 2)))
            .unwrap();
        (db, patient)
    }

    #[test]
    fn test_upsert_replaces_price() {
        let (db, _) = setup();
        db.upsert_lab_test(&LabTest::new("CBC".into(), "Complete blood count".into(), Decimal::new(1800, 2)))
            .unwrap();

        let tests = db.list_lab_tests().unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].price, Decimal::new(1800, 2));
    }

    #[test]
    fn test_order_lifecycle_persisted() {
        let (db, patient) = setup();
        let mut order = LabOrder::new(
            patient.id.clone(),
            "CBC".into(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        );
        db.insert_lab_order(&order).unwrap();
        assert_eq!(db.list_open_lab_orders().unwrap().len(), 1);

        order.complete("normal".into()).unwrap();
        assert!(db.update_lab_order(&order).unwrap());

        let retrieved = db.get_lab_order(&order.id).unwrap().unwrap();
        assert_eq!(retrieved.status, LabOrderStatus::Completed);
        assert_eq!(retrieved.result.as_deref(), Some("normal"));
        assert!(db.list_open_lab_orders().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_test_code_rejected() {
        let (db, patient) = setup();
        let order = LabOrder::new(
            patient.id.clone(),
            "NOPE".into(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        );
        assert!(db.insert_lab_order(&order).unwrap_err().is_constraint_violation());
    }
}
