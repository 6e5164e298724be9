//! Fetching the rows a report run needs.

use super::{Database, DbResult};
use crate::reports::{DateRange, ReportRows};

impl Database {
    /// Snapshot of every record a report over `range` can touch.
    ///
    /// Doctors and the lab catalog are loaded whole; dated records are
    /// restricted to the range.
    pub fn load_report_rows(&self, range: DateRange) -> DbResult<ReportRows> {
        Ok(ReportRows {
            doctors: self.list_doctors(false)?,
            appointments: self.list_appointments_between(range.from, range.to)?,
            invoices: self.list_invoices_between(range.from, range.to)?,
            prescriptions: self.list_prescriptions_between(range.from, range.to)?,
            lab_orders: self.list_lab_orders_between(range.from, range.to)?,
            lab_tests: self.list_lab_tests()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Doctor, Gender, Patient};
    use chrono::NaiveDate;

    #[test]
    fn test_rows_limited_to_range() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Zoe".into(), Gender::Female);
        let doctor = Doctor::new("Dr. Ng".into(), "GP".into(), "General".into());
        db.insert_patient(&patient).unwrap();
        db.insert_doctor(&doctor).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
        for d in [1, 15, 30] {
            db.insert_appointment(&Appointment::new(
                patient.id.clone(),
                doctor.id.clone(),
                day(d),
                "11:00".into(),
            ))
            .unwrap();
        }

        let rows = db
            .load_report_rows(DateRange::new(day(10), day(20)).unwrap())
            .unwrap();
        assert_eq!(rows.doctors.len(), 1);
        assert_eq!(rows.appointments.len(), 1);
        assert!(rows.invoices.is_empty());
    }
}
