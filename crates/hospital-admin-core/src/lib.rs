//! Hospital Admin Core Library
//!
//! Administration back office for a small hospital: patient records,
//! scheduling, beds, billing, laboratory and reporting over SQLite.
//!
//! # Architecture
//!
//! ```text
//!   CLI / UI
//!      │
//!      ▼
//!  HospitalCore ──► models (validation) ──► db (SQLite, migrations)
//!      │                                      │
//!      ├─► billing  (invoice totals, payments) │
//!      ├─► beds     (occupancy vs catalog)     ├─► audit (hash chain)
//!      └─► reports  (rollups, CSV)  ◄──────────┘
//! ```
//!
//! `billing`, `beds` and `reports` are pure: they work on values fetched by
//! [`db`] and never touch storage themselves.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, Invoice, Bed, etc.)
//! - [`billing`]: Invoice totals and payment application
//! - [`beds`]: Bed occupancy aggregation
//! - [`reports`]: Report statistics and CSV export
//! - [`audit`]: Hash-chained audit log
//! - [`config`]: TOML configuration

pub mod audit;
pub mod beds;
pub mod billing;
pub mod config;
pub mod db;
pub mod models;
pub mod reports;
pub mod search;

// Re-export commonly used types
pub use audit::{AuditAction, AuditLog, AuditVerification};
pub use beds::{aggregate_beds, BedCatalog, BedOccupancy, BedTypeConfig};
pub use billing::{
    apply_payment, compute_invoice_totals, BillingError, InvoiceDraft, LineItemInput,
    PaymentOutcome,
};
pub use config::AppConfig;
pub use db::{AuditEntry, Database};
pub use models::{
    Appointment, AppointmentStatus, Bed, BedStatus, Doctor, Gender, HospitalSettings, Invoice,
    LabOrder, LabTest, Patient, Payment, PaymentMethod, PaymentStatus, Prescription,
};
pub use reports::{build_report, DateRange, ReportFilter, ReportKind, ReportModel};

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

// =========================================================================
// Error Type
// =========================================================================

/// Errors surfaced to callers of [`HospitalCore`].
///
/// Validation, not-found and conflict messages are meant for the user.
/// Storage failures are logged in full and reported generically.
#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A storage error occurred; check the logs for details")]
    Storage,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type HospitalResult<T> = Result<T, HospitalError>;

impl From<db::DbError> for HospitalError {
    fn from(e: db::DbError) -> Self {
        if e.is_constraint_violation() {
            tracing::debug!(error = %e, "constraint violation");
            return HospitalError::Conflict(
                "the change conflicts with existing records".to_string(),
            );
        }
        if let db::DbError::NotFound(what) = &e {
            return HospitalError::NotFound(what.clone());
        }
        tracing::error!(error = %e, "storage failure");
        HospitalError::Storage
    }
}

impl From<models::ValidationError> for HospitalError {
    fn from(e: models::ValidationError) -> Self {
        HospitalError::Validation(e.to_string())
    }
}

impl From<BillingError> for HospitalError {
    fn from(e: BillingError) -> Self {
        HospitalError::Validation(e.to_string())
    }
}

impl From<reports::ReportError> for HospitalError {
    fn from(e: reports::ReportError) -> Self {
        match e {
            reports::ReportError::UnknownDoctor(id) => {
                HospitalError::NotFound(format!("doctor {}", id))
            }
            other => HospitalError::Validation(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for HospitalError {
    fn from(e: config::ConfigError) -> Self {
        HospitalError::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HospitalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        tracing::error!(error = %e, "database lock poisoned");
        HospitalError::Storage
    }
}

fn not_found(entity: &str, id: &str) -> HospitalError {
    HospitalError::NotFound(format!("{} {}", entity, id))
}

/// Outcome of [`HospitalCore::record_payment`].
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub invoice: Invoice,
    /// `None` when nothing was applied (zero amount or already settled)
    pub payment: Option<Payment>,
    /// Amount beyond the outstanding balance, to be returned or credited
    pub excess: Decimal,
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe entry point over one database.
pub struct HospitalCore {
    db: Arc<Mutex<Database>>,
    config: AppConfig,
}

impl HospitalCore {
    /// Open (and migrate) the database named in `config`.
    pub fn open(config: AppConfig) -> HospitalResult<Self> {
        config.validate()?;
        let db = Database::open(&config.database.path)?;
        tracing::info!(path = %config.database.path.display(), "opened database");
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    /// In-memory database (for testing).
    pub fn open_in_memory(config: AppConfig) -> HospitalResult<Self> {
        config.validate()?;
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn register_patient(&self, mut patient: Patient, actor: &str) -> HospitalResult<Patient> {
        patient.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            while db.get_patient_by_number(&patient.patient_number)?.is_some() {
                patient.patient_number = Patient::fresh_number();
            }
            db.insert_patient(&patient)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "patient",
                &patient.id,
                actor,
                json!({ "patient_number": patient.patient_number, "name": patient.name }),
            )?;
            Ok(patient)
        })
    }

    /// Save edits to a patient.
    pub fn update_patient(&self, mut patient: Patient, actor: &str) -> HospitalResult<Patient> {
        patient.validate()?;
        patient.touch();
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            if !db.update_patient(&patient)? {
                return Err(not_found("patient", &patient.id));
            }
            AuditLog::new(db).record(AuditAction::Update, "patient", &patient.id, actor, json!({}))?;
            Ok(patient)
        })
    }

    pub fn get_patient(&self, id: &str) -> HospitalResult<Option<Patient>> {
        let db = self.db.lock()?;
        Ok(db.get_patient(id)?)
    }

    /// Substring matches on name, number or phone, then close name matches.
    pub fn search_patients(&self, query: &str, limit: usize) -> HospitalResult<Vec<Patient>> {
        let db = self.db.lock()?;
        let exact = db.search_patients(query, limit)?;
        if exact.len() >= limit || query.trim().is_empty() {
            return Ok(exact);
        }
        let candidates = db.list_patients()?;
        Ok(search::rank_patients(query, exact, candidates, limit))
    }

    pub fn list_patients(&self) -> HospitalResult<Vec<Patient>> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?)
    }

    /// Delete a patient. Refused while they occupy a bed or have invoices.
    pub fn delete_patient(&self, id: &str, actor: &str) -> HospitalResult<()> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            if db.get_bed_for_patient(id)?.is_some() {
                return Err(HospitalError::Conflict(
                    "patient still occupies a bed".to_string(),
                ));
            }
            if !db.delete_patient(id)? {
                return Err(not_found("patient", id));
            }
            AuditLog::new(db).record(AuditAction::Delete, "patient", id, actor, json!({}))?;
            Ok(())
        })
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    pub fn add_doctor(&self, doctor: Doctor, actor: &str) -> HospitalResult<Doctor> {
        doctor.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            db.insert_doctor(&doctor)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "doctor",
                &doctor.id,
                actor,
                json!({ "name": doctor.name, "department": doctor.department }),
            )?;
            Ok(doctor)
        })
    }

    pub fn update_doctor(&self, mut doctor: Doctor, actor: &str) -> HospitalResult<Doctor> {
        doctor.validate()?;
        doctor.touch();
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            if !db.update_doctor(&doctor)? {
                return Err(not_found("doctor", &doctor.id));
            }
            AuditLog::new(db).record(
                AuditAction::Update,
                "doctor",
                &doctor.id,
                actor,
                json!({ "active": doctor.active }),
            )?;
            Ok(doctor)
        })
    }

    pub fn get_doctor(&self, id: &str) -> HospitalResult<Option<Doctor>> {
        let db = self.db.lock()?;
        Ok(db.get_doctor(id)?)
    }

    pub fn list_doctors(&self, active_only: bool) -> HospitalResult<Vec<Doctor>> {
        let db = self.db.lock()?;
        Ok(db.list_doctors(active_only)?)
    }

    pub fn list_departments(&self) -> HospitalResult<Vec<String>> {
        let db = self.db.lock()?;
        Ok(db.list_departments()?)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment. The doctor must be active and free at that time.
    pub fn book_appointment(
        &self,
        appointment: Appointment,
        actor: &str,
    ) -> HospitalResult<Appointment> {
        appointment.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let doctor = db
                .get_doctor(&appointment.doctor_id)?
                .ok_or_else(|| not_found("doctor", &appointment.doctor_id))?;
            if !doctor.active {
                return Err(HospitalError::Validation(format!(
                    "{} is not taking appointments",
                    doctor.name
                )));
            }
            if db.get_patient(&appointment.patient_id)?.is_none() {
                return Err(not_found("patient", &appointment.patient_id));
            }

            let clash = db
                .list_doctor_appointments_on(&doctor.id, appointment.date)?
                .into_iter()
                .any(|a| a.time == appointment.time && a.status != AppointmentStatus::Cancelled);
            if clash {
                return Err(HospitalError::Conflict(format!(
                    "{} already has an appointment at {} on {}",
                    doctor.name, appointment.time, appointment.date
                )));
            }

            db.insert_appointment(&appointment)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "appointment",
                &appointment.id,
                actor,
                json!({ "date": appointment.date, "time": appointment.time }),
            )?;
            Ok(appointment)
        })
    }

    pub fn set_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        actor: &str,
    ) -> HospitalResult<Appointment> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut appointment = db
                .get_appointment(id)?
                .ok_or_else(|| not_found("appointment", id))?;
            appointment.transition(status)?;
            db.update_appointment(&appointment)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "appointment",
                id,
                actor,
                json!({ "status": status.as_str() }),
            )?;
            Ok(appointment)
        })
    }

    pub fn list_appointments(&self, range: DateRange) -> HospitalResult<Vec<Appointment>> {
        let db = self.db.lock()?;
        Ok(db.list_appointments_between(range.from, range.to)?)
    }

    // =========================================================================
    // Bed Operations
    // =========================================================================

    /// Register a bed of a configured type.
    pub fn register_bed(&self, bed: Bed, actor: &str) -> HospitalResult<Bed> {
        bed.validate()?;
        if !self.config.bed_catalog().contains(&bed.bed_type) {
            return Err(HospitalError::Validation(format!(
                "unknown bed type '{}'",
                bed.bed_type
            )));
        }
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            db.insert_bed(&bed)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "bed",
                &bed.id,
                actor,
                json!({ "bed_number": bed.bed_number, "bed_type": bed.bed_type }),
            )?;
            Ok(bed)
        })
    }

    /// Put a patient in a bed.
    pub fn assign_bed(&self, bed_id: &str, patient_id: &str, actor: &str) -> HospitalResult<Bed> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut bed = db.get_bed(bed_id)?.ok_or_else(|| not_found("bed", bed_id))?;
            if db.get_patient(patient_id)?.is_none() {
                return Err(not_found("patient", patient_id));
            }
            if let Some(current) = db.get_bed_for_patient(patient_id)? {
                return Err(HospitalError::Conflict(format!(
                    "patient already occupies bed {}",
                    current.bed_number
                )));
            }
            bed.assign(patient_id.to_string())?;
            db.update_bed(&bed)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "bed",
                bed_id,
                actor,
                json!({ "status": "occupied", "patient_id": patient_id }),
            )?;
            Ok(bed)
        })
    }

    /// Discharge the bed's patient.
    pub fn release_bed(&self, bed_id: &str, actor: &str) -> HospitalResult<Bed> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut bed = db.get_bed(bed_id)?.ok_or_else(|| not_found("bed", bed_id))?;
            let patient_id = bed.patient_id.clone();
            bed.release()?;
            db.update_bed(&bed)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "bed",
                bed_id,
                actor,
                json!({ "status": "available", "released_patient_id": patient_id }),
            )?;
            Ok(bed)
        })
    }

    /// Move a bed into maintenance, reservation or back to available.
    pub fn set_bed_status(
        &self,
        bed_id: &str,
        status: BedStatus,
        actor: &str,
    ) -> HospitalResult<Bed> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut bed = db.get_bed(bed_id)?.ok_or_else(|| not_found("bed", bed_id))?;
            bed.set_status(status)?;
            db.update_bed(&bed)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "bed",
                bed_id,
                actor,
                json!({ "status": status.as_str() }),
            )?;
            Ok(bed)
        })
    }

    pub fn list_beds(&self) -> HospitalResult<Vec<Bed>> {
        let db = self.db.lock()?;
        Ok(db.list_beds()?)
    }

    /// Occupancy of all registered beds against the configured catalog.
    pub fn bed_occupancy(&self) -> HospitalResult<BedOccupancy> {
        let beds = self.list_beds()?;
        Ok(aggregate_beds(&self.config.bed_catalog(), &beds))
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Price configured service codes at list price.
    pub fn service_line_items(&self, selections: &[(&str, u32)]) -> HospitalResult<Vec<LineItemInput>> {
        Ok(self.config.service_catalog().line_items(selections)?)
    }

    /// Create an invoice from a draft.
    pub fn create_invoice(&self, draft: &InvoiceDraft, actor: &str) -> HospitalResult<Invoice> {
        let db = self.db.lock()?;
        let settings = db.load_settings(&self.config.default_settings())?;
        db.with_transaction(|db| {
            if db.get_patient(&draft.patient_id)?.is_none() {
                return Err(not_found("patient", &draft.patient_id));
            }
            let sequence = db.next_invoice_sequence(draft.invoice_date)?;
            let invoice = billing::create_invoice(draft, settings.default_tax_rate, sequence)?;
            db.insert_invoice(&invoice)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "invoice",
                &invoice.id,
                actor,
                json!({
                    "invoice_number": invoice.invoice_number,
                    "total_amount": invoice.total_amount,
                }),
            )?;
            tracing::info!(
                invoice = %invoice.invoice_number,
                total = %invoice.total_amount,
                "invoice created"
            );
            Ok(invoice)
        })
    }

    /// Replace an invoice's lines and adjustments.
    pub fn revise_invoice(
        &self,
        invoice_id: &str,
        draft: &InvoiceDraft,
        actor: &str,
    ) -> HospitalResult<Invoice> {
        let db = self.db.lock()?;
        let settings = db.load_settings(&self.config.default_settings())?;
        db.with_transaction(|db| {
            let existing = db
                .get_invoice(invoice_id)?
                .ok_or_else(|| not_found("invoice", invoice_id))?;
            let revised = billing::revise_invoice(&existing, draft, settings.default_tax_rate)?;
            db.update_invoice(&revised)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "invoice",
                invoice_id,
                actor,
                json!({
                    "previous_total": existing.total_amount,
                    "total_amount": revised.total_amount,
                }),
            )?;
            Ok(revised)
        })
    }

    pub fn get_invoice(&self, id: &str) -> HospitalResult<Option<Invoice>> {
        let db = self.db.lock()?;
        Ok(db.get_invoice(id)?)
    }

    pub fn get_invoice_by_number(&self, invoice_number: &str) -> HospitalResult<Option<Invoice>> {
        let db = self.db.lock()?;
        Ok(db.get_invoice_by_number(invoice_number)?)
    }

    pub fn list_invoices(&self, range: DateRange) -> HospitalResult<Vec<Invoice>> {
        let db = self.db.lock()?;
        Ok(db.list_invoices_between(range.from, range.to)?)
    }

    pub fn list_patient_invoices(&self, patient_id: &str) -> HospitalResult<Vec<Invoice>> {
        let db = self.db.lock()?;
        Ok(db.list_patient_invoices(patient_id)?)
    }

    /// Invoices with money owed whose due date is before `today`.
    pub fn list_overdue_invoices(
        &self,
        range: DateRange,
        today: NaiveDate,
    ) -> HospitalResult<Vec<Invoice>> {
        Ok(self
            .list_invoices(range)?
            .into_iter()
            .filter(|i| i.is_overdue(today))
            .collect())
    }

    /// Apply a payment, persist it and the invoice's new status atomically.
    pub fn record_payment(
        &self,
        invoice_id: &str,
        amount: Decimal,
        method: PaymentMethod,
        reference: Option<String>,
        actor: &str,
    ) -> HospitalResult<PaymentReceipt> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut invoice = db
                .get_invoice(invoice_id)?
                .ok_or_else(|| not_found("invoice", invoice_id))?;
            let outcome = apply_payment(&invoice, amount)?;

            if outcome.applied.is_zero() {
                return Ok(PaymentReceipt {
                    invoice,
                    payment: None,
                    excess: outcome.excess,
                });
            }

            invoice.paid_amount = outcome.paid_amount;
            invoice.payment_status = outcome.status;
            invoice.updated_at = chrono::Utc::now().to_rfc3339();
            db.update_invoice_payment(&invoice)?;

            let mut payment = Payment::new(invoice.id.clone(), outcome.applied, method);
            payment.reference = reference;
            db.insert_payment(&payment)?;

            AuditLog::new(db).record(
                AuditAction::Payment,
                "invoice",
                invoice_id,
                actor,
                json!({
                    "payment_id": payment.id,
                    "amount": outcome.applied,
                    "method": method.as_str(),
                    "paid_amount": invoice.paid_amount,
                    "status": invoice.payment_status.as_str(),
                }),
            )?;
            tracing::info!(
                invoice = %invoice.invoice_number,
                applied = %outcome.applied,
                excess = %outcome.excess,
                status = %invoice.payment_status,
                "payment recorded"
            );

            Ok(PaymentReceipt {
                invoice,
                payment: Some(payment),
                excess: outcome.excess,
            })
        })
    }

    pub fn list_payments(&self, invoice_id: &str) -> HospitalResult<Vec<Payment>> {
        let db = self.db.lock()?;
        Ok(db.list_payments(invoice_id)?)
    }

    /// Delete an invoice that has not received any payment.
    pub fn delete_invoice(&self, invoice_id: &str, actor: &str) -> HospitalResult<()> {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let invoice = db
                .get_invoice(invoice_id)?
                .ok_or_else(|| not_found("invoice", invoice_id))?;
            if invoice.paid_amount > Decimal::ZERO {
                return Err(HospitalError::Conflict(format!(
                    "invoice {} has payments recorded",
                    invoice.invoice_number
                )));
            }
            db.delete_invoice(invoice_id)?;
            AuditLog::new(db).record(
                AuditAction::Delete,
                "invoice",
                invoice_id,
                actor,
                json!({ "invoice_number": invoice.invoice_number }),
            )?;
            Ok(())
        })
    }

    // =========================================================================
    // Laboratory Operations
    // =========================================================================

    pub fn upsert_lab_test(&self, test: LabTest, actor: &str) -> HospitalResult<LabTest> {
        test.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            db.upsert_lab_test(&test)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "lab_test",
                &test.code,
                actor,
                json!({ "price": test.price, "active": test.active }),
            )?;
            Ok(test)
        })
    }

    pub fn list_lab_tests(&self) -> HospitalResult<Vec<LabTest>> {
        let db = self.db.lock()?;
        Ok(db.list_lab_tests()?)
    }

    /// Order an active catalog test for a patient.
    pub fn order_lab_test(&self, order: LabOrder, actor: &str) -> HospitalResult<LabOrder> {
        order.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let test = db
                .get_lab_test(&order.test_code)?
                .ok_or_else(|| not_found("lab test", &order.test_code))?;
            if !test.active {
                return Err(HospitalError::Validation(format!(
                    "lab test {} is no longer offered",
                    test.code
                )));
            }
            db.insert_lab_order(&order)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "lab_order",
                &order.id,
                actor,
                json!({ "test_code": order.test_code }),
            )?;
            Ok(order)
        })
    }

    pub fn start_lab_order(&self, id: &str, actor: &str) -> HospitalResult<LabOrder> {
        self.update_lab_order(id, actor, |order| order.start())
    }

    pub fn complete_lab_order(
        &self,
        id: &str,
        result: String,
        actor: &str,
    ) -> HospitalResult<LabOrder> {
        self.update_lab_order(id, actor, |order| order.complete(result))
    }

    pub fn cancel_lab_order(&self, id: &str, actor: &str) -> HospitalResult<LabOrder> {
        self.update_lab_order(id, actor, |order| order.cancel())
    }

    fn update_lab_order<F>(&self, id: &str, actor: &str, change: F) -> HospitalResult<LabOrder>
    where
        F: FnOnce(&mut LabOrder) -> models::ValidationResult,
    {
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            let mut order = db
                .get_lab_order(id)?
                .ok_or_else(|| not_found("lab order", id))?;
            change(&mut order)?;
            db.update_lab_order(&order)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "lab_order",
                id,
                actor,
                json!({ "status": order.status.as_str() }),
            )?;
            Ok(order)
        })
    }

    pub fn list_open_lab_orders(&self) -> HospitalResult<Vec<LabOrder>> {
        let db = self.db.lock()?;
        Ok(db.list_open_lab_orders()?)
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    pub fn prescribe(&self, prescription: Prescription, actor: &str) -> HospitalResult<Prescription> {
        prescription.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            db.insert_prescription(&prescription)?;
            AuditLog::new(db).record(
                AuditAction::Create,
                "prescription",
                &prescription.id,
                actor,
                json!({ "medicine": prescription.medicine, "quantity": prescription.quantity }),
            )?;
            Ok(prescription)
        })
    }

    pub fn list_patient_prescriptions(&self, patient_id: &str) -> HospitalResult<Vec<Prescription>> {
        let db = self.db.lock()?;
        Ok(db.list_patient_prescriptions(patient_id)?)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Stored settings over the configured defaults.
    pub fn settings(&self) -> HospitalResult<HospitalSettings> {
        let db = self.db.lock()?;
        Ok(db.load_settings(&self.config.default_settings())?)
    }

    pub fn update_settings(
        &self,
        settings: HospitalSettings,
        actor: &str,
    ) -> HospitalResult<HospitalSettings> {
        settings.validate()?;
        let db = self.db.lock()?;
        db.with_transaction(|db| {
            db.save_settings(&settings)?;
            AuditLog::new(db).record(
                AuditAction::Update,
                "settings",
                "hospital",
                actor,
                serde_json::to_value(&settings).map_err(db::DbError::from)?,
            )?;
            Ok(settings)
        })
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn build_report(
        &self,
        kind: ReportKind,
        range: DateRange,
        filter: &ReportFilter,
    ) -> HospitalResult<ReportModel> {
        let rows = {
            let db = self.db.lock()?;
            db.load_report_rows(range)?
        };
        Ok(build_report(kind, range, filter, &rows)?)
    }

    /// Build a report and render it as CSV. Returns `(file_name, contents)`.
    pub fn export_report_csv(
        &self,
        kind: ReportKind,
        range: DateRange,
        filter: &ReportFilter,
    ) -> HospitalResult<(String, String)> {
        let report = self.build_report(kind, range, filter)?;
        Ok((report.csv_file_name(), report.to_csv()))
    }

    // =========================================================================
    // Audit
    // =========================================================================

    pub fn verify_audit_log(&self) -> HospitalResult<AuditVerification> {
        let db = self.db.lock()?;
        Ok(AuditLog::new(&db).verify_chain()?)
    }

    pub fn audit_history(&self, entity: &str, entity_id: &str) -> HospitalResult<Vec<AuditEntry>> {
        let db = self.db.lock()?;
        Ok(AuditLog::new(&db).history(entity, entity_id)?)
    }

    pub fn audit_entries(&self) -> HospitalResult<Vec<AuditEntry>> {
        let db = self.db.lock()?;
        Ok(AuditLog::new(&db).entries()?)
    }
}
