//! Invoice and payment flow through the facade.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use hospital_admin_core::{
    AppConfig, Gender, HospitalCore, HospitalError, HospitalSettings, InvoiceDraft,
    LineItemInput, Patient, PaymentMethod, PaymentStatus,
};

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn invoice_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
}

fn setup() -> (HospitalCore, Patient) {
    let core = HospitalCore::open_in_memory(AppConfig::default()).unwrap();
    let patient = core
        .register_patient(Patient::new("Grace Mbeki".into(), Gender::Female), "reception")
        .unwrap();
    (core, patient)
}

fn draft_for(patient: &Patient) -> InvoiceDraft {
    let mut draft = InvoiceDraft::new(
        patient.id.clone(),
        vec![
            LineItemInput::new("Consultation", 1, cents(5000)),
            LineItemInput::new("Blood panel", 2, cents(2250)),
        ],
        invoice_date(),
    );
    draft.tax_amount = Some(cents(950));
    draft.discount_amount = cents(500);
    draft
}

#[test]
fn test_invoice_totals_persisted() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();

    assert_eq!(invoice.subtotal, cents(9500));
    assert_eq!(invoice.total_amount, cents(9950));
    assert_eq!(invoice.payment_status, PaymentStatus::Pending);
    assert_eq!(invoice.invoice_number, "INV-20240402-0001");

    let stored = core.get_invoice(&invoice.id).unwrap().unwrap();
    assert_eq!(stored, invoice);
}

#[test]
fn test_same_day_invoices_numbered_in_sequence() {
    let (core, patient) = setup();
    let numbers: Vec<String> = (0..3)
        .map(|_| {
            core.create_invoice(&draft_for(&patient), "billing")
                .unwrap()
                .invoice_number
        })
        .collect();
    assert_eq!(
        numbers,
        vec!["INV-20240402-0001", "INV-20240402-0002", "INV-20240402-0003"]
    );

    let mut next_day = draft_for(&patient);
    next_day.invoice_date = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
    let invoice = core.create_invoice(&next_day, "billing").unwrap();
    assert_eq!(invoice.invoice_number, "INV-20240403-0001");
    assert_eq!(
        core.get_invoice_by_number("INV-20240402-0002").unwrap().unwrap().patient_id,
        patient.id
    );
}

#[test]
fn test_sub_cent_price_rejected() {
    let (core, patient) = setup();
    let draft = InvoiceDraft::new(
        patient.id.clone(),
        vec![LineItemInput::new("Cotton swab", 3, Decimal::new(5, 3))],
        invoice_date(),
    );
    let err = core.create_invoice(&draft, "billing").unwrap_err();
    assert!(matches!(err, HospitalError::Validation(_)));
}

#[test]
fn test_partial_then_full_payment() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();

    let first = core
        .record_payment(&invoice.id, cents(4000), PaymentMethod::Cash, None, "cashier")
        .unwrap();
    assert_eq!(first.invoice.payment_status, PaymentStatus::PartiallyPaid);
    assert_eq!(first.invoice.balance_due(), cents(5950));

    let second = core
        .record_payment(
            &invoice.id,
            cents(5950),
            PaymentMethod::Card,
            Some("slip-1182".into()),
            "cashier",
        )
        .unwrap();
    assert_eq!(second.invoice.payment_status, PaymentStatus::Paid);
    assert_eq!(second.invoice.paid_amount, second.invoice.total_amount);
    assert!(second.excess.is_zero());

    let payments = core.list_payments(&invoice.id).unwrap();
    assert_eq!(payments.len(), 2);
    let sum: Decimal = payments.iter().map(|p| p.amount).sum();
    assert_eq!(sum, second.invoice.paid_amount);
}

#[test]
fn test_overpayment_clamped_and_reported() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();

    let receipt = core
        .record_payment(&invoice.id, cents(10000), PaymentMethod::Cash, None, "cashier")
        .unwrap();
    assert_eq!(receipt.invoice.paid_amount, cents(9950));
    assert_eq!(receipt.excess, cents(50));
    assert_eq!(receipt.payment.unwrap().amount, cents(9950));
}

#[test]
fn test_zero_payment_is_noop() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();
    core.record_payment(&invoice.id, cents(1000), PaymentMethod::Cash, None, "cashier")
        .unwrap();

    let receipt = core
        .record_payment(&invoice.id, Decimal::ZERO, PaymentMethod::Cash, None, "cashier")
        .unwrap();
    assert!(receipt.payment.is_none());
    assert_eq!(receipt.invoice.paid_amount, cents(1000));
    assert_eq!(receipt.invoice.payment_status, PaymentStatus::PartiallyPaid);
    assert_eq!(core.list_payments(&invoice.id).unwrap().len(), 1);
}

#[test]
fn test_negative_payment_rejected() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();

    let err = core
        .record_payment(&invoice.id, cents(-100), PaymentMethod::Cash, None, "cashier")
        .unwrap_err();
    assert!(matches!(err, HospitalError::Validation(_)));
    assert!(core.list_payments(&invoice.id).unwrap().is_empty());
}

#[test]
fn test_empty_invoice_rejected() {
    let (core, patient) = setup();
    let draft = InvoiceDraft::new(patient.id.clone(), vec![], invoice_date());

    match core.create_invoice(&draft, "billing") {
        Err(HospitalError::Validation(message)) => {
            assert_eq!(message, "at least one item required")
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_default_tax_rate_from_settings() {
    let (core, patient) = setup();
    core.update_settings(
        HospitalSettings {
            default_tax_rate: Decimal::new(10, 0),
            ..HospitalSettings::default()
        },
        "admin",
    )
    .unwrap();

    let mut draft = draft_for(&patient);
    draft.tax_amount = None;
    draft.discount_amount = Decimal::ZERO;
    let invoice = core.create_invoice(&draft, "billing").unwrap();

    assert_eq!(invoice.tax_amount, cents(950));
    assert_eq!(invoice.total_amount, cents(10450));
}

#[test]
fn test_revision_cannot_drop_below_paid() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();
    core.record_payment(&invoice.id, cents(8000), PaymentMethod::Insurance, None, "cashier")
        .unwrap();

    let mut smaller = draft_for(&patient);
    smaller.items.truncate(1);
    let err = core.revise_invoice(&invoice.id, &smaller, "billing").unwrap_err();
    assert!(matches!(err, HospitalError::Validation(_)));

    let mut larger = draft_for(&patient);
    larger.items.push(LineItemInput::new("Dressing", 1, cents(1500)));
    let revised = core.revise_invoice(&invoice.id, &larger, "billing").unwrap();
    assert_eq!(revised.invoice_number, invoice.invoice_number);
    assert_eq!(revised.paid_amount, cents(8000));
    assert_eq!(revised.payment_status, PaymentStatus::PartiallyPaid);
    assert_eq!(core.get_invoice(&invoice.id).unwrap().unwrap().items.len(), 3);
}

#[test]
fn test_paid_invoice_cannot_be_deleted() {
    let (core, patient) = setup();
    let unpaid = core.create_invoice(&draft_for(&patient), "billing").unwrap();
    let paid = core.create_invoice(&draft_for(&patient), "billing").unwrap();
    core.record_payment(&paid.id, cents(100), PaymentMethod::Cash, None, "cashier")
        .unwrap();

    core.delete_invoice(&unpaid.id, "billing").unwrap();
    assert!(core.get_invoice(&unpaid.id).unwrap().is_none());

    let err = core.delete_invoice(&paid.id, "billing").unwrap_err();
    assert!(matches!(err, HospitalError::Conflict(_)));
}

#[test]
fn test_service_catalog_line_items() {
    let (core, patient) = setup();
    let items = core
        .service_line_items(&[("CONSULT", 1), ("xray", 2)])
        .unwrap();
    let invoice = core
        .create_invoice(&InvoiceDraft::new(patient.id.clone(), items, invoice_date()), "billing")
        .unwrap();
    assert_eq!(invoice.subtotal, cents(21000));

    assert!(core.service_line_items(&[("MRI", 1)]).is_err());
}

#[test]
fn test_payments_are_audited_and_chain_verifies() {
    let (core, patient) = setup();
    let invoice = core.create_invoice(&draft_for(&patient), "billing").unwrap();
    core.record_payment(&invoice.id, cents(2000), PaymentMethod::Cash, None, "cashier")
        .unwrap();

    let history = core.audit_history("invoice", &invoice.id).unwrap();
    let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["create", "payment"]);
    assert_eq!(history[1].details["amount"], "20.00");

    assert!(core.verify_audit_log().unwrap().valid);
}

#[test]
fn test_overdue_listing() {
    let (core, patient) = setup();
    let mut draft = draft_for(&patient);
    draft.due_date = NaiveDate::from_ymd_opt(2024, 4, 16);
    let invoice = core.create_invoice(&draft, "billing").unwrap();

    let range = hospital_admin_core::DateRange::new(
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
    )
    .unwrap();
    let before_due = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    let after_due = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    assert!(core.list_overdue_invoices(range, before_due).unwrap().is_empty());
    assert_eq!(core.list_overdue_invoices(range, after_due).unwrap()[0].id, invoice.id);
}
