//! Building and revising invoices from form drafts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    compute_invoice_totals, payment_status, tax_from_rate, BillingError, BillingResult,
    InvoiceTotals, LineItemInput,
};
use crate::models::{require, Invoice};

/// Invoice form contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceDraft {
    pub patient_id: String,
    pub items: Vec<LineItemInput>,
    /// Explicit tax; `None` applies the default tax rate to the subtotal
    pub tax_amount: Option<Decimal>,
    pub discount_amount: Decimal,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl InvoiceDraft {
    pub fn new(patient_id: String, items: Vec<LineItemInput>, invoice_date: NaiveDate) -> Self {
        Self {
            patient_id,
            items,
            tax_amount: None,
            discount_amount: Decimal::ZERO,
            invoice_date,
            due_date: None,
            notes: None,
        }
    }

    fn check_dates(&self) -> BillingResult<()> {
        require("patient", &self.patient_id)?;
        if let Some(due) = self.due_date {
            if due < self.invoice_date {
                return Err(BillingError::DueBeforeInvoiceDate);
            }
        }
        Ok(())
    }

    /// Price the draft, applying the default rate to the rounded subtotal
    /// when no explicit tax was entered.
    fn totals(&self, default_tax_rate: Decimal) -> BillingResult<InvoiceTotals> {
        let tax = match self.tax_amount {
            Some(tax) => tax,
            None => {
                let untaxed = compute_invoice_totals(&self.items, Decimal::ZERO, Decimal::ZERO)?;
                tax_from_rate(untaxed.subtotal, default_tax_rate)
            }
        };
        compute_invoice_totals(&self.items, tax, self.discount_amount)
    }
}

/// Prefix shared by every invoice number issued on `invoice_date`.
pub fn invoice_number_prefix(invoice_date: NaiveDate) -> String {
    format!("INV-{}-", invoice_date.format("%Y%m%d"))
}

/// Human-facing invoice number: date plus the day's running sequence.
pub fn invoice_number(invoice_date: NaiveDate, sequence: u32) -> String {
    format!("{}{:04}", invoice_number_prefix(invoice_date), sequence)
}

/// Create a new unpaid invoice from a draft.
///
/// `sequence` is the invoice's position among those dated the same day.
pub fn create_invoice(
    draft: &InvoiceDraft,
    default_tax_rate: Decimal,
    sequence: u32,
) -> BillingResult<Invoice> {
    draft.check_dates()?;
    let totals = draft.totals(default_tax_rate)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    Ok(Invoice {
        invoice_number: invoice_number(draft.invoice_date, sequence),
        id,
        patient_id: draft.patient_id.clone(),
        items: totals.items,
        subtotal: totals.subtotal,
        tax_amount: totals.tax_amount,
        discount_amount: totals.discount_amount,
        total_amount: totals.total_amount,
        paid_amount: Decimal::ZERO,
        payment_status: payment_status(Decimal::ZERO, totals.total_amount),
        invoice_date: draft.invoice_date,
        due_date: draft.due_date,
        notes: draft.notes.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Replace an invoice's lines and adjustments, keeping identity and payments.
///
/// The new total may not drop below what has already been paid.
pub fn revise_invoice(
    existing: &Invoice,
    draft: &InvoiceDraft,
    default_tax_rate: Decimal,
) -> BillingResult<Invoice> {
    draft.check_dates()?;
    let totals = draft.totals(default_tax_rate)?;

    if totals.total_amount < existing.paid_amount {
        return Err(BillingError::TotalBelowPaid {
            total: totals.total_amount,
            paid: existing.paid_amount,
        });
    }

    Ok(Invoice {
        id: existing.id.clone(),
        invoice_number: existing.invoice_number.clone(),
        patient_id: draft.patient_id.clone(),
        items: totals.items,
        subtotal: totals.subtotal,
        tax_amount: totals.tax_amount,
        discount_amount: totals.discount_amount,
        total_amount: totals.total_amount,
        paid_amount: existing.paid_amount,
        payment_status: payment_status(existing.paid_amount, totals.total_amount),
        invoice_date: draft.invoice_date,
        due_date: draft.due_date,
        notes: draft.notes.clone(),
        created_at: existing.created_at.clone(),
        updated_at: chrono::Utc::now().to_rfc3339(),
    })
}
