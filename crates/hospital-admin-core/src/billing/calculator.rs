//! Invoice arithmetic: totals, payment status, payment application.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{BillingError, BillingResult};
use crate::models::{Invoice, InvoiceItem, PaymentStatus};

/// A line as submitted on the invoice form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItemInput {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// Result of [`compute_invoice_totals`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    /// Priced lines in submission order
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Result of [`apply_payment`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub paid_amount: Decimal,
    pub status: PaymentStatus,
    /// Portion of the payment that went against the balance
    pub applied: Decimal,
    /// Portion beyond the balance (change to return or credit)
    pub excess: Decimal,
}

/// Round to cents, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price the lines and derive subtotal and total.
///
/// `subtotal = Σ quantity * unit_price` and `total = subtotal + tax - discount`.
/// Unit prices must be whole cents, so the subtotal is the exact sum of the
/// lines. Rejects an empty item list, malformed lines, negative adjustments
/// and a total that is not strictly positive.
pub fn compute_invoice_totals(
    items: &[LineItemInput],
    tax_amount: Decimal,
    discount_amount: Decimal,
) -> BillingResult<InvoiceTotals> {
    if items.is_empty() {
        return Err(BillingError::EmptyItems);
    }

    let mut priced = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for (index, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            return Err(BillingError::InvalidItem {
                line: index + 1,
                reason: "description is required".into(),
            });
        }
        if item.quantity == 0 {
            return Err(BillingError::InvalidItem {
                line: index + 1,
                reason: "quantity must be at least 1".into(),
            });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(BillingError::InvalidItem {
                line: index + 1,
                reason: "unit price cannot be negative".into(),
            });
        }
        if item.unit_price.normalize().scale() > 2 {
            return Err(BillingError::InvalidItem {
                line: index + 1,
                reason: "unit price cannot have fractions of a cent".into(),
            });
        }

        // Exact for cent prices; rounding only settles the scale at two places
        let line_total = round_currency(Decimal::from(item.quantity) * item.unit_price);
        subtotal += line_total;
        priced.push(InvoiceItem {
            description: item.description.trim().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total,
        });
    }

    if tax_amount < Decimal::ZERO {
        return Err(BillingError::NegativeAmount("tax"));
    }
    if discount_amount < Decimal::ZERO {
        return Err(BillingError::NegativeAmount("discount"));
    }

    let tax_amount = round_currency(tax_amount);
    let discount_amount = round_currency(discount_amount);
    let total_amount = subtotal + tax_amount - discount_amount;

    if total_amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveTotal(total_amount));
    }

    Ok(InvoiceTotals {
        items: priced,
        subtotal,
        tax_amount,
        discount_amount,
        total_amount,
    })
}

/// Tax for a percentage rate, rounded to cents.
pub fn tax_from_rate(subtotal: Decimal, rate_percent: Decimal) -> Decimal {
    round_currency(subtotal * rate_percent / Decimal::ONE_HUNDRED)
}

/// The single rule mapping paid vs total to a status.
pub fn payment_status(paid_amount: Decimal, total_amount: Decimal) -> PaymentStatus {
    if paid_amount <= Decimal::ZERO {
        PaymentStatus::Pending
    } else if paid_amount >= total_amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::PartiallyPaid
    }
}

/// Apply a payment to an invoice and recompute its status.
///
/// The new paid amount is clamped to `[0, total]`. A zero payment is a no-op.
pub fn apply_payment(invoice: &Invoice, amount: Decimal) -> BillingResult<PaymentOutcome> {
    if amount < Decimal::ZERO {
        return Err(BillingError::InvalidPayment(format!(
            "amount {} is negative",
            amount
        )));
    }

    let amount = round_currency(amount);
    let current = invoice.paid_amount.max(Decimal::ZERO);
    let paid_amount = (current + amount).clamp(Decimal::ZERO, invoice.total_amount.max(Decimal::ZERO));
    let applied = (paid_amount - current).max(Decimal::ZERO);

    Ok(PaymentOutcome {
        paid_amount,
        status: payment_status(paid_amount, invoice.total_amount),
        applied,
        excess: amount - applied,
    })
}
