//! Invoice and payment models.
//!
//! Totals and payment status are derived values. They are produced by
//! [`crate::billing`] and never set directly by callers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::ParseEnumError;

/// Payment status of an invoice, derived from paid vs total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partially_paid" => Ok(PaymentStatus::PartiallyPaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(ParseEnumError::new("payment status", s)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Insurance,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Insurance => "insurance",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "insurance" => Ok(PaymentMethod::Insurance),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(ParseEnumError::new("payment method", s)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single billed line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// quantity * unit_price, rounded to cents
    pub line_total: Decimal,
}

/// A patient invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    /// Human-facing number (e.g. "INV-20240304-0001")
    pub invoice_number: String,
    pub patient_id: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    /// Never exceeds `total_amount`
    pub paid_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Invoice {
    /// Remaining amount owed.
    pub fn balance_due(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }

    /// Whether the due date has passed with money still owed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.payment_status != PaymentStatus::Paid
            && self.due_date.map(|due| due < today).unwrap_or(false)
    }
}

/// A recorded payment against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// Amount actually applied to the invoice (after clamping to the balance)
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Receipt, card slip or claim number
    pub reference: Option<String>,
    pub received_at: String,
}

impl Payment {
    pub fn new(invoice_id: String, amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_id,
            amount,
            method,
            reference: None,
            received_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
