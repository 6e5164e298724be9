//! Invoice total calculation and payment application.
//!
//! Everything here is pure: callers fetch the invoice, call into this module
//! and persist the returned values.

mod calculator;
mod invoice;
mod services;

pub use calculator::*;
pub use invoice::*;
pub use services::*;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::ValidationError;

/// Billing errors. All of them are user-facing form errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("at least one item required")]
    EmptyItems,

    #[error("Line {line}: {reason}")]
    InvalidItem { line: usize, reason: String },

    #[error("{0} amount cannot be negative")]
    NegativeAmount(&'static str),

    #[error("Invoice total must be greater than zero (got {0})")]
    NonPositiveTotal(Decimal),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Invoice total {total} is below the amount already paid ({paid})")]
    TotalBelowPaid { total: Decimal, paid: Decimal },

    #[error("Due date cannot be before the invoice date")]
    DueBeforeInvoiceDate,

    #[error("Unknown service code: {0}")]
    UnknownService(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type BillingResult<T> = Result<T, BillingError>;
