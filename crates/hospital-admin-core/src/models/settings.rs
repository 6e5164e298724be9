//! Runtime-editable hospital settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{check_email, require, ValidationError, ValidationResult};

/// Hospital identity and billing defaults shown on invoices and reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalSettings {
    pub hospital_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// ISO currency code printed on invoices
    pub currency: String,
    /// Percentage applied when an invoice form leaves tax blank
    pub default_tax_rate: Decimal,
}

impl Default for HospitalSettings {
    fn default() -> Self {
        Self {
            hospital_name: "General Hospital".to_string(),
            address: None,
            phone: None,
            email: None,
            currency: "USD".to_string(),
            default_tax_rate: Decimal::ZERO,
        }
    }
}

impl HospitalSettings {
    pub fn validate(&self) -> ValidationResult {
        require("hospital_name", &self.hospital_name)?;
        check_email("email", self.email.as_deref())?;
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::invalid(
                "currency",
                format!("'{}' is not a three-letter code", self.currency),
            ));
        }
        if self.default_tax_rate < Decimal::ZERO || self.default_tax_rate > Decimal::ONE_HUNDRED {
            return Err(ValidationError::invalid(
                "default_tax_rate",
                "must be between 0 and 100",
            ));
        }
        Ok(())
    }
}
