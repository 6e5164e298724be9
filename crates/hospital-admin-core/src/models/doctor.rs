//! Doctor models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{check_email, require, ValidationError, ValidationResult};

/// A doctor on the hospital staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    /// Clinical specialization (e.g. "Cardiology")
    pub specialization: String,
    /// Department the doctor is attached to, used for department reports
    pub department: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Fee charged per consultation
    pub consultation_fee: Decimal,
    /// Inactive doctors keep their history but cannot take new appointments
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Doctor {
    /// Create a new doctor with required fields.
    pub fn new(name: String, specialization: String, department: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            specialization,
            department,
            phone: None,
            email: None,
            consultation_fee: Decimal::ZERO,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("name", &self.name)?;
        require("specialization", &self.specialization)?;
        require("department", &self.department)?;
        check_email("email", self.email.as_deref())?;
        if self.consultation_fee < Decimal::ZERO {
            return Err(ValidationError::invalid(
                "consultation_fee",
                "cannot be negative",
            ));
        }
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
