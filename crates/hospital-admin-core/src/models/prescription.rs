//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require, ValidationError, ValidationResult};

/// A medicine prescribed to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub medicine: String,
    /// Free-text dosage instructions (e.g. "500mg twice daily")
    pub dosage: Option<String>,
    /// Units dispensed
    pub quantity: u32,
    pub prescribed_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Prescription {
    pub fn new(
        patient_id: String,
        doctor_id: String,
        medicine: String,
        quantity: u32,
        prescribed_on: NaiveDate,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            medicine,
            dosage: None,
            quantity,
            prescribed_on,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("patient", &self.patient_id)?;
        require("doctor", &self.doctor_id)?;
        require("medicine", &self.medicine)?;
        if self.quantity == 0 {
            return Err(ValidationError::invalid("quantity", "must be at least 1"));
        }
        Ok(())
    }
}
