//! Laboratory test catalog and order models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{require, ParseEnumError, ValidationError, ValidationResult};

/// A test the laboratory offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabTest {
    /// Short unique code (e.g. "CBC")
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub active: bool,
}

impl LabTest {
    pub fn new(code: String, name: String, price: Decimal) -> Self {
        Self {
            code,
            name,
            price,
            active: true,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("code", &self.code)?;
        require("name", &self.name)?;
        if self.price < Decimal::ZERO {
            return Err(ValidationError::invalid("price", "cannot be negative"));
        }
        Ok(())
    }
}

/// Lab order status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabOrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl LabOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabOrderStatus::Pending => "pending",
            LabOrderStatus::InProgress => "in_progress",
            LabOrderStatus::Completed => "completed",
            LabOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the order still awaits a result.
    pub fn is_open(&self) -> bool {
        matches!(self, LabOrderStatus::Pending | LabOrderStatus::InProgress)
    }
}

impl FromStr for LabOrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LabOrderStatus::Pending),
            "in_progress" => Ok(LabOrderStatus::InProgress),
            "completed" => Ok(LabOrderStatus::Completed),
            "cancelled" => Ok(LabOrderStatus::Cancelled),
            _ => Err(ParseEnumError::new("lab order status", s)),
        }
    }
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test ordered for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabOrder {
    pub id: String,
    pub patient_id: String,
    /// Ordering doctor, if any (walk-in orders have none)
    pub doctor_id: Option<String>,
    pub test_code: String,
    pub status: LabOrderStatus,
    pub result: Option<String>,
    pub ordered_on: NaiveDate,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl LabOrder {
    /// Create a new pending order.
    pub fn new(patient_id: String, test_code: String, ordered_on: NaiveDate) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id: None,
            test_code,
            status: LabOrderStatus::Pending,
            result: None,
            ordered_on,
            completed_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("patient", &self.patient_id)?;
        require("test", &self.test_code)?;
        Ok(())
    }

    /// Sample taken, processing started.
    pub fn start(&mut self) -> ValidationResult {
        if self.status != LabOrderStatus::Pending {
            return Err(self.closed_error("start"));
        }
        self.status = LabOrderStatus::InProgress;
        self.touch();
        Ok(())
    }

    /// Record the result and close the order.
    pub fn complete(&mut self, result: String) -> ValidationResult {
        require("result", &result)?;
        if !self.status.is_open() {
            return Err(self.closed_error("complete"));
        }
        let now = chrono::Utc::now().to_rfc3339();
        self.status = LabOrderStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(now.clone());
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self) -> ValidationResult {
        if !self.status.is_open() {
            return Err(self.closed_error("cancel"));
        }
        self.status = LabOrderStatus::Cancelled;
        self.touch();
        Ok(())
    }

    fn closed_error(&self, action: &str) -> ValidationError {
        ValidationError::invalid(
            "status",
            format!("cannot {} a {} order", action, self.status),
        )
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
