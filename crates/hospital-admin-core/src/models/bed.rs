//! Bed models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{require, ParseEnumError, ValidationError, ValidationResult};

/// Bed status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BedStatus {
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Occupied => "occupied",
            BedStatus::Maintenance => "maintenance",
            BedStatus::Reserved => "reserved",
        }
    }
}

impl FromStr for BedStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BedStatus::Available),
            "occupied" => Ok(BedStatus::Occupied),
            "maintenance" => Ok(BedStatus::Maintenance),
            "reserved" => Ok(BedStatus::Reserved),
            _ => Err(ParseEnumError::new("bed status", s)),
        }
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered bed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bed {
    pub id: String,
    /// Ward-visible bed number (e.g. "G-012")
    pub bed_number: String,
    pub ward: String,
    /// Key into the configured bed catalog (e.g. "general", "icu")
    pub bed_type: String,
    pub status: BedStatus,
    /// Present exactly when the bed is occupied
    pub patient_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Bed {
    /// Create a new available bed.
    pub fn new(bed_number: String, ward: String, bed_type: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bed_number,
            ward,
            bed_type,
            status: BedStatus::Available,
            patient_id: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("bed_number", &self.bed_number)?;
        require("ward", &self.ward)?;
        require("bed_type", &self.bed_type)?;
        match (self.status, &self.patient_id) {
            (BedStatus::Occupied, None) => Err(ValidationError::invalid(
                "patient",
                "an occupied bed needs an assigned patient",
            )),
            (status, Some(_)) if status != BedStatus::Occupied => Err(ValidationError::invalid(
                "patient",
                format!("a {} bed cannot have an assigned patient", status),
            )),
            _ => Ok(()),
        }
    }

    /// Assign a patient. The bed must be available or reserved.
    pub fn assign(&mut self, patient_id: String) -> ValidationResult {
        require("patient", &patient_id)?;
        match self.status {
            BedStatus::Available | BedStatus::Reserved => {
                self.status = BedStatus::Occupied;
                self.patient_id = Some(patient_id);
                self.touch();
                Ok(())
            }
            status => Err(ValidationError::invalid(
                "status",
                format!("bed {} is {}", self.bed_number, status),
            )),
        }
    }

    /// Discharge the assigned patient and make the bed available.
    pub fn release(&mut self) -> ValidationResult {
        if self.status != BedStatus::Occupied {
            return Err(ValidationError::invalid(
                "status",
                format!("bed {} is not occupied", self.bed_number),
            ));
        }
        self.status = BedStatus::Available;
        self.patient_id = None;
        self.touch();
        Ok(())
    }

    /// Set a non-occupied status (maintenance, reservation, back to available).
    pub fn set_status(&mut self, status: BedStatus) -> ValidationResult {
        if status == BedStatus::Occupied {
            return Err(ValidationError::invalid(
                "status",
                "use assign to occupy a bed",
            ));
        }
        if self.status == BedStatus::Occupied {
            return Err(ValidationError::invalid(
                "status",
                format!("bed {} is occupied; release it first", self.bed_number),
            ));
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
