//! Appointment models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::validation::{require, ParseEnumError, ValidationError, ValidationResult};

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, not yet seen
    Scheduled,
    /// Patient was seen
    Completed,
    /// Cancelled before the visit
    Cancelled,
    /// Patient did not attend
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Whether the status is final.
    pub fn is_closed(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            _ => Err(ParseEnumError::new("appointment status", s)),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booked consultation between a patient and a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    /// Start time, "HH:MM"
    pub time: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Create a new scheduled appointment.
    pub fn new(patient_id: String, doctor_id: String, date: NaiveDate, time: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            doctor_id,
            date,
            time,
            status: AppointmentStatus::Scheduled,
            reason: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require("patient", &self.patient_id)?;
        require("doctor", &self.doctor_id)?;
        NaiveTime::parse_from_str(&self.time, "%H:%M").map_err(|_| {
            ValidationError::invalid("time", format!("'{}' is not HH:MM", self.time))
        })?;
        Ok(())
    }

    /// Move to a new status. Only scheduled appointments can change.
    pub fn transition(&mut self, status: AppointmentStatus) -> ValidationResult {
        if self.status == status {
            return Ok(());
        }
        if self.status.is_closed() {
            return Err(ValidationError::invalid(
                "status",
                format!("appointment is already {}", self.status),
            ));
        }
        self.status = status;
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_appointment() -> Appointment {
        Appointment::new(
            "patient-1".into(),
            "doctor-1".into(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            "09:30".into(),
        )
    }

    #[test]
    fn test_new_appointment_scheduled() {
        let appt = make_appointment();
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert!(appt.validate().is_ok());
    }

    #[test]
    fn test_bad_time_rejected() {
        let mut appt = make_appointment();
        appt.time = "9.30am".into();
        assert!(appt.validate().is_err());
    }

    #[test]
    fn test_transitions() {
        let mut appt = make_appointment();
        appt.transition(AppointmentStatus::Completed).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Completed);

        // Closed appointments stay closed
        assert!(appt.transition(AppointmentStatus::Cancelled).is_err());
        assert!(appt.transition(AppointmentStatus::Completed).is_ok());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
        }
    }
}
