//! Patient models.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{check_email, require, ParseEnumError, ValidationError, ValidationResult};

/// Blood groups accepted on registration.
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Patient gender as recorded at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(ParseEnumError::new("gender", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Internal UUID
    pub id: String,
    /// Human-facing registration number (e.g. "PAT-1A2B3C4D")
    pub patient_number: String,
    /// Full name
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// One of [`BLOOD_GROUPS`]
    pub blood_group: Option<String>,
    /// Name and phone of the emergency contact, free text
    pub emergency_contact: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, gender: Gender) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_number: Self::fresh_number(),
            name,
            gender,
            date_of_birth: None,
            phone: None,
            email: None,
            address: None,
            blood_group: None,
            emergency_contact: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// A random registration number. Not guaranteed unique on its own.
    pub fn fresh_number() -> String {
        let random = uuid::Uuid::new_v4().simple().to_string();
        format!("PAT-{}", random[..8].to_uppercase())
    }

    /// Validate a registration or update form.
    pub fn validate(&self) -> ValidationResult {
        require("name", &self.name)?;
        check_email("email", self.email.as_deref())?;

        if let Some(dob) = self.date_of_birth {
            if dob > chrono::Utc::now().date_naive() {
                return Err(ValidationError::invalid(
                    "date_of_birth",
                    "cannot be in the future",
                ));
            }
        }

        if let Some(group) = &self.blood_group {
            if !BLOOD_GROUPS.contains(&group.as_str()) {
                return Err(ValidationError::invalid(
                    "blood_group",
                    format!("'{}' is not a blood group", group),
                ));
            }
        }

        Ok(())
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        if dob > date {
            return None;
        }
        let mut years = date.year() - dob.year();
        if (date.month(), date.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Amara Okafor".into(), Gender::Female);
        assert_eq!(patient.name, "Amara Okafor");
        assert_eq!(patient.id.len(), 36); // UUID format
        assert!(patient.patient_number.starts_with("PAT-"));
        assert_eq!(patient.patient_number.len(), 12);
        assert!(patient.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut patient = Patient::new(" ".into(), Gender::Male);
        assert_eq!(patient.validate(), Err(ValidationError::Required("name")));

        patient.name = "John Doe".into();
        patient.blood_group = Some("C+".into());
        assert!(patient.validate().is_err());

        patient.blood_group = Some("AB-".into());
        patient.email = Some("not-an-email".into());
        assert!(patient.validate().is_err());
    }

    #[test]
    fn test_age_on() {
        let mut patient = Patient::new("Lee".into(), Gender::Other);
        patient.date_of_birth = NaiveDate::from_ymd_opt(1990, 6, 15);

        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(patient.age_on(before_birthday), Some(33));
        assert_eq!(patient.age_on(on_birthday), Some(34));
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("m".parse::<Gender>().unwrap(), Gender::Male);
        assert!("unknown".parse::<Gender>().is_err());
    }
}
