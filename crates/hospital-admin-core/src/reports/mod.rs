//! Report statistics over fetched rows.
//!
//! Storage fetches a [`ReportRows`] snapshot for a date range; [`build_report`]
//! turns it into a [`ReportModel`] that renders in memory or as CSV.

mod builder;
mod csv;

pub use builder::*;

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Appointment, Doctor, Invoice, LabOrder, LabTest, Prescription};

/// Report errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Unknown report kind: {0}")]
    UnknownKind(String),

    #[error("Unknown doctor: {0}")]
    UnknownDoctor(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Available reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Appointment counts by status (scalar)
    Appointments,
    /// Billed, collected and outstanding amounts (scalar)
    Revenue,
    /// Appointment distribution per department (table)
    Departments,
    /// Per-doctor activity (table)
    Doctors,
    /// Medicine usage from prescriptions (table)
    Medicines,
    /// Lab test volume and revenue (table)
    LabTests,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Appointments,
        ReportKind::Revenue,
        ReportKind::Departments,
        ReportKind::Doctors,
        ReportKind::Medicines,
        ReportKind::LabTests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Appointments => "appointments",
            ReportKind::Revenue => "revenue",
            ReportKind::Departments => "departments",
            ReportKind::Doctors => "doctors",
            ReportKind::Medicines => "medicines",
            ReportKind::LabTests => "lab_tests",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Appointments => "Appointment Summary",
            ReportKind::Revenue => "Revenue Summary",
            ReportKind::Departments => "Department Distribution",
            ReportKind::Doctors => "Doctor Performance",
            ReportKind::Medicines => "Medicine Usage",
            ReportKind::LabTests => "Laboratory Tests",
        }
    }

    /// Scalar reports are label/value lists; the rest are tables.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ReportKind::Appointments | ReportKind::Revenue)
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| ReportError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> ReportResult<Self> {
        if from > to {
            return Err(ReportError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// The `days` days ending on `today`, inclusive.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            from: today - Duration::days(span),
            to: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Optional narrowing by doctor or department.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportFilter {
    pub doctor_id: Option<String>,
    pub department: Option<String>,
}

impl ReportFilter {
    pub fn doctor(doctor_id: impl Into<String>) -> Self {
        Self {
            doctor_id: Some(doctor_id.into()),
            department: None,
        }
    }

    pub fn department(department: impl Into<String>) -> Self {
        Self {
            doctor_id: None,
            department: Some(department.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.doctor_id.is_none() && self.department.is_none()
    }
}

/// Rows fetched from storage for one report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRows {
    pub doctors: Vec<Doctor>,
    pub appointments: Vec<Appointment>,
    pub invoices: Vec<Invoice>,
    pub prescriptions: Vec<Prescription>,
    pub lab_orders: Vec<LabOrder>,
    pub lab_tests: Vec<LabTest>,
}

/// A scalar metric value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Count(u64),
    Amount(Decimal),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Amount(amount) => write!(f, "{:.2}", amount),
        }
    }
}

/// One labelled value in a scalar report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn count(label: &str, value: usize) -> Self {
        Self {
            label: label.to_string(),
            value: MetricValue::Count(value as u64),
        }
    }

    pub fn amount(label: &str, value: Decimal) -> Self {
        Self {
            label: label.to_string(),
            value: MetricValue::Amount(value),
        }
    }
}

/// Header plus one row per entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReportBody {
    Scalar(Vec<Metric>),
    Table(ReportTable),
}

/// A built report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportModel {
    pub kind: ReportKind,
    pub title: String,
    pub range: DateRange,
    pub filter: ReportFilter,
    pub generated_at: String,
    pub body: ReportBody,
}

impl ReportModel {
    /// Scalar metrics, if this is a scalar report.
    pub fn metrics(&self) -> Option<&[Metric]> {
        match &self.body {
            ReportBody::Scalar(metrics) => Some(metrics),
            ReportBody::Table(_) => None,
        }
    }

    /// Table, if this is a tabular report.
    pub fn table(&self) -> Option<&ReportTable> {
        match &self.body {
            ReportBody::Table(table) => Some(table),
            ReportBody::Scalar(_) => None,
        }
    }

    /// Look up a scalar metric by label.
    pub fn metric(&self, label: &str) -> Option<MetricValue> {
        self.metrics()?
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.value)
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 1, 31)));
        assert!(!range.contains(date(2024, 2, 1)));

        assert!(DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_last_days() {
        let range = DateRange::last_days(date(2024, 3, 10), 7);
        assert_eq!(range.from, date(2024, 3, 4));
        assert_eq!(range.to, date(2024, 3, 10));

        let single = DateRange::last_days(date(2024, 3, 10), 0);
        assert_eq!(single.from, single.to);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("lab-tests".parse::<ReportKind>().unwrap(), ReportKind::LabTests);
        assert_eq!("Revenue".parse::<ReportKind>().unwrap(), ReportKind::Revenue);
        assert!("inventory".parse::<ReportKind>().is_err());
        assert!(ReportKind::Revenue.is_scalar());
        assert!(!ReportKind::Medicines.is_scalar());
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(MetricValue::Count(12).to_string(), "12");
        assert_eq!(MetricValue::Amount(Decimal::new(15, 0)).to_string(), "15.00");
        assert_eq!(MetricValue::Amount(Decimal::new(12345, 2)).to_string(), "123.45");
    }
}
