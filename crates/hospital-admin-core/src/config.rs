//! TOML configuration.
//!
//! Every section is optional; missing values fall back to the defaults
//! below. A minimal file:
//!
//! ```toml
//! [database]
//! path = "/var/lib/hospital/admin.db"
//!
//! [[beds]]
//! key = "general"
//! label = "General Ward"
//! capacity = 150
//! daily_rate = "120.00"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::beds::{BedCatalog, BedTypeConfig};
use crate::billing::{ServiceCatalog, ServicePrice};
use crate::models::HospitalSettings;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hospital.db"),
        }
    }
}

/// Identity printed on invoices and reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HospitalConfig {
    pub name: String,
    pub currency: String,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            name: "General Hospital".to_string(),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BillingConfig {
    /// Percentage applied when an invoice leaves tax blank
    pub default_tax_rate: Decimal,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub hospital: HospitalConfig,
    pub billing: BillingConfig,
    pub beds: Vec<BedTypeConfig>,
    pub services: Vec<ServicePrice>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            hospital: HospitalConfig::default(),
            billing: BillingConfig::default(),
            beds: default_bed_types(),
            services: default_services(),
        }
    }
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// The ward layout used when no `[[beds]]` are configured.
pub fn default_bed_types() -> Vec<BedTypeConfig> {
    vec![
        BedTypeConfig::new("general", "General Ward", 150, money(12000)),
        BedTypeConfig::new("icu", "Intensive Care", 20, money(95000)),
        BedTypeConfig::new("private", "Private Room", 30, money(40000)),
        BedTypeConfig::new("semi_private", "Semi-Private Room", 40, money(25000)),
        BedTypeConfig::new("pediatric", "Pediatric Ward", 25, money(15000)),
        BedTypeConfig::new("maternity", "Maternity Ward", 20, money(20000)),
        BedTypeConfig::new("emergency", "Emergency", 15, money(30000)),
    ]
}

pub fn default_services() -> Vec<ServicePrice> {
    vec![
        ServicePrice::new("CONSULT", "General consultation", money(5000)),
        ServicePrice::new("SPECIALIST", "Specialist consultation", money(10000)),
        ServicePrice::new("XRAY", "X-ray", money(8000)),
        ServicePrice::new("ECG", "Electrocardiogram", money(4500)),
        ServicePrice::new("ULTRASOUND", "Ultrasound scan", money(12000)),
        ServicePrice::new("DRESSING", "Wound dressing", money(1500)),
        ServicePrice::new("INJECTION", "Injection administration", money(1000)),
    ]
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), bed_types = config.beds.len(), "loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut keys = HashSet::new();
        for bed_type in &self.beds {
            if bed_type.key.trim().is_empty() {
                return Err(ConfigError::Invalid("bed type key is empty".into()));
            }
            if !keys.insert(bed_type.key.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate bed type '{}'",
                    bed_type.key
                )));
            }
            if bed_type.daily_rate < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "bed type '{}' has a negative daily rate",
                    bed_type.key
                )));
            }
        }

        let mut codes = HashSet::new();
        for service in &self.services {
            if !codes.insert(service.code.to_uppercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate service code '{}'",
                    service.code
                )));
            }
            if service.price < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' has a negative price",
                    service.code
                )));
            }
        }

        self.default_settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn bed_catalog(&self) -> BedCatalog {
        BedCatalog::new(self.beds.clone())
    }

    pub fn service_catalog(&self) -> ServiceCatalog {
        ServiceCatalog::new(self.services.clone())
    }

    /// Settings used until someone edits them in the database.
    pub fn default_settings(&self) -> HospitalSettings {
        HospitalSettings {
            hospital_name: self.hospital.name.clone(),
            currency: self.hospital.currency.clone(),
            default_tax_rate: self.billing.default_tax_rate,
            ..HospitalSettings::default()
        }
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
