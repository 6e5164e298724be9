//! Domain models for the hospital administration core.

mod appointment;
mod bed;
mod doctor;
mod invoice;
mod lab;
mod patient;
mod prescription;
mod settings;
mod validation;

pub use appointment::*;
pub use bed::*;
pub use doctor::*;
pub use invoice::*;
pub use lab::*;
pub use patient::*;
pub use prescription::*;
pub use settings::*;
pub use validation::{ParseEnumError, ValidationError, ValidationResult};

pub(crate) use validation::require;
