//! Common service price list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BillingError, BillingResult, LineItemInput};

/// A billable service with a standard price (e.g. consultation, X-ray).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicePrice {
    pub code: String,
    pub name: String,
    pub price: Decimal,
}

impl ServicePrice {
    pub fn new(code: &str, name: &str, price: Decimal) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            price,
        }
    }
}

/// Lookup over the configured price list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceCatalog {
    services: Vec<ServicePrice>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServicePrice>) -> Self {
        Self { services }
    }

    pub fn get(&self, code: &str) -> Option<&ServicePrice> {
        self.services
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
    }

    pub fn services(&self) -> &[ServicePrice] {
        &self.services
    }

    /// Turn `(code, quantity)` selections into invoice lines at list price.
    pub fn line_items(&self, selections: &[(&str, u32)]) -> BillingResult<Vec<LineItemInput>> {
        selections
            .iter()
            .map(|(code, quantity)| {
                let service = self
                    .get(code)
                    .ok_or_else(|| BillingError::UnknownService(code.to_string()))?;
                Ok(LineItemInput::new(service.name.clone(), *quantity, service.price))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![
            ServicePrice::new("CONSULT", "General consultation", Decimal::new(5000, 2)),
            ServicePrice::new("XRAY", "Chest X-ray", Decimal::new(8000, 2)),
        ])
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(catalog().get("xray").unwrap().name, "Chest X-ray");
        assert!(catalog().get("MRI").is_none());
    }

    #[test]
    fn test_line_items() {
        let lines = catalog().line_items(&[("CONSULT", 1), ("XRAY", 2)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].quantity, 2);
        assert_eq!(lines[1].unit_price, Decimal::new(8000, 2));
    }

    #[test]
    fn test_unknown_service() {
        let err = catalog().line_items(&[("MRI", 1)]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown service code: MRI");
    }
}
