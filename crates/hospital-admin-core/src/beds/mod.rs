//! Bed occupancy aggregation.
//!
//! Counts registered beds per configured type and reconciles them against
//! the type's configured capacity. Capacity that has no bed record yet is
//! reported as `not_created` and counted as available for display.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Bed, BedStatus};

/// One bed type in the catalog with its configured capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedTypeConfig {
    /// Stored on bed records (e.g. "general")
    pub key: String,
    /// Display label (e.g. "General Ward")
    pub label: String,
    pub capacity: u32,
    /// Per-day charge used when billing a stay
    #[serde(default)]
    pub daily_rate: Decimal,
}

impl BedTypeConfig {
    pub fn new(key: &str, label: &str, capacity: u32, daily_rate: Decimal) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            capacity,
            daily_rate,
        }
    }
}

/// The configured set of bed types, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BedCatalog {
    types: Vec<BedTypeConfig>,
}

impl BedCatalog {
    pub fn new(types: Vec<BedTypeConfig>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &[BedTypeConfig] {
        &self.types
    }

    pub fn get(&self, key: &str) -> Option<&BedTypeConfig> {
        self.types.iter().find(|t| t.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn total_capacity(&self) -> u32 {
        self.types.iter().map(|t| t.capacity).sum()
    }
}

/// Status counts over a set of bed records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BedCounts {
    pub registered: u32,
    pub available: u32,
    pub occupied: u32,
    pub maintenance: u32,
    pub reserved: u32,
}

impl BedCounts {
    fn add(&mut self, status: BedStatus) {
        self.registered += 1;
        match status {
            BedStatus::Available => self.available += 1,
            BedStatus::Occupied => self.occupied += 1,
            BedStatus::Maintenance => self.maintenance += 1,
            BedStatus::Reserved => self.reserved += 1,
        }
    }

    fn merge(&mut self, other: &BedCounts) {
        self.registered += other.registered;
        self.available += other.available;
        self.occupied += other.occupied;
        self.maintenance += other.maintenance;
        self.reserved += other.reserved;
    }
}

/// Per-type statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedTypeStats {
    pub key: String,
    pub label: String,
    pub capacity: u32,
    #[serde(flatten)]
    pub counts: BedCounts,
    /// Capacity with no bed record yet: `capacity - registered`, floored at zero
    pub not_created: u32,
    /// Registered beds beyond the configured capacity
    pub over_capacity: u32,
}

impl BedTypeStats {
    /// Available beds plus unregistered capacity.
    pub fn available_displayed(&self) -> u32 {
        self.counts.available + self.not_created
    }

    /// Occupied share of capacity in percent, two decimals.
    pub fn occupancy_rate(&self) -> Decimal {
        occupancy_rate(self.counts.occupied, self.capacity)
    }
}

/// Hospital-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalBedStats {
    pub capacity: u32,
    /// Status counts over every registered bed, catalogued or not
    #[serde(flatten)]
    pub counts: BedCounts,
    pub not_created: u32,
    /// `Σ available + Σ not_created`
    pub available_displayed: u32,
}

impl GlobalBedStats {
    pub fn occupancy_rate(&self) -> Decimal {
        occupancy_rate(self.counts.occupied, self.capacity)
    }
}

/// Full aggregation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedOccupancy {
    /// Catalog types in catalog order
    pub per_type: Vec<BedTypeStats>,
    /// Beds whose type is missing from the catalog, keyed by that type
    pub uncatalogued: BTreeMap<String, BedCounts>,
    pub global: GlobalBedStats,
}

impl BedOccupancy {
    pub fn for_type(&self, key: &str) -> Option<&BedTypeStats> {
        self.per_type.iter().find(|s| s.key == key)
    }

    pub fn has_uncatalogued(&self) -> bool {
        !self.uncatalogued.is_empty()
    }
}

fn occupancy_rate(occupied: u32, capacity: u32) -> Decimal {
    if capacity == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(occupied) * Decimal::ONE_HUNDRED / Decimal::from(capacity)).round_dp(2)
}

/// Aggregate bed records against the catalog.
///
/// Beds whose type is not in the catalog are kept out of the per-type rows
/// and reported under `uncatalogued`; their statuses still count globally.
pub fn aggregate_beds(catalog: &BedCatalog, beds: &[Bed]) -> BedOccupancy {
    let mut by_type: BTreeMap<&str, BedCounts> = BTreeMap::new();
    let mut uncatalogued: BTreeMap<String, BedCounts> = BTreeMap::new();

    for bed in beds {
        if catalog.contains(&bed.bed_type) {
            by_type.entry(bed.bed_type.as_str()).or_default().add(bed.status);
        } else {
            uncatalogued.entry(bed.bed_type.clone()).or_default().add(bed.status);
        }
    }

    if !uncatalogued.is_empty() {
        tracing::warn!(
            types = ?uncatalogued.keys().collect::<Vec<_>>(),
            "bed records reference types missing from the bed catalog"
        );
    }

    let per_type: Vec<BedTypeStats> = catalog
        .types()
        .iter()
        .map(|bed_type| {
            let counts = by_type.get(bed_type.key.as_str()).copied().unwrap_or_default();
            BedTypeStats {
                key: bed_type.key.clone(),
                label: bed_type.label.clone(),
                capacity: bed_type.capacity,
                counts,
                not_created: bed_type.capacity.saturating_sub(counts.registered),
                over_capacity: counts.registered.saturating_sub(bed_type.capacity),
            }
        })
        .collect();

    let mut global = GlobalBedStats {
        capacity: catalog.total_capacity(),
        ..Default::default()
    };
    for stats in &per_type {
        global.counts.merge(&stats.counts);
        global.not_created += stats.not_created;
    }
    for counts in uncatalogued.values() {
        global.counts.merge(counts);
    }
    global.available_displayed = global.counts.available + global.not_created;

    BedOccupancy {
        per_type,
        uncatalogued,
        global,
    }
}
