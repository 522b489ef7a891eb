use crate::core::{CapacityTable, VehicleType};
use crate::storage::{DurabilityMode, RecoveryPolicy};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Ledger configuration
///
/// Defaults reproduce the campus lot: 50 car, 80 motorcycle and 20 bicycle
/// slots, stored in `parqueadero_data.json` in the working directory.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Snapshot file
    pub data_path: PathBuf,

    /// Slots per type, used when no snapshot exists yet
    pub capacity: CapacityTable,

    /// Hourly rate per type
    pub tariffs: BTreeMap<VehicleType, f64>,

    /// Hourly rate for types missing from `tariffs`
    pub default_rate: f64,

    /// Visit number from which a client is billed as frequent
    pub frequent_visit_threshold: u32,

    /// Multiplier applied to a frequent client's fee
    pub frequent_discount: f64,

    /// Remaining-slot count that triggers a low-capacity warning
    pub low_capacity_threshold: u32,

    /// Hours after which a parked vehicle raises an alert
    pub long_stay_hours: i64,

    pub durability: DurabilityMode,
    pub recovery: RecoveryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let mut capacity = CapacityTable::new();
        capacity.insert(VehicleType::Car, 50);
        capacity.insert(VehicleType::Motorcycle, 80);
        capacity.insert(VehicleType::Bicycle, 20);

        let mut tariffs = BTreeMap::new();
        tariffs.insert(VehicleType::Car, 2000.0);
        tariffs.insert(VehicleType::Motorcycle, 1000.0);
        tariffs.insert(VehicleType::Bicycle, 500.0);

        Self {
            data_path: PathBuf::from("parqueadero_data.json"),
            capacity,
            tariffs,
            default_rate: 1000.0,
            frequent_visit_threshold: 5,
            frequent_discount: 0.9,
            low_capacity_threshold: 1,
            long_stay_hours: 24,
            durability: DurabilityMode::Atomic,
            recovery: RecoveryPolicy::FailFast,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot file
    pub fn data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_path = path.as_ref().to_path_buf();
        self
    }

    /// Replace the whole capacity table
    pub fn capacity(mut self, capacity: CapacityTable) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the slot count for one type
    pub fn slots(mut self, kind: impl Into<VehicleType>, slots: u32) -> Self {
        self.capacity.insert(kind.into(), slots);
        self
    }

    /// Set the hourly rate for one type
    pub fn tariff(mut self, kind: impl Into<VehicleType>, rate: f64) -> Self {
        self.tariffs.insert(kind.into(), rate);
        self
    }

    pub fn default_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn frequent_visit_threshold(mut self, visits: u32) -> Self {
        self.frequent_visit_threshold = visits;
        self
    }

    pub fn frequent_discount(mut self, factor: f64) -> Self {
        self.frequent_discount = factor;
        self
    }

    pub fn low_capacity_threshold(mut self, remaining: u32) -> Self {
        self.low_capacity_threshold = remaining;
        self
    }

    pub fn long_stay_hours(mut self, hours: i64) -> Self {
        self.long_stay_hours = hours;
        self
    }

    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    pub fn recovery(mut self, policy: RecoveryPolicy) -> Self {
        self.recovery = policy;
        self
    }

    /// Hourly rate for a type, falling back to `default_rate`
    pub fn rate_for(&self, kind: &VehicleType) -> f64 {
        self.tariffs.get(kind).copied().unwrap_or(self.default_rate)
    }
}
