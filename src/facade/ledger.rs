use super::outcome::CheckInOutcome;
use crate::config::LedgerConfig;
use crate::core::{
    CapacityTable, ClientTier, Clock, LedgerError, Result, SystemClock, Vehicle, VehicleType,
    VisitRecord, normalize_plate,
};
use crate::storage::{LedgerSnapshot, RecoveryPolicy, SnapshotManager};
use chrono::NaiveDateTime;
use log::{info, warn};

/// The occupancy and billing ledger.
///
/// Owns the capacity table, the vehicles currently parked and the history of
/// completed visits. Every mutating call rewrites the whole snapshot before it
/// returns, and leaves memory untouched when that write fails.
pub struct Ledger {
    config: LedgerConfig,
    store: SnapshotManager,
    clock: Box<dyn Clock>,
    capacity: CapacityTable,
    active: Vec<Vehicle>,
    history: Vec<VisitRecord>,
    /// Stamped on every check-out until changed.
    operator: Option<String>,
}

impl Ledger {
    /// Open the ledger on the wall clock, loading any existing snapshot.
    pub fn open(config: LedgerConfig) -> Result<Self> {
        Self::open_with_clock(config, SystemClock)
    }

    pub fn open_with_clock(config: LedgerConfig, clock: impl Clock + 'static) -> Result<Self> {
        let store = SnapshotManager::new(&config.data_path, config.durability);
        let mut ledger = Self {
            capacity: config.capacity.clone(),
            config,
            store,
            clock: Box::new(clock),
            active: Vec::new(),
            history: Vec::new(),
            operator: None,
        };
        ledger.load()?;
        Ok(ledger)
    }

    /// Replace in-memory state with the stored snapshot, if there is one.
    ///
    /// Returns `true` when a snapshot was applied. A snapshot without a
    /// capacity section keeps the current table.
    pub fn load(&mut self) -> Result<bool> {
        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(false),
            Err(LedgerError::CorruptSnapshot(reason))
                if self.config.recovery == RecoveryPolicy::StartEmpty =>
            {
                let moved = self.store.quarantine()?;
                warn!(
                    "Snapshot {} is unreadable ({}); moved to {} and starting empty",
                    self.store.path().display(),
                    reason,
                    moved.display()
                );
                self.capacity = self.config.capacity.clone();
                self.active.clear();
                self.history.clear();
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if let Some(capacity) = snapshot.capacity {
            self.capacity = capacity;
        }
        self.active = snapshot.active_vehicles;
        self.history = snapshot.history;
        info!(
            "Loaded snapshot {}: {} parked, {} completed visits",
            self.store.path().display(),
            self.active.len(),
            self.history.len()
        );
        Ok(true)
    }

    /// Write the full state to the store, replacing the previous snapshot.
    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.snapshot())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.capacity.clone(), self.active.clone(), self.history.clone())
    }

    /// Set the identity stamped on subsequent check-outs.
    pub fn set_operator(&mut self, name: impl Into<String>) {
        self.operator = Some(name.into());
    }

    pub fn clear_operator(&mut self) {
        self.operator = None;
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// A vehicle stamped with the ledger's current time.
    pub fn new_vehicle(&self, plate: &str, kind: impl Into<VehicleType>) -> Vehicle {
        Vehicle::new(plate, kind, self.clock.now())
    }

    pub fn check_in(&mut self, mut vehicle: Vehicle) -> Result<CheckInOutcome> {
        vehicle.plate = normalize_plate(&vehicle.plate);
        let kind = vehicle.kind.clone();

        // 1. Reject when the type has no free slot (unknown types have none)
        let remaining = self.remaining(&kind);
        if remaining == 0 {
            warn!("Check-in of {} rejected: no {} slots", vehicle.plate, kind);
            return Ok(CheckInOutcome::rejected("No slots available for that vehicle type."));
        }

        // 2. One active visit per plate
        if self.find_active(&vehicle.plate).is_some() {
            warn!("Check-in of {} rejected: already parked", vehicle.plate);
            return Ok(CheckInOutcome::rejected(format!(
                "Vehicle {} is already parked.",
                vehicle.plate
            )));
        }

        // 3. Count this visit; regulars are promoted regardless of the requested tier
        vehicle.visits = self.visit_count(&vehicle.plate) + 1;
        if vehicle.visits >= self.config.frequent_visit_threshold {
            vehicle.tier = ClientTier::Frequent;
        }
        let tier = vehicle.tier;
        let (plate, visits) = (vehicle.plate.clone(), vehicle.visits);

        // 4. Occupy the slot
        let left = remaining - 1;
        self.capacity.insert(kind.clone(), left);
        self.active.push(vehicle);

        // 5. Durable before returning; a failed write leaves no trace
        if let Err(e) = self.persist() {
            self.active.pop();
            self.capacity.insert(kind, remaining);
            return Err(e);
        }
        info!(
            "Checked in {} ({}, {}, visit #{}); {} {} slots left",
            plate, kind, tier, visits, left, kind
        );

        let mut messages = Vec::new();
        if left == self.config.low_capacity_threshold {
            messages.push(format!("Warning: {} slot left for {}s.", left, kind));
        }
        if tier == ClientTier::Frequent {
            let percent = (1.0 - self.config.frequent_discount) * 100.0;
            messages.push(format!("Frequent client: {:.0}% discount at checkout.", percent));
        }
        Ok(CheckInOutcome::accepted(messages))
    }

    /// Close the visit for `plate`. `Ok(None)` when the plate is not parked.
    pub fn check_out(&mut self, plate: &str) -> Result<Option<VisitRecord>> {
        let plate = normalize_plate(plate);

        // 1. Locate the active visit
        let Some(index) = self.active.iter().position(|v| v.plate == plate) else {
            return Ok(None);
        };

        // 2. Bill it
        let checked_out_at = self.clock.now();
        let vehicle = &self.active[index];
        let hours = billable_hours(vehicle.checked_in_at, checked_out_at);
        let total = self.fee(&vehicle.kind, vehicle.tier, hours);

        let record = VisitRecord {
            plate: vehicle.plate.clone(),
            kind: vehicle.kind.clone(),
            tier: vehicle.tier,
            checked_in_at: vehicle.checked_in_at,
            checked_out_at,
            hours,
            total,
            operator: self.operator.clone(),
            lat: vehicle.lat,
            lon: vehicle.lon,
        };

        // 3. Free the slot and append to history
        let vehicle = self.active.remove(index);
        let freed = self.capacity.get(&vehicle.kind).copied();
        self.capacity.insert(vehicle.kind.clone(), freed.unwrap_or(0) + 1);
        self.history.push(record.clone());

        // 4. Durable before returning; a failed write leaves no trace
        if let Err(e) = self.persist() {
            self.history.pop();
            match freed {
                Some(slots) => self.capacity.insert(vehicle.kind.clone(), slots),
                None => self.capacity.remove(&vehicle.kind),
            };
            self.active.insert(index, vehicle);
            return Err(e);
        }
        info!(
            "Checked out {} after {}h, total {:.2} (operator: {})",
            record.plate,
            record.hours,
            record.total,
            record.operator.as_deref().unwrap_or("-")
        );
        Ok(Some(record))
    }

    /// Fee for a stay of `hours` whole hours.
    pub fn fee(&self, kind: &VehicleType, tier: ClientTier, hours: u64) -> f64 {
        let base = hours as f64 * self.config.rate_for(kind);
        match tier {
            ClientTier::Normal => base,
            ClientTier::Frequent => base * self.config.frequent_discount,
            ClientTier::Monthly => 0.0,
        }
    }

    pub fn remaining(&self, kind: &VehicleType) -> u32 {
        self.capacity.get(kind).copied().unwrap_or(0)
    }

    pub fn find_active(&self, plate: &str) -> Option<&Vehicle> {
        let plate = normalize_plate(plate);
        self.active.iter().find(|v| v.plate == plate)
    }

    /// Completed visits recorded for `plate`.
    pub fn visit_count(&self, plate: &str) -> u32 {
        let plate = normalize_plate(plate);
        self.history.iter().filter(|r| r.plate == plate).count() as u32
    }

    pub fn active_vehicles(&self) -> &[Vehicle] {
        &self.active
    }

    pub fn capacity(&self) -> &CapacityTable {
        &self.capacity
    }

    pub fn history(&self) -> &[VisitRecord] {
        &self.history
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}

/// Whole hours between two instants, truncated, never less than one.
pub fn billable_hours(checked_in_at: NaiveDateTime, checked_out_at: NaiveDateTime) -> u64 {
    let seconds = (checked_out_at - checked_in_at).num_seconds();
    seconds.div_euclid(3600).max(1) as u64
}
