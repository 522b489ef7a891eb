//! Full-snapshot persistence for the parking ledger

use crate::core::{CapacityTable, LedgerError, Result, Vehicle, VisitRecord};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Ledger Snapshot
// ============================================================================

/// The whole persisted document: capacity, parked vehicles and history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// `None` only when reading a document that has no capacity section.
    #[serde(alias = "cupos", default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityTable>,
    #[serde(alias = "vehiculos", default)]
    pub active_vehicles: Vec<Vehicle>,
    #[serde(rename = "historial", default)]
    pub history: Vec<VisitRecord>,
}

impl LedgerSnapshot {
    pub fn new(
        capacity: CapacityTable,
        active_vehicles: Vec<Vehicle>,
        history: Vec<VisitRecord>,
    ) -> Self {
        Self {
            capacity: Some(capacity),
            active_vehicles,
            history,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer).map_err(|e| {
            LedgerError::Serialization(format!("Failed to serialize snapshot: {}", e))
        })?;
        Ok(out)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| {
            LedgerError::CorruptSnapshot(format!("Failed to deserialize snapshot: {}", e))
        })
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Write to a temp file in the same directory, fsync, then rename over the old snapshot.
    #[default]
    Atomic,
    /// Truncate and rewrite the snapshot in place.
    Direct,
    /// Keep everything in memory.
    None,
}

/// What to do when the snapshot on disk cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    #[default]
    FailFast,
    /// Move the bad file aside and start from the configured capacity.
    StartEmpty,
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
    durability_mode: DurabilityMode,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P, durability_mode: DurabilityMode) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            durability_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let serialized = snapshot.to_json()?;
        if self.durability_mode == DurabilityMode::Atomic {
            self.write_atomic(&serialized)?;
        } else {
            self.write_direct(&serialized)?;
        }
        debug!(
            "Snapshot written to {} ({} bytes, {} active, {} history)",
            self.snapshot_path.display(),
            serialized.len(),
            snapshot.active_vehicles.len(),
            snapshot.history.len()
        );
        Ok(())
    }

    fn parent_dir(&self) -> Result<PathBuf> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| LedgerError::Io(format!("Failed to create snapshot directory: {}", e)))?;
        Ok(parent)
    }

    fn write_atomic(&self, data: &[u8]) -> Result<()> {
        let parent = self.parent_dir()?;
        let mut temp = NamedTempFile::new_in(&parent)
            .map_err(|e| LedgerError::Io(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(data)
            .map_err(|e| LedgerError::Io(format!("Failed to write snapshot: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::Io(format!("Failed to sync snapshot: {}", e)))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| LedgerError::Io(format!("Failed to rename snapshot: {}", e.error)))?;
        Ok(())
    }

    fn write_direct(&self, data: &[u8]) -> Result<()> {
        self.parent_dir()?;
        let file = File::create(&self.snapshot_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open snapshot: {}", e)))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(data)
            .map_err(|e| LedgerError::Io(format!("Failed to write snapshot: {}", e)))?;
        writer.flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(None);
        }
        let data = match fs::read(&self.snapshot_path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Io(format!("Failed to read snapshot: {}", e))),
        };
        LedgerSnapshot::from_json(&data).map(Some)
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    /// Renames an unreadable snapshot to `<file>.corrupt` and returns the new path.
    pub fn quarantine(&self) -> Result<PathBuf> {
        let mut target = self.snapshot_path.clone().into_os_string();
        target.push(".corrupt");
        let target = PathBuf::from(target);
        fs::rename(&self.snapshot_path, &target)
            .map_err(|e| LedgerError::Io(format!("Failed to move corrupt snapshot aside: {}", e)))?;
        Ok(target)
    }
}
