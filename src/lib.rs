// ============================================================================
// ParkLedger Library
// ============================================================================

pub mod config;
pub mod core;
pub mod facade;
pub mod geo;
pub mod report;
pub mod result;
pub mod storage;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use crate::core::{
    CapacityTable, ClientTier, Clock, Coordinates, LedgerError, ManualClock, Result, SystemClock,
    Vehicle, VehicleType, VisitRecord,
};
pub use facade::{CheckInOutcome, Ledger};
pub use report::{CsvExporter, ExportStatus, HistoryExporter, Reporter};
pub use result::ReportTable;
pub use storage::{DurabilityMode, LedgerSnapshot, RecoveryPolicy};
