pub mod persistence;

pub use persistence::{DurabilityMode, LedgerSnapshot, RecoveryPolicy, SnapshotManager};
