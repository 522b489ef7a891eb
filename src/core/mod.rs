pub mod clock;
pub mod error;
pub mod types;
pub mod vehicle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LedgerError, Result};
pub use types::{
    CapacityTable, ClientTier, Coordinates, TIMESTAMP_FORMAT, VehicleType, format_timestamp,
    parse_timestamp,
};
pub use vehicle::{Vehicle, VisitRecord, normalize_plate};
