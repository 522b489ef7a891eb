pub mod ledger;
pub mod outcome;

pub use ledger::{Ledger, billable_hours};
pub use outcome::CheckInOutcome;
