/// Result of a check-in attempt.
///
/// A rejection (no slots, plate already parked) is an ordinary outcome with
/// `accepted == false` and the reason as the only message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    pub accepted: bool,
    pub messages: Vec<String>,
}

impl CheckInOutcome {
    pub fn accepted(messages: Vec<String>) -> Self {
        Self {
            accepted: true,
            messages,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            messages: vec![reason.into()],
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}
