use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl LedgerError {
    /// True for failures of the durable store, as opposed to bad input.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Io(_) | Self::CorruptSnapshot(_) | Self::Serialization(_))
    }
}
