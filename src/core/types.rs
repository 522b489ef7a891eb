use super::{LedgerError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Storage format for every timestamp in the ledger (local time, no zone).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| LedgerError::InvalidInput(format!("bad timestamp '{}': {}", raw, e)))
}

/// Serde adapter for `NaiveDateTime` fields stored as `YYYY-MM-DD HH:MM:SS`.
pub(crate) mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(D::Error::custom)
    }
}

// ============================================================================
// Vehicle Type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Bicycle,
    /// Any other keyword. Billed at the default rate.
    Other(String),
}

impl VehicleType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
            Self::Bicycle => "bicycle",
            Self::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for VehicleType {
    fn from(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "car" | "carro" => Self::Car,
            "motorcycle" | "moto" => Self::Motorcycle,
            "bicycle" | "bici" => Self::Bicycle,
            _ => Self::Other(normalized),
        }
    }
}

impl From<String> for VehicleType {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<VehicleType> for String {
    fn from(kind: VehicleType) -> Self {
        match kind {
            VehicleType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining free slots per vehicle type.
pub type CapacityTable = BTreeMap<VehicleType, u32>;

// ============================================================================
// Client Tier
// ============================================================================

/// Stored lowercase; read with the same leniency as [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ClientTier {
    #[default]
    Normal,
    Frequent,
    Monthly,
}

impl ClientTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Frequent => "frequent",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for ClientTier {
    type Err = LedgerError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "normal" => Ok(Self::Normal),
            "frequent" | "frecuente" => Ok(Self::Frequent),
            "monthly" | "mensual" => Ok(Self::Monthly),
            other => Err(LedgerError::InvalidInput(format!("unknown client tier '{}'", other))),
        }
    }
}

impl TryFrom<String> for ClientTier {
    type Error = LedgerError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl fmt::Display for ClientTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Coordinates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Pairs two optional stored fields; a half-filled pair counts as absent.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}
