use super::types::{Coordinates, format_timestamp, timestamp};
use super::{ClientTier, VehicleType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Trims and upper-cases a plate. Plates are compared only in this form.
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

/// Stored plates are normalized on read, so hand-edited files still match.
fn deserialize_plate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|raw| normalize_plate(&raw))
}

/// A parked vehicle. Identity is the normalized plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(alias = "placa", deserialize_with = "deserialize_plate")]
    pub plate: String,
    #[serde(rename = "tipo")]
    pub kind: VehicleType,
    #[serde(rename = "hora_entrada", with = "timestamp")]
    pub checked_in_at: NaiveDateTime,
    #[serde(rename = "cliente", default)]
    pub tier: ClientTier,
    #[serde(rename = "visitas", default)]
    pub visits: u32,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Vehicle {
    pub fn new(plate: &str, kind: impl Into<VehicleType>, checked_in_at: NaiveDateTime) -> Self {
        Self {
            plate: normalize_plate(plate),
            kind: kind.into(),
            checked_in_at,
            tier: ClientTier::Normal,
            visits: 0,
            lat: None,
            lon: None,
        }
    }

    pub fn with_tier(mut self, tier: ClientTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.lat = Some(location.lat);
        self.lon = Some(location.lon);
        self
    }

    pub fn location(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lon)
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .location()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "no location".to_string());
        write!(
            f,
            "{} | {} | In: {} | Client: {} | Location: {}",
            self.kind.as_str().to_uppercase(),
            self.plate,
            format_timestamp(&self.checked_in_at),
            self.tier,
            location
        )
    }
}

/// One completed visit. Records are appended on check-out and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(rename = "placa", alias = "plate", deserialize_with = "deserialize_plate")]
    pub plate: String,
    #[serde(rename = "tipo")]
    pub kind: VehicleType,
    #[serde(rename = "cliente")]
    pub tier: ClientTier,
    #[serde(rename = "hora_entrada", with = "timestamp")]
    pub checked_in_at: NaiveDateTime,
    #[serde(rename = "hora_salida", with = "timestamp")]
    pub checked_out_at: NaiveDateTime,
    #[serde(rename = "horas")]
    pub hours: u64,
    pub total: f64,
    #[serde(rename = "operador")]
    pub operator: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl VisitRecord {
    pub fn location(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lon)
    }
}
