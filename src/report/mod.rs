//! Read-only reporting over the ledger: alerts, revenue, occupancy and export

pub mod export;

pub use export::{CsvExporter, HistoryExporter};

use crate::core::{Result, VehicleType, format_timestamp};
use crate::facade::Ledger;
use crate::result::ReportTable;
use chrono::{Duration, NaiveDateTime};
use log::info;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Label used for visits closed while no operator was set.
pub const UNASSIGNED_OPERATOR: &str = "unassigned";

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    LongStay { plate: String, parked_for: Duration },
    LowCapacity { kind: VehicleType, remaining: u32 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LongStay { plate, parked_for } => write!(
                f,
                "Vehicle {} has been parked for {} hours.",
                plate,
                parked_for.num_hours()
            ),
            Self::LowCapacity { kind, remaining } => {
                write!(f, "Only {} slot left for {}s.", remaining, kind)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written { rows: usize, path: PathBuf },
    /// Nothing to export yet.
    Empty,
    /// No exporter is installed, or it reports itself unusable.
    Unavailable { capability: String },
}

pub struct Reporter<'a> {
    ledger: &'a Ledger,
    exporter: Option<Box<dyn HistoryExporter + 'a>>,
}

impl<'a> Reporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            exporter: None,
        }
    }

    pub fn with_exporter(mut self, exporter: impl HistoryExporter + 'a) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    /// Long stays and nearly-full types, as of `now`.
    pub fn alerts(&self, now: NaiveDateTime) -> Vec<Alert> {
        let config = self.ledger.config();
        let limit = Duration::hours(config.long_stay_hours);
        let mut alerts: Vec<Alert> = self
            .ledger
            .active_vehicles()
            .iter()
            .filter_map(|v| {
                let parked_for = now - v.checked_in_at;
                (parked_for > limit).then(|| Alert::LongStay {
                    plate: v.plate.clone(),
                    parked_for,
                })
            })
            .collect();

        alerts.extend(
            self.ledger
                .capacity()
                .iter()
                .filter(|(_, remaining)| **remaining == config.low_capacity_threshold)
                .map(|(kind, remaining)| Alert::LowCapacity {
                    kind: kind.clone(),
                    remaining: *remaining,
                }),
        );
        alerts
    }

    /// Sum of fees per operator over the whole history.
    pub fn revenue_by_operator(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for record in self.ledger.history() {
            let operator = record.operator.as_deref().unwrap_or(UNASSIGNED_OPERATOR);
            *totals.entry(operator.to_string()).or_insert(0.0) += record.total;
        }
        totals
    }

    /// Parked vehicles per type.
    pub fn occupancy_by_type(&self) -> BTreeMap<VehicleType, usize> {
        let mut counts = BTreeMap::new();
        for vehicle in self.ledger.active_vehicles() {
            *counts.entry(vehicle.kind.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn export_history(&self, dest: &Path) -> Result<ExportStatus> {
        let exporter = match &self.exporter {
            Some(exporter) if exporter.is_available() => exporter,
            Some(exporter) => {
                return Ok(ExportStatus::Unavailable {
                    capability: exporter.format_name().to_string(),
                });
            }
            None => {
                return Ok(ExportStatus::Unavailable {
                    capability: "history export".to_string(),
                });
            }
        };

        let history = self.ledger.history();
        if history.is_empty() {
            return Ok(ExportStatus::Empty);
        }
        let rows = exporter.export(history, dest)?;
        info!("Exported {} visits as {} to {}", rows, exporter.format_name(), dest.display());
        Ok(ExportStatus::Written {
            rows,
            path: dest.to_path_buf(),
        })
    }

    pub fn occupancy_table(&self) -> ReportTable {
        let mut table = ReportTable::new(["type", "plate", "checked in", "client", "location"]);
        for v in self.ledger.active_vehicles() {
            table.push_row([
                v.kind.to_string(),
                v.plate.clone(),
                format_timestamp(&v.checked_in_at),
                v.tier.to_string(),
                v.location().map(|c| c.to_string()).unwrap_or_default(),
            ]);
        }
        table
    }

    pub fn capacity_table(&self) -> ReportTable {
        let mut table = ReportTable::new(["type", "free"]);
        for (kind, remaining) in self.ledger.capacity() {
            table.push_row([kind.to_string(), remaining.to_string()]);
        }
        table
    }

    pub fn revenue_table(&self) -> ReportTable {
        let mut table = ReportTable::new(["operator", "revenue"]);
        for (operator, total) in self.revenue_by_operator() {
            table.push_row([operator, format!("{:.2}", total)]);
        }
        table
    }
}
