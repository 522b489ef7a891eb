use crate::core::{LedgerError, Result, VisitRecord, format_timestamp};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Something that can write the visit history to a file.
pub trait HistoryExporter {
    fn format_name(&self) -> &'static str;

    /// Whether the backing capability is usable right now.
    fn is_available(&self) -> bool {
        true
    }

    /// Write every record to `dest`, returning the number of rows written.
    fn export(&self, history: &[VisitRecord], dest: &Path) -> Result<usize>;
}

const CSV_HEADER: [&str; 10] = [
    "placa",
    "tipo",
    "cliente",
    "hora_entrada",
    "hora_salida",
    "horas",
    "total",
    "operador",
    "lat",
    "lon",
];

/// Comma-separated export with a header row, one line per visit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn float(value: f64) -> String {
        // Keep a decimal point on whole numbers: 1000 -> "1000.0"
        if value.fract() == 0.0 && value.is_finite() {
            format!("{:.1}", value)
        } else {
            value.to_string()
        }
    }

    pub fn line(record: &VisitRecord) -> String {
        let fields = [
            Self::escape(&record.plate),
            Self::escape(record.kind.as_str()),
            record.tier.as_str().to_string(),
            format_timestamp(&record.checked_in_at),
            format_timestamp(&record.checked_out_at),
            record.hours.to_string(),
            Self::float(record.total),
            Self::escape(record.operator.as_deref().unwrap_or("")),
            record.lat.map(Self::float).unwrap_or_default(),
            record.lon.map(Self::float).unwrap_or_default(),
        ];
        fields.join(",")
    }
}

impl HistoryExporter for CsvExporter {
    fn format_name(&self) -> &'static str {
        "csv"
    }

    fn export(&self, history: &[VisitRecord], dest: &Path) -> Result<usize> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| {
                    LedgerError::Io(format!("Failed to create export directory: {}", e))
                })?;
            }
        }
        let file = File::create(dest)
            .map_err(|e| LedgerError::Io(format!("Failed to create {}: {}", dest.display(), e)))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", CSV_HEADER.join(","))?;
        for record in history {
            writeln!(writer, "{}", Self::line(record))?;
        }
        writer.flush()?;
        Ok(history.len())
    }
}
