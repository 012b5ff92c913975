//! Spreadsheet export of retained detections.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::models::{DetectionRecord, NONE_SENTINEL};

/// Column headers, in order. Confidence is not exported.
pub const HEADERS: [&str; 4] = ["Label", "GPS_Latitude", "GPS_Longitude", "Description"];

/// One spreadsheet row
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: String,
}

impl From<&DetectionRecord> for ReportRow {
    fn from(record: &DetectionRecord) -> Self {
        Self {
            label: record.label.clone(),
            latitude: record.gps.latitude(),
            longitude: record.gps.longitude(),
            description: record.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    /// Nothing to export, no file was created
    Skipped,
}

/// Write rows to an `.xlsx` workbook; with no rows nothing is written
pub fn export_xlsx(rows: &[ReportRow], path: &Path) -> Result<ExportOutcome> {
    if rows.is_empty() {
        info!("No valid detections to export, skipping {}", path.display());
        return Ok(ExportOutcome::Skipped);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, col, header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).context("Too many rows for a worksheet")?;
        worksheet.write_string(r, 0, &row.label)?;
        for (col, value) in [(1u16, row.latitude), (2u16, row.longitude)] {
            match value {
                Some(v) => worksheet.write_number(r, col, v)?,
                None => worksheet.write_string(r, col, NONE_SENTINEL)?,
            };
        }
        worksheet.write_string(r, 3, &row.description)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    info!("Detailed results saved to {}", path.display());
    Ok(ExportOutcome::Written { rows: rows.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GpsCoordinate, RecordSource};
    use std::path::PathBuf;

    fn record(gps: GpsCoordinate) -> DetectionRecord {
        DetectionRecord {
            label: "102".to_string(),
            confidence: Some(0.9),
            description: "Cấm ngược chiều".to_string(),
            gps,
            source: RecordSource::Image(PathBuf::from("a.jpg")),
        }
    }

    #[test]
    fn row_drops_confidence_and_keeps_gps() {
        let row = ReportRow::from(&record(GpsCoordinate::new(21.03, 105.85)));
        assert_eq!(
            row,
            ReportRow {
                label: "102".to_string(),
                latitude: Some(21.03),
                longitude: Some(105.85),
                description: "Cấm ngược chiều".to_string(),
            }
        );
    }

    #[test]
    fn unknown_gps_row_has_no_coordinates() {
        let row = ReportRow::from(&record(GpsCoordinate::Unknown));
        assert_eq!((row.latitude, row.longitude), (None, None));
    }

    #[test]
    fn empty_export_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("report.xlsx");

        assert_eq!(export_xlsx(&[], &path)?, ExportOutcome::Skipped);
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
        Ok(())
    }

    #[test]
    fn export_creates_workbook() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out").join("report.xlsx");
        let rows = vec![
            ReportRow::from(&record(GpsCoordinate::new(21.03, 105.85))),
            ReportRow::from(&record(GpsCoordinate::Unknown)),
        ];

        assert_eq!(export_xlsx(&rows, &path)?, ExportOutcome::Written { rows: 2 });
        let bytes = std::fs::read(&path)?;
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
        Ok(())
    }
}
