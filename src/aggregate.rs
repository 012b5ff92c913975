//! Joins detector output with location and label descriptions.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::labels::{ClassNames, LabelTable};
use crate::models::{DetectionRecord, GpsCoordinate, NONE_SENTINEL, RawBox, RecordSource};

/// Class that is detected but never reported
pub const DEFAULT_EXCLUDED_LABEL: &str = "car";

/// Why a single box did not become a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("class index {index} outside names table of {len} classes")]
    UnknownClass { index: usize, len: usize },

    #[error("confidence {0} is not within [0, 1]")]
    InvalidConfidence(f32),

    #[error("bounding box is degenerate")]
    DegenerateBox,
}

pub type BoxOutcome = Result<DetectionRecord, SkipReason>;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBox {
    pub source: RecordSource,
    pub box_index: usize,
    pub reason: SkipReason,
}

/// Counts for one ingested image or frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub recorded: usize,
    pub skipped: usize,
}

/// Accumulates detection records for one run, in encounter order
#[derive(Debug)]
pub struct Aggregator {
    labels: Arc<LabelTable>,
    excluded_label: String,
    records: Vec<DetectionRecord>,
    skipped: Vec<SkippedBox>,
}

impl Aggregator {
    pub fn new(labels: Arc<LabelTable>) -> Self {
        Self {
            labels,
            excluded_label: DEFAULT_EXCLUDED_LABEL.to_string(),
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn with_excluded_label(mut self, label: impl Into<String>) -> Self {
        self.excluded_label = label.into();
        self
    }

    /// Turn one raw box into a record
    pub fn resolve_box(
        &self,
        raw: &RawBox,
        names: &ClassNames,
        gps: GpsCoordinate,
        source: &RecordSource,
    ) -> BoxOutcome {
        let label = match raw.class_index {
            Some(index) => names
                .get(index)
                .ok_or(SkipReason::UnknownClass { index, len: names.len() })?
                .to_string(),
            None => NONE_SENTINEL.to_string(),
        };

        if let Some(conf) = raw.confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(SkipReason::InvalidConfidence(conf));
            }
        }

        if raw.bbox.is_degenerate() {
            return Err(SkipReason::DegenerateBox);
        }

        let description = self.labels.describe(&label).to_string();
        Ok(DetectionRecord {
            label,
            confidence: raw.confidence,
            description,
            gps,
            source: source.clone(),
        })
    }

    /// Add the boxes of one image or frame; every box shares `gps`.
    ///
    /// A box that cannot be resolved is recorded as skipped and does not
    /// affect the others.
    pub fn ingest(
        &mut self,
        source: RecordSource,
        boxes: &[RawBox],
        names: &ClassNames,
        gps: GpsCoordinate,
    ) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        for (box_index, raw) in boxes.iter().enumerate() {
            match self.resolve_box(raw, names, gps, &source) {
                Ok(record) => {
                    debug!(
                        "{source} - Label: {}, Confidence: {:?}, GPS: {}",
                        record.label, record.confidence, record.gps
                    );
                    self.records.push(record);
                    outcome.recorded += 1;
                }
                Err(reason) => {
                    warn!("Skipping box {box_index} of {source}: {reason}");
                    self.skipped.push(SkippedBox {
                        source: source.clone(),
                        box_index,
                        reason,
                    });
                    outcome.skipped += 1;
                }
            }
        }

        outcome
    }

    pub fn is_excluded(&self, record: &DetectionRecord) -> bool {
        record.label.to_lowercase() == self.excluded_label.to_lowercase()
    }

    /// Records that belong in the report
    pub fn retained(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.iter().filter(|r| !self.is_excluded(r))
    }

    pub fn excluded_count(&self) -> usize {
        self.records.iter().filter(|r| self.is_excluded(r)).count()
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedBox] {
        &self.skipped
    }

    pub fn into_parts(self) -> (Vec<DetectionRecord>, Vec<SkippedBox>) {
        (self.records, self.skipped)
    }
}
