pub mod aggregate;
pub mod detection;
pub mod input;
pub mod labels;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod video;

pub use aggregate::{Aggregator, BoxOutcome, SkipReason, SkippedBox};
pub use detection::{Detector, YoloDetector, YoloParams};
pub use labels::{ClassNames, LabelTable};
pub use models::{BoundingBox, DetectionRecord, GpsCoordinate, RawBox, RecordSource};
pub use pipeline::{Pipeline, PipelineContext, RunSummary};
pub use report::{ExportOutcome, ReportRow};
