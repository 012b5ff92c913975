#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from signscan for tests
pub use signscan::{
    ExportOutcome, GpsCoordinate, LabelTable, Pipeline, RecordSource, RunSummary,
};
