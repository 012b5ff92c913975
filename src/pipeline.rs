use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use tracing::{info, warn};

use crate::aggregate::{Aggregator, SkippedBox};
use crate::detection::{Detector, annotate};
use crate::input::{self, InputKind};
use crate::labels::LabelTable;
use crate::metadata::{apply_orientation, extract_gps, gps_from_tags, read_tag_map};
use crate::models::{DetectionRecord, GpsCoordinate, RecordSource};
use crate::report::{ExportOutcome, ReportRow, export_xlsx};
use crate::video::{FrameSourceOpener, open_video};

/// Settings shared by every stage of a run
#[derive(Clone, Debug)]
pub struct PipelineContext {
    /// Directory for annotated images, created on first write
    pub output_dir: Option<PathBuf>,
    /// Spreadsheet report path
    pub report_path: Option<PathBuf>,
    pub image_confidence: f32,
    pub video_confidence: f32,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            output_dir: None,
            report_path: None,
            image_confidence: 0.1,
            video_confidence: 0.25,
        }
    }
}

/// What a run produced
#[derive(Debug)]
pub struct RunSummary {
    pub inputs_processed: usize,
    pub frames_processed: u64,
    pub annotated_images: Vec<PathBuf>,
    pub records: Vec<DetectionRecord>,
    pub skipped: Vec<SkippedBox>,
    pub excluded: usize,
    pub export: ExportOutcome,
}

impl RunSummary {
    /// Records that made it into the report
    pub fn retained(&self) -> usize {
        self.records.len() - self.excluded
    }
}

/// Detection run over an image, a video or a directory of either
pub struct Pipeline<D: Detector> {
    detector: D,
    labels: Arc<LabelTable>,
    excluded_label: Option<String>,
    open_frames: FrameSourceOpener,
    context: PipelineContext,
}

impl<D: Detector> Pipeline<D> {
    pub fn new(detector: D, labels: Arc<LabelTable>) -> Self {
        Self {
            detector,
            labels,
            excluded_label: None,
            open_frames: open_video,
            context: PipelineContext::default(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context.output_dir = Some(dir.into());
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.context.report_path = Some(path.into());
        self
    }

    pub fn with_image_confidence(mut self, confidence: f32) -> Self {
        self.context.image_confidence = confidence;
        self
    }

    pub fn with_video_confidence(mut self, confidence: f32) -> Self {
        self.context.video_confidence = confidence;
        self
    }

    pub fn with_excluded_label(mut self, label: impl Into<String>) -> Self {
        self.excluded_label = Some(label.into());
        self
    }

    /// Replace the video decoder, e.g. with an in-memory source
    pub fn with_frame_source_opener(mut self, opener: FrameSourceOpener) -> Self {
        self.open_frames = opener;
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    fn new_aggregator(&self) -> Aggregator {
        let aggregator = Aggregator::new(self.labels.clone());
        match &self.excluded_label {
            Some(label) => aggregator.with_excluded_label(label.clone()),
            None => aggregator,
        }
    }

    /// Process an input path and export the report.
    ///
    /// Fails without writing anything when the input cannot be read at all.
    pub fn run(&mut self, input_path: &Path) -> Result<RunSummary> {
        let kind = input::resolve(input_path)?;
        let mut aggregator = self.new_aggregator();
        let mut run = RunState::default();

        match kind {
            InputKind::Image(path) => {
                info!("Processing image: {}", path.display());
                let img = load_image(&path)?;
                self.process_image(&path, img, &mut aggregator, &mut run)?;
                run.inputs += 1;
            }
            InputKind::ImageDir(paths) => {
                info!("Found {} images in directory", paths.len());
                for path in paths {
                    info!("Processing image: {}", path.display());
                    let img = match load_image(&path) {
                        Ok(img) => img,
                        Err(e) => {
                            warn!("Skipping {}: {e:#}", path.display());
                            continue;
                        }
                    };
                    if let Err(e) = self.process_image(&path, img, &mut aggregator, &mut run) {
                        warn!("Skipping {}: {e:#}", path.display());
                        continue;
                    }
                    run.inputs += 1;
                }
            }
            InputKind::Video(path) => {
                self.process_video(&path, &mut aggregator, &mut run)?;
                run.inputs += 1;
            }
            InputKind::VideoDir(paths) => {
                info!("Found {} videos in directory", paths.len());
                for path in paths {
                    if let Err(e) = self.process_video(&path, &mut aggregator, &mut run) {
                        warn!("Skipping {}: {e:#}", path.display());
                        continue;
                    }
                    run.inputs += 1;
                }
            }
        }

        let rows: Vec<ReportRow> = aggregator.retained().map(ReportRow::from).collect();
        let export = match &self.context.report_path {
            Some(report_path) => export_xlsx(&rows, report_path)?,
            None => ExportOutcome::Skipped,
        };

        let excluded = aggregator.excluded_count();
        let (records, skipped) = aggregator.into_parts();
        Ok(RunSummary {
            inputs_processed: run.inputs,
            frames_processed: run.frames,
            annotated_images: run.annotated,
            records,
            skipped,
            excluded,
            export,
        })
    }

    fn process_image(
        &mut self,
        path: &Path,
        img: DynamicImage,
        aggregator: &mut Aggregator,
        run: &mut RunState,
    ) -> Result<()> {
        let (img, gps) = match read_tag_map(path) {
            Ok(tags) => {
                let img = match tags.orientation() {
                    Some(orientation) => apply_orientation(img, orientation),
                    None => img,
                };
                (img, gps_from_tags(&tags))
            }
            Err(e) => {
                info!("{e}");
                (img, GpsCoordinate::Unknown)
            }
        };
        info!("GPS from EXIF: {gps}");

        let boxes = self
            .detector
            .detect(&img, self.context.image_confidence)
            .with_context(|| format!("Detection failed on {}", path.display()))?;
        info!("Detected {} bounding boxes", boxes.len());

        if let Some(output_dir) = &self.context.output_dir {
            let annotated = annotate(&img, &boxes);
            let file_name = path
                .file_name()
                .with_context(|| format!("No file name in {}", path.display()))?;
            std::fs::create_dir_all(output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let output_path = output_dir.join(file_name);
            annotated
                .save(&output_path)
                .with_context(|| format!("Failed to save annotated image {}", output_path.display()))?;
            run.annotated.push(output_path);
        }

        aggregator.ingest(
            RecordSource::Image(path.to_path_buf()),
            &boxes,
            self.detector.names(),
            gps,
        );
        Ok(())
    }

    fn process_video(&mut self, path: &Path, aggregator: &mut Aggregator, run: &mut RunState) -> Result<()> {
        info!("Processing video: {}", path.display());
        let mut frames = (self.open_frames)(path)
            .with_context(|| format!("Cannot open video: {}", path.display()))?;

        // Containers carry file-level metadata only, so GPS is read once
        // at the first frame and shared by all later frames.
        let mut gps = None;
        let mut frame_number = 0u64;

        loop {
            let frame = match frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped reading {} after frame {frame_number}: {e:#}", path.display());
                    break;
                }
            };
            frame_number += 1;
            run.frames += 1;
            info!("Processing frame {frame_number}...");

            let frame_gps = *gps.get_or_insert_with(|| {
                let gps = extract_gps(path);
                info!("GPS: {gps}");
                gps
            });

            let boxes = match self.detector.detect(&frame, self.context.video_confidence) {
                Ok(boxes) => boxes,
                Err(e) => {
                    warn!("Detection failed on frame {frame_number}: {e:#}");
                    continue;
                }
            };
            info!("Detected {} bounding boxes", boxes.len());

            aggregator.ingest(
                RecordSource::VideoFrame {
                    video: path.to_path_buf(),
                    frame: frame_number,
                },
                &boxes,
                self.detector.names(),
                frame_gps,
            );
        }

        Ok(())
    }
}

#[derive(Default)]
struct RunState {
    inputs: usize,
    frames: u64,
    annotated: Vec<PathBuf>,
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))
}
