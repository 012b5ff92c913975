use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use signscan::aggregate::DEFAULT_EXCLUDED_LABEL;
use signscan::{ExportOutcome, LabelTable, Pipeline, YoloDetector, YoloParams};

#[derive(Parser)]
#[command(name = "signscan")]
#[command(about = "Detect traffic signs in photos or videos and export a geotagged report")]
struct Cli {
    /// Image, video, or directory of either
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Detection model in rten format
    #[arg(long, value_name = "FILE")]
    model: PathBuf,

    /// Class names of the model, one per line in class index order
    #[arg(long, value_name = "FILE")]
    names: PathBuf,

    /// Directory for annotated images
    #[arg(long, value_name = "DIR", default_value = "output_images")]
    output_dir: PathBuf,

    /// Spreadsheet report path
    #[arg(long, value_name = "FILE", default_value = "output_results.xlsx")]
    report: PathBuf,

    /// Confidence threshold for images
    #[arg(long, default_value_t = 0.1)]
    image_conf: f32,

    /// Confidence threshold for video frames
    #[arg(long, default_value_t = 0.25)]
    video_conf: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = 0.45)]
    iou: f32,

    /// Model input size in pixels
    #[arg(long, default_value_t = 640)]
    input_size: u32,

    /// JSON file mapping sign codes to descriptions, replaces the built-in table
    #[arg(long, value_name = "FILE")]
    descriptions: Option<PathBuf>,

    /// Label left out of the report
    #[arg(long, default_value = DEFAULT_EXCLUDED_LABEL)]
    exclude: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let labels = match &args.descriptions {
        Some(path) => LabelTable::from_json_file(path)?,
        None => LabelTable::builtin(),
    };

    let params = YoloParams {
        input_size: args.input_size,
        iou_threshold: args.iou,
        ..Default::default()
    };
    let detector = YoloDetector::load(&args.model, &args.names, params)?;

    let mut pipeline = Pipeline::new(detector, Arc::new(labels))
        .with_output_dir(args.output_dir)
        .with_report_path(&args.report)
        .with_image_confidence(args.image_conf)
        .with_video_confidence(args.video_conf)
        .with_excluded_label(args.exclude);

    let summary = pipeline.run(&args.input)?;

    println!("\n=== Traffic Sign Detection Results ===");
    println!("Inputs processed: {}", summary.inputs_processed);
    if summary.frames_processed > 0 {
        println!("Video frames processed: {}", summary.frames_processed);
    }
    println!("Annotated images written: {}", summary.annotated_images.len());
    println!(
        "Detections: {} ({} excluded, {} boxes skipped)",
        summary.records.len(),
        summary.excluded,
        summary.skipped.len()
    );
    match summary.export {
        ExportOutcome::Written { rows } => {
            println!("Report: {} rows written to {}", rows, args.report.display())
        }
        ExportOutcome::Skipped => println!("No valid detections, report not written."),
    }

    Ok(())
}
