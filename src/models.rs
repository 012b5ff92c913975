use std::fmt;
use std::path::PathBuf;

/// Placeholder written wherever a value is unavailable.
pub const NONE_SENTINEL: &str = "None";

/// Location attached to an image or video frame.
///
/// Either both coordinates are known or neither is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GpsCoordinate {
    Known { latitude: f64, longitude: f64 },
    #[default]
    Unknown,
}

impl GpsCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::Known { latitude, longitude }
    }

    pub fn latitude(&self) -> Option<f64> {
        match self {
            Self::Known { latitude, .. } => Some(*latitude),
            Self::Unknown => None,
        }
    }

    pub fn longitude(&self) -> Option<f64> {
        match self {
            Self::Known { longitude, .. } => Some(*longitude),
            Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known { latitude, longitude } => write!(f, "({latitude:.6}, {longitude:.6})"),
            Self::Unknown => write!(f, "({NONE_SENTINEL}, {NONE_SENTINEL})"),
        }
    }
}

/// Axis-aligned rectangle in source image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite())
            || self.width < 0.0
            || self.height < 0.0
    }
}

/// One object as reported by a detector, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RawBox {
    pub class_index: Option<usize>,
    pub confidence: Option<f32>,
    pub bbox: BoundingBox,
}

/// Where a detection came from
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSource {
    Image(PathBuf),
    VideoFrame { video: PathBuf, frame: u64 },
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(path) => write!(f, "image {}", path.display()),
            Self::VideoFrame { video, frame } => write!(f, "{} frame {}", video.display(), frame),
        }
    }
}

/// One detected sign joined with its description and location.
///
/// Confidence is kept here for logging and inspection but never exported.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: Option<f32>,
    pub description: String,
    pub gps: GpsCoordinate,
    pub source: RecordSource,
}
