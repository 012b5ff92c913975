pub mod annotate;
pub mod nms;
pub mod preprocessing;
pub mod yolo;

use image::DynamicImage;

use crate::labels::ClassNames;
use crate::models::RawBox;

pub use annotate::annotate;
pub use yolo::{YoloDetector, YoloParams};

/// An object detector consumed as a black box.
///
/// Each call returns the boxes of one image in the detector's own order.
pub trait Detector {
    /// Class index to label table of the underlying model
    fn names(&self) -> &ClassNames;

    /// Detect objects whose confidence is at least `confidence`
    fn detect(&mut self, image: &DynamicImage, confidence: f32) -> anyhow::Result<Vec<RawBox>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn names(&self) -> &ClassNames {
        (**self).names()
    }

    fn detect(&mut self, image: &DynamicImage, confidence: f32) -> anyhow::Result<Vec<RawBox>> {
        (**self).detect(image, confidence)
    }
}
