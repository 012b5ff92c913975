use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::debug;

use super::Detector;
use super::nms::non_max_suppression;
use super::preprocessing::{scale_factors, to_chw_tensor_data};
use crate::labels::ClassNames;
use crate::models::{BoundingBox, RawBox};

/// Inference parameters of a YOLO-style model
#[derive(Debug, Clone)]
pub struct YoloParams {
    /// Side of the square model input, 640 for most exports
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

/// YOLO (v8 and later) detector running on the rten runtime
pub struct YoloDetector {
    model: Model,
    names: ClassNames,
    params: YoloParams,
}

impl YoloDetector {
    pub fn new(model: Model, names: ClassNames, params: YoloParams) -> Self {
        Self { model, names, params }
    }

    /// Load a `.rten` model and its class names file
    pub fn load(model_path: &Path, names_path: &Path, params: YoloParams) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!(
                "Detection model not found: {}\n\
                 Convert the trained ONNX export with `rten-convert` first.",
                model_path.display()
            );
        }

        let model = Model::load_file(model_path)
            .with_context(|| format!("Failed to load model {}", model_path.display()))?;
        let names = ClassNames::from_file(names_path)?;
        if names.is_empty() {
            anyhow::bail!("Class names file is empty: {}", names_path.display());
        }

        Ok(Self::new(model, names, params))
    }
}

impl Detector for YoloDetector {
    fn names(&self) -> &ClassNames {
        &self.names
    }

    fn detect(&mut self, image: &DynamicImage, confidence: f32) -> Result<Vec<RawBox>> {
        let size = self.params.input_size;
        let data = to_chw_tensor_data(image, size);
        let input = NdTensor::from_data([1, 3, size as usize, size as usize], data);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| anyhow::anyhow!("Model inference failed: {e}"))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|e| anyhow::anyhow!("Unexpected model output: {e:?}"))?;

        let [_, rows, cols] = output.shape();
        let layout = OutputLayout::infer(rows, cols, self.names.len())?;
        let candidates = decode_predictions(
            &output.to_vec(),
            layout,
            confidence,
            scale_factors(image, size),
        );
        debug!("{} candidates above {confidence}", candidates.len());

        Ok(non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        ))
    }
}

/// Shape of a single-image YOLO output tensor, batch axis dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[4 + classes, candidates]`, the usual export layout
    ChannelsFirst { channels: usize, candidates: usize },
    /// `[candidates, 4 + classes]`
    ChannelsLast { channels: usize, candidates: usize },
}

impl OutputLayout {
    pub fn infer(rows: usize, cols: usize, num_classes: usize) -> Result<Self> {
        let channels = 4 + num_classes;
        if rows == channels {
            Ok(Self::ChannelsFirst { channels, candidates: cols })
        } else if cols == channels {
            Ok(Self::ChannelsLast { channels, candidates: rows })
        } else {
            anyhow::bail!(
                "Model output [{rows}, {cols}] does not match {num_classes} class names"
            )
        }
    }

    fn candidates(&self) -> usize {
        match *self {
            Self::ChannelsFirst { candidates, .. } | Self::ChannelsLast { candidates, .. } => candidates,
        }
    }

    fn channels(&self) -> usize {
        match *self {
            Self::ChannelsFirst { channels, .. } | Self::ChannelsLast { channels, .. } => channels,
        }
    }

    fn at(&self, data: &[f32], candidate: usize, channel: usize) -> f32 {
        match *self {
            Self::ChannelsFirst { candidates, .. } => data[channel * candidates + candidate],
            Self::ChannelsLast { channels, .. } => data[candidate * channels + channel],
        }
    }
}

/// Turn raw predictions (cx, cy, w, h, class scores...) into boxes in source pixels
pub fn decode_predictions(
    data: &[f32],
    layout: OutputLayout,
    confidence: f32,
    (scale_x, scale_y): (f32, f32),
) -> Vec<RawBox> {
    let mut boxes = Vec::new();

    for candidate in 0..layout.candidates() {
        let best = (4..layout.channels())
            .map(|channel| (channel - 4, layout.at(data, candidate, channel)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let Some((class_index, score)) = best else {
            continue;
        };
        if score < confidence {
            continue;
        }

        let cx = layout.at(data, candidate, 0);
        let cy = layout.at(data, candidate, 1);
        let w = layout.at(data, candidate, 2);
        let h = layout.at(data, candidate, 3);

        boxes.push(RawBox {
            class_index: Some(class_index),
            confidence: Some(score),
            bbox: BoundingBox::from_corners(
                (cx - w / 2.0) * scale_x,
                (cy - h / 2.0) * scale_y,
                (cx + w / 2.0) * scale_x,
                (cy + h / 2.0) * scale_y,
            ),
        });
    }

    boxes
}
