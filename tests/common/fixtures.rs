use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use signscan::{BoundingBox, ClassNames, Detector, RawBox};

/// Detector that replays scripted answers, one per call, then finds nothing
pub struct ScriptedDetector {
    names: ClassNames,
    responses: VecDeque<Result<Vec<RawBox>, String>>,
    /// Confidence threshold of every call, in order
    pub thresholds: Vec<f32>,
}

impl ScriptedDetector {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().copied().collect(),
            responses: VecDeque::new(),
            thresholds: Vec::new(),
        }
    }

    pub fn then_boxes(mut self, boxes: Vec<RawBox>) -> Self {
        self.responses.push_back(Ok(boxes));
        self
    }

    pub fn then_error(mut self, message: &str) -> Self {
        self.responses.push_back(Err(message.to_string()));
        self
    }
}

impl Detector for ScriptedDetector {
    fn names(&self) -> &ClassNames {
        &self.names
    }

    fn detect(&mut self, _image: &DynamicImage, confidence: f32) -> anyhow::Result<Vec<RawBox>> {
        self.thresholds.push(confidence);
        match self.responses.pop_front() {
            Some(Ok(boxes)) => Ok(boxes),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

pub fn raw_box(class_index: usize, confidence: f32) -> RawBox {
    RawBox {
        class_index: Some(class_index),
        confidence: Some(confidence),
        bbox: BoundingBox::from_corners(4.0, 4.0, 20.0, 20.0),
    }
}

pub fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(32, 32, |_, _| Rgb([90u8, 120u8, 200u8])))
}

/// Write a PNG without any metadata
pub fn write_plain_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    test_image()
        .save_with_format(&path, ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

fn rationals(parts: &[u32]) -> Value {
    Value::Rational(parts.iter().map(|&num| Rational { num, denom: 1 }).collect())
}

fn ascii(s: &str) -> Value {
    Value::Ascii(vec![s.as_bytes().to_vec()])
}

/// TIFF-structured EXIF block holding a GPS position
pub fn gps_exif_block(lat: [u32; 3], lat_ref: &str, lon: [u32; 3], lon_ref: &str) -> Vec<u8> {
    let fields = [
        Field { tag: Tag::GPSLatitudeRef, ifd_num: In::PRIMARY, value: ascii(lat_ref) },
        Field { tag: Tag::GPSLatitude, ifd_num: In::PRIMARY, value: rationals(&lat) },
        Field { tag: Tag::GPSLongitudeRef, ifd_num: In::PRIMARY, value: ascii(lon_ref) },
        Field { tag: Tag::GPSLongitude, ifd_num: In::PRIMARY, value: rationals(&lon) },
    ];

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).expect("Failed to write EXIF");
    buf.into_inner()
}

/// Write a JPEG carrying the given EXIF block in an APP1 segment
pub fn write_jpeg_with_exif(dir: &Path, name: &str, exif_block: &[u8]) -> PathBuf {
    let mut encoded = Cursor::new(Vec::new());
    test_image()
        .write_to(&mut encoded, ImageFormat::Jpeg)
        .expect("Failed to encode JPEG");
    let jpeg = encoded.into_inner();

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(exif_block);
    let segment_len = (app1.len() + 2) as u16;

    // SOI, then APP1, then the rest of the encoded stream
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&segment_len.to_be_bytes());
    bytes.extend_from_slice(&app1);
    bytes.extend_from_slice(&jpeg[2..]);

    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write JPEG");
    path
}

/// A file with a video extension but no decodable content or metadata
pub fn write_fake_video(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"not really a video").expect("Failed to write video stub");
    path
}
