use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Context, In, Value};
use image::DynamicImage;
use thiserror::Error;

/// Reasons the metadata block of a file could not be read
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file carries no EXIF block, or the block is not parsable
    #[error("No usable EXIF data in {path}: {source}")]
    NoExif {
        path: String,
        #[source]
        source: exif::Error,
    },
}

/// Primary-image EXIF fields keyed by tag name.
///
/// GPS fields live in their own sub-block, mirroring the GPS IFD of the file.
#[derive(Debug, Clone, Default)]
pub struct ExifTagMap {
    tags: HashMap<String, Value>,
    gps: HashMap<String, Value>,
}

impl ExifTagMap {
    pub fn from_exif(exif: &exif::Exif) -> Self {
        let mut map = Self::default();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let name = field.tag.to_string();
            if field.tag.context() == Context::Gps {
                map.gps.insert(name, field.value.clone());
            } else {
                map.tags.insert(name, field.value.clone());
            }
        }
        map
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.tags.insert(name.into(), value);
    }

    pub fn insert_gps(&mut self, name: impl Into<String>, value: Value) {
        self.gps.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tags.get(name)
    }

    /// GPS sub-block, `None` when the file has no GPS fields at all
    pub fn gps_block(&self) -> Option<&HashMap<String, Value>> {
        if self.gps.is_empty() {
            None
        } else {
            Some(&self.gps)
        }
    }

    /// EXIF orientation (1..=8), if present
    pub fn orientation(&self) -> Option<u32> {
        self.get("Orientation")
            .and_then(|value| value.get_uint(0))
            .filter(|o| (1..=8).contains(o))
    }

    pub fn len(&self) -> usize {
        self.tags.len() + self.gps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.gps.is_empty()
    }
}

/// Read the EXIF block of a file into a tag map
pub fn read_tag_map(path: &Path) -> Result<ExifTagMap, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|source| MetadataError::NoExif {
            path: path.display().to_string(),
            source,
        })?;

    Ok(ExifTagMap::from_exif(&exif))
}

/// Rotate/flip an image into its display orientation
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn gps_block_absent_when_empty() {
        let mut map = ExifTagMap::default();
        map.insert("Make", Value::Ascii(vec![b"Canon".to_vec()]));
        assert!(map.gps_block().is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn orientation_out_of_range_is_ignored() {
        let mut map = ExifTagMap::default();
        map.insert("Orientation", Value::Short(vec![6]));
        assert_eq!(map.orientation(), Some(6));

        map.insert("Orientation", Value::Short(vec![42]));
        assert_eq!(map.orientation(), None);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let rotated = apply_orientation(DynamicImage::ImageRgb8(img), 6);

        assert_eq!(rotated.dimensions(), (2, 4));
        // Top-left moves to top-right after a clockwise quarter turn
        assert_eq!(rotated.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = read_tag_map(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, MetadataError::Open { .. }));
    }

    #[test]
    fn file_without_exif_is_reported() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("plain.png");
        RgbImage::new(8, 8).save(&path)?;

        let err = read_tag_map(&path).unwrap_err();
        assert!(matches!(err, MetadataError::NoExif { .. }));
        Ok(())
    }
}
