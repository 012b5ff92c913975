//! Embedded photo metadata: EXIF tag maps, orientation and GPS location.

pub mod gps;
pub mod tags;

pub use gps::{dms_to_decimal, extract_gps, gps_from_tags};
pub use tags::{ExifTagMap, MetadataError, apply_orientation, read_tag_map};
