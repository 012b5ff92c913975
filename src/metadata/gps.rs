//! GPS decoding from EXIF.
//!
//! Latitude and longitude are stored as sexagesimal (degrees, minutes,
//! seconds) rationals plus a hemisphere reference. A coordinate is only
//! reported when both halves decode; a partial GPS block counts as no GPS.

use std::collections::HashMap;
use std::path::Path;

use exif::Value;
use tracing::{info, warn};

use super::tags::{ExifTagMap, read_tag_map};
use crate::models::GpsCoordinate;

/// `decimal = degrees + minutes/60 + seconds/3600`.
///
/// Accepts a (degrees, minutes, seconds) triple or a (degrees, minutes) pair.
pub fn dms_to_decimal(parts: &[f64]) -> Option<f64> {
    let (degrees, minutes, seconds) = match *parts {
        [d, m, s] => (d, m, s),
        [d, m] => (d, m, 0.0),
        _ => return None,
    };
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    decimal.is_finite().then_some(decimal)
}

fn value_components(value: &Value) -> Option<Vec<f64>> {
    let parts: Vec<f64> = match value {
        Value::Rational(v) => v
            .iter()
            .map(|r| (r.denom != 0).then(|| r.to_f64()))
            .collect::<Option<_>>()?,
        Value::SRational(v) => v
            .iter()
            .map(|r| (r.denom != 0).then(|| r.to_f64()))
            .collect::<Option<_>>()?,
        Value::Float(v) => v.iter().map(|f| f64::from(*f)).collect(),
        Value::Double(v) => v.clone(),
        _ => return None,
    };
    Some(parts)
}

fn reference(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(strings) => strings
            .first()
            .map(|s| String::from_utf8_lossy(s).trim_matches(char::from(0)).trim().to_string()),
        _ => None,
    }
}

/// Decode one signed coordinate; `positive` is the hemisphere that keeps the sign
fn signed_coordinate(
    gps: &HashMap<String, Value>,
    value_tag: &str,
    ref_tag: &str,
    positive: &str,
) -> Option<f64> {
    let decimal = dms_to_decimal(&value_components(gps.get(value_tag)?)?)?;
    let hemisphere = reference(gps.get(ref_tag)?)?;

    if hemisphere == positive {
        Some(decimal)
    } else {
        Some(-decimal.abs())
    }
}

/// Convert the GPS sub-block of a tag map into a coordinate
pub fn gps_from_tags(tags: &ExifTagMap) -> GpsCoordinate {
    let Some(gps) = tags.gps_block() else {
        info!("No GPS information in EXIF");
        return GpsCoordinate::Unknown;
    };

    let latitude = signed_coordinate(gps, "GPSLatitude", "GPSLatitudeRef", "N");
    let longitude = signed_coordinate(gps, "GPSLongitude", "GPSLongitudeRef", "E");

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => GpsCoordinate::new(latitude, longitude),
        _ => {
            let mut fields: Vec<_> = gps.keys().map(String::as_str).collect();
            fields.sort_unstable();
            warn!(?latitude, ?longitude, ?fields, "Incomplete GPS coordinates in EXIF, ignoring them");
            GpsCoordinate::Unknown
        }
    }
}

/// Read the GPS location of a file.
///
/// Never fails: unreadable or missing metadata yields `GpsCoordinate::Unknown`.
pub fn extract_gps(path: &Path) -> GpsCoordinate {
    match read_tag_map(path) {
        Ok(tags) => gps_from_tags(&tags),
        Err(e) => {
            info!("{e}");
            GpsCoordinate::Unknown
        }
    }
}
