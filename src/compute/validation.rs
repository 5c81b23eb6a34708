//! Validation for geographic coordinates and map regions.

use crate::error::{ClusterError, Result};
use geocluster_types::region::Region;

/// Checks that a longitude/latitude pair is a real position on the globe.
///
/// NaN and infinities are rejected along with out-of-range values, since the
/// Mercator projection would turn them into NaN node positions.
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_coordinates;
///
/// assert!(validate_coordinates(2.3522, 48.8566).is_ok());
/// assert!(validate_coordinates(200.0, 40.0).is_err());
/// assert!(validate_coordinates(-74.0, f64::NAN).is_err());
/// ```
pub fn validate_coordinates(longitude: f64, latitude: f64) -> Result<()> {
    for (axis, value, limit) in [("longitude", longitude, 180.0), ("latitude", latitude, 90.0)] {
        if !(-limit..=limit).contains(&value) {
            return Err(ClusterError::config(format!(
                "{} {} is not within ±{}°",
                axis, value, limit
            )));
        }
    }
    Ok(())
}

/// Validates every point of an input stream, reporting the offending position.
pub fn validate_points<'a, I>(points: I) -> Result<()>
where
    I: IntoIterator<Item = &'a geocluster_types::point::Point>,
{
    for point in points {
        validate_coordinates(point.longitude(), point.latitude()).map_err(|e| {
            ClusterError::config(format!(
                "Point at input index {}: {}",
                point.original_index, e
            ))
        })?;
    }
    Ok(())
}

/// Validates a map region before a bounding box or zoom is derived from it.
///
/// Deltas must be strictly positive: a zero or negative span has no bounding
/// box and would yield an infinite zoom.
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_region;
/// use geocluster::Region;
///
/// assert!(validate_region(&Region::new(48.85, 2.35, 0.1, 0.1)).is_ok());
/// assert!(validate_region(&Region::new(48.85, 2.35, 0.1, 0.0)).is_err());
/// ```
pub fn validate_region(region: &Region) -> Result<()> {
    if !region.longitude.is_finite() || !region.latitude.is_finite() {
        return Err(ClusterError::config(format!(
            "Region center must be finite, got: ({}, {})",
            region.longitude, region.latitude
        )));
    }

    if !(-90.0..=90.0).contains(&region.latitude) {
        return Err(ClusterError::config(format!(
            "Region latitude out of range [-90.0, 90.0]: {}",
            region.latitude
        )));
    }

    for (name, delta) in [
        ("longitude", region.longitude_delta),
        ("latitude", region.latitude_delta),
    ] {
        if !delta.is_finite() || delta <= 0.0 {
            return Err(ClusterError::config(format!(
                "Region {} delta must be positive and finite, got: {}",
                name, delta
            )));
        }
    }

    Ok(())
}
