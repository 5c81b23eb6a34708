//! Deriving query parameters from a map region.
//!
//! The zoom is a calibrated heuristic: the number of world-wide tiles of
//! `tile_size` pixels that a view `width_px` wide spanning
//! `longitude_delta` degrees corresponds to. Rebuild and reproject both go
//! through [`derive`], so the two paths can never disagree on the zoom.

use crate::compute::validation::validate_region;
use crate::config::{IndexParams, ViewportConfig};
use crate::error::Result;
use geocluster_types::region::{BoundingBox, Region};
use serde::{Deserialize, Serialize};

/// Bounding box and zoom level for one settled region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bbox: BoundingBox,
    pub zoom: u8,
}

/// Bounding box of the region: its center plus/minus the half-span deltas.
///
/// # Examples
///
/// ```
/// use geocluster::viewport::bounding_box;
/// use geocluster::Region;
///
/// let bbox = bounding_box(&Region::new(48.85, 2.35, 0.1, 0.2))?;
/// assert_eq!(bbox.west, 2.35 - 0.2);
/// assert_eq!(bbox.north, 48.85 + 0.1);
/// # Ok::<(), geocluster::ClusterError>(())
/// ```
pub fn bounding_box(region: &Region) -> Result<BoundingBox> {
    validate_region(region)?;

    Ok(BoundingBox::new(
        region.longitude - region.longitude_delta,
        region.latitude - region.latitude_delta,
        region.longitude + region.longitude_delta,
        region.latitude + region.latitude_delta,
    ))
}

/// Integer zoom for the region, clamped to `[min_zoom, max_zoom]`.
pub fn zoom_level(region: &Region, min_zoom: u8, max_zoom: u8, device: &ViewportConfig) -> Result<u8> {
    validate_region(region)?;

    let scale = 360.0 * device.width_px / (region.longitude_delta * device.tile_size);
    let zoom = scale.log2().floor();
    let zoom = zoom.clamp(min_zoom as f64, max_zoom as f64);

    Ok(zoom as u8)
}

/// Bounding box and zoom in one step.
pub fn derive(region: &Region, params: &IndexParams, device: &ViewportConfig) -> Result<Viewport> {
    let bbox = bounding_box(region)?;
    let zoom = zoom_level(region, params.min_zoom, params.max_zoom, device)?;
    Ok(Viewport { bbox, zoom })
}
