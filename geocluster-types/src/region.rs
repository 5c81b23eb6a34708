use geo::Point as GeoPoint;
use serde::{Deserialize, Serialize};

/// A visible map region: center plus the span of the viewport in degrees.
///
/// This is the shape map widgets report after a pan or zoom settles.
///
/// # Examples
///
/// ```
/// use geocluster_types::region::Region;
///
/// let paris = Region::new(48.8566, 2.3522, 0.0922, 0.0421);
/// assert_eq!(paris.center().x(), 2.3522);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn new(latitude: f64, longitude: f64, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            latitude,
            longitude,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Center of the region as a `geo::Point` (x = longitude, y = latitude).
    pub fn center(&self) -> GeoPoint<f64> {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

/// A geographic extent in degrees.
///
/// Unlike `geo::Rect`, corners are not normalized: `west > east` denotes a box
/// crossing the antimeridian, and `west`/`east` may lie outside [-180, 180]
/// when derived from a region near the date line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Longitudinal span in degrees, accounting for antimeridian wrap.
    pub fn width(&self) -> f64 {
        if self.east >= self.west {
            self.east - self.west
        } else {
            self.east - self.west + 360.0
        }
    }

    /// Check if a longitude/latitude pair lies inside the box.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        if latitude < self.south || latitude > self.north {
            return false;
        }
        if self.width() >= 360.0 {
            return true;
        }
        if self.west > self.east {
            return longitude >= self.west || longitude <= self.east;
        }
        [longitude, longitude - 360.0, longitude + 360.0]
            .iter()
            .any(|lng| *lng >= self.west && *lng <= self.east)
    }
}
