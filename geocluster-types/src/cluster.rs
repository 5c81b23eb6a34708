use crate::point::CategoryKey;
use geo::{Line, Point as GeoPoint};
use serde::{Deserialize, Serialize};

/// One renderable unit returned by a spatial index query.
///
/// `point_count == 1` nodes are singletons and carry the `original_index` of
/// the point they stand for. Larger counts are clusters; their members are
/// reachable only through the index's leaf query using `id`.
///
/// Nodes are recomputed on every viewport or data change and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterNode {
    /// Index-scoped identifier (not the same as `Point::id`)
    pub id: u64,
    /// Position in degrees; the weighted centroid for clusters
    pub location: GeoPoint<f64>,
    pub point_count: usize,
    pub category: CategoryKey,
    /// Set for singletons only
    pub original_index: Option<usize>,
}

impl ClusterNode {
    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn is_cluster(&self) -> bool {
        self.point_count > 1
    }

    /// Short label for marker badges: `999`, `1.2k`, `34k`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geocluster_types::cluster::ClusterNode;
    /// use geocluster_types::point::CategoryKey;
    ///
    /// let node = ClusterNode {
    ///     id: 7,
    ///     location: geo::Point::new(0.0, 0.0),
    ///     point_count: 1300,
    ///     category: CategoryKey::new("red"),
    ///     original_index: None,
    /// };
    /// assert_eq!(node.abbreviated_count(), "1.3k");
    /// ```
    pub fn abbreviated_count(&self) -> String {
        let count = self.point_count;
        if count >= 10_000 {
            format!("{}k", (count as f64 / 1000.0).round() as u64)
        } else if count >= 1000 {
            format!("{:.1}k", count as f64 / 1000.0)
        } else {
            count.to_string()
        }
    }
}

/// A leaf point fanned out around its cluster's centroid.
///
/// Exists only while spiral expansion is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiralPosition {
    /// Displaced marker position
    pub location: GeoPoint<f64>,
    /// Centroid of the cluster the point was expanded from
    pub center: GeoPoint<f64>,
    pub original_index: usize,
}

impl SpiralPosition {
    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn center_longitude(&self) -> f64 {
        self.center.x()
    }

    pub fn center_latitude(&self) -> f64 {
        self.center.y()
    }

    /// Connecting segment from the cluster centroid to the displaced marker.
    pub fn leg(&self) -> Line<f64> {
        Line::new(self.center.0, self.location.0)
    }

    /// Distance from the centroid in degrees of latitude, with the
    /// longitude offset shrunk to its ground length at the centroid.
    pub fn radius(&self) -> f64 {
        let dx = (self.longitude() - self.center_longitude())
            * longitude_scale(self.center_latitude());
        let dy = self.latitude() - self.center_latitude();
        (dx * dx + dy * dy).sqrt()
    }
}

/// Smallest `cos φ` used near the poles.
const MIN_LONGITUDE_SCALE: f64 = 0.05;

/// Ground length of one degree of longitude relative to one of latitude.
pub fn longitude_scale(latitude: f64) -> f64 {
    latitude.to_radians().cos().max(MIN_LONGITUDE_SCALE)
}
