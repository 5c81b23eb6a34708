use geo::Point as GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of an independent classification stream.
///
/// Every stream gets its own spatial index, so markers of different
/// categories never merge into a shared cluster.
///
/// # Examples
///
/// ```
/// use geocluster_types::point::CategoryKey;
///
/// let red = CategoryKey::new("red");
/// assert_eq!(red.as_str(), "red");
/// assert_eq!(red, CategoryKey::from("red"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CategoryKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable geo-tagged input record.
///
/// `id` is the position of the point in the ordered list of located input
/// items, independent of how they are classified, while `original_index` is
/// its position in the caller's unfiltered input (overlays included), which
/// is what a renderer uses to map back to the source element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Position among the located input items
    pub id: usize,
    /// Longitude (x) and latitude (y) in degrees
    pub location: GeoPoint<f64>,
    /// Stream this point was classified into
    pub category: CategoryKey,
    /// Position in the original input sequence
    pub original_index: usize,
}

impl Point {
    /// Create a new point.
    ///
    /// # Arguments
    ///
    /// * `id` - Position among the located input items
    /// * `longitude` - Longitude in degrees
    /// * `latitude` - Latitude in degrees
    /// * `category` - Classification stream
    /// * `original_index` - Position in the caller's input
    pub fn new(
        id: usize,
        longitude: f64,
        latitude: f64,
        category: CategoryKey,
        original_index: usize,
    ) -> Self {
        Self {
            id,
            location: GeoPoint::new(longitude, latitude),
            category,
            original_index,
        }
    }

    /// Get the longitude.
    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    /// Get the latitude.
    pub fn latitude(&self) -> f64 {
        self.location.y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_accessors() {
        let p = Point::new(3, 2.30, 48.85, CategoryKey::new("blue"), 11);
        assert_eq!(p.id, 3);
        assert_eq!(p.longitude(), 2.30);
        assert_eq!(p.latitude(), 48.85);
        assert_eq!(p.original_index, 11);
        assert_eq!(p.category.to_string(), "blue");
    }

    #[test]
    fn test_category_ordering_is_lexicographic() {
        let mut keys = vec![CategoryKey::new("red"), CategoryKey::new("blue")];
        keys.sort();
        assert_eq!(keys[0].as_str(), "blue");
    }

    #[test]
    fn test_category_serializes_as_string() {
        let json = serde_json::to_string(&CategoryKey::new("red")).unwrap();
        assert_eq!(json, "\"red\"");
    }
}
