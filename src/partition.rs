//! Splitting caller input into independent category streams.
//!
//! Each classified item becomes a [`Point`] that remembers its position in
//! the unfiltered input, so renderers can map clusters back to their source
//! elements. Items without a position, or that the predicate declines, pass
//! through untouched.

use geo::Point as GeoPoint;
use geocluster_types::point::{CategoryKey, Point};
use std::collections::BTreeMap;

/// Anything that may carry a geographic position.
pub trait Locatable {
    /// Longitude/latitude of the item, `None` for non-point overlays.
    fn location(&self) -> Option<GeoPoint<f64>>;
}

impl Locatable for GeoPoint<f64> {
    fn location(&self) -> Option<GeoPoint<f64>> {
        Some(*self)
    }
}

/// A simple map element: a tagged marker, or an overlay without a position.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapItem {
    pub location: Option<GeoPoint<f64>>,
    /// Free-form tag such as a pin color
    pub tag: Option<String>,
}

impl MapItem {
    pub fn marker(longitude: f64, latitude: f64, tag: impl Into<String>) -> Self {
        Self {
            location: Some(GeoPoint::new(longitude, latitude)),
            tag: Some(tag.into()),
        }
    }

    pub fn untagged(longitude: f64, latitude: f64) -> Self {
        Self {
            location: Some(GeoPoint::new(longitude, latitude)),
            tag: None,
        }
    }

    pub fn overlay() -> Self {
        Self {
            location: None,
            tag: None,
        }
    }
}

impl Locatable for MapItem {
    fn location(&self) -> Option<GeoPoint<f64>> {
        self.location
    }
}

/// Classifies a [`MapItem`] by its tag; untagged items pass through.
pub fn classify_by_tag(item: &MapItem) -> Option<CategoryKey> {
    item.tag.as_deref().map(CategoryKey::from)
}

/// Result of partitioning one input sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Points per category, each in first-seen order
    pub streams: BTreeMap<CategoryKey, Vec<Point>>,
    /// Input indices of pass-through items, in order
    pub other: Vec<usize>,
}

impl Partition {
    /// Number of classified points across all streams.
    pub fn point_count(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }
}

/// Split `items` into category streams plus pass-through indices.
///
/// Pure and order-preserving: within every output, items appear in the order
/// they were first seen.
///
/// # Examples
///
/// ```
/// use geocluster::partition::{classify_by_tag, partition, MapItem};
/// use geocluster::CategoryKey;
///
/// let items = vec![
///     MapItem::marker(2.30, 48.85, "red"),
///     MapItem::overlay(),
///     MapItem::marker(2.31, 48.86, "blue"),
/// ];
/// let parts = partition(&items, classify_by_tag);
///
/// assert_eq!(parts.streams[&CategoryKey::new("blue")][0].original_index, 2);
/// assert_eq!(parts.other, vec![1]);
/// ```
pub fn partition<T, F>(items: &[T], classify: F) -> Partition
where
    T: Locatable,
    F: Fn(&T) -> Option<CategoryKey>,
{
    let mut parts = Partition::default();
    let mut located = 0;

    for (original_index, item) in items.iter().enumerate() {
        let classified = item.location().and_then(|location| {
            let id = located;
            located += 1;
            classify(item).map(|category| (id, location, category))
        });

        match classified {
            Some((id, location, category)) => {
                parts.streams.entry(category.clone()).or_default().push(Point::new(
                    id,
                    location.x(),
                    location.y(),
                    category,
                    original_index,
                ));
            }
            None => parts.other.push(original_index),
        }
    }

    parts
}

/// Every item passes through unclustered.
pub fn passthrough<T>(items: &[T]) -> Partition {
    Partition {
        streams: BTreeMap::new(),
        other: (0..items.len()).collect(),
    }
}
