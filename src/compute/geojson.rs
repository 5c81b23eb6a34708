//! GeoJSON interop for engine input and output.
//!
//! Output features use the property names common to point-clustering
//! libraries (`cluster`, `cluster_id`, `point_count`,
//! `point_count_abbreviated`), so existing map styles can consume them.

use crate::error::{ClusterError, Result};
use crate::partition::Locatable;
use geo::Point as GeoPoint;
use geocluster_types::cluster::{ClusterNode, SpiralPosition};
use geocluster_types::point::CategoryKey;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

/// One feature of an input collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureItem {
    /// Set for Point geometries only
    pub location: Option<GeoPoint<f64>>,
    pub properties: JsonObject,
}

impl FeatureItem {
    /// String value of a property, if present.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_str())
    }
}

impl Locatable for FeatureItem {
    fn location(&self) -> Option<GeoPoint<f64>> {
        self.location
    }
}

/// Classifier using a string property as the category key.
pub fn classify_by_property(
    name: impl Into<String>,
) -> impl Fn(&FeatureItem) -> Option<CategoryKey> + Send + Sync + 'static {
    let name = name.into();
    move |item| item.property_str(&name).map(CategoryKey::from)
}

/// Parses a FeatureCollection into engine input, one item per feature.
///
/// Features without a Point geometry become pass-through items.
pub fn items_from_feature_collection(geojson: &str) -> Result<Vec<FeatureItem>> {
    let collection: FeatureCollection = serde_json::from_str(geojson)
        .map_err(|e| ClusterError::config(format!("Failed to parse GeoJSON: {}", e)))?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let location = match feature.geometry.map(|g| g.value) {
                Some(Value::Point(coords)) => {
                    if coords.len() < 2 {
                        return Err(ClusterError::config(format!(
                            "Feature {}: Point must have at least 2 coordinates",
                            idx
                        )));
                    }
                    Some(GeoPoint::new(coords[0], coords[1]))
                }
                _ => None,
            };

            Ok(FeatureItem {
                location,
                properties: feature.properties.unwrap_or_default(),
            })
        })
        .collect()
}

/// Converts a rendered node into a Point feature.
pub fn node_to_feature(node: &ClusterNode) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("cluster".into(), json!(node.is_cluster()));
    properties.insert("category".into(), json!(node.category.as_str()));
    properties.insert("point_count".into(), json!(node.point_count));
    properties.insert(
        "point_count_abbreviated".into(),
        json!(node.abbreviated_count()),
    );

    if node.is_cluster() {
        properties.insert("cluster_id".into(), json!(node.id));
    }
    if let Some(index) = node.original_index {
        properties.insert("index".into(), json!(index));
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            node.longitude(),
            node.latitude(),
        ]))),
        id: node
            .is_cluster()
            .then(|| Id::Number(serde_json::Number::from(node.id))),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Converts rendered nodes into a FeatureCollection.
pub fn nodes_to_feature_collection<'a>(
    nodes: impl IntoIterator<Item = &'a ClusterNode>,
) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: nodes.into_iter().map(node_to_feature).collect(),
        foreign_members: None,
    }
}

/// Converts spiral positions into LineString features from centroid to marker.
pub fn spiral_legs_to_feature_collection<'a>(
    positions: impl IntoIterator<Item = &'a SpiralPosition>,
) -> FeatureCollection {
    let features = positions
        .into_iter()
        .map(|pos| {
            let leg = pos.leg();
            let mut properties = JsonObject::new();
            properties.insert("index".into(), json!(pos.original_index));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(vec![
                    vec![leg.start.x, leg.start.y],
                    vec![leg.end.x, leg.end.y],
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
