//! The clustering engine: partition, index, query and spiral resolution.
//!
//! Two transitions drive the engine:
//!
//! - **Rebuild** on a new input set or a clustering toggle: partition the
//!   input, build one index per category, query them at the current region
//!   and emit "markers changed".
//! - **Reproject** on a settled region: query the existing indices with no
//!   rebuild, emit "region settled" and then "markers changed".
//!
//! Both compute the full new state before touching the old one, so a failed
//! call leaves the engine exactly as it was.
//!
//! ```rust
//! use geocluster::partition::{classify_by_tag, MapItem};
//! use geocluster::{EngineBuilder, Region};
//!
//! let mut engine = EngineBuilder::new()
//!     .region(Region::new(48.85, 2.30, 0.5, 0.5))
//!     .classify(classify_by_tag)
//!     .build()?;
//!
//! engine.rebuild(vec![
//!     MapItem::marker(2.3000, 48.8500, "red"),
//!     MapItem::marker(2.3001, 48.8501, "red"),
//!     MapItem::marker(2.3500, 48.8600, "blue"),
//!     MapItem::overlay(),
//! ])?;
//!
//! let frame = engine.frame();
//! assert_eq!(frame.clusters().count(), 1);
//! assert_eq!(frame.other, vec![3]);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod hooks;
pub mod state;
#[cfg(feature = "sync")]
pub mod sync;

use crate::compute::cluster_index::{ClusterIndex, SpatialIndex};
use crate::config::EngineConfig;
use crate::error::{ClusterError, Result};
use crate::partition::{Locatable, partition, passthrough};
use crate::render::RenderFrame;
use crate::viewport::{self, Viewport};
use geo::{BoundingRect, MultiPoint};
use geocluster_types::cluster::{ClusterNode, SpiralPosition};
use geocluster_types::point::{CategoryKey, Point};
use geocluster_types::region::Region;
use hooks::{ClusterActivation, Hooks, Notification, StreamNodes};
use state::{EngineState, IndexHandle};
use std::fmt;

/// Assigns an item to a category stream, or `None` to pass it through.
pub type Classifier<T> = Box<dyn Fn(&T) -> Option<CategoryKey> + Send + Sync>;

/// Padding applied around a cluster's leaves when framing them.
const FIT_PADDING: f64 = 1.2;
/// Smallest half-span of a framing region, for coincident leaves.
const MIN_FIT_DELTA: f64 = 0.0005;

/// Viewport-driven clustering engine over items of type `T`.
pub struct ClusterEngine<T> {
    config: EngineConfig,
    classifier: Classifier<T>,
    hooks: Hooks,
    items: Vec<T>,
    region: Region,
    state: EngineState,
}

impl<T: Locatable> ClusterEngine<T> {
    pub(crate) fn from_parts(
        config: EngineConfig,
        classifier: Classifier<T>,
        hooks: Hooks,
        region: Region,
    ) -> Self {
        Self {
            config,
            classifier,
            hooks,
            items: Vec::new(),
            region,
            state: EngineState::default(),
        }
    }

    /// Replace the input set and rebuild every index.
    ///
    /// Returns a handle to the new indices; it stays usable for leaf queries
    /// even after later rebuilds.
    pub fn rebuild(&mut self, items: Vec<T>) -> Result<IndexHandle> {
        let (handle, notifications) = self.apply_rebuild(items)?;
        self.hooks.dispatch_all(&notifications);
        Ok(handle)
    }

    /// Toggle clustering. A change triggers a rebuild over the current items.
    pub fn set_clustering_enabled(&mut self, enabled: bool) -> Result<IndexHandle> {
        let (handle, notifications) = self.apply_clustering_enabled(enabled)?;
        self.hooks.dispatch_all(&notifications);
        Ok(handle)
    }

    /// Re-query the existing indices for a settled region.
    pub fn reproject(&mut self, region: Region) -> Result<()> {
        let notifications = self.apply_reproject(region)?;
        self.hooks.dispatch_all(&notifications);
        Ok(())
    }

    /// Expand a cluster the user activated and report its leaves.
    ///
    /// An unknown category or an id that is not a cluster of the current
    /// index yields [`ClusterError::StaleReference`].
    pub fn activate_cluster(
        &mut self,
        category: &CategoryKey,
        cluster_id: u64,
    ) -> Result<ClusterActivation> {
        let (activation, notifications) = self.apply_activation(category, cluster_id)?;
        self.hooks.dispatch_all(&notifications);
        Ok(activation)
    }

    pub(crate) fn apply_rebuild(
        &mut self,
        items: Vec<T>,
    ) -> Result<(IndexHandle, Vec<Notification>)> {
        let state = self.build_state(&items)?;
        self.items = items;
        Ok(self.commit_rebuild(state))
    }

    pub(crate) fn apply_clustering_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(IndexHandle, Vec<Notification>)> {
        if self.config.clustering_enabled == enabled {
            return Ok((self.handle(), Vec::new()));
        }

        self.config.clustering_enabled = enabled;
        match self.build_state(&self.items) {
            Ok(state) => Ok(self.commit_rebuild(state)),
            Err(e) => {
                self.config.clustering_enabled = !enabled;
                Err(e)
            }
        }
    }

    pub(crate) fn apply_reproject(&mut self, region: Region) -> Result<Vec<Notification>> {
        let viewport = self.derive_viewport(&region).inspect_err(|e| {
            log::warn!("Rejecting region {:?}: {}", region, e);
        })?;
        self.region = region;

        if !self.config.clustering_enabled {
            self.state.viewport = Some(viewport);
            return Ok(vec![Notification::RegionSettled(region, StreamNodes::new())]);
        }

        self.state.project(viewport, &self.config.spiral);
        let center = region.center();
        log::debug!(
            "Reprojected {} streams around ({:.5}, {:.5}) at zoom {} (spiral {})",
            self.state.index_count(),
            center.x(),
            center.y(),
            viewport.zoom,
            if self.state.spiral_active { "on" } else { "off" }
        );

        let nodes = self.state.rendered_nodes();
        Ok(vec![
            Notification::RegionSettled(region, nodes.clone()),
            Notification::MarkersChanged(nodes),
        ])
    }

    pub(crate) fn apply_activation(
        &mut self,
        category: &CategoryKey,
        cluster_id: u64,
    ) -> Result<(ClusterActivation, Vec<Notification>)> {
        let stale = ClusterError::StaleReference { cluster_id };
        let index = &self.state.streams.get(category).ok_or(stale)?.index;

        let node = index.node(cluster_id)?;
        let leaves = index.leaves(cluster_id, None)?;
        let expansion_zoom = index.expansion_zoom(cluster_id)?;
        let fit_region = if self.config.preserve_cluster_press {
            None
        } else {
            fit_region(&leaves)
        };

        self.state.last_expanded = Some(leaves.clone());
        let activation = ClusterActivation {
            category: category.clone(),
            node,
            leaves,
            expansion_zoom,
            fit_region,
        };
        let notifications = vec![Notification::ClusterActivated(activation.clone())];
        Ok((activation, notifications))
    }

    /// Move the hooks out, leaving none behind.
    #[cfg(feature = "sync")]
    pub(crate) fn take_hooks(&mut self) -> Hooks {
        std::mem::take(&mut self.hooks)
    }

    fn derive_viewport(&self, region: &Region) -> Result<Viewport> {
        viewport::derive(region, &self.config.index, &self.config.viewport)
    }

    fn build_state(&self, items: &[T]) -> Result<EngineState> {
        let viewport = self.derive_viewport(&self.region)?;

        if !self.config.clustering_enabled {
            return Ok(EngineState::passthrough(passthrough(items).other, viewport));
        }

        let parts = partition(items, |item| (self.classifier)(item));
        log::trace!(
            "Partitioned {} points into {} streams, {} pass-through",
            parts.point_count(),
            parts.streams.len(),
            parts.other.len()
        );
        let indices = parts
            .streams
            .into_iter()
            .map(|(category, points)| ClusterIndex::build(category, points, &self.config.index))
            .collect::<Result<Vec<_>>>()?;

        let mut state = EngineState::with_indices(indices, parts.other);
        state.project(viewport, &self.config.spiral);
        Ok(state)
    }

    fn commit_rebuild(&mut self, state: EngineState) -> (IndexHandle, Vec<Notification>) {
        self.state = state;
        log::debug!(
            "Rebuilt {} items into {} indices ({} pass-through, clustering {})",
            self.items.len(),
            self.state.index_count(),
            self.state.other.len(),
            if self.config.clustering_enabled { "on" } else { "off" }
        );

        let nodes = self.state.rendered_nodes();
        (self.handle(), vec![Notification::MarkersChanged(nodes)])
    }
}

impl<T> ClusterEngine<T> {
    /// Handle to the current indices (empty when clustering is off).
    pub fn handle(&self) -> IndexHandle {
        self.state.handle()
    }

    /// Flatten the current state into drawable units.
    pub fn frame(&self) -> RenderFrame {
        RenderFrame::from_state(&self.state)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.state.viewport()
    }

    pub fn nodes(&self, category: &CategoryKey) -> &[ClusterNode] {
        self.state.nodes(category)
    }

    pub fn spiral_positions(&self) -> Vec<&SpiralPosition> {
        self.state.spiral_positions().collect()
    }

    pub fn is_spiral_active(&self) -> bool {
        self.state.is_spiral_active()
    }

    pub fn last_expanded_leaves(&self) -> Option<&[Point]> {
        self.state.last_expanded_leaves()
    }
}

impl<T> fmt::Debug for ClusterEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEngine")
            .field("config", &self.config)
            .field("items", &self.items.len())
            .field("region", &self.region)
            .field("state", &self.state)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Region whose derived bounding box frames all `leaves` with some padding.
fn fit_region(leaves: &[Point]) -> Option<Region> {
    let multi: MultiPoint<f64> = leaves.iter().map(|p| p.location).collect();
    let rect = multi.bounding_rect()?;
    let center = rect.center();

    Some(Region::new(
        center.y,
        center.x,
        (rect.height() / 2.0 * FIT_PADDING).max(MIN_FIT_DELTA),
        (rect.width() / 2.0 * FIT_PADDING).max(MIN_FIT_DELTA),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use crate::config::IndexParams;
    use crate::partition::{MapItem, classify_by_tag};

    fn paris_items() -> Vec<MapItem> {
        vec![
            MapItem::marker(2.3000, 48.8500, "red"),
            MapItem::marker(2.3001, 48.8501, "red"),
            MapItem::marker(2.3500, 48.8600, "blue"),
            MapItem::overlay(),
        ]
    }

    fn engine(region: Region) -> ClusterEngine<MapItem> {
        EngineBuilder::new()
            .config(EngineConfig::default().with_index(IndexParams::default().with_extent(128.0)))
            .region(region)
            .classify(classify_by_tag)
            .build()
            .unwrap()
    }

    #[test]
    fn test_rebuild_partitions_and_clusters() {
        let mut engine = engine(Region::new(48.85, 2.30, 0.5, 0.5));
        let handle = engine.rebuild(paris_items()).unwrap();

        assert_eq!(handle.categories().count(), 2);
        let red = engine.nodes(&CategoryKey::new("red"));
        assert_eq!(red.len(), 1);
        assert_eq!(red[0].point_count, 2);
        assert_eq!(engine.nodes(&CategoryKey::new("blue")).len(), 1);
        assert_eq!(engine.state().other(), &[3]);
        assert_eq!(engine.viewport().unwrap().zoom, 10);
        assert!(!engine.is_spiral_active());
    }

    #[test]
    fn test_failed_rebuild_keeps_state() {
        let mut engine = engine(Region::new(48.85, 2.30, 0.5, 0.5));
        engine.rebuild(paris_items()).unwrap();
        let before = engine.frame();

        let err = engine
            .rebuild(vec![MapItem::marker(500.0, 48.85, "red")])
            .unwrap_err();
        assert!(matches!(err, ClusterError::Configuration(_)));
        assert_eq!(engine.frame(), before);
        assert_eq!(engine.items().len(), 4);
    }

    #[test]
    fn test_activate_cluster_records_leaves() {
        let mut engine = engine(Region::new(48.85, 2.30, 0.5, 0.5));
        engine.rebuild(paris_items()).unwrap();
        let red = CategoryKey::new("red");
        let cluster_id = engine.nodes(&red)[0].id;

        let activation = engine.activate_cluster(&red, cluster_id).unwrap();
        assert_eq!(activation.leaves.len(), 2);
        assert_eq!(activation.node.point_count, 2);
        assert!(activation.expansion_zoom > 10);

        let fit = activation.fit_region.unwrap();
        assert!((fit.longitude - 2.30005).abs() < 1e-9);
        assert!(fit.longitude_delta >= MIN_FIT_DELTA);

        let recorded: Vec<_> = engine
            .last_expanded_leaves()
            .unwrap()
            .iter()
            .map(|p| p.original_index)
            .collect();
        assert_eq!(recorded, vec![0, 1]);
    }

    #[test]
    fn test_activate_unknown_cluster_is_stale() {
        let mut engine = engine(Region::new(48.85, 2.30, 0.5, 0.5));
        engine.rebuild(paris_items()).unwrap();

        let err = engine
            .activate_cluster(&CategoryKey::new("green"), 42)
            .unwrap_err();
        assert!(err.is_stale());

        let blue = CategoryKey::new("blue");
        let singleton = engine.nodes(&blue)[0].id;
        assert!(engine.activate_cluster(&blue, singleton).unwrap_err().is_stale());
        assert!(engine.last_expanded_leaves().is_none());
    }

    #[test]
    fn test_preserve_cluster_press_skips_fit() {
        let mut engine = EngineBuilder::new()
            .config(EngineConfig::default().with_preserve_cluster_press(true))
            .region(Region::new(48.85, 2.30, 0.5, 0.5))
            .classify(classify_by_tag)
            .build()
            .unwrap();
        engine.rebuild(paris_items()).unwrap();
        let red = CategoryKey::new("red");
        let id = engine.nodes(&red)[0].id;

        assert!(engine.activate_cluster(&red, id).unwrap().fit_region.is_none());
    }

    #[test]
    fn test_toggle_clustering_same_value_is_noop() {
        let mut engine = engine(Region::new(48.85, 2.30, 0.5, 0.5));
        engine.rebuild(paris_items()).unwrap();
        let handle = engine.set_clustering_enabled(true).unwrap();
        assert_eq!(handle.categories().count(), 2);
    }

    #[test]
    fn test_fit_region_of_coincident_leaves() {
        let red = CategoryKey::new("red");
        let leaves = vec![
            Point::new(0, 1.0, 2.0, red.clone(), 0),
            Point::new(1, 1.0, 2.0, red, 1),
        ];
        let fit = fit_region(&leaves).unwrap();
        assert_eq!(fit.longitude, 1.0);
        assert_eq!(fit.latitude_delta, MIN_FIT_DELTA);
        assert!(fit_region(&[]).is_none());
    }
}
