//! Snapshot of everything the engine has computed for the current inputs.

use crate::compute::cluster_index::{ClusterIndex, SpatialIndex};
use crate::compute::spiral::{self, SpiralFan};
use crate::config::SpiralConfig;
use crate::engine::hooks::StreamNodes;
use crate::error::{ClusterError, Result};
use crate::viewport::Viewport;
use geocluster_types::cluster::{ClusterNode, SpiralPosition};
use geocluster_types::point::{CategoryKey, Point};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One category's index and the nodes it produced for the current viewport.
#[derive(Debug, Clone)]
pub(crate) struct Stream {
    pub(crate) index: Arc<ClusterIndex>,
    pub(crate) nodes: Vec<ClusterNode>,
}

/// Engine state, replaced wholesale on rebuild.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub(crate) streams: BTreeMap<CategoryKey, Stream>,
    pub(crate) other: Vec<usize>,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) fans: Vec<SpiralFan>,
    pub(crate) spiral_active: bool,
    pub(crate) last_expanded: Option<Vec<Point>>,
}

impl EngineState {
    /// State in which every item bypasses clustering.
    pub(crate) fn passthrough(other: Vec<usize>, viewport: Viewport) -> Self {
        Self {
            other,
            viewport: Some(viewport),
            ..Self::default()
        }
    }

    pub(crate) fn with_indices(indices: Vec<ClusterIndex>, other: Vec<usize>) -> Self {
        let streams = indices
            .into_iter()
            .map(|index| {
                let category = index.category().clone();
                let stream = Stream {
                    index: Arc::new(index),
                    nodes: Vec::new(),
                };
                (category, stream)
            })
            .collect();

        Self {
            streams,
            other,
            ..Self::default()
        }
    }

    /// Query every index at `viewport` and refresh the spiral layout.
    pub(crate) fn project(&mut self, viewport: Viewport, spiral_config: &SpiralConfig) {
        for stream in self.streams.values_mut() {
            stream.nodes = stream.index.query(&viewport.bbox, viewport.zoom);
        }
        self.viewport = Some(viewport);

        let active = spiral::should_activate(
            viewport.zoom,
            self.streams.values().flat_map(|s| s.nodes.iter()),
            spiral_config,
        );

        if active {
            self.fans = spiral::resolve(
                self.streams
                    .iter()
                    .map(|(category, s)| (category, s.index.as_ref(), s.nodes.as_slice())),
                spiral_config,
            );
        } else {
            self.fans.clear();
        }
        self.spiral_active = active;
    }

    pub fn rendered_nodes(&self) -> StreamNodes {
        self.streams
            .iter()
            .map(|(category, s)| (category.clone(), s.nodes.clone()))
            .collect()
    }

    pub fn nodes(&self, category: &CategoryKey) -> &[ClusterNode] {
        self.streams
            .get(category)
            .map(|s| s.nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn other(&self) -> &[usize] {
        &self.other
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn fans(&self) -> &[SpiralFan] {
        &self.fans
    }

    pub fn spiral_positions(&self) -> impl Iterator<Item = &SpiralPosition> {
        self.fans.iter().flat_map(|fan| fan.positions.iter())
    }

    pub fn is_spiral_active(&self) -> bool {
        self.spiral_active
    }

    pub fn last_expanded_leaves(&self) -> Option<&[Point]> {
        self.last_expanded.as_deref()
    }

    pub fn index_count(&self) -> usize {
        self.streams.len()
    }

    pub(crate) fn handle(&self) -> IndexHandle {
        IndexHandle {
            indices: self
                .streams
                .iter()
                .map(|(category, s)| (category.clone(), Arc::clone(&s.index)))
                .collect(),
        }
    }
}

/// Shared, read-only access to the indices produced by one rebuild.
///
/// Handles stay valid after later rebuilds; they keep answering for the data
/// they were built from.
#[derive(Debug, Clone, Default)]
pub struct IndexHandle {
    indices: BTreeMap<CategoryKey, Arc<ClusterIndex>>,
}

impl IndexHandle {
    pub fn get(&self, category: &CategoryKey) -> Option<&ClusterIndex> {
        self.indices.get(category).map(Arc::as_ref)
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryKey> {
        self.indices.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Leaf points of a cluster in the given category.
    pub fn leaves(
        &self,
        category: &CategoryKey,
        cluster_id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<Point>> {
        self.get(category)
            .ok_or(ClusterError::StaleReference { cluster_id })?
            .leaves(cluster_id, limit)
    }
}
