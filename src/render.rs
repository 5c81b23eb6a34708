//! Renderable units handed to the drawing layer.
//!
//! The engine never draws; it flattens its state into a [`RenderFrame`] of
//! tagged units that a map widget can dispatch on.

use crate::engine::state::EngineState;
use crate::viewport::Viewport;
use geo::Point as GeoPoint;
use geocluster_types::cluster::{ClusterNode, SpiralPosition};
use geocluster_types::point::CategoryKey;
use rustc_hash::FxHashSet;

/// One drawable element.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUnit {
    /// A single input point at its own position
    Singleton {
        category: CategoryKey,
        original_index: usize,
        location: GeoPoint<f64>,
    },
    /// An aggregate badge standing in for `node.point_count` points
    Cluster {
        category: CategoryKey,
        node: ClusterNode,
    },
    /// A leaf displaced around its cluster's centroid
    SpiralPoint {
        category: CategoryKey,
        position: SpiralPosition,
    },
}

impl RenderUnit {
    pub fn category(&self) -> &CategoryKey {
        match self {
            RenderUnit::Singleton { category, .. }
            | RenderUnit::Cluster { category, .. }
            | RenderUnit::SpiralPoint { category, .. } => category,
        }
    }

    /// Input index for units that stand for exactly one point.
    pub fn original_index(&self) -> Option<usize> {
        match self {
            RenderUnit::Singleton { original_index, .. } => Some(*original_index),
            RenderUnit::SpiralPoint { position, .. } => Some(position.original_index),
            RenderUnit::Cluster { .. } => None,
        }
    }
}

/// Everything to draw for one settled state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    pub units: Vec<RenderUnit>,
    /// Input indices of items that bypass clustering
    pub other: Vec<usize>,
    pub spiral_active: bool,
    pub viewport: Option<Viewport>,
}

impl RenderFrame {
    /// Flatten engine state: nodes per category, then spiral points.
    ///
    /// Clusters that were expanded into a spiral are omitted.
    pub fn from_state(state: &EngineState) -> Self {
        let expanded: FxHashSet<u64> = state.fans.iter().map(|fan| fan.cluster_id).collect();
        let mut units = Vec::new();

        for (category, stream) in &state.streams {
            for node in &stream.nodes {
                match node.original_index {
                    Some(original_index) if !node.is_cluster() => {
                        units.push(RenderUnit::Singleton {
                            category: category.clone(),
                            original_index,
                            location: node.location,
                        })
                    }
                    _ if expanded.contains(&node.id) => {}
                    _ => units.push(RenderUnit::Cluster {
                        category: category.clone(),
                        node: node.clone(),
                    }),
                }
            }
        }

        for fan in &state.fans {
            units.extend(fan.positions.iter().map(|position| RenderUnit::SpiralPoint {
                category: fan.category.clone(),
                position: position.clone(),
            }));
        }

        Self {
            units,
            other: state.other.clone(),
            spiral_active: state.spiral_active,
            viewport: state.viewport,
        }
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterNode> {
        self.units.iter().filter_map(|unit| match unit {
            RenderUnit::Cluster { node, .. } => Some(node),
            _ => None,
        })
    }

    pub fn spiral_points(&self) -> impl Iterator<Item = &SpiralPosition> {
        self.units.iter().filter_map(|unit| match unit {
            RenderUnit::SpiralPoint { position, .. } => Some(position),
            _ => None,
        })
    }

    pub fn singletons(&self) -> impl Iterator<Item = usize> + '_ {
        self.units.iter().filter_map(|unit| match unit {
            RenderUnit::Singleton { original_index, .. } => Some(*original_index),
            _ => None,
        })
    }

    /// Input indices drawn individually: singletons, spiral points and pass-through items.
    pub fn individual_indices(&self) -> Vec<usize> {
        self.units
            .iter()
            .filter_map(RenderUnit::original_index)
            .chain(self.other.iter().copied())
            .collect()
    }
}
