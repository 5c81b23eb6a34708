//! Spiral ("spider") expansion of clusters that survive to high zoom.
//!
//! Small clusters are fanned out on a single circle; larger ones on an
//! Archimedean spiral whose radius grows with every placed point, so early
//! points never collide with late ones. Offsets are applied in degrees:
//! `latitude += r·cos θ`, `longitude += r·sin θ / cos φ`, where the `cos φ`
//! correction at the centroid's latitude keeps the circle round on a
//! Mercator map instead of stretching it east-west.

use crate::compute::cluster_index::SpatialIndex;
use crate::config::SpiralConfig;
use geo::Point as GeoPoint;
use geocluster_types::cluster::{ClusterNode, SpiralPosition, longitude_scale};
use geocluster_types::point::{CategoryKey, Point};
use std::f64::consts::TAU;

/// Clusters with more leaves than this are still expanded, but logged.
pub const LARGE_FAN_WARNING: usize = 1_000;

/// The expanded leaves of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiralFan {
    pub category: CategoryKey,
    pub cluster_id: u64,
    pub center: GeoPoint<f64>,
    pub positions: Vec<SpiralPosition>,
}

/// Whether expansion applies at `zoom` for the given node lists.
pub fn should_activate<'a>(
    zoom: u8,
    mut nodes: impl Iterator<Item = &'a ClusterNode>,
    config: &SpiralConfig,
) -> bool {
    config.enabled && zoom >= config.zoom_threshold && nodes.any(ClusterNode::is_cluster)
}

/// Polar offsets `(radius, angle)` for `count` points.
pub fn offsets(count: usize, config: &SpiralConfig) -> Vec<(f64, f64)> {
    if count <= config.fan_out_threshold {
        circle(count, config)
    } else {
        spiral(count, config)
    }
}

fn circle(count: usize, config: &SpiralConfig) -> Vec<(f64, f64)> {
    let step = TAU / count.max(1) as f64;
    (0..count)
        .map(|i| (config.circle_radius, config.start_angle + step * i as f64))
        .collect()
}

fn spiral(count: usize, config: &SpiralConfig) -> Vec<(f64, f64)> {
    // r = a + b·θ, one full turn adds `pitch` to the radius
    let growth = config.pitch / TAU;
    let mut swept = 0.0;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let radius = config.circle_radius + growth * swept;
        out.push((radius, config.start_angle + swept));
        swept += config.spacing / radius;
    }
    out
}

/// Lay `leaves` out around `center`, in leaf order.
pub fn layout(center: GeoPoint<f64>, leaves: &[Point], config: &SpiralConfig) -> Vec<SpiralPosition> {
    let scale = longitude_scale(center.y());
    offsets(leaves.len(), config)
        .into_iter()
        .zip(leaves)
        .map(|((radius, angle), leaf)| SpiralPosition {
            location: GeoPoint::new(
                center.x() + radius * angle.sin() / scale,
                center.y() + radius * angle.cos(),
            ),
            center,
            original_index: leaf.original_index,
        })
        .collect()
}

/// Expand every cluster of every stream, in stream then node order.
///
/// Clusters whose id no longer resolves in their index are skipped; the next
/// reprojection supersedes the partial result.
pub fn resolve<'a, I>(
    streams: impl IntoIterator<Item = (&'a CategoryKey, &'a I, &'a [ClusterNode])>,
    config: &SpiralConfig,
) -> Vec<SpiralFan>
where
    I: SpatialIndex + 'a,
{
    let mut fans = Vec::new();

    for (category, index, nodes) in streams {
        for node in nodes.iter().filter(|n| n.is_cluster()) {
            let leaves = match index.leaves(node.id, None) {
                Ok(leaves) => leaves,
                Err(e) => {
                    log::debug!("Skipping spiral for category {}: {}", category, e);
                    continue;
                }
            };

            if leaves.len() > LARGE_FAN_WARNING {
                log::warn!(
                    "Expanding cluster of {} points in category {} into a single spiral",
                    leaves.len(),
                    category
                );
            }

            fans.push(SpiralFan {
                category: category.clone(),
                cluster_id: node.id,
                center: node.location,
                positions: layout(node.location, &leaves, config),
            });
        }
    }

    fans
}
