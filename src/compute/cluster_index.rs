//! Hierarchical point-cluster index over per-zoom R-trees.
//!
//! The index is built once from a static point set and answers two queries:
//! which clusters are visible in a bounding box at a zoom level, and which
//! input points sit under a given cluster.
//!
//! ## Construction
//!
//! Points are projected into unit Web-Mercator space. The deepest level
//! (`max_zoom + 1`) holds the raw points. Each shallower level is derived from
//! the one below it greedily: nodes are visited in order and an unvisited node
//! absorbs every unvisited neighbour within `radius / (extent * 2^zoom)` into a
//! new cluster placed at the count-weighted centroid. Nodes with no neighbours
//! are carried up unchanged.
//!
//! Levels larger than `node_size` are bulk-loaded into an `rstar::RTree`; small
//! levels are scanned linearly, which is faster than descending a tree.
//!
//! ## Identifiers
//!
//! Node ids embed the generation of the index that produced them, so an id
//! kept across a rebuild is reported as [`ClusterError::StaleReference`]
//! instead of silently resolving to an unrelated node.
//!
//! ## Example
//!
//! ```rust
//! use geocluster::compute::cluster_index::{ClusterIndex, SpatialIndex};
//! use geocluster::{BoundingBox, CategoryKey, IndexParams, Point};
//!
//! let red = CategoryKey::new("red");
//! let points = vec![
//!     Point::new(0, 2.3000, 48.8500, red.clone(), 0),
//!     Point::new(1, 2.3001, 48.8501, red.clone(), 1),
//! ];
//! let index = ClusterIndex::build(red, points, &IndexParams::default())?;
//!
//! let nodes = index.query(&BoundingBox::new(2.0, 48.0, 3.0, 49.0), 10);
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].point_count, 2);
//!
//! let leaves = index.leaves(nodes[0].id, None)?;
//! assert_eq!(leaves.len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

use crate::compute::validation::validate_points;
use crate::config::IndexParams;
use crate::error::{ClusterError, Result};
use geo::Point as GeoPoint;
use geocluster_types::cluster::ClusterNode;
use geocluster_types::point::{CategoryKey, Point};
use geocluster_types::region::BoundingBox;
use rstar::{AABB, Point as RstarPoint, RTree};
use smallvec::SmallVec;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Marks a node that has not been visited at any zoom yet.
const UNVISITED: u8 = u8::MAX;

/// Contract between the engine and a hierarchical spatial index.
pub trait SpatialIndex {
    /// Nodes visible inside `bbox` at `zoom`.
    fn query(&self, bbox: &BoundingBox, zoom: u8) -> Vec<ClusterNode>;

    /// Input points under a cluster, in stable order; `None` means unbounded.
    fn leaves(&self, cluster_id: u64, limit: Option<usize>) -> Result<Vec<Point>>;

    /// Number of input points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Projected position of a level node, stored in the R-tree.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LevelEntry {
    x: f64,
    y: f64,
    node: u32,
}

impl LevelEntry {
    fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            node: u32::MAX,
        }
    }
}

impl RstarPoint for LevelEntry {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self::at(generator(0), generator(1))
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// The nodes present at one zoom level.
#[derive(Debug)]
enum Level {
    Linear(Vec<LevelEntry>),
    Tree(RTree<LevelEntry>),
}

impl Level {
    fn new(entries: Vec<LevelEntry>, node_size: usize) -> Self {
        if entries.len() <= node_size {
            Level::Linear(entries)
        } else {
            Level::Tree(RTree::bulk_load(entries))
        }
    }

    fn len(&self) -> usize {
        match self {
            Level::Linear(entries) => entries.len(),
            Level::Tree(tree) => tree.size(),
        }
    }

    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<u32> {
        let r2 = radius * radius;
        match self {
            Level::Linear(entries) => entries
                .iter()
                .filter(|e| {
                    let (dx, dy) = (e.x - x, e.y - y);
                    dx * dx + dy * dy <= r2
                })
                .map(|e| e.node)
                .collect(),
            Level::Tree(tree) => tree
                .locate_within_distance(LevelEntry::at(x, y), r2)
                .map(|e| e.node)
                .collect(),
        }
    }

    fn in_envelope(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64, out: &mut Vec<u32>) {
        match self {
            Level::Linear(entries) => out.extend(
                entries
                    .iter()
                    .filter(|e| e.x >= min_x && e.x <= max_x && e.y >= min_y && e.y <= max_y)
                    .map(|e| e.node),
            ),
            Level::Tree(tree) => {
                let envelope = AABB::from_corners(
                    LevelEntry::at(min_x, min_y),
                    LevelEntry::at(max_x, max_y),
                );
                out.extend(tree.locate_in_envelope(&envelope).map(|e| e.node));
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    count: usize,
    /// Merged nodes one level deeper; empty for input points
    children: SmallVec<[u32; 4]>,
    /// Index into `points` for input points
    origin: Option<u32>,
    /// Last zoom this node was visited at while building
    zoom: u8,
    /// Zoom at which a cluster was formed
    formed_zoom: u8,
}

impl Node {
    fn leaf(x: f64, y: f64, origin: u32) -> Self {
        Self {
            x,
            y,
            count: 1,
            children: SmallVec::new(),
            origin: Some(origin),
            zoom: UNVISITED,
            formed_zoom: UNVISITED,
        }
    }
}

/// Greedy hierarchical cluster index for one category stream.
#[derive(Debug)]
pub struct ClusterIndex {
    category: CategoryKey,
    params: IndexParams,
    generation: u32,
    points: Vec<Point>,
    nodes: Vec<Node>,
    /// `levels[0]` is `min_zoom`, the last entry is `max_zoom + 1`
    levels: Vec<Level>,
}

impl ClusterIndex {
    /// Build an index from the points of one category.
    ///
    /// Fails with [`ClusterError::Configuration`] on invalid parameters or
    /// points with out-of-range coordinates.
    pub fn build(category: CategoryKey, points: Vec<Point>, params: &IndexParams) -> Result<Self> {
        params.validate().map_err(ClusterError::Configuration)?;
        validate_points(&points)?;

        if points.len() > (u32::MAX / 2) as usize {
            return Err(ClusterError::config(format!(
                "Too many points for a single index: {}",
                points.len()
            )));
        }

        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

        let mut nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(i, p)| Node::leaf(lng_x(p.longitude()), lat_y(p.latitude()), i as u32))
            .collect();

        let mut current: Vec<u32> = (0..nodes.len() as u32).collect();
        let mut level = Level::new(entries(&nodes, &current), params.node_size);
        let mut levels = Vec::with_capacity((params.max_zoom - params.min_zoom) as usize + 2);

        for zoom in (params.min_zoom..=params.max_zoom).rev() {
            let next = cluster_level(&mut nodes, &level, &current, zoom, params);
            log::trace!(
                "category {}: zoom {} reduced {} nodes to {}",
                category,
                zoom,
                current.len(),
                next.len()
            );
            let next_level = Level::new(entries(&nodes, &next), params.node_size);
            levels.push(std::mem::replace(&mut level, next_level));
            current = next;
        }
        levels.push(level);
        levels.reverse();

        log::debug!(
            "Built cluster index for category {} ({} points, {} nodes, zooms {}..={})",
            category,
            points.len(),
            nodes.len(),
            params.min_zoom,
            params.max_zoom + 1
        );

        Ok(Self {
            category,
            params: params.clone(),
            generation,
            points,
            nodes,
            levels,
        })
    }

    pub fn category(&self) -> &CategoryKey {
        &self.category
    }

    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    /// Number of nodes visible at `zoom` across the whole world.
    pub fn level_len(&self, zoom: u8) -> usize {
        self.levels[self.level_slot(zoom)].len()
    }

    /// Resolve a single node by id.
    pub fn node(&self, id: u64) -> Result<ClusterNode> {
        let index = self.resolve(id)?;
        Ok(self.to_cluster_node(index))
    }

    /// Direct children of a cluster, one zoom level deeper.
    pub fn children(&self, cluster_id: u64) -> Result<Vec<ClusterNode>> {
        let index = self.resolve_cluster(cluster_id)?;
        Ok(self.nodes[index as usize]
            .children
            .iter()
            .map(|&child| self.to_cluster_node(child))
            .collect())
    }

    /// Smallest zoom at which the cluster splits into several nodes.
    pub fn expansion_zoom(&self, cluster_id: u64) -> Result<u8> {
        let index = self.resolve_cluster(cluster_id)?;
        let formed = self.nodes[index as usize].formed_zoom;
        Ok((formed + 1).min(self.params.max_zoom + 1))
    }

    fn level_slot(&self, zoom: u8) -> usize {
        let zoom = zoom.clamp(self.params.min_zoom, self.params.max_zoom + 1);
        (zoom - self.params.min_zoom) as usize
    }

    fn encode(&self, node: u32) -> u64 {
        ((self.generation as u64) << 32) | node as u64
    }

    fn resolve(&self, id: u64) -> Result<u32> {
        let generation = (id >> 32) as u32;
        let index = (id & u32::MAX as u64) as u32;
        if generation != self.generation || index as usize >= self.nodes.len() {
            return Err(ClusterError::StaleReference { cluster_id: id });
        }
        Ok(index)
    }

    fn resolve_cluster(&self, id: u64) -> Result<u32> {
        let index = self.resolve(id)?;
        if self.nodes[index as usize].origin.is_some() {
            return Err(ClusterError::StaleReference { cluster_id: id });
        }
        Ok(index)
    }

    fn to_cluster_node(&self, index: u32) -> ClusterNode {
        let node = &self.nodes[index as usize];
        match node.origin {
            Some(origin) => {
                let point = &self.points[origin as usize];
                ClusterNode {
                    id: self.encode(index),
                    location: point.location,
                    point_count: 1,
                    category: self.category.clone(),
                    original_index: Some(point.original_index),
                }
            }
            None => ClusterNode {
                id: self.encode(index),
                location: GeoPoint::new(x_lng(node.x), y_lat(node.y)),
                point_count: node.count,
                category: self.category.clone(),
                original_index: None,
            },
        }
    }

    fn collect_leaves(&self, index: u32, limit: usize, out: &mut Vec<Point>) {
        let node = &self.nodes[index as usize];
        if let Some(origin) = node.origin {
            out.push(self.points[origin as usize].clone());
            return;
        }
        for &child in &node.children {
            if out.len() >= limit {
                return;
            }
            self.collect_leaves(child, limit, out);
        }
    }
}

impl SpatialIndex for ClusterIndex {
    fn query(&self, bbox: &BoundingBox, zoom: u8) -> Vec<ClusterNode> {
        if ![bbox.west, bbox.south, bbox.east, bbox.north]
            .iter()
            .all(|v| v.is_finite())
        {
            log::warn!("Rejecting cluster query with non-finite bounding box");
            return Vec::new();
        }

        let level = &self.levels[self.level_slot(zoom)];
        let min_lat = bbox.south.clamp(-90.0, 90.0);
        let max_lat = bbox.north.clamp(-90.0, 90.0);
        let (min_y, max_y) = (lat_y(max_lat), lat_y(min_lat));

        let mut found = Vec::new();
        if bbox.width() >= 360.0 {
            level.in_envelope(0.0, min_y, 1.0, max_y, &mut found);
        } else {
            let min_lng = normalize_lng(bbox.west);
            let max_lng = if bbox.east == 180.0 {
                180.0
            } else {
                normalize_lng(bbox.east)
            };
            if min_lng > max_lng {
                level.in_envelope(lng_x(min_lng), min_y, 1.0, max_y, &mut found);
                level.in_envelope(0.0, min_y, lng_x(max_lng), max_y, &mut found);
            } else {
                level.in_envelope(lng_x(min_lng), min_y, lng_x(max_lng), max_y, &mut found);
            }
        }

        // halves of a split query meet at the antimeridian
        found.sort_unstable();
        found.dedup();
        found
            .into_iter()
            .map(|index| self.to_cluster_node(index))
            .collect()
    }

    fn leaves(&self, cluster_id: u64, limit: Option<usize>) -> Result<Vec<Point>> {
        let index = self.resolve_cluster(cluster_id)?;
        let limit = limit.unwrap_or(usize::MAX);
        let mut out = Vec::with_capacity(self.nodes[index as usize].count.min(limit));
        self.collect_leaves(index, limit, &mut out);
        Ok(out)
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

fn entries(nodes: &[Node], ids: &[u32]) -> Vec<LevelEntry> {
    ids.iter()
        .map(|&id| {
            let node = &nodes[id as usize];
            LevelEntry {
                x: node.x,
                y: node.y,
                node: id,
            }
        })
        .collect()
}

/// Merge the nodes of the level below `zoom` into the nodes visible at `zoom`.
fn cluster_level(
    nodes: &mut Vec<Node>,
    level: &Level,
    current: &[u32],
    zoom: u8,
    params: &IndexParams,
) -> Vec<u32> {
    let radius = params.radius / (params.extent * 2f64.powi(zoom as i32));
    let mut next = Vec::with_capacity(current.len());

    for &id in current {
        if nodes[id as usize].zoom <= zoom {
            continue;
        }
        nodes[id as usize].zoom = zoom;

        let (x, y) = (nodes[id as usize].x, nodes[id as usize].y);
        let mut neighbors: Vec<u32> = level
            .within(x, y, radius)
            .into_iter()
            .filter(|&n| n != id && nodes[n as usize].zoom > zoom)
            .collect();

        if neighbors.is_empty() {
            next.push(id);
            continue;
        }
        neighbors.sort_unstable();

        let own = nodes[id as usize].count as f64;
        let (mut wx, mut wy, mut total) = (x * own, y * own, nodes[id as usize].count);
        for &n in &neighbors {
            let neighbor = &mut nodes[n as usize];
            neighbor.zoom = zoom;
            let weight = neighbor.count as f64;
            wx += neighbor.x * weight;
            wy += neighbor.y * weight;
            total += neighbor.count;
        }

        let mut children = SmallVec::with_capacity(neighbors.len() + 1);
        children.push(id);
        children.extend(neighbors);

        nodes.push(Node {
            x: wx / total as f64,
            y: wy / total as f64,
            count: total,
            children,
            origin: None,
            zoom: UNVISITED,
            formed_zoom: zoom,
        });
        next.push((nodes.len() - 1) as u32);
    }

    next
}

fn normalize_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}
