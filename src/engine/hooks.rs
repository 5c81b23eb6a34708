//! Notification hooks fired synchronously by the engine.
//!
//! Hooks run on the caller's stack after the engine state is fully updated,
//! so a hook always observes a consistent snapshot. Transitions first record
//! what happened as [`Notification`]s, then hand them to the hooks in order.

use geocluster_types::cluster::ClusterNode;
use geocluster_types::point::{CategoryKey, Point};
use geocluster_types::region::Region;
use std::collections::BTreeMap;
use std::fmt;

/// Rendered nodes keyed by category.
pub type StreamNodes = BTreeMap<CategoryKey, Vec<ClusterNode>>;

/// Outcome of activating (tapping) a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterActivation {
    pub category: CategoryKey,
    pub node: ClusterNode,
    /// Every input point under the cluster
    pub leaves: Vec<Point>,
    /// Smallest zoom at which the cluster splits apart
    pub expansion_zoom: u8,
    /// Region framing all leaves, unless cluster press behavior is preserved
    pub fit_region: Option<Region>,
}

/// One event produced by a committed transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    MarkersChanged(StreamNodes),
    RegionSettled(Region, StreamNodes),
    ClusterActivated(ClusterActivation),
}

type MarkersHook = Box<dyn FnMut(&StreamNodes) + Send + Sync>;
type RegionHook = Box<dyn FnMut(&Region, &StreamNodes) + Send + Sync>;
type ActivationHook = Box<dyn FnMut(&ClusterActivation) + Send + Sync>;

#[derive(Default)]
pub struct Hooks {
    pub(crate) markers_changed: Option<MarkersHook>,
    pub(crate) region_settled: Option<RegionHook>,
    pub(crate) cluster_activated: Option<ActivationHook>,
}

impl Hooks {
    pub(crate) fn dispatch(&mut self, notification: &Notification) {
        match notification {
            Notification::MarkersChanged(nodes) => self.markers_changed(nodes),
            Notification::RegionSettled(region, nodes) => self.region_settled(region, nodes),
            Notification::ClusterActivated(activation) => self.cluster_activated(activation),
        }
    }

    pub(crate) fn dispatch_all(&mut self, notifications: &[Notification]) {
        for notification in notifications {
            self.dispatch(notification);
        }
    }

    fn markers_changed(&mut self, nodes: &StreamNodes) {
        if let Some(hook) = self.markers_changed.as_mut() {
            hook(nodes);
        }
    }

    fn region_settled(&mut self, region: &Region, nodes: &StreamNodes) {
        if let Some(hook) = self.region_settled.as_mut() {
            hook(region, nodes);
        }
    }

    fn cluster_activated(&mut self, activation: &ClusterActivation) {
        if let Some(hook) = self.cluster_activated.as_mut() {
            hook(activation);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("markers_changed", &self.markers_changed.is_some())
            .field("region_settled", &self.region_settled.is_some())
            .field("cluster_activated", &self.cluster_activated.is_some())
            .finish()
    }
}
