//! Engine builder
//!
//! Collects the serializable configuration together with the parts that are
//! not: the category predicate and the notification hooks.

use crate::config::EngineConfig;
use crate::engine::hooks::{ClusterActivation, Hooks, StreamNodes};
use crate::engine::{Classifier, ClusterEngine};
use crate::error::{ClusterError, Result};
use crate::partition::Locatable;
use crate::viewport;
use geocluster_types::point::CategoryKey;
use geocluster_types::region::Region;

/// Category used when no predicate is supplied.
pub const DEFAULT_CATEGORY: &str = "default";

/// Builder for [`ClusterEngine`].
pub struct EngineBuilder<T> {
    config: EngineConfig,
    region: Region,
    classifier: Option<Classifier<T>>,
    hooks: Hooks,
}

impl<T: Locatable> EngineBuilder<T> {
    /// Create a new builder with default configuration, framing the whole world.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            region: Region::new(0.0, 0.0, 85.0, 180.0),
            classifier: None,
            hooks: Hooks::default(),
        }
    }

    /// Set the engine configuration (index tuning, spiral, viewport).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Region the first rebuild is queried against.
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Predicate assigning items to category streams; `None` passes an item through.
    pub fn classify<F>(mut self, classify: F) -> Self
    where
        F: Fn(&T) -> Option<CategoryKey> + Send + Sync + 'static,
    {
        self.classifier = Some(Box::new(classify));
        self
    }

    /// Called after every rebuild and reprojection with the nodes per category.
    pub fn on_markers_changed<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&StreamNodes) + Send + Sync + 'static,
    {
        self.hooks.markers_changed = Some(Box::new(hook));
        self
    }

    /// Called after a reprojection, before "markers changed".
    pub fn on_region_settled<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Region, &StreamNodes) + Send + Sync + 'static,
    {
        self.hooks.region_settled = Some(Box::new(hook));
        self
    }

    /// Called when a cluster is activated.
    pub fn on_cluster_activated<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&ClusterActivation) + Send + Sync + 'static,
    {
        self.hooks.cluster_activated = Some(Box::new(hook));
        self
    }

    /// Build the engine. Validates the configuration and the initial region.
    pub fn build(self) -> Result<ClusterEngine<T>>
    where
        T: 'static,
    {
        self.config
            .validate()
            .map_err(ClusterError::Configuration)?;
        viewport::derive(&self.region, &self.config.index, &self.config.viewport)?;

        let classifier: Classifier<T> = match self.classifier {
            Some(classifier) => classifier,
            None => Box::new(|_: &T| Some(CategoryKey::new(DEFAULT_CATEGORY))),
        };

        Ok(ClusterEngine::from_parts(
            self.config,
            classifier,
            self.hooks,
            self.region,
        ))
    }
}

impl<T: Locatable> Default for EngineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
