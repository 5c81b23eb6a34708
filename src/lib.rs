//! Viewport-driven point clustering with spiral expansion for interactive maps.
//!
//! Input items are partitioned into category streams, each stream gets its
//! own hierarchical cluster index, and every settled viewport is answered
//! with the clusters and singletons visible at its zoom level. Clusters that
//! survive to high zoom are fanned out on a spiral around their centroid.
//!
//! ```rust
//! use geocluster::partition::{classify_by_tag, MapItem};
//! use geocluster::{BoundingBox, EngineBuilder, Region};
//!
//! let mut engine = EngineBuilder::new()
//!     .region(Region::new(48.85, 2.30, 0.5, 0.5))
//!     .classify(classify_by_tag)
//!     .build()?;
//!
//! engine.rebuild(vec![
//!     MapItem::marker(2.3000, 48.8500, "red"),
//!     MapItem::marker(2.3001, 48.8501, "red"),
//! ])?;
//!
//! let bbox = engine.viewport().unwrap().bbox;
//! assert!(bbox.contains(2.30, 48.85));
//! assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).contains(2.30, 48.85));
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod partition;
pub mod render;
pub mod viewport;

pub use builder::EngineBuilder;
pub use engine::ClusterEngine;
pub use engine::hooks::{ClusterActivation, StreamNodes};
pub use engine::state::{EngineState, IndexHandle};
pub use error::{ClusterError, Result};

#[cfg(feature = "sync")]
pub use engine::sync::SyncClusterEngine;

pub use config::{EngineConfig, IndexParams, SpiralConfig, ViewportConfig};

pub use compute::cluster_index::{ClusterIndex, SpatialIndex};
pub use compute::spiral::SpiralFan;

pub use geocluster_types::cluster::{ClusterNode, SpiralPosition};
pub use geocluster_types::point::{CategoryKey, Point};
pub use geocluster_types::region::{BoundingBox, Region};

pub use partition::{Locatable, MapItem};
pub use render::{RenderFrame, RenderUnit};
pub use viewport::Viewport;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterEngine, ClusterError, EngineBuilder, Result};

    pub use crate::{EngineConfig, IndexParams, SpiralConfig, ViewportConfig};

    pub use crate::{BoundingBox, CategoryKey, ClusterNode, Point, Region, SpiralPosition};

    pub use crate::partition::{Locatable, MapItem, classify_by_tag};

    pub use crate::{RenderFrame, RenderUnit};

    #[cfg(feature = "sync")]
    pub use crate::SyncClusterEngine;
}
