//! # geocluster-types
//!
//! Core data types for the geocluster engine.
//!
//! - **Point types**: `Point`, `CategoryKey`
//! - **Viewport types**: `Region`, `BoundingBox`
//! - **Cluster output**: `ClusterNode`, `SpiralPosition`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::point::{CategoryKey, Point};
//! use geocluster_types::region::BoundingBox;
//!
//! let cafe = Point::new(0, 2.3522, 48.8566, CategoryKey::new("red"), 4);
//! assert_eq!(cafe.original_index, 4);
//!
//! let paris = BoundingBox::new(2.30, 48.80, 2.40, 48.90);
//! assert!(paris.contains(cafe.longitude(), cafe.latitude()));
//! ```

pub mod cluster;
pub mod point;
pub mod region;
