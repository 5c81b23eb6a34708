//! Compute layer: indexing, spiral layout and input validation.
//!
//! Nothing in here knows about the engine's lifecycle or hooks; the engine
//! composes these pieces per rebuild and per reprojection.

pub mod cluster_index;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod spiral;
pub mod validation;
