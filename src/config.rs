//! Engine configuration
//!
//! Tuning for the spatial index, spiral expansion and the zoom heuristic.
//! The category predicate and notification hooks are not serializable and are
//! supplied through [`EngineBuilder`](crate::EngineBuilder) instead.
use serde::de::Error;

/// Upper bound for zoom levels; keeps `2^zoom` and the level table small.
pub const MAX_ZOOM_LIMIT: u8 = 30;

/// Tuning parameters of the hierarchical cluster index.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexParams {
    /// Cluster radius in pixels of a tile of `extent` pixels
    #[serde(default = "IndexParams::default_radius")]
    pub radius: f64,

    /// Highest zoom at which points are still clustered
    #[serde(default = "IndexParams::default_max_zoom")]
    pub max_zoom: u8,

    /// Lowest zoom that gets its own level
    #[serde(default = "IndexParams::default_min_zoom")]
    pub min_zoom: u8,

    /// Tile extent the radius is expressed against
    #[serde(default = "IndexParams::default_extent")]
    pub extent: f64,

    /// Levels at or below this size are scanned linearly instead of through an R-tree
    #[serde(default = "IndexParams::default_node_size")]
    pub node_size: usize,
}

impl IndexParams {
    const fn default_radius() -> f64 {
        40.0
    }

    const fn default_max_zoom() -> u8 {
        20
    }

    const fn default_min_zoom() -> u8 {
        1
    }

    const fn default_extent() -> f64 {
        250.0
    }

    const fn default_node_size() -> usize {
        64
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_node_size(mut self, node_size: usize) -> Self {
        self.node_size = node_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(format!(
                "Cluster radius must be positive and finite, got: {}",
                self.radius
            ));
        }
        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(format!(
                "Tile extent must be positive and finite, got: {}",
                self.extent
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }
        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(format!(
                "max_zoom must be at most {}, got: {}",
                MAX_ZOOM_LIMIT, self.max_zoom
            ));
        }
        if self.node_size == 0 {
            return Err("Node size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            max_zoom: Self::default_max_zoom(),
            min_zoom: Self::default_min_zoom(),
            extent: Self::default_extent(),
            node_size: Self::default_node_size(),
        }
    }
}

/// Spiral ("spider") expansion of clusters at high zoom.
///
/// Distances are in degrees and applied directly to longitude/latitude.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpiralConfig {
    #[serde(default = "SpiralConfig::default_enabled")]
    pub enabled: bool,

    /// Expansion starts at this zoom level
    #[serde(default = "SpiralConfig::default_zoom_threshold")]
    pub zoom_threshold: u8,

    /// Clusters up to this size are laid out on a single circle
    #[serde(default = "SpiralConfig::default_fan_out_threshold")]
    pub fan_out_threshold: usize,

    /// Circle radius, also the starting radius of the spiral
    #[serde(default = "SpiralConfig::default_circle_radius")]
    pub circle_radius: f64,

    /// Arc distance between successive spiral points
    #[serde(default = "SpiralConfig::default_spacing")]
    pub spacing: f64,

    /// Radial distance between successive spiral turns
    #[serde(default = "SpiralConfig::default_pitch")]
    pub pitch: f64,

    /// Angle of the first point, in radians
    #[serde(default)]
    pub start_angle: f64,
}

impl SpiralConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_zoom_threshold() -> u8 {
        17
    }

    const fn default_fan_out_threshold() -> usize {
        8
    }

    const fn default_circle_radius() -> f64 {
        0.00015
    }

    const fn default_spacing() -> f64 {
        0.00008
    }

    const fn default_pitch() -> f64 {
        0.00008
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("circle_radius", self.circle_radius),
            ("spacing", self.spacing),
            ("pitch", self.pitch),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!(
                    "Spiral {} must be positive and finite, got: {}",
                    name, value
                ));
            }
        }
        if !self.start_angle.is_finite() {
            return Err("Spiral start angle must be finite".to_string());
        }
        Ok(())
    }
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            zoom_threshold: Self::default_zoom_threshold(),
            fan_out_threshold: Self::default_fan_out_threshold(),
            circle_radius: Self::default_circle_radius(),
            spacing: Self::default_spacing(),
            pitch: Self::default_pitch(),
            start_angle: 0.0,
        }
    }
}

/// Device parameters feeding the zoom heuristic.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportConfig {
    /// Width of the map view in device pixels
    #[serde(default = "ViewportConfig::default_width_px")]
    pub width_px: f64,

    /// Edge length of a map tile in pixels
    #[serde(default = "ViewportConfig::default_tile_size")]
    pub tile_size: f64,
}

impl ViewportConfig {
    const fn default_width_px() -> f64 {
        400.0
    }

    const fn default_tile_size() -> f64 {
        256.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.width_px.is_finite() || self.width_px <= 0.0 {
            return Err(format!(
                "Viewport width must be positive and finite, got: {}",
                self.width_px
            ));
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(format!(
                "Tile size must be positive and finite, got: {}",
                self.tile_size
            ));
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width_px: Self::default_width_px(),
            tile_size: Self::default_tile_size(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub index: IndexParams,

    #[serde(default = "EngineConfig::default_clustering_enabled")]
    pub clustering_enabled: bool,

    #[serde(default)]
    pub spiral: SpiralConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    /// Report cluster activation without computing a region to zoom to
    #[serde(default)]
    pub preserve_cluster_press: bool,
}

impl EngineConfig {
    const fn default_clustering_enabled() -> bool {
        true
    }

    pub fn with_index(mut self, index: IndexParams) -> Self {
        self.index = index;
        self
    }

    pub fn with_clustering_enabled(mut self, enabled: bool) -> Self {
        self.clustering_enabled = enabled;
        self
    }

    pub fn with_spiral(mut self, spiral: SpiralConfig) -> Self {
        self.spiral = spiral;
        self
    }

    pub fn with_spiral_enabled(mut self, enabled: bool) -> Self {
        self.spiral.enabled = enabled;
        self
    }

    pub fn with_spiral_zoom_threshold(mut self, zoom: u8) -> Self {
        self.spiral.zoom_threshold = zoom;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_viewport_width(mut self, width_px: f64) -> Self {
        self.viewport.width_px = width_px;
        self
    }

    pub fn with_preserve_cluster_press(mut self, preserve: bool) -> Self {
        self.preserve_cluster_press = preserve;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.index.validate()?;
        self.spiral.validate()?;
        self.viewport.validate()?;

        if self.spiral.enabled && self.spiral.zoom_threshold > self.index.max_zoom + 1 {
            log::warn!(
                "Spiral zoom threshold {} is above the deepest index level {}; \
                expansion will never trigger",
                self.spiral.zoom_threshold,
                self.index.max_zoom + 1
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: EngineConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index: IndexParams::default(),
            clustering_enabled: Self::default_clustering_enabled(),
            spiral: SpiralConfig::default(),
            viewport: ViewportConfig::default(),
            preserve_cluster_press: false,
        }
    }
}
