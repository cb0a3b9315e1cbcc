//! Engine configuration.
//!
//! Every field has a default matching the runtime the engine was built for,
//! so a config file only needs to name what it overrides:
//!
//! ```json
//! { "atlas_width": 2048, "integer_font_sizes": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TextError;

/// Tunables shared by the processing engine, the letter atlas and the
/// canvas pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest canvas edge (pixels) a label may rasterize into.
    pub max_canvas_size: f32,
    /// Font size above which the device font scale stops being applied.
    pub max_font_size: f32,
    /// How many times the canvas measurement is retried with a smaller scale.
    pub max_calculation_retries: u32,
    /// Surfaces kept alive by the canvas pool.
    pub canvas_pool_capacity: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Gap (pixels) between packed letters.
    pub atlas_spacing: u32,
    /// Extra baseline shift, as a fraction of the font size.
    pub baseline_offset: f32,
    /// Entries in the text measurement cache.
    pub measure_cache_capacity: usize,
    /// Round resolved font sizes down to integers (some platforms reject
    /// fractional sizes).
    pub integer_font_sizes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_canvas_size: 2048.0,
            max_font_size: 100.0,
            max_calculation_retries: 3,
            canvas_pool_capacity: 20,
            atlas_width: 1024,
            atlas_height: 1024,
            atlas_spacing: 0,
            baseline_offset: 0.0,
            measure_cache_capacity: 100,
            integer_font_sizes: false,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TextError> {
        let config: Self = serde_json::from_str(json)?;
        log::debug!(
            "EngineConfig: atlas {}x{}, max canvas {}",
            config.atlas_width,
            config.atlas_height,
            config.max_canvas_size
        );
        Ok(config)
    }
}
