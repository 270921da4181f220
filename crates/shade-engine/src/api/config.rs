use serde::{Deserialize, Serialize};

use crate::api::types::Rgb;
use crate::components::light::LightColor;
use crate::error::LightingError;
use crate::systems::compositor::LightBlend;
use crate::systems::falloff::FalloffShape;

/// Configuration for the lighting system.
///
/// Every field has a default, so a JSON document only needs to name what it
/// changes: `{"ambient": {"r": 20, "g": 70, "b": 80}}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Width of the scene (and of the light buffer) in pixels (default: 320).
    pub width: u32,
    /// Height of the scene in pixels (default: 180).
    pub height: u32,
    /// Ambient floor the light buffer is reset to each frame (default: black).
    pub ambient: Rgb,
    /// Radius of the box blur run over the whole light buffer. 0 disables it.
    pub blur: u32,
    /// Radius of the box blur run over each light mask to soften shadow
    /// edges (default: 2). 0 disables it.
    pub mask_blur: u32,
    /// Recompute visibility and masks every N frames (default: 1).
    pub mask_interval: u32,
    /// Advance every light's falloff variant every M frames (default: 5).
    pub variant_interval: u32,
    /// How the light buffer is combined with the scene (default: multiply).
    pub blend: LightBlend,
    /// Lights spawned when the system is created.
    pub lights: Vec<LightDesc>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            ambient: Rgb::BLACK,
            blur: 0,
            mask_blur: 2,
            mask_interval: 1,
            variant_interval: 5,
            blend: LightBlend::Multiply,
            lights: Vec::new(),
        }
    }
}

impl LightingConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LightingError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Static description of a light, as found in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDesc {
    /// Initial world-space position.
    pub position: [f64; 2],
    pub color: LightColor,
    /// Pixels lit in each direction.
    pub range: u32,
    /// Pixels the light may bleed through the edge of a wall.
    pub piercing: u32,
    /// Number of pre-baked falloff variants to cycle through.
    pub variants: u32,
    pub shape: FalloffShape,
}

impl Default for LightDesc {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            color: LightColor::Fixed(Rgb::WHITE),
            range: 120,
            piercing: 0,
            variants: 1,
            shape: FalloffShape::Quadratic,
        }
    }
}
