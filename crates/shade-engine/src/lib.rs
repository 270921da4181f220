pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::config::{LightingConfig, LightDesc};
pub use api::types::{LightId, Rgb};
pub use components::light::{Light, LightColor};
pub use components::occluder::OccluderSet;
pub use components::tilemap::Tilemap;
pub use core::geometry::{Point, Rect, Segment, IntersectMode, intersect, clip_polygon_to_rect, expand_polygon};
pub use core::visibility::{VisibilityCalculator, visible_polygon};
pub use core::pool::LightPool;
pub use core::time::{FrameClock, Cadence};
pub use error::LightingError;
pub use renderer::buffer::{AlphaMask, RgbImage};
pub use systems::falloff::{FalloffShape, FalloffCache, Variant};
pub use systems::mask::LightMaskGenerator;
pub use systems::compositor::{GlobalLightMask, LightBlend};
pub use systems::lighting::LightingSystem;
