//! Point lights.

use serde::{Deserialize, Serialize};

use crate::api::config::LightDesc;
use crate::api::types::Rgb;
use crate::core::geometry::{expand_polygon, Point};
use crate::error::LightingError;
use crate::renderer::buffer::AlphaMask;
use crate::systems::falloff::{FalloffShape, Variant};
use crate::systems::mask::LightMaskGenerator;

fn default_loop_time() -> f64 {
    5.0
}

/// Color of a light, possibly changing over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Fixed(Rgb),
    /// Full-saturation hue cycling once every `loop_time` seconds, offset
    /// by `hue_start` seconds.
    Rainbow {
        #[serde(default)]
        hue_start: f64,
        #[serde(default = "default_loop_time")]
        loop_time: f64,
    },
}

impl Default for LightColor {
    fn default() -> Self {
        LightColor::Fixed(Rgb::WHITE)
    }
}

impl LightColor {
    /// Color after `elapsed` seconds.
    pub fn at(&self, elapsed: f64) -> Rgb {
        match *self {
            LightColor::Fixed(color) => color,
            LightColor::Rainbow { hue_start, loop_time } => {
                if loop_time <= 0.0 {
                    return Rgb::from_hue(0.0);
                }
                let hue = (hue_start + elapsed).rem_euclid(loop_time) / loop_time;
                Rgb::from_hue(hue)
            }
        }
    }
}

/// A point light.
///
/// Position and color may change every frame. Range, variant and shape are
/// validated on the way in; changing any of them invalidates the mask.
#[derive(Debug, Clone)]
pub struct Light {
    pub position: Point,
    pub color: LightColor,
    /// Pixels the light may bleed through the edge of a wall.
    pub piercing: u32,
    range: u32,
    variant: Variant,
    shape: FalloffShape,
    alpha: Option<AlphaMask>,
    /// Visible polygon of the last visibility pass and the point it was seen from.
    polygon: Vec<Point>,
    seen_from: Point,
    dirty: bool,
}

impl Light {
    /// Create a light with `variants` falloff variants.
    pub fn new(position: Point, color: LightColor, range: u32, variants: u32) -> Result<Self, LightingError> {
        if range == 0 {
            return Err(LightingError::InvalidRange);
        }
        Ok(Self {
            position,
            color,
            piercing: 0,
            range,
            variant: Variant::first(variants)?,
            shape: FalloffShape::default(),
            alpha: None,
            polygon: Vec::new(),
            seen_from: position,
            dirty: true,
        })
    }

    pub fn from_desc(desc: &LightDesc) -> Result<Self, LightingError> {
        let position = Point::new(desc.position[0], desc.position[1]);
        Ok(Self::new(position, desc.color.clone(), desc.range, desc.variants)?
            .with_piercing(desc.piercing)
            .with_shape(desc.shape))
    }

    pub fn with_piercing(mut self, piercing: u32) -> Self {
        self.piercing = piercing;
        self
    }

    pub fn with_shape(mut self, shape: FalloffShape) -> Self {
        self.shape = shape;
        self.dirty = true;
        self
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    pub fn set_range(&mut self, range: u32) -> Result<(), LightingError> {
        if range == 0 {
            return Err(LightingError::InvalidRange);
        }
        self.range = range;
        self.dirty = true;
        Ok(())
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Jump to variant `index` of the current count.
    pub fn set_variant(&mut self, index: u32) -> Result<(), LightingError> {
        self.variant = Variant::new(index, self.variant.count())?;
        self.dirty = true;
        Ok(())
    }

    /// Advance to the following falloff variant. Takes effect on the next
    /// mask update. Returns whether the falloff actually changes.
    pub fn next_variant(&mut self) -> bool {
        let previous = self.variant;
        self.variant = self.variant.next();
        self.variant != previous && self.shape.varies()
    }

    pub fn shape(&self) -> FalloffShape {
        self.shape
    }

    /// The current alpha mask, if one was ever computed.
    pub fn alpha(&self) -> Option<&AlphaMask> {
        self.alpha.as_ref()
    }

    /// The last visible polygon, in world space.
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// Where the light stood when its polygon was computed. Differs from
    /// `position` while a throttled mask is stale.
    pub fn seen_from(&self) -> Point {
        self.seen_from
    }

    /// Force a full recompute on the next tick.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Whether the mask is missing or out of date regardless of cadence.
    pub fn needs_update(&self) -> bool {
        self.dirty || self.alpha.is_none()
    }

    /// Top-left corner of the mask in scene pixels.
    pub fn topleft(&self) -> (i32, i32) {
        let r = self.range as i32;
        (self.position.x.round() as i32 - r, self.position.y.round() as i32 - r)
    }

    /// Current color, `elapsed` seconds into the run.
    pub fn color_at(&self, elapsed: f64) -> Rgb {
        self.color.at(elapsed)
    }

    /// Store a fresh visible polygon, seen from the current position, and
    /// rebuild the mask from it.
    pub fn update_mask(&mut self, polygon: Vec<Point>, masks: &mut LightMaskGenerator) -> Result<(), LightingError> {
        self.polygon = polygon;
        self.seen_from = self.position;
        self.remask(masks)
    }

    /// Rebuild the mask from the cached polygon, e.g. after a variant change.
    pub fn remask(&mut self, masks: &mut LightMaskGenerator) -> Result<(), LightingError> {
        let expanded;
        let polygon = if self.piercing > 0 && !self.polygon.is_empty() {
            expanded = expand_polygon(&self.polygon, self.seen_from, self.piercing as f64);
            &expanded
        } else {
            &self.polygon
        };
        let mask = masks.get_light_mask(polygon, self.seen_from, self.range, self.shape, self.variant)?;
        self.alpha = Some(mask);
        self.dirty = false;
        Ok(())
    }
}
