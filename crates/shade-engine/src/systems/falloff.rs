//! Falloff templates: how much light would reach each pixel of a light's
//! tile if nothing blocked it.
//!
//! Templates depend only on `(shape, range, variant)`, so they are built once
//! and cached. Cached templates are never handed out mutably; callers get a
//! copy to mask.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LightingError;
use crate::renderer::buffer::AlphaMask;
use crate::renderer::filter::gaussian_blur;
use crate::systems::rng::Rng;

/// Shape of the unobstructed light field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloffShape {
    /// Smooth radial falloff, `255·(1 − (d/range)²)`. Ignores the variant.
    #[default]
    Quadratic,
    /// A random cloud of lit pixels, normally distributed around the light
    /// and Gaussian-blurred. Each variant is a different cloud, which makes
    /// variant cycling look like flicker.
    Speckle,
}

impl FalloffShape {
    /// Whether different variants produce different templates.
    pub fn varies(self) -> bool {
        matches!(self, FalloffShape::Speckle)
    }

    /// Build the `2·range` square template for `variant`.
    pub fn generate(self, range: u32, variant: u32) -> AlphaMask {
        match self {
            FalloffShape::Quadratic => quadratic(range),
            FalloffShape::Speckle => speckle(range, variant),
        }
    }
}

fn quadratic(range: u32) -> AlphaMask {
    let size = 2 * range;
    let r = range as f64;
    let mut mask = AlphaMask::square(size);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - r;
            let dy = y as f64 + 0.5 - r;
            let falloff = 1.0 - (dx * dx + dy * dy) / (r * r);
            if falloff > 0.0 {
                mask.set(x, y, (255.0 * falloff).round() as u8);
            }
        }
    }
    mask
}

fn speckle(range: u32, variant: u32) -> AlphaMask {
    let size = (2 * range) as usize;
    let r = range as f64;
    let mut rng = Rng::from_key(range, variant);
    let mut plane = vec![0.0_f32; size * size];

    let samples = 7 * (range as usize).pow(2);
    let last = (size - 1) as f64;
    for _ in 0..samples {
        let x = rng.next_truncated_normal(r, r / 4.0, 4.0).clamp(0.0, last) as usize;
        let y = rng.next_truncated_normal(r, r / 4.0, 4.0).clamp(0.0, last) as usize;
        plane[y * size + x] = 255.0;
    }

    gaussian_blur(&mut plane, size, size, r / 10.0);

    let mut mask = AlphaMask::square(2 * range);
    for (dst, src) in mask.data_mut().iter_mut().zip(&plane) {
        *dst = src.round().clamp(0.0, 255.0) as u8;
    }
    mask
}

/// A falloff variant index together with the number of variants it is
/// chosen from. Only constructible in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    index: u32,
    count: u32,
}

impl Variant {
    pub fn new(index: u32, count: u32) -> Result<Self, LightingError> {
        if index >= count {
            return Err(LightingError::InvalidVariant { index, count });
        }
        Ok(Self { index, count })
    }

    /// The first of `count` variants.
    pub fn first(count: u32) -> Result<Self, LightingError> {
        Self::new(0, count)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// The following variant, wrapping around.
    pub fn next(self) -> Self {
        Self {
            index: (self.index + 1) % self.count,
            count: self.count,
        }
    }
}

/// Cache key of a falloff template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FalloffKey {
    pub shape: FalloffShape,
    pub range: u32,
    pub variant: u32,
}

/// Memoized falloff templates.
///
/// Grows for the lifetime of its owner; the key space is the handful of
/// ranges and variants actually in use.
#[derive(Debug, Default)]
pub struct FalloffCache {
    templates: HashMap<FalloffKey, AlphaMask>,
}

impl FalloffCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template for `key`, generated on first use. Variants of a shape that
    /// ignores them share one template.
    pub fn get(&mut self, mut key: FalloffKey) -> Result<&AlphaMask, LightingError> {
        if key.range == 0 {
            return Err(LightingError::InvalidRange);
        }
        if !key.shape.varies() {
            key.variant = 0;
        }
        Ok(self.templates.entry(key).or_insert_with(|| {
            log::debug!(
                "falloff: generating {:?} template, range {} variant {}",
                key.shape,
                key.range,
                key.variant
            );
            key.shape.generate(key.range, key.variant)
        }))
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
