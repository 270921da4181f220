use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Handle to a light in a [`LightPool`](crate::core::pool::LightPool).
///
/// The generation is bumped every time a slot is reused, so a handle kept
/// after its light was removed never resolves to a newer light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId {
    pub index: u32,
    pub generation: u32,
}

/// An 8-bit RGB triple. Used for light colors, the ambient floor and every
/// pixel of the composited light buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `alpha / 255`, rounding to nearest.
    #[inline]
    pub fn tinted(self, alpha: u8) -> Self {
        let scale = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Channel-wise saturating addition.
    #[inline]
    pub fn saturating_add(self, other: Rgb) -> Self {
        Self::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }

    /// Channel-wise `self * other / 255`: how much of this color survives
    /// under a light of intensity `other`.
    #[inline]
    pub fn modulated(self, other: Rgb) -> Self {
        let mul = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Self::new(mul(self.r, other.r), mul(self.g, other.g), mul(self.b, other.b))
    }

    /// Convert a hue in `[0, 1)` at full saturation and value.
    pub fn from_hue(hue: f64) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let sector = h.floor() as u32;
        let f = h - h.floor();
        let up = (255.0 * f).round() as u8;
        let down = (255.0 * (1.0 - f)).round() as u8;
        match sector {
            0 => Self::new(255, up, 0),
            1 => Self::new(down, 255, 0),
            2 => Self::new(0, 255, up),
            3 => Self::new(0, down, 255),
            4 => Self::new(up, 0, 255),
            _ => Self::new(255, 0, down),
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}
