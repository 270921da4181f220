//! Global light buffer: every light's mask summed over the ambient floor,
//! then applied to a rendered scene.

use serde::{Deserialize, Serialize};

use crate::api::types::Rgb;
use crate::components::light::Light;
use crate::renderer::buffer::RgbImage;
use crate::renderer::filter::box_blur_rgb;

/// How the light buffer is combined with the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightBlend {
    /// scene = scene * light / 255. Unlit areas fall to the ambient floor.
    #[default]
    Multiply,
    /// scene = scene + light, saturating.
    Additive,
}

impl LightBlend {
    #[inline]
    fn blend(self, scene: Rgb, light: Rgb) -> Rgb {
        match self {
            LightBlend::Multiply => scene.modulated(light),
            LightBlend::Additive => scene.saturating_add(light),
        }
    }
}

/// Scene-sized buffer holding how much red, green and blue light reaches
/// each pixel this frame.
#[derive(Debug, Clone)]
pub struct GlobalLightMask {
    buffer: RgbImage,
    ambient: Rgb,
    blur: u32,
}

impl GlobalLightMask {
    pub fn new(width: u32, height: u32, ambient: Rgb, blur: u32) -> Self {
        Self {
            buffer: RgbImage::filled(width, height, ambient),
            ambient,
            blur,
        }
    }

    pub fn ambient(&self) -> Rgb {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: Rgb) {
        self.ambient = ambient;
    }

    pub fn set_blur(&mut self, blur: u32) {
        self.blur = blur;
    }

    /// Fill the buffer with the ambient floor.
    pub fn reset(&mut self) {
        self.buffer.fill(self.ambient);
    }

    /// Add one light's mask, tinted by `color`, at the light's position.
    /// Lights without a mask yet contribute nothing.
    pub fn accumulate(&mut self, light: &Light, color: Rgb) {
        let Some(alpha) = light.alpha() else {
            return;
        };
        let (left, top) = light.topleft();
        self.buffer.add_tinted(alpha, color, left, top);
    }

    /// Rebuild the buffer from scratch: reset, add every light with its
    /// color at `elapsed` seconds, then blur.
    pub fn update<'a>(&mut self, lights: impl IntoIterator<Item = &'a Light>, elapsed: f64) {
        self.reset();
        for light in lights {
            self.accumulate(light, light.color_at(elapsed));
        }
        box_blur_rgb(&mut self.buffer, self.blur);
    }

    /// Light the scene in place. Only the overlapping region is touched
    /// when the sizes differ.
    pub fn apply(&self, scene: &mut RgbImage, mode: LightBlend) {
        let w = scene.width().min(self.buffer.width()) as usize;
        let h = scene.height().min(self.buffer.height()) as usize;
        let (scene_w, light_w) = (scene.width() as usize, self.buffer.width() as usize);
        let light = self.buffer.pixels();
        let pixels = scene.pixels_mut();
        for y in 0..h {
            let dst = &mut pixels[y * scene_w..y * scene_w + w];
            let src = &light[y * light_w..y * light_w + w];
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = mode.blend(*d, s);
            }
        }
    }

    /// Light an RGBA8 image of the buffer's size in place. Alpha is left
    /// untouched. Images of any other size are left as they are.
    pub fn apply_rgba(&self, rgba: &mut [u8], mode: LightBlend) {
        let expected = self.buffer.pixels().len() * 4;
        if rgba.len() != expected {
            log::warn!(
                "compositor: RGBA image is {} bytes, expected {} for {}x{}",
                rgba.len(),
                expected,
                self.buffer.width(),
                self.buffer.height()
            );
            return;
        }
        for (px, &light) in rgba.chunks_exact_mut(4).zip(self.buffer.pixels()) {
            let lit = mode.blend(Rgb::new(px[0], px[1], px[2]), light);
            px[0] = lit.r;
            px[1] = lit.g;
            px[2] = lit.b;
        }
    }

    pub fn buffer(&self) -> &RgbImage {
        &self.buffer
    }

    /// The buffer as raw row-major `r, g, b` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }
}
