//! CPU pixel buffers: single-channel intensity masks and RGB images.

use crate::api::types::Rgb;

/// A row-major grid of 8-bit intensities.
///
/// Used both for falloff templates and for the per-light alpha mask
/// (`2·range` square, light at the center).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// Create a mask filled with zeros.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    /// Create a square mask of side `size`, filled with zeros.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intensity at `(x, y)`. Out of bounds reads as zero.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// One row of the mask.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y * self.width) as usize;
        &self.data[start..start + self.width as usize]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Highest intensity in the mask.
    pub fn max(&self) -> u8 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Zero every pixel whose counterpart in `keep` is `false`.
    pub fn retain(&mut self, keep: &[bool]) {
        for (value, &k) in self.data.iter_mut().zip(keep) {
            if !k {
                *value = 0;
            }
        }
    }
}

/// A row-major RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl RgbImage {
    /// Create an image filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// Create a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgb::BLACK)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, or `None` out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    /// Raw `r, g, b` bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    /// Additively blend `color` tinted by `mask` with the mask's top-left
    /// corner at `(left, top)`. Parts falling outside the image are dropped.
    pub fn add_tinted(&mut self, mask: &AlphaMask, color: Rgb, left: i32, top: i32) {
        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = (left + mask.width() as i32).min(self.width as i32);
        let y1 = (top + mask.height() as i32).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            let src = mask.row((y - top) as u32);
            let row_start = (y as u32 * self.width) as usize;
            for x in x0..x1 {
                let alpha = src[(x - left) as usize];
                if alpha == 0 {
                    continue;
                }
                let dst = &mut self.pixels[row_start + x as usize];
                *dst = dst.saturating_add(color.tinted(alpha));
            }
        }
    }
}
