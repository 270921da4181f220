//! Per-light alpha masks: the falloff template, cut down to what the light
//! can actually see.

use crate::core::geometry::{clip_polygon_to_rect, Point, Rect};
use crate::error::LightingError;
use crate::renderer::buffer::AlphaMask;
use crate::renderer::filter::box_blur;
use crate::systems::falloff::{FalloffCache, FalloffKey, FalloffShape, Variant};

/// Builds light masks from visible polygons. Owns the falloff cache.
#[derive(Debug)]
pub struct LightMaskGenerator {
    cache: FalloffCache,
    edge_blur: u32,
}

impl LightMaskGenerator {
    /// `edge_blur` is the box blur radius applied to every finished mask.
    pub fn new(edge_blur: u32) -> Self {
        Self {
            cache: FalloffCache::new(),
            edge_blur,
        }
    }

    pub fn edge_blur(&self) -> u32 {
        self.edge_blur
    }

    pub fn cache(&self) -> &FalloffCache {
        &self.cache
    }

    /// Alpha mask of a light at `view` whose visible region is `polygon`
    /// (world space). The mask is `2·range` square with the light at its
    /// center; pixels the light cannot see are zero.
    pub fn get_light_mask(
        &mut self,
        polygon: &[Point],
        view: Point,
        range: u32,
        shape: FalloffShape,
        variant: Variant,
    ) -> Result<AlphaMask, LightingError> {
        let key = FalloffKey {
            shape,
            range,
            variant: variant.index(),
        };
        let mut mask = self.cache.get(key)?.clone();

        let r = range as f64;
        let local: Vec<Point> = polygon.iter().map(|&p| p - view).collect();
        let tile = Rect::new(Point::splat(-r), Point::splat(r));
        let clipped: Vec<Point> = clip_polygon_to_rect(&local, &tile)
            .into_iter()
            .map(|p| p + Point::splat(r))
            .collect();

        let visible = rasterize_polygon(&clipped, mask.width(), mask.height());
        mask.retain(&visible);
        box_blur(&mut mask, self.edge_blur);
        Ok(mask)
    }
}

/// Even-odd scanline fill of `poly` on a `width × height` grid, sampled at
/// pixel centers. Row-major; `true` means inside.
pub fn rasterize_polygon(poly: &[Point], width: u32, height: u32) -> Vec<bool> {
    let (w, h) = (width as usize, height as usize);
    let mut inside = vec![false; w * h];
    if poly.len() < 3 || w == 0 {
        return inside;
    }

    let mut crossings: Vec<f64> = Vec::new();
    for y in 0..h {
        let yc = y as f64 + 0.5;
        crossings.clear();
        for (i, &p) in poly.iter().enumerate() {
            let q = poly[(i + 1) % poly.len()];
            // half-open, so a vertex on the scanline is counted once
            if (p.y <= yc) != (q.y <= yc) {
                crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        let row = &mut inside[y * w..(y + 1) * w];
        for pair in crossings.chunks_exact(2) {
            let first = (pair[0] - 0.5).ceil().max(0.0);
            let last = (pair[1] - 0.5).floor().min((w - 1) as f64);
            if first > last {
                continue;
            }
            row[first as usize..=last as usize].fill(true);
        }
    }
    inside
}
