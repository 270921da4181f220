//! Solid-tile grids as a source of occluders.
//!
//! A tilemap stores which cells block light. Only the edges between a solid
//! and an empty cell can cast shadows, so [`Tilemap::occluders`] emits those
//! (merged into maximal straight runs) plus the outer bounds.

use crate::components::occluder::OccluderSet;
use crate::core::geometry::{Point, Rect, Segment};

/// Grid of solid/empty cells.
///
/// Cells are stored in row-major order: index = y * width + x, with y
/// growing downwards like the scene.
#[derive(Debug, Clone)]
pub struct Tilemap {
    /// Width of the tilemap in tiles.
    pub width: u32,
    /// Height of the tilemap in tiles.
    pub height: u32,
    /// Size of each tile in scene pixels.
    pub tile_size: f64,
    /// Position of the tilemap's top-left corner.
    pub origin: Point,
    solid: Vec<bool>,
    revision: u64,
}

impl Tilemap {
    /// Create an empty tilemap.
    pub fn new(width: u32, height: u32, tile_size: f64) -> Self {
        Self {
            width,
            height,
            tile_size,
            origin: Point::ZERO,
            solid: vec![false; (width * height) as usize],
            revision: 0,
        }
    }

    /// Set the scene-space origin (top-left corner).
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Whether the tile at `(x, y)` blocks light. Out of bounds is empty.
    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.solid[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x < self.width && y < self.height {
            let cell = &mut self.solid[(y * self.width + x) as usize];
            if *cell != solid {
                *cell = solid;
                self.revision += 1;
            }
        }
    }

    /// Fill a rectangular region.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, solid: bool) {
        for ty in y..(y + h).min(self.height) {
            for tx in x..(x + w).min(self.width) {
                self.set(tx, ty, solid);
            }
        }
    }

    /// Make every tile empty.
    pub fn clear(&mut self) {
        if self.solid.iter().any(|&s| s) {
            self.solid.fill(false);
            self.revision += 1;
        }
    }

    /// Bumped whenever a tile changes, so callers can tell when to rebuild
    /// their occluders.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of solid tiles.
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    /// Scene-space bounds of the tilemap.
    pub fn bounds(&self) -> Rect {
        let size = Point::new(self.width as f64, self.height as f64) * self.tile_size;
        Rect::from_size(self.origin, size)
    }

    /// Convert a scene position to tile coordinates.
    pub fn world_to_tile(&self, pos: Point) -> Option<(u32, u32)> {
        let local = (pos - self.origin) / self.tile_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (tx, ty) = (local.x as u32, local.y as u32);
        if tx >= self.width || ty >= self.height {
            return None;
        }
        Some((tx, ty))
    }

    /// Center of tile `(x, y)` in scene space.
    pub fn tile_to_world(&self, x: u32, y: u32) -> Point {
        self.origin + (Point::new(x as f64, y as f64) + 0.5) * self.tile_size
    }

    /// The bounds plus every exposed tile edge.
    pub fn occluders(&self) -> OccluderSet {
        let mut set = OccluderSet::with_bounds(self.bounds());
        let solid = |x: i64, y: i64| self.solid[(y * self.width as i64 + x) as usize];
        let (w, h) = (self.width as i64, self.height as i64);

        // Border edges lie on the bounds, so only inner boundaries are scanned.
        for row in 1..h {
            let exposed = |x: i64| solid(x, row - 1) != solid(x, row);
            for (start, end) in runs(w, exposed) {
                set.add_segment(self.edge((start, row), (end, row)));
            }
        }
        for col in 1..w {
            let exposed = |y: i64| solid(col - 1, y) != solid(col, y);
            for (start, end) in runs(h, exposed) {
                set.add_segment(self.edge((col, start), (col, end)));
            }
        }

        log::debug!(
            "tilemap: {} solid tiles -> {} occluder segments",
            self.solid_count(),
            set.len()
        );
        set
    }

    fn edge(&self, a: (i64, i64), b: (i64, i64)) -> Segment {
        let corner = |(x, y): (i64, i64)| self.origin + Point::new(x as f64, y as f64) * self.tile_size;
        Segment::new(corner(a), corner(b))
    }
}

/// Maximal `[start, end)` runs of `0..len` where `pred` holds.
fn runs(len: i64, pred: impl Fn(i64) -> bool) -> Vec<(i64, i64)> {
    let mut out = Vec::new();
    let mut start = None;
    for i in 0..=len {
        match (start, i < len && pred(i)) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                out.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    out
}
