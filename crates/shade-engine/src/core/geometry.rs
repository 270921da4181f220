//! Geometry kernel: segment intersection, polygon clipping and expansion.
//!
//! Coordinates are `f64` screen-space points (x right, y down). Angles grow
//! clockwise on screen, which is the winding every polygon here uses.

use glam::DVec2;

/// A 2D point or vector.
pub type Point = DVec2;

/// Tolerance used when deciding whether an intersection parameter lies on a
/// segment, and when comparing distances.
pub const EPSILON: f64 = 1e-9;

/// An ordered pair of points. Undirected for intersection purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn length_squared(&self) -> f64 {
        (self.b - self.a).length_squared()
    }

    /// Whether both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        self.length_squared() <= EPSILON * EPSILON
    }
}

/// Axis-aligned rectangle, `min` inclusive, `max` exclusive for pixel use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Rectangle from its top-left corner and size.
    pub fn from_size(topleft: Point, size: Point) -> Self {
        Self {
            min: topleft,
            max: topleft + size,
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        (self.min + self.max) * 0.5
    }

    /// Whether `p` lies inside, `min` edges included and `max` edges excluded.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Whether `p` lies strictly inside the rectangle.
    pub fn contains_strict(&self, p: Point) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }

    /// Corners in the order top-left, bottom-left, bottom-right, top-right.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.min.x, self.max.y),
            self.max,
            Point::new(self.max.x, self.min.y),
        ]
    }

    /// The four edges, following [`Rect::corners`].
    pub fn edges(&self) -> [Segment; 4] {
        let c = self.corners();
        [
            Segment::new(c[0], c[1]),
            Segment::new(c[1], c[2]),
            Segment::new(c[2], c[3]),
            Segment::new(c[3], c[0]),
        ]
    }
}

/// How the two inputs of [`intersect`] are bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectMode {
    /// Half-line from `p` through `q` against the segment `[a, b]`.
    HalfLine,
    /// Full line through `p` and `q` against the segment `[a, b]`.
    FullLine,
    /// Segment `[p, q]` against segment `[a, b]`.
    Segments,
    /// Infinite lines `(pq)` and `(ab)`.
    InfiniteLines,
}

/// 2D cross product of `u` and `v`.
#[inline]
pub fn cross(u: Point, v: Point) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Intersection of the line through `p → q` with the line through `a → b`,
/// bounded according to `mode`. Parallel lines never intersect.
///
/// Segment endpoints are included.
pub fn intersect(p: Point, q: Point, a: Point, b: Point, mode: IntersectMode) -> Option<Point> {
    let d = q - p;
    let v = b - a;

    let denom = cross(d, v);
    if denom == 0.0 {
        return None;
    }

    let ap = a - p;
    let t1 = cross(ap, v) / denom;
    let t2 = cross(ap, d) / denom;

    let in_unit = |t: f64| (-EPSILON..=1.0 + EPSILON).contains(&t);
    let accepted = match mode {
        IntersectMode::HalfLine => t1 >= -EPSILON && in_unit(t2),
        IntersectMode::FullLine => in_unit(t2),
        IntersectMode::Segments => in_unit(t1) && in_unit(t2),
        IntersectMode::InfiniteLines => true,
    };

    accepted.then(|| p + d * t1)
}

/// Polar angle of `p` around `center`, in `(-π, π]`.
#[inline]
pub fn polar_angle(center: Point, p: Point) -> f64 {
    let d = p - center;
    d.y.atan2(d.x)
}

/// Even-odd point-in-polygon test.
pub fn polygon_contains(poly: &[Point], p: Point) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Whether any two non-adjacent edges of the polygon cross.
pub fn is_self_intersecting(poly: &[Point]) -> bool {
    let n = poly.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a, b) = (poly[i], poly[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (poly[j], poly[(j + 1) % n]);
            let d1 = cross(b - a, c - a);
            let d2 = cross(b - a, d - a);
            let d3 = cross(d - c, a - c);
            let d4 = cross(d - c, b - c);
            if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
                return true;
            }
        }
    }
    false
}

fn snap(p: Point) -> Point {
    p.round()
}

/// Clip a polygon to a rectangle (Sutherland–Hodgman).
///
/// Coordinates are snapped to integers on entry and after every clipping
/// edge so that floating point noise cannot leak vertices past an edge.
/// Returns an empty polygon when nothing remains inside.
pub fn clip_polygon_to_rect(poly: &[Point], rect: &Rect) -> Vec<Point> {
    let mut output: Vec<Point> = poly.iter().copied().map(snap).collect();

    for edge in rect.edges() {
        let (start, end) = (snap(edge.a), snap(edge.b));
        let dir = end - start;
        // Points on the clipping edge count as inside.
        let inside = |p: Point| cross(dir, p - start) <= 0.0;

        let input = std::mem::take(&mut output);
        let Some(&last) = input.last() else {
            return Vec::new();
        };

        let mut s = last;
        for &e in &input {
            if inside(e) {
                if !inside(s) {
                    if let Some(i) = intersect(start, end, s, e, IntersectMode::FullLine) {
                        output.push(snap(i));
                    }
                }
                output.push(e);
            } else if inside(s) {
                if let Some(i) = intersect(start, end, s, e, IntersectMode::FullLine) {
                    output.push(snap(i));
                }
            }
            s = e;
        }
    }

    output
}

/// Push every edge of `poly` away from `center` by `distance`.
///
/// For each vertex, the feet of the perpendiculars dropped from `center` on
/// its two adjacent edges give two push directions; the vertex moves by
/// their sum, each scaled to `distance`.
pub fn expand_polygon(poly: &[Point], center: Point, distance: f64) -> Vec<Point> {
    let n = poly.len();
    let push = |p: Point, neighbour: Point| -> Point {
        let edge = neighbour - p;
        let normal = Point::new(edge.y, -edge.x);
        match intersect(p, neighbour, center, center + normal, IntersectMode::InfiniteLines) {
            Some(foot) => {
                let dir = foot - center;
                if dir.length() > 1e-4 {
                    dir.normalize() * distance
                } else {
                    dir
                }
            }
            None => Point::ZERO,
        }
    };

    (0..n)
        .map(|i| {
            let p = poly[i];
            let before = poly[(i + n - 1) % n];
            let after = poly[(i + 1) % n];
            p + push(p, after) + push(p, before)
        })
        .collect()
}
