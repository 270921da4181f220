//! Occluder sets: every opaque edge of the world, as line segments.

use crate::core::geometry::{cross, Point, Rect, Segment, EPSILON};

/// Distance (in pixels) within which an endpoint counts as lying on a line.
const ON_LINE_TOLERANCE: f64 = 1e-6;

/// All opaque edges of the world.
///
/// Rebuilt whenever the map changes and treated as immutable in between.
/// Visibility is only defined when the set is enclosed by a rectangle of
/// segments (see [`OccluderSet::enclosure`]); [`OccluderSet::with_bounds`]
/// guarantees that by construction, whatever else is added later.
#[derive(Debug, Clone, Default)]
pub struct OccluderSet {
    segments: Vec<Segment>,
    bounds: Option<Rect>,
}

impl OccluderSet {
    /// Create an empty occluder set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an occluder set holding the four edges of `bounds`.
    pub fn with_bounds(bounds: Rect) -> Self {
        let mut set = Self::new();
        set.add_rect(bounds);
        set.bounds = Some(bounds);
        set
    }

    /// Add a single wall segment. Zero-length segments are dropped.
    pub fn add_segment(&mut self, segment: Segment) {
        if !segment.is_degenerate() {
            self.segments.push(segment);
        }
    }

    /// Add every edge of a closed polygon.
    pub fn add_polygon(&mut self, poly: &[Point]) {
        let n = poly.len();
        if n < 2 {
            return;
        }
        for i in 0..n {
            self.add_segment(Segment::new(poly[i], poly[(i + 1) % n]));
        }
    }

    /// Add the four edges of an axis-aligned rectangle.
    pub fn add_rect(&mut self, rect: Rect) {
        for edge in rect.edges() {
            self.add_segment(edge);
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every distinct segment endpoint.
    pub fn endpoints(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self
            .segments
            .iter()
            .flat_map(|s| [s.a, s.b])
            .collect();
        points.sort_by(|p, q| p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y)));
        points.dedup_by(|p, q| p.distance_squared(*q) <= EPSILON * EPSILON);
        points
    }

    /// Smallest rectangle containing every segment.
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.segments.first()?;
        let (min, max) = self
            .segments
            .iter()
            .flat_map(|s| [s.a, s.b])
            .fold((first.a, first.a), |(min, max), p| (min.min(p), max.max(p)));
        Some(Rect::new(min, max))
    }

    /// The scene rectangle given to [`OccluderSet::with_bounds`], if any.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// The rectangle whose four sides are fully covered by segments, so that
    /// every ray cast from inside it hits something.
    ///
    /// The declared scene bounds are tried first; walls may stick out past
    /// them. Without declared bounds the bounding box of all segments is
    /// used.
    pub fn enclosure(&self) -> Option<Rect> {
        self.bounds
            .into_iter()
            .chain(self.bounding_box())
            .find(|rect| self.encloses(rect))
    }

    pub fn is_enclosed(&self) -> bool {
        self.enclosure().is_some()
    }

    fn encloses(&self, rect: &Rect) -> bool {
        rect.width() > EPSILON
            && rect.height() > EPSILON
            && rect.edges().iter().all(|side| self.covers(side))
    }

    /// Whether the union of segments lying on `side` spans all of it.
    fn covers(&self, side: &Segment) -> bool {
        let dir = side.b - side.a;
        let len = dir.length();
        let on_line = |p: Point| cross(dir, p - side.a).abs() <= ON_LINE_TOLERANCE * len;
        let param = |p: Point| (p - side.a).dot(dir) / (len * len);

        let mut spans: Vec<(f64, f64)> = self
            .segments
            .iter()
            .filter(|s| on_line(s.a) && on_line(s.b))
            .map(|s| {
                let (t0, t1) = (param(s.a), param(s.b));
                (t0.min(t1), t0.max(t1))
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let gap = ON_LINE_TOLERANCE / len;
        let mut reach = 0.0_f64;
        for (start, end) in spans {
            if start > reach + gap {
                return false;
            }
            reach = reach.max(end);
        }
        reach >= 1.0 - gap
    }
}
