//! Visibility polygons by radial sweep.
//!
//! From a view point, a ray is cast through every occluder endpoint and two
//! more just beside it, so that the sweep sees both what an endpoint hides
//! and what lies past it. The nearest hit of each ray becomes a boundary
//! point; sorted by angle they form the polygon of everything visible.

use glam::DMat2;

use crate::components::occluder::OccluderSet;
use crate::core::geometry::{cross, intersect, polar_angle, IntersectMode, Point, Rect, Segment, EPSILON};
use crate::error::LightingError;

/// Angle (radians) between the ray through an endpoint and its two
/// neighbours.
pub const RAY_ANGLE_EPSILON: f64 = 1e-5;

/// Sine of the turning angle below which a vertex is considered collinear
/// with its neighbours and dropped.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Distance below which two boundary points are merged.
const MERGE_DISTANCE: f64 = 1e-6;

/// Computes visibility polygons against a fixed occluder set.
///
/// Building one validates that the occluders are enclosed, so every ray cast
/// from inside the bounds terminates.
#[derive(Debug, Clone)]
pub struct VisibilityCalculator {
    segments: Vec<Segment>,
    endpoints: Vec<Point>,
    bounds: Rect,
}

impl VisibilityCalculator {
    pub fn new(occluders: &OccluderSet) -> Result<Self, LightingError> {
        let bounds = occluders.enclosure().ok_or(LightingError::Unbounded)?;
        log::debug!(
            "visibility: {} segments, bounds {:?}..{:?}",
            occluders.len(),
            bounds.min,
            bounds.max
        );
        Ok(Self {
            segments: occluders.segments().to_vec(),
            endpoints: occluders.endpoints(),
            bounds,
        })
    }

    /// The rectangle view points must lie in: the declared scene bounds, or
    /// the bounding box of an undeclared but closed set.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The polygon visible from `view`, in world coordinates.
    ///
    /// Empty when `view` is not strictly inside the bounds.
    pub fn visible_polygon(&self, view: Point) -> Vec<Point> {
        if !self.bounds.contains_strict(view) {
            log::debug!("visibility: view point {view:?} outside bounds");
            return Vec::new();
        }
        sweep(view, &self.segments, &self.endpoints)
    }
}

/// The polygon visible from `view` given occluding `segments`.
///
/// The segments must enclose `view`; rays that escape are skipped and
/// logged, which leaves a hole in the polygon.
pub fn visible_polygon(view: Point, segments: &[Segment]) -> Vec<Point> {
    let mut set = OccluderSet::new();
    for &s in segments {
        set.add_segment(s);
    }
    sweep(view, set.segments(), &set.endpoints())
}

fn sweep(view: Point, segments: &[Segment], endpoints: &[Point]) -> Vec<Point> {
    let left = DMat2::from_angle(-RAY_ANGLE_EPSILON);
    let right = DMat2::from_angle(RAY_ANGLE_EPSILON);

    let mut hits: Vec<(f64, f64, Point)> = Vec::with_capacity(endpoints.len() * 3);
    for &endpoint in endpoints {
        let dir = endpoint - view;
        if dir.length_squared() <= EPSILON * EPSILON {
            continue;
        }
        for ray in [left * dir, dir, right * dir] {
            match nearest_hit(view, ray, segments) {
                Some(hit) => {
                    let dist = hit.distance_squared(view);
                    hits.push((polar_angle(view, hit), dist, hit));
                }
                None => log::error!("visibility: ray from {view:?} towards {ray:?} hit nothing"),
            }
        }
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    simplify(hits.into_iter().map(|(_, _, p)| p))
}

/// Nearest intersection of the half-line from `origin` along `dir` with any
/// segment. Hits at the origin itself (a view point lying on a wall) don't
/// block.
fn nearest_hit(origin: Point, dir: Point, segments: &[Segment]) -> Option<Point> {
    let target = origin + dir;
    segments
        .iter()
        .filter_map(|s| intersect(origin, target, s.a, s.b, IntersectMode::HalfLine))
        .map(|p| (p.distance_squared(origin), p))
        .filter(|(d, _)| *d > EPSILON * EPSILON)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, p)| p)
}

/// Whether `b` adds nothing to the outline `a → b → c`.
fn redundant(a: Point, b: Point, c: Point) -> bool {
    let (u, v) = (b - a, c - b);
    let scale = u.length() * v.length();
    if scale <= EPSILON {
        return true;
    }
    cross(u, v).abs() <= COLLINEAR_TOLERANCE * scale && u.dot(v) > 0.0
}

/// Merge coincident points and drop collinear ones, treating the sequence as
/// a closed loop.
fn simplify(points: impl Iterator<Item = Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::new();
    for p in points {
        if out.last().is_some_and(|&last| last.distance(p) <= MERGE_DISTANCE) {
            continue;
        }
        while out.len() >= 2 && redundant(out[out.len() - 2], out[out.len() - 1], p) {
            out.pop();
        }
        out.push(p);
    }

    loop {
        let n = out.len();
        if n < 3 {
            break;
        }
        if out[n - 1].distance(out[0]) <= MERGE_DISTANCE || redundant(out[n - 2], out[n - 1], out[0]) {
            out.pop();
        } else if redundant(out[n - 1], out[0], out[1]) {
            out.remove(0);
        } else {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{is_self_intersecting, polygon_contains};

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn room(w: f64, h: f64) -> OccluderSet {
        OccluderSet::with_bounds(Rect::from_size(Point::ZERO, pt(w, h)))
    }

    fn assert_increasing_angles(view: Point, poly: &[Point]) {
        for pair in poly.windows(2) {
            assert!(
                polar_angle(view, pair[0]) < polar_angle(view, pair[1]),
                "angles not increasing at {:?}",
                pair
            );
        }
    }

    #[test]
    fn empty_room_is_fully_visible() {
        let calc = VisibilityCalculator::new(&room(100.0, 100.0)).unwrap();
        let poly = calc.visible_polygon(pt(50.0, 50.0));
        assert_eq!(poly.len(), 4, "{poly:?}");
        for corner in [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0), pt(0.0, 100.0)] {
            assert!(poly.iter().any(|p| p.distance(corner) < 1e-6), "missing {corner}");
        }
    }

    #[test]
    fn off_center_view_still_sees_the_whole_rect() {
        let calc = VisibilityCalculator::new(&room(320.0, 180.0)).unwrap();
        let view = pt(13.5, 170.25);
        let poly = calc.visible_polygon(view);
        assert_eq!(poly.len(), 4, "{poly:?}");
        assert_increasing_angles(view, &poly);
    }

    #[test]
    fn unbounded_occluders_are_rejected() {
        let mut set = OccluderSet::new();
        set.add_segment(Segment::new(pt(0.0, 0.0), pt(10.0, 0.0)));
        assert!(matches!(
            VisibilityCalculator::new(&set),
            Err(LightingError::Unbounded)
        ));
    }

    #[test]
    fn box_casts_a_shadow() {
        let mut set = room(200.0, 100.0);
        set.add_rect(Rect::from_size(pt(90.0, 40.0), pt(20.0, 20.0)));
        let calc = VisibilityCalculator::new(&set).unwrap();
        let view = pt(20.0, 50.0);
        let poly = calc.visible_polygon(view);

        assert!(polygon_contains(&poly, pt(60.0, 50.0)));
        assert!(polygon_contains(&poly, pt(150.0, 10.0)));
        assert!(!polygon_contains(&poly, pt(150.0, 50.0)));
        assert!(!polygon_contains(&poly, pt(100.0, 50.0)));
        assert!(!is_self_intersecting(&poly));
        assert_increasing_angles(view, &poly);
    }

    #[test]
    fn cluttered_room_gives_simple_star_polygon() {
        let mut set = room(320.0, 180.0);
        set.add_rect(Rect::from_size(pt(40.0, 40.0), pt(8.0, 8.0)));
        set.add_rect(Rect::from_size(pt(100.0, 20.0), pt(40.0, 8.0)));
        set.add_rect(Rect::from_size(pt(200.0, 120.0), pt(16.0, 30.0)));
        set.add_polygon(&[pt(250.0, 30.0), pt(270.0, 70.0), pt(230.0, 60.0)]);
        let calc = VisibilityCalculator::new(&set).unwrap();

        for view in [pt(160.0, 90.0), pt(10.0, 10.0), pt(300.0, 170.0), pt(44.0, 90.0)] {
            let poly = calc.visible_polygon(view);
            assert!(poly.len() >= 4);
            assert!(!is_self_intersecting(&poly), "self-intersecting from {view}");
            assert_increasing_angles(view, &poly);
            assert!(polygon_contains(&poly, view + pt(0.5, 0.25)));
        }
    }

    #[test]
    fn no_leak_through_a_shared_vertex() {
        // Two wall pieces meet exactly on the horizontal ray from the light.
        let mut set = room(100.0, 100.0);
        set.add_segment(Segment::new(pt(60.0, 10.0), pt(60.0, 50.0)));
        set.add_segment(Segment::new(pt(60.0, 50.0), pt(60.0, 90.0)));
        let calc = VisibilityCalculator::new(&set).unwrap();
        let poly = calc.visible_polygon(pt(20.0, 50.0));

        assert!(polygon_contains(&poly, pt(40.0, 50.0)));
        for behind in [pt(61.0, 50.0), pt(80.0, 50.0), pt(95.0, 49.999), pt(95.0, 50.001), pt(80.0, 30.0)] {
            assert!(!polygon_contains(&poly, behind), "light leaked to {behind}");
        }
    }

    #[test]
    fn thin_wall_through_its_endpoint() {
        // The ray grazes the end of a single wall.
        let mut set = room(100.0, 100.0);
        set.add_segment(Segment::new(pt(60.0, 50.0), pt(60.0, 90.0)));
        let calc = VisibilityCalculator::new(&set).unwrap();
        let poly = calc.visible_polygon(pt(20.0, 50.0));

        assert!(polygon_contains(&poly, pt(90.0, 40.0)));
        assert!(!polygon_contains(&poly, pt(80.0, 60.0)));
        assert!(!polygon_contains(&poly, pt(90.0, 85.0)));
    }

    #[test]
    fn view_on_a_wall_does_not_panic() {
        let mut set = room(100.0, 100.0);
        set.add_segment(Segment::new(pt(50.0, 20.0), pt(50.0, 80.0)));
        let calc = VisibilityCalculator::new(&set).unwrap();
        let poly = calc.visible_polygon(pt(50.0, 50.0));
        assert!(!poly.is_empty());
    }

    #[test]
    fn view_outside_bounds_is_empty() {
        let calc = VisibilityCalculator::new(&room(100.0, 100.0)).unwrap();
        assert!(calc.visible_polygon(pt(150.0, 50.0)).is_empty());
        assert!(calc.visible_polygon(pt(0.0, 50.0)).is_empty());
    }

    #[test]
    fn wall_past_the_scene_edge_is_accepted() {
        let scene = Rect::from_size(Point::ZERO, pt(64.0, 48.0));
        let mut walls = OccluderSet::with_bounds(scene);
        walls.add_rect(Rect::from_size(pt(60.0, 10.0), pt(8.0, 8.0)));
        let calc = VisibilityCalculator::new(&walls).unwrap();
        assert_eq!(calc.bounds(), scene);

        let view = pt(30.0, 24.0);
        let poly = calc.visible_polygon(view);
        assert!(poly.len() > 4);
        assert_increasing_angles(view, &poly);
        for p in &poly {
            assert!(p.x > -1e-6 && p.x < 64.0 + 1e-6 && p.y > -1e-6 && p.y < 48.0 + 1e-6, "{p:?}");
        }
        assert!(!polygon_contains(&poly, pt(62.0, 14.0)));

        // inside the wall's overhang, outside the scene
        assert!(calc.visible_polygon(pt(66.0, 12.0)).is_empty());
    }

    #[test]
    fn free_function_matches_calculator() {
        let mut set = room(100.0, 100.0);
        set.add_rect(Rect::from_size(pt(30.0, 30.0), pt(10.0, 10.0)));
        let calc = VisibilityCalculator::new(&set).unwrap();
        let view = pt(70.0, 60.0);
        assert_eq!(visible_polygon(view, set.segments()), calc.visible_polygon(view));
    }

    #[test]
    fn simplify_drops_collinear_and_duplicates() {
        let pts = [
            pt(0.0, 0.0),
            pt(5.0, 0.0),
            pt(10.0, 0.0),
            pt(10.0, 0.0),
            pt(10.0, 10.0),
            pt(0.0, 10.0),
            pt(0.0, 5.0),
        ];
        let out = simplify(pts.into_iter());
        assert_eq!(out, vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0), pt(0.0, 10.0)]);
    }
}
