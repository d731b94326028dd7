//! Raycasting against collision geometry
//!
//! Rays carry their magnitude: `dir` is the full displacement of the sweep,
//! and hits are reported as the fraction `tmin` of it.

use glam::Vec2;

use super::arc::ArcConnector;
use super::volumes::CollisionGeometry;

/// Nearest hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    /// Fraction of `dir` travelled before the hit; 1 means no hit
    pub tmin: f32,
    /// Unit surface normal at the hit, zero on a miss
    pub normal: Vec2,
}

impl RaycastResult {
    pub fn miss() -> Self {
        Self {
            tmin: 1.0,
            normal: Vec2::ZERO,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.tmin < 1.0
    }
}

/// Find the nearest surface crossed by `start + t * dir`, `t` in [0, 1].
///
/// Among equal hits the first element wins (lines before arcs).
pub fn raycast(geometry: &CollisionGeometry, start: Vec2, dir: Vec2) -> RaycastResult {
    let len = dir.length();
    if len == 0.0 || !len.is_finite() {
        return RaycastResult::miss();
    }

    let mut tmin = 1.0;
    let mut normal = Vec2::ZERO;

    for line in &geometry.lines {
        if let Some(t) = line.intersect_ray(start, dir) {
            if t < tmin {
                tmin = t;
                normal = line.direction().perp();
            }
        }
    }

    for arc in &geometry.arcs {
        if let Some((t, hit)) = intersect_arc(arc, start, dir, len) {
            if t < tmin {
                tmin = t;
                normal = hit - arc.center;
            }
        }
    }

    RaycastResult {
        tmin: tmin.clamp(0.0, 1.0),
        normal: normal.normalize_or_zero(),
    }
}

/// Entry point of a ray into an arc's circle, if it lands inside the span.
///
/// Circles behind the ray origin are ignored, which also keeps a ray that
/// starts inside a circle from catching on its far wall. A ray that starts
/// inside a circle and heads deeper gets its entry point behind the origin;
/// that is reported as a hit at `t = 0` so the body stops instead of
/// tunnelling further into the corner.
fn intersect_arc(arc: &ArcConnector, start: Vec2, dir: Vec2, len: f32) -> Option<(f32, Vec2)> {
    let to_center = arc.center - start;
    if dir.dot(to_center) <= 0.0 {
        return None;
    }

    // Project the center onto the ray
    let unit = dir / len;
    let closest = start + unit * unit.dot(to_center);
    let dist2 = (closest - arc.center).length_squared();
    let r2 = arc.radius * arc.radius;
    if dist2 >= r2 {
        return None;
    }

    // Back off by the half chord to reach the near intersection
    let hit = closest - unit * (r2 - dist2).sqrt();
    if !arc.contains_point(hit) {
        return None;
    }

    // Entry behind the origin clamps to an immediate hit
    let t = ((hit - start).dot(unit) / len).max(0.0);
    Some((t, hit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::segment::LineSegment;
    use crate::sim::volumes::Sides;

    fn single_line(a: Vec2, b: Vec2) -> CollisionGeometry {
        let mut geo = CollisionGeometry::new();
        geo.lines.push(LineSegment::new(a, b));
        geo
    }

    #[test]
    fn test_raycast_axis_aligned_segment() {
        // Winding puts the outside at +y
        let geo = single_line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let hit = raycast(&geo, Vec2::new(5.0, 5.0), Vec2::new(0.0, -10.0));
        assert!((hit.tmin - 0.5).abs() < 1e-6);
        assert!((hit.normal - Vec2::new(0.0, 1.0)).length() < 1e-6);

        // Reverse winding puts the outside at -y
        let geo = single_line(Vec2::new(10.0, 0.0), Vec2::new(0.0, 0.0));
        let hit = raycast(&geo, Vec2::new(5.0, -5.0), Vec2::new(0.0, 10.0));
        assert!((hit.tmin - 0.5).abs() < 1e-6);
        assert!((hit.normal - Vec2::new(0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_raycast_one_sided() {
        let geo = single_line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let hit = raycast(&geo, Vec2::new(5.0, -5.0), Vec2::new(0.0, 10.0));
        assert_eq!(hit, RaycastResult::miss());
    }

    #[test]
    fn test_raycast_zero_dir_misses() {
        let geo = single_line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let hit = raycast(&geo, Vec2::new(5.0, 0.0), Vec2::ZERO);
        assert!(!hit.is_hit());
        assert_eq!(hit.normal, Vec2::ZERO);
    }

    #[test]
    fn test_raycast_nearest_wins() {
        let mut geo = single_line(Vec2::new(0.0, 8.0), Vec2::new(10.0, 8.0));
        geo.lines.push(LineSegment::new(Vec2::new(0.0, 4.0), Vec2::new(10.0, 4.0)));
        let hit = raycast(&geo, Vec2::new(5.0, 10.0), Vec2::new(0.0, -10.0));
        assert!((hit.tmin - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_raycast_arc_head_on() {
        let mut geo = CollisionGeometry::new();
        geo.arcs.push(ArcConnector::new(Vec2::ZERO, Vec2::X, Vec2::Y, 2.0));
        // Straight down the 45° diagonal toward the center
        let start = Vec2::new(10.0, 10.0);
        let hit = raycast(&geo, start, Vec2::new(-10.0, -10.0));
        let expected_t = (start.length() - 2.0) / start.length();
        assert!((hit.tmin - expected_t).abs() < 1e-5);
        assert!((hit.normal - Vec2::new(1.0, 1.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_raycast_arc_outside_span_misses() {
        let mut geo = CollisionGeometry::new();
        geo.arcs.push(ArcConnector::new(Vec2::ZERO, Vec2::X, Vec2::Y, 2.0));
        // Approaches from the third quadrant
        let hit = raycast(&geo, Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0));
        assert!(!hit.is_hit());
    }

    #[test]
    fn test_raycast_arc_behind_ignored() {
        let mut geo = CollisionGeometry::new();
        geo.arcs.push(ArcConnector::new(Vec2::ZERO, Vec2::X, Vec2::Y, 2.0));
        let hit = raycast(&geo, Vec2::new(3.0, 0.5), Vec2::new(10.0, 0.0));
        assert!(!hit.is_hit());
    }

    #[test]
    fn test_raycast_from_inside_arc_stops_at_origin() {
        let mut geo = CollisionGeometry::new();
        geo.arcs.push(ArcConnector::new(Vec2::ZERO, Vec2::X, Vec2::Y, 2.0));
        // Already inside the fillet and heading for the corner
        let hit = raycast(&geo, Vec2::new(1.0, 1.0), Vec2::new(-2.0, -2.0));
        assert!(hit.is_hit());
        assert_eq!(hit.tmin, 0.0);
        assert!((hit.normal - Vec2::new(1.0, 1.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_raycast_rounded_rect_corner() {
        let mut geo = CollisionGeometry::new();
        geo.add_rect(Vec2::ZERO, Vec2::splat(16.0), 4.0, Sides::default());
        // Diagonally into the top-right corner fillet
        let hit = raycast(&geo, Vec2::new(30.0, 30.0), Vec2::new(-20.0, -20.0));
        assert!(hit.is_hit());
        assert!((hit.normal - Vec2::new(1.0, 1.0).normalize()).length() < 1e-4);
        let contact = Vec2::new(30.0, 30.0) + Vec2::new(-20.0, -20.0) * hit.tmin;
        assert!(((contact - Vec2::splat(16.0)).length() - 4.0).abs() < 1e-3);
    }
}
