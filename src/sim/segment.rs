//! Oriented line segments
//!
//! A segment runs from `a` to `b`. The solid side is on the right of the
//! direction of travel: a point `p` is inside when `cross(p - a, b - a) >= 0`,
//! and the outward normal is `perp(b - a) = (-d.y, d.x)`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One oriented edge of collidable geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.b - self.a
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// Unit normal pointing away from the solid side
    #[inline]
    pub fn outward_normal(&self) -> Vec2 {
        self.direction().normalize_or_zero().perp()
    }

    /// Whether `p` lies on the solid side (or exactly on the line)
    #[inline]
    pub fn is_inside(&self, p: Vec2) -> bool {
        (p - self.a).perp_dot(self.direction()) >= 0.0
    }

    /// Parametric hit of the ray `start + t * dir`, `t` in [0, 1].
    ///
    /// One-sided: rays only hit when crossing from the outside in.
    pub fn intersect_ray(&self, start: Vec2, dir: Vec2) -> Option<f32> {
        let seg = self.direction();
        let divisor = dir.perp_dot(seg);
        if divisor <= 0.0 {
            return None;
        }

        let diff = self.a - start;
        let t0 = diff.perp_dot(seg);
        if t0 < 0.0 || t0 > divisor {
            return None;
        }
        let u0 = diff.perp_dot(dir);
        if u0 < 0.0 || u0 > divisor {
            return None;
        }
        Some(t0 / divisor)
    }

    /// Distance from `p` to its projection on the segment, if the projection
    /// falls within the segment's span
    pub fn span_distance(&self, p: Vec2) -> Option<f32> {
        let tangent = self.direction().normalize_or_zero();
        let along = (p - self.a).dot(tangent);
        if along < 0.0 || along > self.length() {
            return None;
        }
        let closest = self.a + tangent * along;
        Some((closest - p).length())
    }
}
