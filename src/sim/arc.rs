//! Arc connectors: rounded fillets at convex corners
//!
//! An arc is centered on a corner and spans the counter-clockwise sweep from
//! `leg1` to `leg2`. The sign of `cross(leg1, leg2)` tells which way round:
//! - `>= 0`: the sweep is at most 180°, a direction must be past `leg1` AND
//!   before `leg2`
//! - `< 0`: the sweep is more than 180°, past `leg1` OR before `leg2`

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A rounded corner of radius `radius` around `center`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcConnector {
    pub center: Vec2,
    /// Unit vector where the span begins
    pub leg1: Vec2,
    /// Unit vector where the span ends
    pub leg2: Vec2,
    pub radius: f32,
}

impl ArcConnector {
    pub fn new(center: Vec2, leg1: Vec2, leg2: Vec2, radius: f32) -> Self {
        Self {
            center,
            leg1,
            leg2,
            radius,
        }
    }

    /// Whether the span is wider than a half circle
    #[inline]
    pub fn is_reflex(&self) -> bool {
        self.leg1.perp_dot(self.leg2) < 0.0
    }

    /// Check if a direction (relative to the center) is within the span
    pub fn contains_direction(&self, v: Vec2) -> bool {
        let past_start = self.leg1.perp_dot(v) >= 0.0;
        let before_end = v.perp_dot(self.leg2) >= 0.0;

        if self.is_reflex() {
            past_start || before_end
        } else {
            past_start && before_end
        }
    }

    /// Check if a world-space point is within the angular span
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.contains_direction(p - self.center)
    }

    /// Outward normal at a point on (or near) the arc
    #[inline]
    pub fn normal_at(&self, p: Vec2) -> Vec2 {
        (p - self.center).normalize_or_zero()
    }
}
