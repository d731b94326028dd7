//! Continuous collision response for circular bodies
//!
//! A body is swept as a point through geometry that was already inflated by
//! its radius (see `volumes`). Each hit advances to the contact, turns the
//! leftover motion by the bounce blend and casts again. A short discrete
//! pass afterwards pushes the point back out of any surface it ended up
//! just inside of, which happens in tight corners from rounding.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::raycast::raycast;
use super::tilemap::{SolidTable, TileLayer};
use super::volumes::{add_collision_volumes, Circle, CollisionGeometry, Obstacle};

/// Maximum hits resolved per sweep
pub const SWEEP_ITERATIONS: usize = 4;
/// Maximum push-out rounds after a sweep
pub const CORRECTION_ITERATIONS: usize = 4;
/// Contact offset along the surface normal after each hit
pub const SKIN: f32 = 0.001;
/// Depth below a surface that the discrete pass still corrects
pub const PHYSICS_DISCRETE_RADIUS: f32 = 1.0;
/// Push-out overshoot so the next round starts outside
const CORRECTION_OVERSHOOT: f32 = 1.01;

/// The per-body physics state carried between ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    #[inline]
    pub fn collider(&self) -> Circle {
        Circle::new(self.pos, self.radius)
    }
}

/// Everything static a body collides with during one tick
#[derive(Debug, Clone, Copy)]
pub struct CollisionWorld<'a> {
    pub layer: &'a TileLayer,
    pub solids: &'a SolidTable,
    pub obstacles: &'a [Obstacle],
}

impl<'a> CollisionWorld<'a> {
    pub fn new(layer: &'a TileLayer, solids: &'a SolidTable, obstacles: &'a [Obstacle]) -> Self {
        Self {
            layer,
            solids,
            obstacles,
        }
    }
}

/// Outcome of a sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Where the point came to rest
    pub end: Vec2,
    /// Displacement left after the last hit (already bounced)
    pub dir: Vec2,
    /// Fraction of the tick the leftover displacement spans
    pub time_remaining: f32,
    /// Number of surfaces hit
    pub hits: usize,
    /// False when every iteration hit something and the point froze
    pub resolved: bool,
}

/// Sweep a point through `geometry` by `displacement`.
///
/// `bounce` blends the leftover motion after a hit: -1 keeps it, 0 slides
/// along the surface, 1 reflects it. Every hit normal is appended to
/// `normals` when given.
///
/// After each hit the point is nudged off the surface by a second cast of
/// `normal * SKIN * 2`, moving half the free distance. This only guards
/// against the next cast starting on the wrong side of the surface due to
/// rounding; it has no physical meaning.
///
/// If all `SWEEP_ITERATIONS` hit something the point stays at the last
/// contact and the leftover displacement is not applied.
pub fn sweep(
    geometry: &CollisionGeometry,
    start: Vec2,
    displacement: Vec2,
    bounce: f32,
    mut normals: Option<&mut Vec<Vec2>>,
) -> Sweep {
    let bounce = bounce.clamp(-1.0, 1.0);
    let mut pos = start;
    let mut dir = displacement;
    let mut time_remaining = 1.0;
    let mut hits = 0;
    let mut resolved = false;

    for _ in 0..SWEEP_ITERATIONS {
        let cast = raycast(geometry, pos, dir);
        if !cast.is_hit() {
            resolved = true;
            break;
        }

        pos += dir * cast.tmin;
        let nudge = cast.normal * SKIN * 2.0;
        let back = raycast(geometry, pos, nudge);
        pos += nudge * back.tmin * 0.5;

        let incoming = dir * (1.0 - cast.tmin);
        let tangent = Vec2::new(cast.normal.y, -cast.normal.x);
        dir = incoming + (bounce + 1.0) * (incoming.dot(tangent) * tangent - incoming);
        time_remaining *= 1.0 - cast.tmin;
        hits += 1;

        if let Some(normals) = normals.as_deref_mut() {
            normals.push(cast.normal);
        }
    }

    if resolved {
        pos += dir;
    }

    Sweep {
        end: pos,
        dir,
        time_remaining,
        hits,
        resolved,
    }
}

/// Push `pos` out of surfaces it sits just inside of.
///
/// Lines push along their outward normal when `pos` is on the solid side
/// and within `PHYSICS_DISCRETE_RADIUS` of the segment; arcs push radially
/// when `pos` is within that depth of the rim and inside the span. Any part
/// of `dir` heading back into a push is removed. Returns the number of
/// rounds that moved the point.
pub fn correct_penetration(geometry: &CollisionGeometry, pos: &mut Vec2, dir: &mut Vec2) -> usize {
    let mut rounds = 0;

    for _ in 0..CORRECTION_ITERATIONS {
        let mut push = Vec2::ZERO;

        for line in &geometry.lines {
            if !line.is_inside(*pos) {
                continue;
            }
            if let Some(distance) = line.span_distance(*pos) {
                if distance < PHYSICS_DISCRETE_RADIUS {
                    push += distance * line.outward_normal();
                }
            }
        }

        for arc in &geometry.arcs {
            let distance = (*pos - arc.center).length();
            if distance <= arc.radius
                && distance > arc.radius - PHYSICS_DISCRETE_RADIUS
                && arc.contains_point(*pos)
            {
                push += (arc.radius - distance) * arc.normal_at(*pos);
            }
        }

        if push == Vec2::ZERO {
            break;
        }
        *pos += push * CORRECTION_OVERSHOOT;
        rounds += 1;

        if dir.dot(push) < 0.0 {
            let normal = push.normalize_or_zero();
            *dir -= dir.dot(normal) * normal;
        }
    }

    rounds
}

/// Velocity implied by the leftover displacement over the leftover time.
///
/// Never faster than the incoming motion, and zero whenever the division
/// would not give a finite result.
fn reconstruct_velocity(dir: Vec2, displacement: Vec2, tick: f32, time_remaining: f32) -> Vec2 {
    let denom = tick * time_remaining;
    if !(denom > 0.0 && denom.is_finite()) {
        return Vec2::ZERO;
    }

    let vel = (dir / denom).clamp_length_max(displacement.length() / tick);
    if vel.is_finite() { vel } else { Vec2::ZERO }
}

/// Move `body` by `displacement` through the world for one tick.
///
/// Rebuilds the local geometry into `scratch`, sweeps, corrects, then
/// writes the new position and velocity back to the body.
pub fn resolve(
    world: &CollisionWorld,
    scratch: &mut CollisionGeometry,
    body: &mut Body,
    displacement: Vec2,
    tick: f32,
    bounce: f32,
    normals: Option<&mut Vec<Vec2>>,
) -> Sweep {
    scratch.clear();
    add_collision_volumes(
        scratch,
        world.layer,
        world.solids,
        world.obstacles,
        body.collider(),
        displacement,
    );

    let mut result = sweep(scratch, body.pos, displacement, bounce, normals);
    correct_penetration(scratch, &mut result.end, &mut result.dir);

    body.pos = result.end;
    body.vel = reconstruct_velocity(result.dir, displacement, tick, result.time_remaining);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arc::ArcConnector;
    use crate::sim::segment::LineSegment;

    /// A wall along x = 0 whose solid side is +x
    fn wall() -> CollisionGeometry {
        let mut geo = CollisionGeometry::new();
        geo.lines
            .push(LineSegment::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 10.0)));
        geo
    }

    fn velocity_after(geo: &CollisionGeometry, displacement: Vec2, bounce: f32) -> Vec2 {
        let mut result = sweep(geo, Vec2::new(-5.0, 0.0), displacement, bounce, None);
        correct_penetration(geo, &mut result.end, &mut result.dir);
        reconstruct_velocity(result.dir, displacement, 1.0, result.time_remaining)
    }

    #[test]
    fn test_elastic_bounce_negates_normal_component() {
        let geo = wall();
        let vel = velocity_after(&geo, Vec2::new(10.0, 0.0), 1.0);
        assert!((vel - Vec2::new(-10.0, 0.0)).length() < 1e-3);

        let vel = velocity_after(&geo, Vec2::new(10.0, 4.0), 1.0);
        assert!((vel - Vec2::new(-10.0, 4.0)).length() < 1e-3);
    }

    #[test]
    fn test_plastic_bounce_keeps_tangent_only() {
        let geo = wall();
        let vel = velocity_after(&geo, Vec2::new(10.0, 0.0), 0.0);
        assert!(vel.length() < 1e-3);

        let vel = velocity_after(&geo, Vec2::new(10.0, 4.0), 0.0);
        assert!((vel - Vec2::new(0.0, 4.0)).length() < 1e-3);
    }

    #[test]
    fn test_sweep_stops_on_outside_of_wall() {
        let geo = wall();
        let mut normals = Vec::new();
        let result = sweep(
            &geo,
            Vec2::new(-5.0, 0.0),
            Vec2::new(10.0, 4.0),
            0.0,
            Some(&mut normals),
        );
        assert!(result.resolved);
        assert_eq!(result.hits, 1);
        assert_eq!(normals, vec![Vec2::new(-1.0, 0.0)]);
        assert!(result.end.x < 0.0 && result.end.x > -0.01);
        assert!((result.end.y - 4.0).abs() < 1e-4);
        assert!((result.time_remaining - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_corner_is_rounded() {
        let layer = TileLayer::from_ascii(&["...", ".#.", "..."]).unwrap();
        let solids = SolidTable::default();
        let world = CollisionWorld::new(&layer, &solids, &[]);
        let mut scratch = CollisionGeometry::new();
        let mut body = Body::new(Vec2::new(40.0, 34.0), 4.0);

        let result = resolve(&world, &mut scratch, &mut body, Vec2::new(-8.0, 0.0), 1.0, 0.0, None);

        assert_eq!(result.hits, 1);
        // Slid around the fillet rather than catching on the corner
        assert!((body.vel - Vec2::new(-2.0, 3.0f32.sqrt() * 2.0)).length() < 1e-2);
        assert!(body.pos.y > 34.0);
        assert!((body.pos - Vec2::new(32.0, 32.0)).length() >= 4.0);
    }

    #[test]
    fn test_zero_motion_is_idempotent() {
        let layer = TileLayer::from_ascii(&["...", ".#.", "..."]).unwrap();
        let solids = SolidTable::default();
        let world = CollisionWorld::new(&layer, &solids, &[]);
        let mut scratch = CollisionGeometry::new();
        let start = Vec2::new(8.0, 8.0);
        let mut body = Body::new(start, 5.0);

        for _ in 0..3 {
            let result = resolve(
                &world,
                &mut scratch,
                &mut body,
                Vec2::ZERO,
                1.0 / 240.0,
                0.1,
                None,
            );
            assert!(result.resolved);
            assert_eq!(result.hits, 0);
        }
        assert_eq!(body.pos, start);
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_v_corridor_respects_iteration_bound() {
        let mut geo = CollisionGeometry::new();
        geo.lines
            .push(LineSegment::new(Vec2::new(20.0, 10.0), Vec2::new(0.0, 0.0)));
        geo.lines
            .push(LineSegment::new(Vec2::new(0.0, 0.0), Vec2::new(20.0, -10.0)));

        let mut normals = Vec::new();
        let displacement = Vec2::new(-30.0, 1.0);
        let mut result = sweep(&geo, Vec2::new(18.0, 0.0), displacement, 1.0, Some(&mut normals));
        correct_penetration(&geo, &mut result.end, &mut result.dir);
        let vel = reconstruct_velocity(result.dir, displacement, 1.0, result.time_remaining);

        assert!(result.hits >= 1);
        assert!(result.hits <= SWEEP_ITERATIONS);
        assert_eq!(normals.len(), result.hits);
        assert!(result.end.is_finite());
        assert!(result.end.x > -1.0);
        assert!(vel.is_finite());
        assert!(vel.length() <= displacement.length() + 1e-3);
    }

    #[test]
    fn test_correction_pushes_out_of_line() {
        let geo = wall();
        let mut pos = Vec2::new(0.5, 0.0);
        let mut dir = Vec2::new(3.0, 1.0);
        let rounds = correct_penetration(&geo, &mut pos, &mut dir);

        assert_eq!(rounds, 1);
        assert!(pos.x < 0.0);
        // The part of the motion heading back in is gone
        assert!((dir - Vec2::new(0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_correction_pushes_out_of_arc() {
        let mut geo = CollisionGeometry::new();
        geo.arcs.push(ArcConnector::new(Vec2::ZERO, Vec2::X, Vec2::Y, 4.0));
        let mut pos = Vec2::new(2.5, 2.5);
        let mut dir = Vec2::ZERO;
        correct_penetration(&geo, &mut pos, &mut dir);
        assert!(pos.length() >= 4.0);
    }

    #[test]
    fn test_correction_ignores_deep_points() {
        let geo = wall();
        // Further inside than the discrete radius: left alone
        let mut pos = Vec2::new(3.0, 0.0);
        let mut dir = Vec2::ZERO;
        assert_eq!(correct_penetration(&geo, &mut pos, &mut dir), 0);
        assert_eq!(pos, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_velocity_guards() {
        assert_eq!(reconstruct_velocity(Vec2::ONE, Vec2::ONE, 1.0, 0.0), Vec2::ZERO);
        assert_eq!(reconstruct_velocity(Vec2::ONE, Vec2::ONE, f32::NAN, 1.0), Vec2::ZERO);
        let vel = reconstruct_velocity(Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), 1.0, 0.01);
        assert!((vel.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_bounce_is_clamped() {
        let geo = wall();
        let wild = velocity_after(&geo, Vec2::new(10.0, 0.0), 5.0);
        let elastic = velocity_after(&geo, Vec2::new(10.0, 0.0), 1.0);
        assert!((wild - elastic).length() < 1e-4);
    }
}
