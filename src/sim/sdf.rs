//! Signed distance queries against the world
//!
//! The sweep never needs these; they back the clearance diagnostics and
//! the property tests, as an independent check that bodies stay outside
//! solid tiles and obstacles.

use glam::Vec2;

use super::collision::CollisionWorld;

/// Signed distance to an axis-aligned box
#[inline]
pub fn sd_box(p: Vec2, center: Vec2, half_extents: Vec2) -> f32 {
    let d = (p - center).abs() - half_extents;
    d.max(Vec2::ZERO).length() + d.max_element().min(0.0)
}

/// Compute SDF gradient (surface normal) using central differences
pub fn sdf_gradient<F>(p: Vec2, sdf: F) -> Vec2
where
    F: Fn(Vec2) -> f32,
{
    let eps = 0.5;
    let dx = sdf(p + Vec2::new(eps, 0.0)) - sdf(p - Vec2::new(eps, 0.0));
    let dy = sdf(p + Vec2::new(0.0, eps)) - sdf(p - Vec2::new(0.0, eps));
    Vec2::new(dx, dy).normalize_or_zero()
}

/// Distance from `p` to the nearest solid tile or obstacle within `reach`.
///
/// Obstacles count with their padding. Returns `f32::MAX` when nothing solid
/// is in reach; negative values mean `p` is inside something.
pub fn clearance(world: &CollisionWorld, p: Vec2, reach: f32) -> f32 {
    let layer = world.layer;
    let (min_x, min_y) = layer.cell_at(p - reach);
    let (max_x, max_y) = layer.cell_at(p + reach);
    let half = Vec2::splat(layer.tile_size * 0.5);

    let mut best = f32::MAX;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if world.solids.is_solid_cell(layer, x, y) {
                best = best.min(sd_box(p, layer.cell_center(x, y), half));
            }
        }
    }

    for obstacle in world.obstacles {
        let d = sd_box(p, obstacle.center, obstacle.half_extents) - obstacle.padding;
        best = best.min(d);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tilemap::{SolidTable, TileLayer};
    use crate::sim::volumes::Obstacle;

    #[test]
    fn test_sd_box() {
        let c = Vec2::new(8.0, 8.0);
        let he = Vec2::splat(8.0);
        assert!((sd_box(Vec2::new(20.0, 8.0), c, he) - 4.0).abs() < 1e-6);
        assert!((sd_box(Vec2::new(8.0, 8.0), c, he) + 8.0).abs() < 1e-6);
        // Diagonal from the corner
        assert!((sd_box(Vec2::new(19.0, 20.0), c, he) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_points_away_from_box() {
        let n = sdf_gradient(Vec2::new(20.0, 8.0), |p| {
            sd_box(p, Vec2::splat(8.0), Vec2::splat(8.0))
        });
        assert!((n - Vec2::X).length() < 1e-4);
    }

    #[test]
    fn test_clearance_tiles_and_obstacles() {
        let layer = TileLayer::from_ascii(&["....", ".#..", "...."]).unwrap();
        let solids = SolidTable::default();
        let world = CollisionWorld::new(&layer, &solids, &[]);
        // Cell (1, 1) spans 16..32 on both axes
        assert!((clearance(&world, Vec2::new(40.0, 24.0), 20.0) - 8.0).abs() < 1e-5);
        assert_eq!(clearance(&world, Vec2::new(60.0, 8.0), 4.0), f32::MAX);

        let tree = [Obstacle::new(Vec2::new(56.0, 24.0), Vec2::splat(2.0), 3.0)];
        let world = CollisionWorld::new(&layer, &solids, &tree);
        assert!((clearance(&world, Vec2::new(40.0, 24.0), 20.0) - 8.0).abs() < 1e-5);
        assert!((clearance(&world, Vec2::new(50.0, 24.0), 1.0) - 1.0).abs() < 1e-5);
    }
}
