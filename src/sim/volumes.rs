//! Collision volume construction
//!
//! Turns the tiles around a moving circle, plus any dynamic obstacles, into
//! line segments and arc connectors inflated by the circle's radius. The
//! circle can then be swept as a point against the result.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arc::ArcConnector;
use super::segment::LineSegment;
use super::tilemap::{SolidTable, TileLayer};

/// Extra reach around the swept region, in world units
pub const WINDOW_MARGIN: f32 = 0.5;

/// A circular collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// A dynamic axis-aligned blocker (tree trunk, wreckage)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Extra rounding added on top of the collider radius
    pub padding: f32,
}

impl Obstacle {
    pub fn new(center: Vec2, half_extents: Vec2, padding: f32) -> Self {
        Self {
            center,
            half_extents,
            padding,
        }
    }
}

/// Which sides of a rectangle border another solid (and so get no edge)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sides {
    pub pos_x: bool,
    pub neg_x: bool,
    pub pos_y: bool,
    pub neg_y: bool,
}

/// Per-query geometry scratch space
#[derive(Debug, Clone, Default)]
pub struct CollisionGeometry {
    pub lines: Vec<LineSegment>,
    pub arcs: Vec<ArcConnector>,
}

impl CollisionGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for the next body, keeping the allocations
    pub fn clear(&mut self) {
        self.lines.clear();
        self.arcs.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.arcs.is_empty()
    }

    /// Append a rectangle from `min` to `max` inflated by `r`.
    ///
    /// Edges run so the rectangle is on their inside; corners get a
    /// quarter arc only where both adjoining sides are exposed.
    pub fn add_rect(&mut self, min: Vec2, max: Vec2, r: f32, blocked: Sides) {
        if !blocked.neg_x {
            self.lines.push(LineSegment::new(
                Vec2::new(min.x - r, min.y),
                Vec2::new(min.x - r, max.y),
            ));
        }
        if !blocked.pos_y {
            self.lines.push(LineSegment::new(
                Vec2::new(min.x, max.y + r),
                Vec2::new(max.x, max.y + r),
            ));
        }
        if !blocked.pos_x {
            self.lines.push(LineSegment::new(
                Vec2::new(max.x + r, max.y),
                Vec2::new(max.x + r, min.y),
            ));
        }
        if !blocked.neg_y {
            self.lines.push(LineSegment::new(
                Vec2::new(max.x, min.y - r),
                Vec2::new(min.x, min.y - r),
            ));
        }

        if r <= 0.0 {
            return;
        }
        if !blocked.neg_x && !blocked.neg_y {
            self.arcs.push(ArcConnector::new(min, Vec2::NEG_X, Vec2::NEG_Y, r));
        }
        if !blocked.neg_x && !blocked.pos_y {
            self.arcs.push(ArcConnector::new(
                Vec2::new(min.x, max.y),
                Vec2::Y,
                Vec2::NEG_X,
                r,
            ));
        }
        if !blocked.pos_x && !blocked.pos_y {
            self.arcs.push(ArcConnector::new(max, Vec2::X, Vec2::Y, r));
        }
        if !blocked.pos_x && !blocked.neg_y {
            self.arcs.push(ArcConnector::new(
                Vec2::new(max.x, min.y),
                Vec2::NEG_Y,
                Vec2::X,
                r,
            ));
        }
    }

    /// Append an obstacle as a fully exposed rounded rectangle
    pub fn add_obstacle(&mut self, obstacle: &Obstacle, collider_radius: f32) {
        self.add_rect(
            obstacle.center - obstacle.half_extents,
            obstacle.center + obstacle.half_extents,
            collider_radius + obstacle.padding,
            Sides::default(),
        );
    }
}

/// Inclusive cell window covered by a collider's sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileWindow {
    /// Cells reachable by `collider` moving by `movement`, clamped to the grid
    pub fn around(layer: &TileLayer, collider: Circle, movement: Vec2) -> Self {
        let reach = movement.length() + WINDOW_MARGIN + collider.radius;
        let lo = ((collider.center - reach) / layer.tile_size).floor();
        let hi = ((collider.center + reach) / layer.tile_size).floor();
        Self {
            min_x: (lo.x as i32).max(0),
            min_y: (lo.y as i32).max(0),
            max_x: (hi.x as i32).min(layer.width as i32 - 1),
            max_y: (hi.y as i32).min(layer.height as i32 - 1),
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Build the inflated geometry around `collider` for a move of `movement`.
///
/// Only the solid/open boundary produces edges. Cells outside the window
/// count as open, so solids on the window border are always closed off.
pub fn add_collision_volumes(
    geometry: &mut CollisionGeometry,
    layer: &TileLayer,
    solids: &SolidTable,
    obstacles: &[Obstacle],
    collider: Circle,
    movement: Vec2,
) {
    let window = TileWindow::around(layer, collider, movement);
    let solid_in_window =
        |x: i32, y: i32| window.contains(x, y) && solids.is_solid_cell(layer, x, y);

    for y in window.min_y..=window.max_y {
        for x in window.min_x..=window.max_x {
            if !solids.is_solid_cell(layer, x, y) {
                continue;
            }
            let blocked = Sides {
                pos_x: solid_in_window(x + 1, y),
                neg_x: solid_in_window(x - 1, y),
                pos_y: solid_in_window(x, y + 1),
                neg_y: solid_in_window(x, y - 1),
            };
            let (min, max) = layer.cell_bounds(x, y);
            geometry.add_rect(min, max, collider.radius, blocked);
        }
    }

    for obstacle in obstacles {
        geometry.add_obstacle(obstacle, collider.radius);
    }
}
