//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies
//!
//! Per tick, each moving body gets its own geometry: the solid tiles and
//! obstacles around it are inflated by its radius into segments and arcs
//! (`volumes`), swept against as a point (`raycast`, `collision`), then
//! cleared.

pub mod arc;
pub mod collision;
pub mod raycast;
pub mod sdf;
pub mod segment;
pub mod state;
pub mod tick;
pub mod tilemap;
pub mod volumes;

pub use arc::ArcConnector;
pub use collision::{
    Body, CollisionWorld, Sweep, correct_penetration, resolve, sweep, CORRECTION_ITERATIONS,
    PHYSICS_DISCRETE_RADIUS, SKIN, SWEEP_ITERATIONS,
};
pub use raycast::{RaycastResult, raycast};
pub use sdf::{clearance, sd_box, sdf_gradient};
pub use segment::LineSegment;
pub use state::{
    Attack, Enemy, Entity, EntityKind, GameEvent, GamePhase, GameState, Player, RngState,
};
pub use tick::{FrameClock, FrameOutput, TickInput, TickOutput, can_interact, tick};
pub use tilemap::{LevelError, SolidTable, TileLayer};
pub use volumes::{Circle, CollisionGeometry, Obstacle, Sides, TileWindow, add_collision_volumes};
