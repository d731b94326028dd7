//! Wraithwood - survive the night by torchlight
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collision geometry, sweeps, game state)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `persistence`: Versioned save envelope

pub mod persistence;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (240 Hz)
    pub const TICK_LENGTH: f32 = 1.0 / 240.0;
    /// Maximum ticks per frame to avoid spinning on a slow frame
    pub const MAX_TICKS_PER_FRAME: u32 = 50;

    /// Tile grid cell size in world units
    pub const TILE_SIZE: f32 = 16.0;

    /// Collider radius shared by the player and wraiths
    pub const BODY_RADIUS: f32 = 5.0;
    /// Bounce used for walking bodies (mostly plastic)
    pub const WALK_BOUNCE: f32 = 0.1;

    /// Player movement
    pub const PLAYER_ACCEL: f32 = 1000.0;
    pub const PLAYER_DRAG: f32 = 4.0;
    pub const PLAYER_FRICTION: f32 = 120.0;
    /// Seconds before a dropped item can be interacted with again
    pub const SPRINT_RETRIGGER_TIME: f32 = 0.25;

    /// Wraiths
    pub const ENEMY_SPEED: f32 = 60.0;
    pub const ENEMY_ACCEL: f32 = 80.0;
    pub const ENEMY_AGGRO_DISTANCE: f32 = 200.0;
    pub const ENEMY_ATTACK_RANGE: f32 = 20.0;
    pub const ATTACK_COOLDOWN: f32 = 2.0;
    pub const GLOBAL_ATTACK_COOLDOWN: f32 = 0.5;
    pub const ATTACK_DAMAGE: f32 = 0.3;
    pub const ATTACK_KNOCKBACK: f32 = 80.0;
    /// Attack effect lifetime (four frames at 6 fps)
    pub const ATTACK_EFFECT_TIME: f32 = 4.0 / 6.0;

    /// Light sources
    pub const TORCH_LIFETIME: f32 = 30.0;
    pub const TORCH_RADIUS: f32 = 80.0;
    pub const FIRE_RADIUS: f32 = 200.0;
    pub const FIRE_LOGS: f32 = 5.0;
    pub const FIRE_LOG_TIME: f32 = 20.0;
    pub const FIRE_TOTAL_TIME: f32 = FIRE_LOGS * FIRE_LOG_TIME;
    pub const TREE_HITS: u32 = 6;

    /// Player health regenerates per second, in [0, 1]
    pub const HEALTH_REGEN: f32 = 0.05;
}

/// Linear falloff between an inner and outer radius: 1 inside `inner`,
/// 0 beyond `outer`.
#[inline]
pub fn repulsion(dist: f32, inner: f32, outer: f32) -> f32 {
    ((outer - dist) / (outer - inner)).clamp(0.0, 1.0)
}

/// Shrink a vector toward zero by `amount` without overshooting.
#[inline]
pub fn approach_zero(v: Vec2, amount: f32) -> Vec2 {
    v - v.normalize_or_zero() * amount.min(v.length())
}
