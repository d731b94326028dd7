//! Game settings and tuning
//!
//! Loaded from a JSON file next to the binary. Missing fields take their
//! defaults, so old files keep working as knobs are added.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::state::EntityKind;

/// Gameplay knobs that feed the simulation.
///
/// A copy lives in `GameState`, so a save replays with the tuning it was
/// played with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Bounce for walking bodies: -1 keeps motion, 0 slides, 1 reflects
    pub bounce: f32,
    /// Collider radius for the player and wraiths
    pub body_radius: f32,

    // === Player ===
    pub speed_empty_handed: f32,
    pub speed_with_battery: f32,
    pub speed_with_torch: f32,
    pub speed_with_other: f32,
    pub player_accel: f32,

    // === Wraiths ===
    pub enemy_speed: f32,
    pub enemy_accel: f32,
    pub aggro_distance: f32,
    pub attack_damage: f32,

    /// Log bodies that end a tick closer to a wall than their radius
    pub clearance_checks: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bounce: WALK_BOUNCE,
            body_radius: BODY_RADIUS,

            speed_empty_handed: 70.0,
            speed_with_battery: 25.0,
            speed_with_torch: 50.0,
            speed_with_other: 40.0,
            player_accel: PLAYER_ACCEL,

            enemy_speed: ENEMY_SPEED,
            enemy_accel: ENEMY_ACCEL,
            aggro_distance: ENEMY_AGGRO_DISTANCE,
            attack_damage: ATTACK_DAMAGE,

            clearance_checks: false,
        }
    }
}

impl Tuning {
    /// Top walking speed for whatever the player is carrying
    pub fn player_speed(&self, held: Option<&EntityKind>) -> f32 {
        match held {
            None => self.speed_empty_handed,
            Some(EntityKind::Battery) => self.speed_with_battery,
            Some(EntityKind::Torch { .. }) => self.speed_with_torch,
            Some(_) => self.speed_with_other,
        }
    }
}

/// Runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed for new runs
    pub seed: u64,
    /// Fixed tick length in seconds
    pub tick_length: f32,
    /// Cap on ticks run for one frame
    pub max_ticks_per_frame: u32,
    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            tick_length: TICK_LENGTH,
            max_ticks_per_frame: MAX_TICKS_PER_FRAME,
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                log::info!("Using default settings");
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings {}: {}", path.display(), e);
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
