//! Save/load persistence
//!
//! Saves are the full `GameState` in a versioned JSON envelope. A version
//! bump invalidates older saves rather than guessing at a migration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::GameState;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveEnvelope<S> {
    pub version: u32,
    pub state: S,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

pub fn save_to_string(state: &GameState) -> Result<String, PersistError> {
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        state,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Restore a state saved by `save_to_string`
pub fn load_from_str(json: &str) -> Result<GameState, PersistError> {
    // Check the version before trying to make sense of the body
    let probe: VersionProbe = serde_json::from_str(json)?;
    if probe.version != SAVE_VERSION {
        log::warn!("Rejecting save with version {}", probe.version);
        return Err(PersistError::Version {
            found: probe.version,
            expected: SAVE_VERSION,
        });
    }

    let envelope: SaveEnvelope<GameState> = serde_json::from_str(json)?;
    let mut state = envelope.state;
    state.normalize_order();
    log::info!("Loaded save at tick {}", state.time_ticks);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::sim::{tick, EntityKind, TickInput};
    use glam::Vec2;

    fn sample_state() -> GameState {
        GameState::from_ascii(3, &["######", "#PTaE#", "######"], Tuning::default()).unwrap()
    }

    #[test]
    fn test_save_restores_and_continues() {
        let mut original = sample_state();
        let input = TickInput {
            move_dir: Vec2::new(1.0, 0.5),
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut original, &input, crate::consts::TICK_LENGTH);
        }

        let json = save_to_string(&original).unwrap();
        let mut restored = load_from_str(&json).unwrap();
        assert_eq!(restored.time_ticks, 30);
        assert_eq!(restored.player.pos(), original.player.pos());
        assert!(restored
            .entities
            .iter()
            .any(|e| matches!(e.kind, EntityKind::Tree { .. })));

        // Both continue identically, scratch buffers included
        for _ in 0..30 {
            tick(&mut original, &input, crate::consts::TICK_LENGTH);
            tick(&mut restored, &input, crate::consts::TICK_LENGTH);
        }
        assert_eq!(
            serde_json::to_string(&original).unwrap(),
            serde_json::to_string(&restored).unwrap()
        );
    }

    #[test]
    fn test_wrong_version_rejected() {
        let json = save_to_string(&sample_state()).unwrap();
        let bumped = json.replacen("\"version\":1", "\"version\":99", 1);
        assert!(matches!(
            load_from_str(&bumped),
            Err(PersistError::Version { found: 99, expected: SAVE_VERSION })
        ));
    }

    #[test]
    fn test_corrupt_tile_layer_rejected() {
        let json = save_to_string(&sample_state()).unwrap();
        let mut save: serde_json::Value = serde_json::from_str(&json).unwrap();

        let mut short = save.clone();
        short["state"]["layer"]["tiles"] = serde_json::json!([8, 8]);
        assert!(matches!(
            load_from_str(&short.to_string()),
            Err(PersistError::Json(_))
        ));

        save["state"]["layer"]["tile_size"] = serde_json::json!(0.0);
        assert!(matches!(
            load_from_str(&save.to_string()),
            Err(PersistError::Json(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(load_from_str("not json"), Err(PersistError::Json(_))));
    }
}
