//! Wraithwood entry point
//!
//! Runs a headless session on a built-in island: a simple autopilot walks
//! the player between things it can use while the log reports what
//! happens. Usage: `wraithwood [settings.json] [frames]`.

use glam::Vec2;

use wraithwood::Settings;
use wraithwood::persistence;
use wraithwood::sim::{FrameClock, GameEvent, GamePhase, GameState, TickInput, can_interact};

const ISLAND: &[&str] = &[
    "####################",
    "#...T....##....T...#",
    "#.P..a...##..E.....#",
    "#..t....T.....w....#",
    "#....##......F.....#",
    "#..T.##...b......E.#",
    "#.........T....B...#",
    "####################",
];

/// Frame length the demo pretends to render at
const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 3600;

struct Game {
    state: GameState,
    clock: FrameClock,
    input: TickInput,
}

impl Game {
    fn new(settings: &Settings) -> Result<Self, wraithwood::sim::LevelError> {
        let state = GameState::from_ascii(settings.seed, ISLAND, settings.tuning.clone())?;
        Ok(Self {
            state,
            clock: FrameClock::from_settings(settings),
            input: TickInput::default(),
        })
    }

    /// Head for the nearest thing the player can use, and use it on arrival
    fn autopilot(&mut self) {
        let pos = self.state.player.pos();
        let held = self.state.player.held_kind();
        let target = self
            .state
            .entities
            .iter()
            .filter(|e| can_interact(held, &e.kind, self.state.boat_ready))
            .map(|e| e.pos)
            .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)));

        match target {
            Some(target) => {
                let to_target = target - pos;
                self.input.facing = to_target;
                self.input.move_dir = to_target;
                self.input.interact = to_target.length() < 14.0;
            }
            None => {
                self.input.move_dir = Vec2::ZERO;
                self.input.drop = self.state.player.held.is_some();
            }
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        self.autopilot();
        self.clock.advance(&mut self.state, &mut self.input, dt).events
    }
}

fn main() {
    env_logger::init();
    log::info!("Wraithwood (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_from(path),
        None => Settings::default(),
    };
    let frames = args
        .next()
        .and_then(|f| f.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    let mut game = match Game::new(&settings) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Could not build level: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Game initialized with seed: {}", settings.seed);

    for frame in 0..frames {
        for event in game.update(FRAME_DT) {
            log::info!("[frame {}] {:?}", frame, event);
        }
        if game.state.phase != GamePhase::Playing && game.state.game_over_timer > 2.0 {
            break;
        }
    }

    log::info!(
        "Finished after {} ticks: {:?}, health {:.2}, {} entities, {} wraiths",
        game.state.time_ticks,
        game.state.phase,
        game.state.health,
        game.state.entities.len(),
        game.state.enemies.len()
    );

    match persistence::save_to_string(&game.state) {
        Ok(json) => log::info!("Final state serializes to {} bytes", json.len()),
        Err(e) => log::warn!("Could not save final state: {}", e),
    }
}
