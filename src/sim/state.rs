//! Game state and core simulation types
//!
//! All state that must be persisted for saves/determinism lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Body;
use super::tilemap::{LevelError, SolidTable, TileLayer};
use super::volumes::{CollisionGeometry, Obstacle};
use crate::consts::*;
use crate::settings::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Health dropped below zero; the world keeps running without input
    Dead,
    /// Escaped on the boat
    Won,
}

/// What an entity is, with the fields only that kind needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Wood,
    /// Seconds of light left
    Torch { fuel: f32 },
    Axe,
    /// Seconds of burn left; unlit fires keep their fuel
    Fire { fuel: f32, lit: bool },
    Tree { wood_left: u32 },
    Battery,
    /// The burning plane wreck; never goes out
    FireSource,
    Boat,
}

impl EntityKind {
    /// Whether the player can carry this
    pub fn is_holdable(&self) -> bool {
        matches!(
            self,
            EntityKind::Wood | EntityKind::Torch { .. } | EntityKind::Axe | EntityKind::Battery
        )
    }

    /// Same variant, ignoring fields
    #[inline]
    pub fn same_kind(&self, other: &EntityKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Radius wraiths keep away from, if this gives off light
    pub fn light_radius(&self) -> Option<f32> {
        match *self {
            EntityKind::Torch { fuel } => Some(TORCH_RADIUS * (fuel / TORCH_LIFETIME).sqrt()),
            EntityKind::Fire { fuel, lit } => Some(if lit {
                (FIRE_RADIUS * (fuel / FIRE_TOTAL_TIME).sqrt() * 0.8 + 10.0).max(1.0)
            } else {
                1.0
            }),
            EntityKind::FireSource => Some(FIRE_RADIUS),
            _ => None,
        }
    }

    /// Collision box for kinds that block movement
    pub fn obstacle(&self, pos: Vec2) -> Option<Obstacle> {
        match self {
            EntityKind::Tree { .. } => Some(Obstacle::new(pos, Vec2::splat(2.0), 3.0)),
            EntityKind::FireSource => Some(Obstacle::new(
                pos - Vec2::new(0.0, 6.0),
                Vec2::new(22.0, 2.0),
                4.0,
            )),
            _ => None,
        }
    }
}

/// An item or fixture in the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    #[serde(default)]
    pub animation_timer: f32,
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// Push from wraith hits, decays separately from walking
    pub knockback: Vec2,
    pub held: Option<Entity>,
    /// Unit vector toward the cursor
    pub facing: Vec2,
    /// Interaction is locked out while positive
    pub retrigger_timer: f32,
    #[serde(default)]
    pub animation_timer: f32,
}

impl Player {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            body: Body::new(pos, radius),
            knockback: Vec2::ZERO,
            held: None,
            facing: Vec2::X,
            retrigger_timer: 0.0,
            animation_timer: 0.0,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn held_kind(&self) -> Option<&EntityKind> {
        self.held.as_ref().map(|e| &e.kind)
    }
}

/// A wraith
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub body: Body,
    pub attack_cooldown: f32,
    /// Within aggro distance this tick
    pub aggroed: bool,
    pub ever_aggroed: bool,
    #[serde(default)]
    pub animation_timer: f32,
}

/// A claw swipe effect, kept until its animation ends
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attack {
    pub pos: Vec2,
    pub dir: Vec2,
    pub timer: f32,
}

/// Notable outcomes of a tick, for audio/UI to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    FireLit { id: u32 },
    FireFed { id: u32 },
    FireOut { id: u32 },
    TorchRefueled,
    TreeChopped { tree: u32, wood: u32 },
    TreeFelled { tree: u32 },
    PickedUp { id: u32 },
    Dropped { id: u32 },
    BoatReady,
    EnemyAggroed { id: u32 },
    PlayerHurt { enemy: u32 },
    PlayerDied,
    Escaped,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    /// Values drawn so far
    pub draws: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        rng.advance(self.draws);
        rng
    }

    /// Uniform value in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        let value = self.to_rng().random::<f32>();
        self.draws += 1;
        value
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub tuning: Tuning,
    pub layer: TileLayer,
    pub solids: SolidTable,
    pub player: Player,
    /// Loose items and fixtures (sorted by id for determinism)
    pub entities: Vec<Entity>,
    /// Wraiths (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    pub attacks: Vec<Attack>,
    /// Player health in [0, 1]; below 0 is death
    pub health: f32,
    /// Hurt flash, 1 on a hit fading to 0
    pub damage_timer: f32,
    /// Shared cooldown so wraiths can't all hit at once
    pub global_attack_cooldown: f32,
    pub boat_ready: bool,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds since the end (death or escape)
    pub game_over_timer: f32,
    /// Next entity ID
    next_id: u32,
    /// Per-body collision scratch, rebuilt every query
    #[serde(skip)]
    pub(crate) geometry: CollisionGeometry,
    /// Blocking entities gathered for this tick
    #[serde(skip)]
    pub(crate) obstacles: Vec<Obstacle>,
}

impl GameState {
    /// Create a new game state on a level with the player at `player_pos`
    pub fn new(seed: u64, layer: TileLayer, player_pos: Vec2, tuning: Tuning) -> Self {
        let player = Player::new(player_pos, tuning.body_radius);
        Self {
            seed,
            rng_state: RngState::new(seed),
            tuning,
            layer,
            solids: SolidTable::default(),
            player,
            entities: Vec::new(),
            enemies: Vec::new(),
            attacks: Vec::new(),
            health: 1.0,
            damage_timer: 0.0,
            global_attack_cooldown: 0.0,
            boat_ready: false,
            phase: GamePhase::Playing,
            time_ticks: 0,
            game_over_timer: 0.0,
            next_id: 1,
            geometry: CollisionGeometry::new(),
            obstacles: Vec::new(),
        }
    }

    /// Build a level from ASCII rows.
    ///
    /// Tiles: `#` water, `.` ground. Spawns, each on ground at the cell
    /// center: `P` player, `E` wraith, `T` tree, `w` wood, `t` torch,
    /// `a` axe, `b` battery, `B` boat, `F` burning wreck, `f` unlit fire.
    pub fn from_ascii(seed: u64, rows: &[&str], tuning: Tuning) -> Result<Self, LevelError> {
        let mut tiles = Vec::with_capacity(rows.len());
        let mut spawns = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let mut line = String::with_capacity(row.len());
            for (x, glyph) in row.chars().enumerate() {
                match glyph {
                    '#' | '.' => line.push(glyph),
                    _ => {
                        spawns.push((glyph, x, y));
                        line.push('.');
                    }
                }
            }
            tiles.push(line);
        }
        let tile_rows: Vec<&str> = tiles.iter().map(String::as_str).collect();
        let layer = TileLayer::from_ascii(&tile_rows)?;

        let center = |x: usize, y: usize| layer.cell_center(x as i32, y as i32);
        let player_pos = spawns
            .iter()
            .find(|(glyph, _, _)| *glyph == 'P')
            .map(|&(_, x, y)| center(x, y))
            .ok_or(LevelError::MissingPlayer)?;

        let mut state = Self::new(seed, layer, player_pos, tuning);
        for (glyph, x, y) in spawns {
            let pos = state.layer.cell_center(x as i32, y as i32);
            let kind = match glyph {
                'P' => continue,
                'E' => {
                    state.spawn_enemy(pos);
                    continue;
                }
                'T' => EntityKind::Tree {
                    wood_left: TREE_HITS,
                },
                'w' => EntityKind::Wood,
                't' => EntityKind::Torch {
                    fuel: TORCH_LIFETIME,
                },
                'a' => EntityKind::Axe,
                'b' => EntityKind::Battery,
                'B' => EntityKind::Boat,
                'F' => EntityKind::FireSource,
                'f' => EntityKind::Fire {
                    fuel: 0.0,
                    lit: false,
                },
                _ => {
                    return Err(LevelError::UnknownGlyph {
                        glyph,
                        row: y,
                        column: x,
                    });
                }
            };
            state.spawn_entity(kind, pos);
        }

        log::info!(
            "Level {}x{} loaded: {} entities, {} wraiths",
            state.layer.width,
            state.layer.height,
            state.entities.len(),
            state.enemies.len()
        );
        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_entity(&mut self, kind: EntityKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            kind,
            pos,
            animation_timer: 0.0,
        });
        id
    }

    pub fn spawn_enemy(&mut self, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy {
            id,
            body: Body::new(pos, self.tuning.body_radius),
            attack_cooldown: 0.0,
            aggroed: false,
            ever_aggroed: false,
            animation_timer: 0.0,
        });
        id
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Rebuild the blocking-entity list from the current entities
    pub fn collect_obstacles(&mut self) {
        self.obstacles.clear();
        self.obstacles
            .extend(self.entities.iter().filter_map(|e| e.kind.obstacle(e.pos)));
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
        self.enemies.sort_by_key(|e| e.id);
    }
}
