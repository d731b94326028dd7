//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{resolve, Body, CollisionWorld};
use super::sdf::{clearance, sdf_gradient};
use super::state::{Attack, Entity, EntityKind, GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::settings::Settings;
use crate::{approach_zero, repulsion};

/// How far ahead of the player it reaches for things
const REACH_DISTANCE: f32 = 10.0;
/// Reach is measured from the chest, not the feet
const REACH_LIFT: Vec2 = Vec2::new(0.0, 8.0);
const INTERACT_RANGE: f32 = 20.0;
/// Distance of the held item from the player
const HELD_DISTANCE: f32 = 12.0;
/// How far chopped wood lands from the tree
const CHOP_SCATTER: f32 = 10.0;
/// Wraiths stand still this long after striking
const ATTACK_RECOVERY: f32 = 0.666;
/// Speed at which crowded bodies shove apart
const CROWD_PUSH_SPEED: f32 = 60.0;
/// Slack for the clearance diagnostic
const CLEARANCE_TOLERANCE: f32 = 0.1;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    /// Walk direction; any length, zero to stand still
    pub move_dir: Vec2,
    /// Direction from the player toward the cursor
    pub facing: Vec2,
    /// Use or pick up what's in reach (one-shot)
    pub interact: bool,
    /// Put down the held item (one-shot)
    pub drop: bool,
}

impl TickInput {
    /// Reset inputs that should only fire once
    pub fn clear_one_shots(&mut self) {
        self.interact = false;
        self.drop = false;
    }
}

/// What happened during a tick
#[derive(Debug, Clone, Default)]
pub struct TickOutput {
    pub events: Vec<GameEvent>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> TickOutput {
    let mut out = TickOutput::default();

    // Nothing moves once the boat has left
    if state.phase == GamePhase::Won {
        state.game_over_timer += dt;
        return out;
    }
    let alive = state.phase == GamePhase::Playing;

    advance_animations(state, dt);

    let facing = input.facing.normalize_or_zero();
    if facing != Vec2::ZERO {
        state.player.facing = facing;
    }

    if alive {
        if input.interact && state.player.retrigger_timer <= 0.0 {
            interact(state, &mut out);
        }
        if input.drop {
            drop_held(state, &mut out);
        }
    }

    state.collect_obstacles();
    let move_dir = if alive { input.move_dir } else { Vec2::ZERO };
    move_player(state, move_dir, dt);
    steer_enemies(state, dt);
    move_enemies(state, dt, &mut out);
    enemy_attacks(state, dt, &mut out);
    update_entities(state, dt, &mut out);
    update_health(state, dt, &mut out);

    state.normalize_order();
    state.time_ticks += 1;
    out
}

fn advance_animations(state: &mut GameState, dt: f32) {
    for e in &mut state.entities {
        e.animation_timer += dt;
    }
    for e in &mut state.enemies {
        e.animation_timer += dt;
    }
    if let Some(held) = &mut state.player.held {
        held.animation_timer += dt;
    }
}

/// Whether the player holding `held` can do anything with `target`
pub fn can_interact(held: Option<&EntityKind>, target: &EntityKind, boat_ready: bool) -> bool {
    use EntityKind::*;

    match (held, target) {
        (Some(Torch { fuel }), Wood) => *fuel > 0.0,
        (Some(Torch { .. }), Fire { .. }) => true,
        (Some(Wood), Fire { .. }) => true,
        (Some(Axe), Tree { .. }) => true,
        (Some(Torch { .. }), FireSource) => true,
        (Some(Battery), Boat) => true,
        (None, Boat) => boat_ready,
        // Logs get in the way of chopping
        (Some(Axe), Wood) => false,
        (Some(h), t) if h.same_kind(t) => false,
        (_, t) => t.is_holdable(),
    }
}

/// Index of the closest entity the player can interact with around `reach`.
///
/// The boat and the wreck are big, so they count at half distance.
fn nearest_interactable(state: &GameState, reach: Vec2) -> Option<usize> {
    let held = state.player.held_kind();
    let mut nearest = None;
    let mut best = INTERACT_RANGE;

    for (i, e) in state.entities.iter().enumerate() {
        let mut d = reach.distance(e.pos);
        if matches!(e.kind, EntityKind::Boat | EntityKind::FireSource) {
            d *= 0.5;
        }
        if d < best && can_interact(held, &e.kind, state.boat_ready) {
            nearest = Some(i);
            best = d;
        }
    }

    nearest
}

fn interact(state: &mut GameState, out: &mut TickOutput) {
    let reach = state.player.pos() + state.player.facing * REACH_DISTANCE - REACH_LIFT;
    let Some(index) = nearest_interactable(state, reach) else {
        return;
    };
    let held = state.player.held_kind().copied();
    let target_id = state.entities[index].id;
    let target = state.entities[index].kind;

    match (held, target) {
        (Some(EntityKind::Torch { fuel }), EntityKind::Wood) => {
            if fuel > 0.0 {
                state.entities[index].kind = EntityKind::Fire {
                    fuel: FIRE_LOG_TIME,
                    lit: true,
                };
                out.events.push(GameEvent::FireLit { id: target_id });
            }
        }
        (Some(EntityKind::Torch { fuel }), EntityKind::Fire { fuel: fire_fuel, lit }) => {
            if !lit && fire_fuel > 0.0 && fuel > 0.0 {
                state.entities[index].kind = EntityKind::Fire {
                    fuel: fire_fuel,
                    lit: true,
                };
                out.events.push(GameEvent::FireLit { id: target_id });
            } else if lit {
                refuel_torch(state, out);
            }
        }
        (Some(EntityKind::Wood), EntityKind::Fire { fuel, lit }) => {
            if fuel < FIRE_LOG_TIME * 4.0 {
                state.entities[index].kind = EntityKind::Fire {
                    fuel: fuel + FIRE_LOG_TIME,
                    lit,
                };
                state.player.held = None;
                out.events.push(GameEvent::FireFed { id: target_id });
            }
        }
        (Some(EntityKind::Axe), EntityKind::Tree { .. }) => chop(state, index, out),
        (Some(EntityKind::Battery), EntityKind::Boat) => {
            state.boat_ready = true;
            state.player.held = None;
            out.events.push(GameEvent::BoatReady);
        }
        (None, EntityKind::Boat) => {
            if state.boat_ready {
                state.phase = GamePhase::Won;
                out.events.push(GameEvent::Escaped);
                log::info!("Escaped after {} ticks", state.time_ticks);
            }
        }
        (Some(EntityKind::Torch { .. }), EntityKind::FireSource) => refuel_torch(state, out),
        (Some(h), t) if h.same_kind(&t) => {}
        (_, t) if t.is_holdable() => pick_up(state, index, out),
        _ => {}
    }
}

fn refuel_torch(state: &mut GameState, out: &mut TickOutput) {
    if let Some(Entity {
        kind: EntityKind::Torch { fuel },
        ..
    }) = &mut state.player.held
    {
        *fuel = TORCH_LIFETIME;
        out.events.push(GameEvent::TorchRefueled);
    }
}

fn chop(state: &mut GameState, index: usize, out: &mut TickOutput) {
    let angle = state.rng_state.next_f32() * std::f32::consts::TAU;
    let tree_id = state.entities[index].id;
    let wood_pos = state.entities[index].pos + Vec2::from_angle(angle) * CHOP_SCATTER;
    let wood = state.spawn_entity(EntityKind::Wood, wood_pos);
    out.events.push(GameEvent::TreeChopped {
        tree: tree_id,
        wood,
    });

    let felled = match &mut state.entities[index].kind {
        EntityKind::Tree { wood_left } => {
            *wood_left = wood_left.saturating_sub(1);
            *wood_left == 0
        }
        _ => false,
    };
    if felled {
        state.entities.remove(index);
        out.events.push(GameEvent::TreeFelled { tree: tree_id });
    }
}

fn pick_up(state: &mut GameState, index: usize, out: &mut TickOutput) {
    // The pushed item lands after `index`, so it stays valid
    if let Some(held) = state.player.held.take() {
        put_down(state, held, out);
    }
    let target = state.entities.remove(index);
    out.events.push(GameEvent::PickedUp { id: target.id });
    state.player.held = Some(target);
}

fn drop_held(state: &mut GameState, out: &mut TickOutput) {
    if let Some(held) = state.player.held.take() {
        put_down(state, held, out);
    }
}

/// Leave an item where the player was holding it
fn put_down(state: &mut GameState, item: Entity, out: &mut TickOutput) {
    let mut lockout = SPRINT_RETRIGGER_TIME;
    if item.kind == EntityKind::Battery {
        lockout *= 8.0;
    }
    state.player.retrigger_timer = lockout;
    out.events.push(GameEvent::Dropped { id: item.id });
    state.entities.push(item);
}

fn move_player(state: &mut GameState, move_dir: Vec2, dt: f32) {
    let speed = state.tuning.player_speed(state.player.held_kind());
    let accel = state.tuning.player_accel;
    let bounce = state.tuning.bounce;

    let player = &mut state.player;
    player.retrigger_timer -= dt;
    player.animation_timer += dt * speed / 40.0;

    let mut vel = player.body.vel;
    vel += move_dir.normalize_or_zero() * accel * dt;
    vel -= vel * PLAYER_DRAG * dt;
    vel = approach_zero(vel, PLAYER_FRICTION * dt);
    player.body.vel = vel.clamp_length_max(speed);

    player.knockback -= player.knockback * PLAYER_DRAG * dt;
    player.knockback = approach_zero(player.knockback, PLAYER_FRICTION * dt);

    let displacement = (player.body.vel + player.knockback) * dt;
    let world = CollisionWorld::new(&state.layer, &state.solids, &state.obstacles);
    resolve(
        &world,
        &mut state.geometry,
        &mut state.player.body,
        displacement,
        dt,
        bounce,
        None,
    );
    if state.tuning.clearance_checks {
        check_clearance(&world, &state.player.body, 0);
    }

    if state.player.body.vel.length() < 10.0 {
        state.player.animation_timer = 0.0;
    }
    let held_pos = state.player.pos() + state.player.facing * HELD_DISTANCE;
    if let Some(held) = &mut state.player.held {
        held.pos = held_pos;
    }
}

/// Log bodies that ended up closer to solid ground than their radius
fn check_clearance(world: &CollisionWorld, body: &Body, id: u32) {
    let reach = body.radius + 1.0;
    let distance = clearance(world, body.pos, reach);
    if distance < body.radius - CLEARANCE_TOLERANCE {
        let escape = sdf_gradient(body.pos, |p| clearance(world, p, reach));
        log::debug!(
            "Body {} at {:?} is {:.3} from solid (radius {}), way out {:?}",
            id,
            body.pos,
            distance,
            body.radius,
            escape
        );
    }
}

/// Update wraith velocities: chase the player, avoid each other and light
fn steer_enemies(state: &mut GameState, dt: f32) {
    let player_pos = state.player.pos();
    let accel = state.tuning.enemy_accel;
    let max_speed = state.tuning.enemy_speed;
    let lights: Vec<(Vec2, f32)> = state
        .entities
        .iter()
        .chain(state.player.held.iter())
        .filter_map(|e| e.kind.light_radius().map(|r| (e.pos, r)))
        .collect();

    for i in 0..state.enemies.len() {
        let mut pos = state.enemies[i].body.pos;
        let mut desired = (player_pos - pos).normalize_or_zero() * 20.0;

        for j in 0..state.enemies.len() {
            let other = state.enemies[j].body.pos;
            if j == i || other == pos {
                continue;
            }
            let push = repulsion(pos.distance(other), 15.0, 20.0);
            pos += (pos - other).normalize_or_zero() * push * CROWD_PUSH_SPEED * dt;
        }

        for &(light, radius) in &lights {
            let dist = pos.distance(light);
            if dist > 0.0 && radius > 0.0 {
                let push = repulsion(dist, radius * 0.875, radius * 1.125);
                desired += (pos - light).normalize_or_zero() * push * 1000.0;
            }
        }

        let enemy = &mut state.enemies[i];
        enemy.body.pos = pos;
        enemy.body.vel += desired.normalize_or_zero() * accel * dt;
        enemy.body.vel = enemy.body.vel.clamp_length_max(max_speed);
    }
}

/// Sweep aggroed wraiths through the world
fn move_enemies(state: &mut GameState, dt: f32, out: &mut TickOutput) {
    let player_pos = state.player.pos();
    let aggro_distance = state.tuning.aggro_distance;
    let bounce = state.tuning.bounce;
    let checks = state.tuning.clearance_checks;
    let world = CollisionWorld::new(&state.layer, &state.solids, &state.obstacles);

    for enemy in &mut state.enemies {
        if enemy.body.pos.distance(player_pos) > aggro_distance {
            enemy.aggroed = false;
            continue;
        }
        enemy.aggroed = true;
        if enemy.attack_cooldown > ATTACK_COOLDOWN - ATTACK_RECOVERY {
            continue;
        }
        if !enemy.ever_aggroed {
            enemy.ever_aggroed = true;
            out.events.push(GameEvent::EnemyAggroed { id: enemy.id });
        }

        let displacement = enemy.body.vel * dt;
        resolve(
            &world,
            &mut state.geometry,
            &mut enemy.body,
            displacement,
            dt,
            bounce,
            None,
        );
        if checks {
            check_clearance(&world, &enemy.body, enemy.id);
        }
    }
}

fn enemy_attacks(state: &mut GameState, dt: f32, out: &mut TickOutput) {
    let damage = state.tuning.attack_damage;

    for enemy in &mut state.enemies {
        let to_player = state.player.body.pos - enemy.body.pos;
        if state.global_attack_cooldown == 0.0
            && enemy.attack_cooldown == 0.0
            && to_player.length() < ENEMY_ATTACK_RANGE
        {
            state.health -= damage;
            state.damage_timer = 1.0;
            enemy.attack_cooldown = ATTACK_COOLDOWN;
            state.global_attack_cooldown = GLOBAL_ATTACK_COOLDOWN;

            let dir = to_player.normalize_or_zero();
            state.attacks.push(Attack {
                pos: enemy.body.pos,
                dir,
                timer: 0.0,
            });
            state.player.knockback += dir * ATTACK_KNOCKBACK;
            out.events.push(GameEvent::PlayerHurt { enemy: enemy.id });
        }
        enemy.attack_cooldown = (enemy.attack_cooldown - dt).max(0.0);
    }
    state.global_attack_cooldown = (state.global_attack_cooldown - dt).max(0.0);

    for attack in &mut state.attacks {
        attack.timer += dt;
    }
    state.attacks.retain(|a| a.timer <= ATTACK_EFFECT_TIME);
}

/// Burn down torches and fires; loose wood and torches shuffle apart
fn update_entities(state: &mut GameState, dt: f32, out: &mut TickOutput) {
    for i in 0..state.entities.len() {
        let entity = &mut state.entities[i];
        match &mut entity.kind {
            EntityKind::Torch { fuel } => *fuel = (*fuel - dt).max(0.0),
            EntityKind::Fire { fuel, lit } => {
                if *lit {
                    *fuel = (*fuel - dt).max(0.0);
                    if *fuel == 0.0 {
                        *lit = false;
                        out.events.push(GameEvent::FireOut { id: entity.id });
                    }
                }
            }
            _ => {}
        }

        if !matches!(entity.kind, EntityKind::Wood | EntityKind::Torch { .. }) {
            continue;
        }
        let mut pos = entity.pos;
        for (j, other) in state.entities.iter().enumerate() {
            if j == i || other.pos == pos {
                continue;
            }
            let (inner, outer) = match other.kind {
                EntityKind::FireSource => (15.0, 20.0),
                _ => (10.0, 15.0),
            };
            let push = repulsion(pos.distance(other.pos), inner, outer);
            pos += (pos - other.pos).normalize_or_zero() * push * CROWD_PUSH_SPEED * dt;
        }
        state.entities[i].pos = pos;
    }

    if let Some(Entity {
        kind: EntityKind::Torch { fuel },
        ..
    }) = &mut state.player.held
    {
        *fuel = (*fuel - dt).max(0.0);
    }
}

fn update_health(state: &mut GameState, dt: f32, out: &mut TickOutput) {
    state.health = (state.health + HEALTH_REGEN * dt).min(1.0);
    state.damage_timer = (state.damage_timer - dt / 0.25).max(0.0);

    if state.health < 0.0 && state.phase == GamePhase::Playing {
        state.phase = GamePhase::Dead;
        out.events.push(GameEvent::PlayerDied);
        log::info!("Player died after {} ticks", state.time_ticks);
    }
    if state.phase != GamePhase::Playing {
        state.game_over_timer += dt;
    }
}

/// Ticks run for one rendered frame
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub ticks: u32,
    pub events: Vec<GameEvent>,
}

/// Turns variable frame times into fixed ticks
#[derive(Debug, Clone)]
pub struct FrameClock {
    accumulator: f32,
    tick_length: f32,
    max_ticks: u32,
}

impl FrameClock {
    pub fn new(tick_length: f32, max_ticks: u32) -> Self {
        Self {
            accumulator: 0.0,
            tick_length,
            max_ticks,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.tick_length, settings.max_ticks_per_frame)
    }

    /// Unsimulated time carried into the next frame
    pub fn backlog(&self) -> f32 {
        self.accumulator
    }

    /// Run as many whole ticks as `frame_dt` covers, up to the cap.
    ///
    /// One-shot inputs are consumed by the first tick that runs.
    pub fn advance(
        &mut self,
        state: &mut GameState,
        input: &mut TickInput,
        frame_dt: f32,
    ) -> FrameOutput {
        if frame_dt.is_finite() {
            self.accumulator += frame_dt.max(0.0);
        }

        let mut output = FrameOutput::default();
        while self.accumulator > self.tick_length && output.ticks < self.max_ticks {
            self.accumulator -= self.tick_length;
            let result = tick(state, input, self.tick_length);
            output.events.extend(result.events);
            output.ticks += 1;
            input.clear_one_shots();
        }
        output
    }
}
