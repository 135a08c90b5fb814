//! World state and spawn helpers
//!
//! Entity tables are ordered maps keyed by id so every pass over them runs
//! in the same order for a given seed.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::Shape;
use super::combat::Detonation;
use super::entity::{
    Enemy, EnemyVariant, EntityId, Faction, Placeable, PlaceableKind, Player, Projectile,
    ProjectileKind,
};
use super::physics::{Body, CollisionType, PhysicsWorld};
use super::room::Room;
use super::shop::{ItemKind, Shop};
use super::wave::{WaveDirector, WavePhase};
use super::weapon::{Shot, WeaponKind};
use crate::consts::*;
use crate::{ActionError, DEGENERATE_LENGTH, cell_center, grid_index, safe_normalize};

/// Something the host may want to react to (sound, UI, logs)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WeaponFired { weapon: WeaponKind },
    Placed { kind: PlaceableKind, cell: (i32, i32) },
    EnemyFired { variant: EnemyVariant },
    PlayerHit { damage: f32 },
    EnemyKilled { variant: EnemyVariant, bounty: u32 },
    Explosion { pos: Vec2, radius: f32 },
    WaveStarted(u32),
    WaveCleared { wave: u32, award: u32 },
    Purchased(ItemKind),
    PurchaseFailed(ActionError),
    Refreshed,
    GameOver,
    GameWon,
}

/// Work deferred until the physics step has finished
#[derive(Debug, Clone, Default)]
pub struct Pending {
    deletions: BTreeSet<EntityId>,
    pub detonations: VecDeque<Detonation>,
    /// Projectiles and explosives already used up this tick
    spent: HashSet<EntityId>,
}

impl Pending {
    /// Flag an entity for reaping; repeated flags collapse into one
    pub fn delete(&mut self, id: EntityId) -> bool {
        self.deletions.insert(id)
    }

    /// Mark as used up; false if it already was
    pub fn spend(&mut self, id: EntityId) -> bool {
        self.spent.insert(id)
    }

    pub fn is_spent(&self, id: EntityId) -> bool {
        self.spent.contains(&id)
    }

    /// Queue a blast; each origin detonates at most once
    pub fn detonate(&mut self, blast: Detonation) {
        if self.spend(blast.origin) {
            self.delete(blast.origin);
            self.detonations.push_back(blast);
        }
    }

    fn take_deletions(&mut self) -> BTreeSet<EntityId> {
        self.spent.clear();
        std::mem::take(&mut self.deletions)
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub room: Room,
    pub physics: PhysicsWorld,
    pub player: Player,
    pub enemies: BTreeMap<EntityId, Enemy>,
    pub projectiles: BTreeMap<EntityId, Projectile>,
    pub placeables: BTreeMap<EntityId, Placeable>,
    pub wave: WaveDirector,
    pub shop: Shop,
    pub pending: Pending,
    /// Events produced since the host last drained them
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self::with_room(seed, Room::default())
    }

    /// A fresh run in `room` with the player at its center
    pub fn with_room(seed: u64, room: Room) -> Self {
        let mut physics = PhysicsWorld::new(WORLD_DAMPING);
        use CollisionType as T;
        for (a, b) in [
            (T::Player, T::Wall),
            (T::Player, T::Enemy),
            (T::Enemy, T::Wall),
            (T::Enemy, T::Enemy),
            (T::Bullet, T::Wall),
            (T::Bullet, T::Enemy),
            (T::Bullet, T::Player),
            (T::Bullet, T::Placeable),
            (T::Enemy, T::Placeable),
        ] {
            physics.add_route(a, b);
        }
        for other in [T::Player, T::Wall, T::Enemy, T::Bullet, T::Placeable, T::Explosion] {
            physics.add_route(T::Explosion, other);
        }

        let half = Vec2::splat(room.cell / 2.0);
        for wall in &room.walls {
            physics.insert(Body::fixed(Shape::Box { half }, T::Wall).at(wall.pos));
        }

        let player_id = EntityId(1);
        let body = physics.insert(
            Body::dynamic(Shape::Circle { radius: PLAYER_RADIUS }, PLAYER_MASS, T::Player)
                .at(room.center())
                .with_damping(PLAYER_DAMPING)
                .with_max_velocity(PLAYER_MAX_VELOCITY)
                .owned_by(player_id),
        );
        let mut player = Player::new(player_id, body);
        player.aim = room.center() + Vec2::X;

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            room,
            physics,
            player,
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            placeables: BTreeMap::new(),
            wave: WaveDirector::new(),
            shop: Shop::new(),
            pending: Pending::default(),
            events: Vec::new(),
            next_id: 2,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn player_pos(&self) -> Vec2 {
        self.physics
            .position(self.player.body)
            .unwrap_or_else(|| self.room.center())
    }

    pub fn entity_pos(&self, id: EntityId) -> Option<Vec2> {
        let body = if let Some(e) = self.enemies.get(&id) {
            e.body
        } else if let Some(p) = self.projectiles.get(&id) {
            p.body
        } else if let Some(p) = self.placeables.get(&id) {
            return Some(p.pos);
        } else if id == self.player.id {
            self.player.body
        } else {
            return None;
        };
        self.physics.position(body)
    }

    pub fn phase(&self) -> WavePhase {
        self.wave.phase
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn random_sign(&mut self) -> f32 {
        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
    }

    pub fn spawn_enemy(&mut self, variant: EnemyVariant, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let stats = variant.stats();
        let bias = (self.random_sign(), self.random_sign());
        let body = self.physics.insert(
            Body::dynamic(
                Shape::Circle { radius: stats.radius },
                stats.mass,
                CollisionType::Enemy,
            )
            .at(pos)
            .with_max_velocity(stats.max_velocity)
            .owned_by(id),
        );
        self.enemies.insert(id, Enemy::new(id, body, variant, bias));
        id
    }

    /// Spawn a projectile; `shot.velocity` is in units per tick
    pub fn spawn_projectile(
        &mut self,
        shot: &Shot,
        origin: Vec2,
        owner: Faction,
        explosion_damage: f32,
    ) -> EntityId {
        let id = self.next_entity_id();
        let collision_type = if shot.kind.is_cosmetic() {
            CollisionType::Explosion
        } else {
            CollisionType::Bullet
        };
        let body = self.physics.insert(
            Body::dynamic(Shape::Circle { radius: PROJECTILE_RADIUS }, 0.05, collision_type)
                .at(origin)
                .with_velocity(shot.velocity * TICK_RATE)
                .with_damping(1.0)
                .sensor()
                .owned_by(id),
        );
        self.projectiles.insert(
            id,
            Projectile {
                id,
                body,
                kind: shot.kind,
                damage: shot.damage,
                life_span: shot.life_span,
                owner,
                explosion_damage,
            },
        );
        id
    }

    /// Put a placeable in the grid cell containing `at`
    pub fn place(&mut self, kind: PlaceableKind, at: Vec2) -> Result<EntityId, ActionError> {
        let idx = grid_index(at);
        if !self.room.in_bounds(idx) {
            return Err(ActionError::OutOfRoom(idx));
        }
        if !self.room.occupy(idx) {
            return Err(ActionError::CellOccupied(idx));
        }
        let pos = cell_center(idx);
        let id = self.next_entity_id();
        let half = self.room.cell / 2.0;
        let body = match kind {
            PlaceableKind::Wall => {
                Body::fixed(Shape::Box { half: Vec2::splat(half) }, CollisionType::Placeable)
            }
            PlaceableKind::Barrel => {
                Body::fixed(Shape::Box { half: Vec2::splat(half * 0.8) }, CollisionType::Placeable)
            }
            PlaceableKind::Mine => {
                Body::fixed(Shape::Circle { radius: half * 0.6 }, CollisionType::Placeable).sensor()
            }
        };
        let body = self.physics.insert(body.at(pos).owned_by(id));
        self.placeables.insert(
            id,
            Placeable {
                id,
                body,
                kind,
                pos,
                health: self.player.arsenal.get(kind.weapon()).health,
                grid_idx: idx,
                flash_ticks: 0,
            },
        );
        Ok(id)
    }

    /// Fire the active gun toward the aim point
    pub fn fire_active(&mut self) -> Result<usize, ActionError> {
        let kind = self.player.active_kind().ok_or(ActionError::NotOwned)?;
        let pos = self.player_pos();
        let mut dir = self.player.aim - pos;
        if dir.length() < DEGENERATE_LENGTH {
            dir = Vec2::X;
        }

        let player = &mut self.player;
        let weapon = player.arsenal.get_mut(kind);
        weapon.aim_at(pos, dir);
        let shots = weapon.fire(&mut player.energy, dir)?;
        let blast_damage = weapon.damage + player.explosion_damage;

        for shot in &shots {
            let origin = pos + safe_normalize(shot.velocity) * PLAYER_RADIUS;
            if shot.kind == ProjectileKind::Missile {
                let missile = Shot { damage: 0.0, ..*shot };
                self.spawn_projectile(&missile, origin, Faction::Player, blast_damage);
            } else {
                self.spawn_projectile(shot, origin, Faction::Player, 0.0);
            }
        }
        self.events.push(GameEvent::WeaponFired { weapon: kind });
        Ok(shots.len())
    }

    /// Build the active placeable at the aim point
    pub fn place_active(&mut self) -> Result<EntityId, ActionError> {
        let kind = self.player.active_kind().ok_or(ActionError::NotOwned)?;
        let placeable = kind.placeable().ok_or(ActionError::NotAPlaceable)?;
        self.player.arsenal.get(kind).ready(self.player.energy)?;

        let id = self.place(placeable, self.player.aim)?;
        let player = &mut self.player;
        player.arsenal.get_mut(kind).commit(&mut player.energy);
        let cell = self.placeables[&id].grid_idx;
        self.events.push(GameEvent::Placed {
            kind: placeable,
            cell,
        });
        Ok(id)
    }

    /// Remove every flagged entity and pay out kills
    pub fn reap(&mut self) {
        let dead: Vec<EntityId> = self
            .enemies
            .values()
            .filter(|e| e.is_dead())
            .map(|e| e.id)
            .collect();
        for id in dead {
            self.pending.delete(id);
        }
        for id in self.pending.take_deletions() {
            self.despawn(id);
        }
    }

    fn despawn(&mut self, id: EntityId) {
        if let Some(enemy) = self.enemies.remove(&id) {
            self.physics.remove(enemy.body);
            if enemy.is_dead() {
                let bounty = enemy.variant.stats().bounty;
                if !self.player.is_dead() {
                    self.player.heal(self.player.kill_recover);
                }
                self.player.money = self.player.money.saturating_add(bounty);
                self.wave.record_kill();
                self.events.push(GameEvent::EnemyKilled {
                    variant: enemy.variant,
                    bounty,
                });
            }
        } else if let Some(projectile) = self.projectiles.remove(&id) {
            self.physics.remove(projectile.body);
        } else if let Some(placeable) = self.placeables.remove(&id) {
            self.physics.remove(placeable.body);
            self.room.release(placeable.grid_idx);
        }
    }

    /// Spawn `count` enemies of wave `n` at random gaps
    pub fn spawn_cohort(&mut self, wave: u32, count: u32) {
        let plan = super::wave::WavePlan::for_wave(wave);
        for _ in 0..count {
            let variant = plan.variants[self.rng.random_range(0..plan.variants.len())];
            let base = if self.room.spawn_pos.is_empty() {
                cell_center((0, 0))
            } else {
                self.room.spawn_pos[self.rng.random_range(0..self.room.spawn_pos.len())]
            };
            let jitter = Vec2::new(
                self.rng.random_range(-4.0..4.0),
                self.rng.random_range(-4.0..4.0),
            );
            self.spawn_enemy(variant, base + jitter);
        }
    }

    pub fn start_wave(&mut self) -> bool {
        if !self.wave.confirm() {
            return false;
        }
        if let Some(n) = self.wave.phase.wave() {
            self.events.push(GameEvent::WaveStarted(n));
        }
        true
    }

    pub fn open_shop(&mut self, wave: u32) {
        self.shop.open(wave, &self.player, &mut self.rng);
    }

    pub fn close_shop(&mut self) -> bool {
        if !self.wave.close_shop() {
            return false;
        }
        self.shop.close();
        true
    }

    fn shop_wave(&self) -> u32 {
        self.wave.phase.wave().unwrap_or(1)
    }

    pub fn purchase(&mut self, slot: usize) -> Result<ItemKind, ActionError> {
        let result = self.shop.purchase(slot, &mut self.player);
        match result {
            Ok(kind) => {
                log::info!("purchased {kind:?}");
                self.events.push(GameEvent::Purchased(kind));
            }
            Err(err) => {
                log::debug!("purchase refused: {err}");
                self.events.push(GameEvent::PurchaseFailed(err));
            }
        }
        result
    }

    pub fn refresh_shop(&mut self) -> Result<(), ActionError> {
        let wave = self.shop_wave();
        let result = self.shop.refresh(&mut self.player, wave, &mut self.rng);
        match result {
            Ok(()) => self.events.push(GameEvent::Refreshed),
            Err(err) => {
                log::debug!("refresh refused: {err}");
                self.events.push(GameEvent::PurchaseFailed(err));
            }
        }
        result
    }

    /// Cells claimed by walls and placeables, for consistency checks
    pub fn claimed_cells(&self) -> BTreeSet<(i32, i32)> {
        self.room
            .walls
            .iter()
            .map(|w| w.grid_idx)
            .chain(self.placeables.values().map(|p| p.grid_idx))
            .collect()
    }
}
