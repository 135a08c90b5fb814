//! Contact effects and explosion chains
//!
//! [`ContactResolver`] runs inside the physics step and only records
//! consequences: damage, spent projectiles, deletions and detonations.
//! [`run_detonations`] drains the detonation queue after the step, before
//! reaping, so a chain propagates within one tick.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;

use super::entity::{
    Enemy, EntityId, Faction, Placeable, PlaceableKind, Player, Projectile, ProjectileKind,
};
use super::physics::{CollisionHandler, CollisionType, Contact, ContactResponse};
use super::state::{GameEvent, Pending, World};
use super::weapon::{Shot, WeaponKind};
use crate::consts::*;

/// What blew up; selects the radius and which multi flag allows chaining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlastKind {
    Missile,
    Barrel,
    Mine,
}

impl BlastKind {
    pub fn radius(self) -> f32 {
        match self {
            BlastKind::Missile => MISSILE_EXPLOSION_RADIUS,
            BlastKind::Barrel => BARREL_EXPLOSION_RADIUS,
            BlastKind::Mine => MINE_EXPLOSION_RADIUS,
        }
    }

    pub fn weapon(self) -> WeaponKind {
        match self {
            BlastKind::Missile => WeaponKind::Rocket,
            BlastKind::Barrel => WeaponKind::Barrel,
            BlastKind::Mine => WeaponKind::Mine,
        }
    }
}

/// A queued explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detonation {
    /// Missile or placeable that exploded
    pub origin: EntityId,
    pub kind: BlastKind,
    pub pos: Vec2,
    pub damage: f32,
}

/// Blast for an explosive placeable; walls never explode
pub fn placeable_blast(placeable: &Placeable, player: &Player) -> Option<Detonation> {
    let kind = match placeable.kind {
        PlaceableKind::Wall => return None,
        PlaceableKind::Barrel => BlastKind::Barrel,
        PlaceableKind::Mine => BlastKind::Mine,
    };
    let weapon = player.arsenal.get(placeable.kind.weapon());
    Some(Detonation {
        origin: placeable.id,
        kind,
        pos: placeable.pos,
        damage: weapon.damage + player.explosion_damage,
    })
}

fn missile_blast(projectile: &Projectile, pos: Vec2) -> Detonation {
    Detonation {
        origin: projectile.id,
        kind: BlastKind::Missile,
        pos,
        damage: projectile.explosion_damage,
    }
}

/// Collision handler borrowing the entity tables next to the physics world
pub struct ContactResolver<'a> {
    pub player: &'a mut Player,
    pub enemies: &'a mut BTreeMap<EntityId, Enemy>,
    pub projectiles: &'a BTreeMap<EntityId, Projectile>,
    pub placeables: &'a mut BTreeMap<EntityId, Placeable>,
    pub pending: &'a mut Pending,
    pub events: &'a mut Vec<GameEvent>,
}

impl CollisionHandler for ContactResolver<'_> {
    fn on_contact(&mut self, contact: &Contact) -> ContactResponse {
        use CollisionType as T;
        match (contact.type_a, contact.type_b) {
            (T::Player, T::Enemy) => {
                if let Some(id) = contact.entity_b {
                    self.enemy_strikes_player(id);
                }
                ContactResponse::Resolve
            }
            (T::Bullet, other) => {
                self.projectile_hit(contact, other);
                ContactResponse::Ignore
            }
            (T::Enemy, T::Placeable) => match (contact.entity_a, contact.entity_b) {
                (Some(enemy), Some(placeable)) => self.enemy_meets_placeable(enemy, placeable),
                _ => ContactResponse::Resolve,
            },
            (T::Explosion, _) => ContactResponse::Ignore,
            _ => ContactResponse::Resolve,
        }
    }
}

impl ContactResolver<'_> {
    fn enemy_strikes_player(&mut self, enemy_id: EntityId) {
        let Some(enemy) = self.enemies.get_mut(&enemy_id) else {
            return;
        };
        if enemy.is_dead() || !enemy.cooldown_ready() {
            return;
        }
        enemy.cooldown = enemy.cooldown_max;
        self.player.take_damage(enemy.hit_damage);
        self.events.push(GameEvent::PlayerHit {
            damage: enemy.hit_damage,
        });
    }

    fn enemy_meets_placeable(
        &mut self,
        enemy_id: EntityId,
        placeable_id: EntityId,
    ) -> ContactResponse {
        let Some(placeable) = self.placeables.get_mut(&placeable_id) else {
            return ContactResponse::Ignore;
        };
        match placeable.kind {
            PlaceableKind::Mine => {
                if let Some(blast) = placeable_blast(placeable, self.player) {
                    self.pending.detonate(blast);
                }
                ContactResponse::Ignore
            }
            PlaceableKind::Barrel => ContactResponse::Resolve,
            PlaceableKind::Wall => {
                if let Some(enemy) = self.enemies.get_mut(&enemy_id)
                    && enemy.cooldown_ready()
                {
                    enemy.cooldown = enemy.cooldown_max;
                    placeable.health -= enemy.hit_damage;
                    placeable.flash_ticks = FLASH_TICKS;
                    if placeable.health <= 0.0 {
                        self.pending.delete(placeable.id);
                    }
                }
                ContactResponse::Resolve
            }
        }
    }

    /// Mark a projectile used up; missiles leave a blast behind
    fn spend(&mut self, projectile: &Projectile, pos: Vec2) {
        if projectile.kind == ProjectileKind::Missile {
            // Claims the missile and flags it for reaping
            self.pending.detonate(missile_blast(projectile, pos));
        } else if self.pending.spend(projectile.id) {
            self.pending.delete(projectile.id);
        }
    }

    fn projectile_hit(&mut self, contact: &Contact, other: CollisionType) {
        let Some(projectile) = contact.entity_a.and_then(|id| self.projectiles.get(&id)) else {
            return;
        };
        if projectile.kind.is_cosmetic() || self.pending.is_spent(projectile.id) {
            return;
        }
        let pos = contact.pos_a;

        match (other, projectile.owner) {
            (CollisionType::Wall, _) => self.spend(projectile, pos),
            (CollisionType::Enemy, Faction::Player) => {
                let Some(enemy) = contact.entity_b.and_then(|id| self.enemies.get_mut(&id)) else {
                    return;
                };
                if enemy.is_dead() {
                    return;
                }
                enemy.take_damage(projectile.damage);
                self.spend(projectile, pos);
            }
            (CollisionType::Player, Faction::Enemy) => {
                self.player.take_damage(projectile.damage);
                self.events.push(GameEvent::PlayerHit {
                    damage: projectile.damage,
                });
                self.spend(projectile, pos);
            }
            (CollisionType::Placeable, owner) => {
                let Some(placeable) = contact.entity_b.and_then(|id| self.placeables.get_mut(&id))
                else {
                    return;
                };
                if placeable.kind.is_explosive() {
                    if let Some(blast) = placeable_blast(placeable, self.player) {
                        self.pending.detonate(blast);
                    }
                    self.spend(projectile, pos);
                } else if owner == Faction::Enemy {
                    placeable.health -= projectile.damage;
                    placeable.flash_ticks = FLASH_TICKS;
                    if placeable.health <= 0.0 {
                        self.pending.delete(placeable.id);
                    }
                    self.spend(projectile, pos);
                }
                // Player shots pass over player-built walls
            }
            _ => {}
        }
    }
}

/// Drain the detonation queue breadth-first
pub fn run_detonations(world: &mut World) {
    while let Some(blast) = world.pending.detonations.pop_front() {
        explode(world, &blast);
    }
}

fn explode(world: &mut World, blast: &Detonation) {
    let radius = blast.kind.radius();
    log::trace!("{:?} explosion at {:?} for {}", blast.kind, blast.pos, blast.damage);

    for enemy in world.enemies.values_mut() {
        let Some(pos) = world.physics.position(enemy.body) else {
            continue;
        };
        if pos.distance(blast.pos) <= radius && !enemy.is_dead() {
            enemy.take_damage(blast.damage);
        }
    }

    let player_pos = world.player_pos();
    if !world.player.is_dead() && player_pos.distance(blast.pos) <= radius {
        world.player.take_damage(blast.damage);
        world.events.push(GameEvent::PlayerHit {
            damage: blast.damage,
        });
    }

    for placeable in world.placeables.values_mut() {
        if placeable.kind == PlaceableKind::Wall && placeable.pos.distance(blast.pos) <= radius {
            placeable.health -= blast.damage;
            placeable.flash_ticks = FLASH_TICKS;
            if placeable.health <= 0.0 {
                world.pending.delete(placeable.id);
            }
        }
    }

    spawn_particles(world, blast.pos);
    world.events.push(GameEvent::Explosion {
        pos: blast.pos,
        radius,
    });

    if world.player.multi_for(blast.kind.weapon()) {
        chain(world, blast.pos, radius);
    }
}

/// Queue every unspent explosive within `radius` of `center`
fn chain(world: &mut World, center: Vec2, radius: f32) {
    let mut triggered = Vec::new();
    for placeable in world.placeables.values() {
        if placeable.kind.is_explosive()
            && !world.pending.is_spent(placeable.id)
            && placeable.pos.distance(center) <= radius
            && let Some(blast) = placeable_blast(placeable, &world.player)
        {
            triggered.push(blast);
        }
    }
    for projectile in world.projectiles.values() {
        if projectile.kind != ProjectileKind::Missile
            || projectile.owner != Faction::Player
            || world.pending.is_spent(projectile.id)
        {
            continue;
        }
        if let Some(pos) = world.physics.position(projectile.body)
            && pos.distance(center) <= radius
        {
            triggered.push(missile_blast(projectile, pos));
        }
    }
    for blast in triggered {
        world.pending.detonate(blast);
    }
}

fn spawn_particles(world: &mut World, origin: Vec2) {
    for i in 0..EXPLOSION_PARTICLES {
        let angle = TAU * i as f32 / EXPLOSION_PARTICLES as f32;
        let shot = Shot {
            kind: ProjectileKind::ExplosionParticle,
            velocity: Vec2::from_angle(angle) * EXPLOSION_PARTICLE_SPEED,
            damage: 0.0,
            life_span: EXPLOSION_PARTICLE_LIFE,
        };
        world.spawn_projectile(&shot, origin, Faction::Player, 0.0);
    }
}
