//! Entity records
//!
//! One flat record per entity family. Per-variant behaviour is looked up in
//! tables keyed by the variant rather than spread over a type hierarchy.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::BodyHandle;
use super::weapon::{Arsenal, WeaponKind};
use crate::consts::*;

/// Stable entity handle (never reused within a world)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

/// Per-tick player intents, set by input and consumed by the tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intents {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub change_weapon_left: bool,
    pub change_weapon_right: bool,
    pub firing: bool,
    pub placing: bool,
}

impl Intents {
    /// Unit-less movement direction (+y is up)
    pub fn move_dir(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(
            axis(self.move_right, self.move_left),
            axis(self.move_up, self.move_down),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub body: BodyHandle,
    pub health: f32,
    pub energy: f32,
    pub energy_max: f32,
    pub money: u32,
    /// Movement force magnitude
    pub speed: f32,
    pub luck: i32,
    pub explosion_damage: f32,
    pub kill_recover: f32,
    /// Owned weapons in switching order
    pub inventory: Vec<WeaponKind>,
    pub active_weapon: usize,
    /// Parameters for every weapon kind, owned or not
    pub arsenal: Arsenal,
    pub intents: Intents,
    /// Aim target in world coordinates
    pub aim: Vec2,
    pub is_rocket_multi: bool,
    pub is_barrel_multi: bool,
    pub is_mine_multi: bool,
    pub flash_ticks: u32,
}

impl Player {
    pub fn new(id: EntityId, body: BodyHandle) -> Self {
        Self {
            id,
            body,
            health: 100.0,
            energy: ENERGY_START_MAX,
            energy_max: ENERGY_START_MAX,
            money: 0,
            speed: SPEED_MIN,
            luck: 0,
            explosion_damage: 0.0,
            kill_recover: 1.0,
            inventory: vec![WeaponKind::Pistol],
            active_weapon: 0,
            arsenal: Arsenal::default(),
            intents: Intents::default(),
            aim: Vec2::ZERO,
            is_rocket_multi: false,
            is_barrel_multi: false,
            is_mine_multi: false,
            flash_ticks: 0,
        }
    }

    pub fn owns(&self, kind: WeaponKind) -> bool {
        self.inventory.contains(&kind)
    }

    pub fn active_kind(&self) -> Option<WeaponKind> {
        self.inventory.get(self.active_weapon).copied()
    }

    /// Cycle the active weapon by `k` slots, wrapping both ways
    pub fn change_weapon(&mut self, k: i32) {
        let n = self.inventory.len() as i32;
        if n == 0 {
            return;
        }
        self.active_weapon = (self.active_weapon as i32 + k).rem_euclid(n) as usize;
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, HEALTH_MAX);
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).clamp(0.0, HEALTH_MAX);
        self.flash_ticks = FLASH_TICKS;
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn regen_energy(&mut self) {
        self.energy = (self.energy + ENERGY_REGEN).min(self.energy_max);
    }

    pub fn multi_for(&self, kind: WeaponKind) -> bool {
        match kind {
            WeaponKind::Rocket => self.is_rocket_multi,
            WeaponKind::Barrel => self.is_barrel_multi,
            WeaponKind::Mine => self.is_mine_multi,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyVariant {
    White,
    Red,
    Crack,
    BigMouth,
    Crash,
    Tank,
}

/// Ranged attack carried by shooting variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub kind: ProjectileKind,
    pub damage: f32,
    /// Units per tick
    pub speed: f32,
    pub life_span: i32,
}

/// Tuning table row for one enemy variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    /// Steering force magnitude
    pub speed: f32,
    pub mass: f32,
    pub radius: f32,
    pub max_velocity: f32,
    pub hit_damage: f32,
    pub cooldown_max: i32,
    pub shoot_range: Option<f32>,
    pub shot: Option<EnemyShot>,
    /// Dash multiplier applied to the stored dash force
    pub dash_factor: Option<f32>,
    /// Unstick force multiplier
    pub unstick_factor: f32,
    pub bounty: u32,
}

impl EnemyVariant {
    pub const ALL: [EnemyVariant; 6] = [
        EnemyVariant::White,
        EnemyVariant::Red,
        EnemyVariant::Crack,
        EnemyVariant::BigMouth,
        EnemyVariant::Crash,
        EnemyVariant::Tank,
    ];

    /// First wave on which this variant may spawn
    pub fn first_wave(self) -> u32 {
        match self {
            EnemyVariant::White => 1,
            EnemyVariant::Red => 2,
            EnemyVariant::Crack => 3,
            EnemyVariant::BigMouth => 4,
            EnemyVariant::Crash => 5,
            EnemyVariant::Tank => 7,
        }
    }

    pub fn stats(self) -> EnemyStats {
        let base = EnemyStats {
            health: 60.0,
            speed: 500.0,
            mass: 0.35,
            radius: 12.0,
            max_velocity: 400.0,
            hit_damage: 10.0,
            cooldown_max: 60,
            shoot_range: None,
            shot: None,
            dash_factor: None,
            unstick_factor: 2.0,
            bounty: 2,
        };
        match self {
            EnemyVariant::White => base,
            EnemyVariant::Red => EnemyStats {
                health: 50.0,
                speed: 450.0,
                hit_damage: 8.0,
                cooldown_max: 90,
                shoot_range: Some(240.0),
                shot: Some(EnemyShot {
                    kind: ProjectileKind::Bullet,
                    damage: 10.0,
                    speed: 8.0,
                    life_span: 60,
                }),
                bounty: 3,
                ..base
            },
            EnemyVariant::Crack => EnemyStats {
                health: 40.0,
                speed: 650.0,
                mass: 0.3,
                radius: 10.0,
                max_velocity: 500.0,
                hit_damage: 12.0,
                cooldown_max: 45,
                bounty: 3,
                ..base
            },
            EnemyVariant::BigMouth => EnemyStats {
                health: 150.0,
                speed: 400.0,
                mass: 0.6,
                radius: 16.0,
                max_velocity: 300.0,
                hit_damage: 15.0,
                cooldown_max: 120,
                shoot_range: Some(300.0),
                shot: Some(EnemyShot {
                    kind: ProjectileKind::FireBall,
                    damage: 25.0,
                    speed: 6.0,
                    life_span: 80,
                }),
                bounty: 5,
                ..base
            },
            EnemyVariant::Crash => EnemyStats {
                health: 120.0,
                mass: 0.5,
                radius: 14.0,
                max_velocity: 600.0,
                hit_damage: 20.0,
                cooldown_max: 120,
                shoot_range: Some(180.0),
                dash_factor: Some(2.0),
                bounty: 5,
                ..base
            },
            EnemyVariant::Tank => EnemyStats {
                health: 400.0,
                speed: 900.0,
                mass: 1.2,
                radius: 20.0,
                max_velocity: 450.0,
                hit_damage: 35.0,
                cooldown_max: 180,
                shoot_range: Some(150.0),
                dash_factor: Some(5.0),
                bounty: 10,
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub body: BodyHandle,
    pub variant: EnemyVariant,
    pub health: f32,
    pub health_max: f32,
    pub speed: f32,
    pub hit_damage: f32,
    pub cooldown: i32,
    pub cooldown_max: i32,
    /// Target-direction force from the last walking tick
    pub last_force: Vec2,
    /// Random unstick bias, each component -1 or +1
    pub l_or_r: f32,
    pub u_or_d: f32,
    pub shoot_range: Option<f32>,
    pub dash_force: Option<Vec2>,
    pub is_walking: bool,
    pub flash_ticks: u32,
}

impl Enemy {
    pub fn new(id: EntityId, body: BodyHandle, variant: EnemyVariant, bias: (f32, f32)) -> Self {
        let stats = variant.stats();
        Self {
            id,
            body,
            variant,
            health: stats.health,
            health_max: stats.health,
            speed: stats.speed,
            hit_damage: stats.hit_damage,
            cooldown: 0,
            cooldown_max: stats.cooldown_max,
            last_force: Vec2::ZERO,
            l_or_r: bias.0,
            u_or_d: bias.1,
            shoot_range: stats.shoot_range,
            dash_force: None,
            is_walking: true,
            flash_ticks: 0,
        }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
        self.flash_ticks = FLASH_TICKS;
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn cooldown_ready(&self) -> bool {
        self.cooldown <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Bullet,
    EnergyBullet,
    Missile,
    FireBall,
    ExplosionParticle,
}

impl ProjectileKind {
    /// Cosmetic projectiles never deal damage or touch anything
    pub fn is_cosmetic(self) -> bool {
        self == ProjectileKind::ExplosionParticle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub body: BodyHandle,
    pub kind: ProjectileKind,
    pub damage: f32,
    /// Ticks remaining
    pub life_span: i32,
    pub owner: Faction,
    /// Damage dealt by the blast when a missile detonates
    pub explosion_damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceableKind {
    Wall,
    Barrel,
    Mine,
}

impl PlaceableKind {
    pub fn weapon(self) -> WeaponKind {
        match self {
            PlaceableKind::Wall => WeaponKind::Wall,
            PlaceableKind::Barrel => WeaponKind::Barrel,
            PlaceableKind::Mine => WeaponKind::Mine,
        }
    }

    pub fn is_explosive(self) -> bool {
        self != PlaceableKind::Wall
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeable {
    pub id: EntityId,
    pub body: BodyHandle,
    pub kind: PlaceableKind,
    /// Center of the occupied grid cell
    pub pos: Vec2,
    pub health: f32,
    pub grid_idx: (i32, i32),
    pub flash_ticks: u32,
}
