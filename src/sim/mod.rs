//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or filesystem access

pub mod collision;
pub mod combat;
pub mod enemy_ai;
pub mod entity;
pub mod physics;
pub mod room;
pub mod shop;
pub mod state;
pub mod tick;
pub mod wave;
pub mod weapon;

pub use collision::{CollisionResult, Shape, collide};
pub use combat::{BlastKind, Detonation};
pub use entity::{
    Enemy, EnemyVariant, EntityId, Faction, Intents, Placeable, PlaceableKind, Player, Projectile,
    ProjectileKind,
};
pub use physics::{Body, BodyHandle, CollisionType, PhysicsWorld};
pub use room::{Room, Wall, WallVariant};
pub use shop::{ItemKind, Offer, Shop};
pub use state::{GameEvent, World};
pub use tick::{TickInput, tick};
pub use wave::{WaveDirector, WavePhase};
pub use weapon::{Arsenal, Weapon, WeaponKind};
