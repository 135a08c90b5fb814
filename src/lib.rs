//! Room Siege - a top-down wave survival shooter
//!
//! Core modules:
//! - `sim`: Deterministic fixed-step simulation (physics, combat, waves, shop)
//! - `game`: Host-facing orchestrator (scheduler, shop actions, audio cues)
//! - `platform`: Input events coalesced into per-tick intents
//! - `settings`: Persisted user settings
//! - `audio`: Audio collaborator contract
//! - `snapshot`: Read-only render snapshot per frame
//! - `assets`: Explicit asset manifest check

pub mod assets;
pub mod audio;
pub mod error;
pub mod game;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use error::{ActionError, AssetError, SettingsError};
pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TICK_RATE: f32 = 60.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Side length of one grid tile in world units
    pub const GRID_CELL: f32 = 30.0;
    /// Room is ROOM_GRID x ROOM_GRID tiles
    pub const ROOM_GRID: usize = 40;
    /// Half-width of each boundary gap left open for spawning (in tiles)
    pub const SPAWN_GAP_HALF: usize = 1;

    /// Player attribute bounds
    pub const HEALTH_MAX: f32 = 1000.0;
    pub const SPEED_MIN: f32 = 600.0;
    pub const LUCK_LIMIT: i32 = 60;
    pub const ENERGY_START_MAX: f32 = 100.0;
    pub const ENERGY_LIMIT: f32 = 1000.0;
    /// Energy regained per tick
    pub const ENERGY_REGEN: f32 = 0.25;

    /// Minimum cooldown any weapon may be upgraded to
    pub const CD_MIN: i32 = 4;

    /// Global velocity damping (fraction of velocity kept per second)
    pub const WORLD_DAMPING: f32 = 0.01;
    /// Player-specific damping override
    pub const PLAYER_DAMPING: f32 = 0.001;

    /// Player body
    pub const PLAYER_RADIUS: f32 = 12.0;
    pub const PLAYER_MASS: f32 = 0.3;
    pub const PLAYER_MAX_VELOCITY: f32 = 300.0;

    /// Projectile speeds are expressed in units per tick
    pub const PROJECTILE_RADIUS: f32 = 4.0;

    /// Explosion parameters
    pub const MISSILE_EXPLOSION_RADIUS: f32 = 60.0;
    pub const BARREL_EXPLOSION_RADIUS: f32 = 90.0;
    pub const MINE_EXPLOSION_RADIUS: f32 = 60.0;
    /// Decorative particles spawned per explosion
    pub const EXPLOSION_PARTICLES: usize = 8;
    pub const EXPLOSION_PARTICLE_LIFE: i32 = 12;
    pub const EXPLOSION_PARTICLE_SPEED: f32 = 4.0;
    /// Minimum ticks between two explosion sounds (~0.3 s)
    pub const EXPLOSION_SOUND_INTERVAL: u32 = 18;

    /// Ticks a damaged entity flashes for
    pub const FLASH_TICKS: u32 = 6;

    /// Final wave; clearing it wins the run
    pub const N_MAX: u32 = 10;
    /// Ticks between enemy cohorts within a wave
    pub const COHORT_INTERVAL: u32 = 90;
    /// Money awarded per wave index when a wave is cleared
    pub const WAVE_AWARD_BASE: u32 = 10;
    /// Money awarded per kill when a wave is cleared
    pub const WAVE_AWARD_PER_KILL: u32 = 2;

    /// Shop
    pub const OFFER_COUNT: usize = 4;
    pub const REFRESH_COST: u32 = 5;
}

/// Smallest magnitude a vector is treated as having when normalized
pub const DEGENERATE_LENGTH: f32 = 0.001;

/// Normalize a vector, treating a zero vector as having length 0.001
///
/// Avoids division by zero; the result of normalizing `Vec2::ZERO` is
/// `Vec2::ZERO` rather than NaN.
#[inline]
pub fn safe_normalize(v: Vec2) -> Vec2 {
    v / v.length().max(DEGENERATE_LENGTH)
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Map a world coordinate to its grid cell `(floor(x/30), floor(y/30))`
#[inline]
pub fn grid_index(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / consts::GRID_CELL).floor() as i32,
        (pos.y / consts::GRID_CELL).floor() as i32,
    )
}

/// World-space center of a grid cell
#[inline]
pub fn cell_center(idx: (i32, i32)) -> Vec2 {
    Vec2::new(
        (idx.0 as f32 + 0.5) * consts::GRID_CELL,
        (idx.1 as f32 + 0.5) * consts::GRID_CELL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_normalize_zero() {
        let n = safe_normalize(Vec2::ZERO);
        assert!(n.x.is_finite() && n.y.is_finite());
        assert_eq!(n, Vec2::ZERO);
    }

    #[test]
    fn test_safe_normalize_unit() {
        let n = safe_normalize(Vec2::new(3.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let r = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-6);
        assert!((r.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_grid_index_and_center() {
        assert_eq!(grid_index(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid_index(Vec2::new(29.9, 30.0)), (0, 1));
        assert_eq!(grid_index(Vec2::new(-0.1, 61.0)), (-1, 2));
        assert_eq!(cell_center((10, 10)), Vec2::new(315.0, 315.0));
        assert_eq!(grid_index(cell_center((7, 3))), (7, 3));
    }
}
