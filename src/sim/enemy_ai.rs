//! Enemy steering, dashing and shooting
//!
//! Every enemy seeks the player. Shooters and dashers stop walking inside
//! their range. An enemy whose target-direction force barely changed since
//! the last walking tick is assumed to be pinned against something it
//! cannot see and gets pushed sideways by its random unstick bias.

use glam::Vec2;

use super::entity::{Enemy, EnemyVariant};
use super::weapon::Shot;
use crate::safe_normalize;

/// Below this change the target-direction force counts as unchanged
pub const STUCK_EPSILON: f32 = 0.1;

/// Outcome of one steering update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Force to apply through the physics world
    pub force: Vec2,
    /// Player is inside this enemy's shoot range
    pub in_range: bool,
    /// The unstick branch produced `force`
    pub unstuck: bool,
}

/// Compute this tick's steering force toward `player_pos`
pub fn steer(enemy: &mut Enemy, enemy_pos: Vec2, player_pos: Vec2) -> Steering {
    let force = player_pos - enemy_pos;

    if let Some(range) = enemy.shoot_range
        && force.length() < range
    {
        enemy.is_walking = false;
        return Steering {
            force: Vec2::ZERO,
            in_range: true,
            unstuck: false,
        };
    }
    enemy.is_walking = true;

    let delta = (enemy.last_force - force).abs();
    if enemy.last_force.distance(force) < STUCK_EPSILON {
        let k = enemy.variant.stats().unstick_factor;
        let push = enemy.speed * k;
        let unstick = Vec2::new(
            if delta.x < STUCK_EPSILON { enemy.l_or_r * push } else { 0.0 },
            if delta.y < STUCK_EPSILON { enemy.u_or_d * push } else { 0.0 },
        );
        return Steering {
            force: unstick,
            in_range: false,
            unstuck: true,
        };
    }

    enemy.last_force = force;
    let walk = safe_normalize(force) * enemy.speed;
    if matches!(enemy.variant, EnemyVariant::Crash | EnemyVariant::Tank) {
        enemy.dash_force = Some(walk);
    }
    Steering {
        force: walk,
        in_range: false,
        unstuck: false,
    }
}

/// Dash toward the stored direction; returns the impulse to apply
pub fn try_dash(enemy: &mut Enemy, in_range: bool) -> Option<Vec2> {
    let k = enemy.variant.stats().dash_factor?;
    if !in_range || !enemy.cooldown_ready() {
        return None;
    }
    let dash = enemy.dash_force? * k;
    enemy.cooldown = enemy.cooldown_max;
    Some(dash)
}

/// Fire at the player when in range; returns the shot to spawn
pub fn try_shoot(
    enemy: &mut Enemy,
    in_range: bool,
    enemy_pos: Vec2,
    player_pos: Vec2,
) -> Option<Shot> {
    let shot = enemy.variant.stats().shot?;
    if !in_range || !enemy.cooldown_ready() {
        return None;
    }
    enemy.cooldown = enemy.cooldown_max;
    Some(Shot {
        kind: shot.kind,
        velocity: safe_normalize(player_pos - enemy_pos) * shot.speed,
        damage: shot.damage,
        life_span: shot.life_span,
    })
}

pub fn tick_cooldown(enemy: &mut Enemy) {
    enemy.cooldown = (enemy.cooldown - 1).max(0);
}
