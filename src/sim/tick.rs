//! Fixed timestep simulation tick
//!
//! Core game loop that advances the world deterministically. Order within
//! a tick: intents, player actions, enemy AI, projectile lifetimes, physics
//! with contact handling, explosion chains, reaping, wave director.

use glam::Vec2;

use super::combat::{ContactResolver, run_detonations};
use super::enemy_ai;
use super::entity::{Faction, Intents};
use super::state::{GameEvent, World};
use super::wave::{WavePhase, WaveSignal};
use crate::consts::*;
use crate::safe_normalize;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held movement/fire/place bits plus one-shot weapon changes
    pub intents: Intents,
    /// Aim point in world coordinates
    pub aim: Option<Vec2>,
    /// Start the next wave, or leave the shop
    pub confirm: bool,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) {
    match world.wave.phase {
        WavePhase::Win | WavePhase::Lost => return,
        WavePhase::PostWave(_) => {
            // Shop is open; the arena is frozen
            if input.confirm && world.close_shop() {
                log::info!("shop closed, next is {:?}", world.wave.phase);
            }
            return;
        }
        WavePhase::PreWave(_) => {
            if input.confirm {
                world.start_wave();
            }
        }
        WavePhase::InWave(_) => {}
    }
    world.time_ticks += 1;

    world.player.intents = input.intents;
    if let Some(aim) = input.aim {
        world.player.aim = aim;
    }

    update_player(world);
    update_enemies(world);
    age_projectiles(world);
    step_physics(world);
    run_detonations(world);
    world.reap();
    update_wave(world);
}

fn update_player(world: &mut World) {
    let player = &mut world.player;
    let dir = player.intents.move_dir();
    if dir != Vec2::ZERO {
        world.physics.apply_force(player.body, safe_normalize(dir) * player.speed);
    }
    if player.intents.change_weapon_left {
        player.change_weapon(-1);
    }
    if player.intents.change_weapon_right {
        player.change_weapon(1);
    }
    for kind in super::weapon::WeaponKind::ALL {
        player.arsenal.get_mut(kind).tick_cooldown();
    }
    player.regen_energy();
    player.flash_ticks = player.flash_ticks.saturating_sub(1);

    let Some(active) = player.active_kind() else {
        return;
    };
    if active.is_gun() {
        if player.intents.firing
            && let Err(err) = world.fire_active()
        {
            log::trace!("fire refused: {err}");
        }
    } else if player.intents.placing
        && let Err(err) = world.place_active()
    {
        log::debug!("place refused: {err}");
    }
}

fn update_enemies(world: &mut World) {
    let player_pos = world.player_pos();
    let mut shots = Vec::new();
    for enemy in world.enemies.values_mut() {
        enemy_ai::tick_cooldown(enemy);
        enemy.flash_ticks = enemy.flash_ticks.saturating_sub(1);
        let Some(pos) = world.physics.position(enemy.body) else {
            continue;
        };
        let steering = enemy_ai::steer(enemy, pos, player_pos);
        if steering.force != Vec2::ZERO {
            world.physics.apply_force(enemy.body, steering.force);
        }
        if let Some(impulse) = enemy_ai::try_dash(enemy, steering.in_range) {
            world.physics.apply_impulse(enemy.body, impulse);
        }
        if let Some(shot) = enemy_ai::try_shoot(enemy, steering.in_range, pos, player_pos) {
            shots.push((enemy.variant, shot, pos));
        }
    }
    for (variant, shot, pos) in shots {
        world.spawn_projectile(&shot, pos, Faction::Enemy, 0.0);
        world.events.push(GameEvent::EnemyFired { variant });
    }
    for placeable in world.placeables.values_mut() {
        placeable.flash_ticks = placeable.flash_ticks.saturating_sub(1);
    }
}

fn age_projectiles(world: &mut World) {
    for projectile in world.projectiles.values_mut() {
        projectile.life_span -= 1;
        if projectile.life_span <= 0 {
            world.pending.delete(projectile.id);
        }
    }
}

fn step_physics(world: &mut World) {
    let World {
        physics,
        player,
        enemies,
        projectiles,
        placeables,
        pending,
        events,
        room,
        ..
    } = world;
    let mut resolver = ContactResolver {
        player,
        enemies,
        projectiles,
        placeables,
        pending,
        events,
    };
    physics.step(SIM_DT, &mut resolver);

    // Spawn gaps are open; keep the player inside the room rectangle
    if let Some(body) = physics.get_mut(resolver.player.body) {
        let clamped = room.clamp_inside(body.pos, PLAYER_RADIUS);
        if clamped != body.pos {
            body.pos = clamped;
            body.vel = Vec2::ZERO;
        }
    }
}

fn update_wave(world: &mut World) {
    if world.player.is_dead() {
        if world.wave.lose() {
            log::info!("player died on tick {}", world.time_ticks);
            world.events.push(GameEvent::GameOver);
        }
        return;
    }
    match world.wave.update(world.enemies.len()) {
        WaveSignal::Idle => {}
        WaveSignal::SpawnCohort { wave, count } => world.spawn_cohort(wave, count),
        WaveSignal::Cleared { wave, award } => {
            world.player.money = world.player.money.saturating_add(award);
            world.events.push(GameEvent::WaveCleared { wave, award });
            world.open_shop(wave);
        }
        WaveSignal::Won { award } => {
            world.player.money = world.player.money.saturating_add(award);
            world.events.push(GameEvent::GameWon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EnemyVariant, ProjectileKind};
    use crate::sim::room::Room;
    use crate::sim::weapon::WeaponKind;

    fn hold(intents: Intents) -> TickInput {
        TickInput {
            intents,
            ..Default::default()
        }
    }

    #[test]
    fn test_walk_up_into_top_wall() {
        let mut world = World::new(1);
        let input = hold(Intents {
            move_up: true,
            ..Default::default()
        });
        let max_step = world.player.speed * SIM_DT;
        let mut last_y = world.player_pos().y;
        for _ in 0..400 {
            tick(&mut world, &input);
            let y = world.player_pos().y;
            assert!(y >= last_y - 1e-3, "moved down: {last_y} -> {y}");
            assert!(y - last_y <= max_step + 1e-3);
            last_y = y;
        }
        let top_wall_face = world.room.height() - world.room.cell;
        assert!(last_y >= top_wall_face - PLAYER_RADIUS - GRID_CELL);
        assert!(last_y <= top_wall_face + GRID_CELL);
    }

    #[test]
    fn test_pistol_fires_every_thirty_ticks() {
        let mut world = World::with_room(2, Room::empty(40, 40));
        world.player.energy = 0.0;
        world.player.energy_max = 0.0;
        let input = TickInput {
            intents: Intents {
                firing: true,
                ..Default::default()
            },
            aim: Some(world.player_pos() + Vec2::new(0.0, 200.0)),
            confirm: false,
        };
        let mut fired_on = Vec::new();
        for t in 0..95 {
            tick(&mut world, &input);
            let n = world
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::WeaponFired { .. }))
                .count();
            assert!(n <= 1);
            if n == 1 {
                fired_on.push(t);
            }
        }
        assert_eq!(fired_on, vec![0, 30, 60, 90]);
    }

    #[test]
    fn test_shotgun_burst_symmetric() {
        let mut world = World::with_room(3, Room::empty(40, 40));
        world.player.inventory = vec![WeaponKind::Shotgun];
        let pos = world.player_pos();
        world.player.aim = pos + Vec2::new(1.0, 0.0);
        assert_eq!(world.fire_active(), Ok(3));

        let velocities: Vec<Vec2> = world
            .projectiles
            .values()
            .map(|p| world.physics.velocity(p.body).unwrap())
            .collect();
        assert_eq!(velocities.len(), 3);
        assert!(velocities.iter().all(|v| v.x > 0.0));
        let sum_y: f32 = velocities.iter().map(|v| v.y).sum();
        assert!(sum_y.abs() < 1e-2);
    }

    #[test]
    fn test_projectiles_reaped_when_expired() {
        let mut world = World::with_room(4, Room::empty(40, 40));
        world.player.aim = world.player_pos() + Vec2::new(0.0, 10.0);
        world.fire_active().unwrap();
        let life = WeaponKind::Pistol.defaults().life_span;
        for _ in 0..life - 1 {
            tick(&mut world, &TickInput::default());
            assert!(world.projectiles.values().all(|p| p.life_span > 0));
            assert_eq!(world.projectiles.len(), 1);
        }
        tick(&mut world, &TickInput::default());
        assert!(world.projectiles.is_empty());
        // Only the player body is left in an empty room
        assert_eq!(world.physics.len(), 1);
    }

    #[test]
    fn test_white_pursues_player() {
        let mut world = World::with_room(5, Room::empty(40, 40));
        world.physics.set_position(world.player.body, Vec2::new(500.0, 0.0));
        let id = world.spawn_enemy(EnemyVariant::White, Vec2::ZERO);
        for _ in 0..120 {
            tick(&mut world, &TickInput::default());
        }
        let enemy = world.entity_pos(id).unwrap();
        assert!(enemy.x > 0.0);
        assert!((enemy.x - 500.0).abs() <= 40.0, "enemy x = {}", enemy.x);
    }

    #[test]
    fn test_weapon_change_wraps_on_one_shot_intent() {
        let mut world = World::with_room(6, Room::empty(10, 10));
        world.player.inventory = vec![WeaponKind::Pistol, WeaponKind::Uzi];
        let left = hold(Intents {
            change_weapon_left: true,
            ..Default::default()
        });
        tick(&mut world, &left);
        assert_eq!(world.player.active_weapon, 1);
        tick(&mut world, &TickInput::default());
        assert_eq!(world.player.active_weapon, 1);
    }

    #[test]
    fn test_grid_matches_walls_and_placeables() {
        let mut world = World::new(7);
        world.player.inventory.push(WeaponKind::Wall);
        world.player.active_weapon = 1;
        let input = TickInput {
            intents: Intents {
                placing: true,
                ..Default::default()
            },
            aim: Some(crate::cell_center((12, 12))),
            confirm: false,
        };
        tick(&mut world, &input);
        assert_eq!(world.placeables.len(), 1);
        let occupied: std::collections::BTreeSet<_> = world.room.occupied_cells().collect();
        assert_eq!(occupied, world.claimed_cells());
    }

    #[test]
    fn test_wave_flow_to_shop() {
        let mut world = World::with_room(8, Room::new(20, 20));
        tick(
            &mut world,
            &TickInput {
                confirm: true,
                ..Default::default()
            },
        );
        assert_eq!(world.phase(), WavePhase::InWave(1));
        assert!(!world.enemies.is_empty());

        // Clear the wave by force
        for _ in 0..2000 {
            for enemy in world.enemies.values_mut() {
                enemy.health = 0.0;
            }
            tick(&mut world, &TickInput::default());
            if world.phase() != WavePhase::InWave(1) {
                break;
            }
        }
        assert_eq!(world.phase(), WavePhase::PostWave(1));
        assert!(world.shop.is_open);
        assert_eq!(world.wave.kills, 7);
        assert!(world.player.money >= WAVE_AWARD_BASE + 7 * WAVE_AWARD_PER_KILL);

        tick(
            &mut world,
            &TickInput {
                confirm: true,
                ..Default::default()
            },
        );
        assert_eq!(world.phase(), WavePhase::PreWave(2));
        assert!(!world.shop.is_open);
    }

    #[test]
    fn test_death_loses() {
        let mut world = World::with_room(9, Room::empty(20, 20));
        world.player.health = 0.0;
        tick(&mut world, &TickInput::default());
        assert_eq!(world.phase(), WavePhase::Lost);
        assert!(world.events.contains(&GameEvent::GameOver));
        let before = world.time_ticks;
        tick(&mut world, &TickInput::default());
        assert_eq!(world.time_ticks, before);
    }

    #[test]
    fn test_enemy_bullets_hit_player() {
        let mut world = World::with_room(10, Room::empty(40, 40));
        let player = world.player_pos();
        world.spawn_enemy(EnemyVariant::Red, player - Vec2::new(150.0, 0.0));
        let start = world.player.health;
        for _ in 0..60 {
            tick(&mut world, &TickInput::default());
        }
        assert!(world.player.health < start);
        assert!(
            world
                .projectiles
                .values()
                .all(|p| p.kind != ProjectileKind::Bullet || p.owner == Faction::Enemy)
        );
    }
}
