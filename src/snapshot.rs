//! Read-only render snapshot
//!
//! Built once per frame from the world; the renderer never sees the world
//! itself. Sprites are ordered by descending y so nearer entities (lower on
//! screen) are drawn last.

use glam::Vec2;
use serde::Serialize;

use crate::sim::{
    EnemyVariant, PlaceableKind, ProjectileKind, WallVariant, WavePhase, WeaponKind, World,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SpriteKind {
    Player,
    Enemy(EnemyVariant),
    Placeable(PlaceableKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub pos: Vec2,
    pub facing_right: bool,
    /// Draw the damage flash overlay
    pub flash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallSprite {
    pub pos: Vec2,
    pub variant: WallVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileSprite {
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub health: f32,
    pub energy: f32,
    pub energy_max: f32,
    pub money: u32,
    pub phase: WavePhase,
    pub weapon: Option<WeaponKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Ground rectangle, origin at (0, 0)
    pub room_size: Vec2,
    pub walls: Vec<WallSprite>,
    pub shadows: Vec<Shadow>,
    pub sprites: Vec<Sprite>,
    pub projectiles: Vec<ProjectileSprite>,
    pub hud: Hud,
}

impl Snapshot {
    pub fn build(world: &World) -> Self {
        let walls: Vec<WallSprite> = world
            .room
            .walls
            .iter()
            .map(|w| WallSprite {
                pos: w.pos,
                variant: w.variant,
            })
            .collect();

        let player_pos = world.player_pos();
        let mut sprites = vec![Sprite {
            kind: SpriteKind::Player,
            pos: player_pos,
            facing_right: world.player.aim.x >= player_pos.x,
            flash: world.player.flash_ticks > 0,
        }];
        for enemy in world.enemies.values() {
            let Some(pos) = world.physics.position(enemy.body) else {
                continue;
            };
            sprites.push(Sprite {
                kind: SpriteKind::Enemy(enemy.variant),
                pos,
                facing_right: player_pos.x >= pos.x,
                flash: enemy.flash_ticks > 0,
            });
        }
        for placeable in world.placeables.values() {
            sprites.push(Sprite {
                kind: SpriteKind::Placeable(placeable.kind),
                pos: placeable.pos,
                facing_right: true,
                flash: placeable.flash_ticks > 0,
            });
        }
        sprites.sort_by(|a, b| b.pos.y.total_cmp(&a.pos.y));

        let half_cell = world.room.cell / 2.0;
        let shadows = walls
            .iter()
            .map(|w| Shadow {
                pos: w.pos,
                radius: half_cell,
            })
            .chain(sprites.iter().map(|s| Shadow {
                pos: s.pos,
                radius: half_cell * 0.6,
            }))
            .collect();

        let projectiles = world
            .projectiles
            .values()
            .filter_map(|p| {
                let body = world.physics.get(p.body)?;
                Some(ProjectileSprite {
                    kind: p.kind,
                    pos: body.pos,
                    velocity: body.vel,
                })
            })
            .collect();

        Self {
            room_size: Vec2::new(world.room.width(), world.room.height()),
            walls,
            shadows,
            sprites,
            projectiles,
            hud: Hud {
                health: world.player.health,
                energy: world.player.energy,
                energy_max: world.player.energy_max,
                money: world.player.money,
                phase: world.wave.phase,
                weapon: world.player.active_kind(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprites_sorted_by_descending_y() {
        let mut world = World::new(3);
        world.spawn_enemy(EnemyVariant::White, Vec2::new(200.0, 100.0));
        world.spawn_enemy(EnemyVariant::Red, Vec2::new(200.0, 900.0));
        world
            .place(PlaceableKind::Barrel, Vec2::new(400.0, 500.0))
            .unwrap();
        let snap = Snapshot::build(&world);
        assert_eq!(snap.sprites.len(), 4);
        assert!(snap.sprites.windows(2).all(|w| w[0].pos.y >= w[1].pos.y));
        assert_eq!(snap.shadows.len(), snap.walls.len() + snap.sprites.len());
        assert_eq!(snap.hud.weapon, Some(WeaponKind::Pistol));
        assert_eq!(snap.hud.phase, WavePhase::PreWave(1));
    }

    #[test]
    fn test_flash_follows_damage() {
        let mut world = World::new(3);
        world.player.take_damage(5.0);
        let snap = Snapshot::build(&world);
        let player = snap
            .sprites
            .iter()
            .find(|s| s.kind == SpriteKind::Player)
            .unwrap();
        assert!(player.flash);
    }
}
