//! Weapons as data plus a fire pattern
//!
//! Every weapon is the same parameter record; what differs per kind is the
//! default parameters and the fire pattern function that turns an aim
//! direction into one or more projectile velocities.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{PlaceableKind, ProjectileKind};
use crate::ActionError;
use crate::consts::CD_MIN;
use crate::{rotate, safe_normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    Uzi,
    Shotgun,
    Rocket,
    Wall,
    Barrel,
    Mine,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 7] = [
        WeaponKind::Pistol,
        WeaponKind::Uzi,
        WeaponKind::Shotgun,
        WeaponKind::Rocket,
        WeaponKind::Wall,
        WeaponKind::Barrel,
        WeaponKind::Mine,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn is_gun(self) -> bool {
        self.placeable().is_none()
    }

    /// Rocket, Barrel and Mine deal explosion damage
    pub fn is_explosive(self) -> bool {
        matches!(self, WeaponKind::Rocket | WeaponKind::Barrel | WeaponKind::Mine)
    }

    pub fn placeable(self) -> Option<PlaceableKind> {
        match self {
            WeaponKind::Wall => Some(PlaceableKind::Wall),
            WeaponKind::Barrel => Some(PlaceableKind::Barrel),
            WeaponKind::Mine => Some(PlaceableKind::Mine),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Uzi => "uzi",
            WeaponKind::Shotgun => "shotgun",
            WeaponKind::Rocket => "rocket",
            WeaponKind::Wall => "wall",
            WeaponKind::Barrel => "barrel",
            WeaponKind::Mine => "mine",
        }
    }

    fn fire_pattern(self) -> FirePattern {
        match self {
            WeaponKind::Shotgun | WeaponKind::Rocket => spread_shot,
            _ => single_shot,
        }
    }

    /// Factory defaults; selling a weapon restores these
    pub fn defaults(self) -> Weapon {
        let base = Weapon {
            kind: self,
            damage: 30.0,
            cd_max: 30,
            cooldown: 0,
            bullet_speed: 25.0,
            life_span: 20,
            energy_cost: 0.0,
            bullet_num: 1,
            bullet_kind: ProjectileKind::Bullet,
            is_gun: self.is_gun(),
            health: 0.0,
            facing_right: true,
            rotation: 0.0,
            aim: Vec2::X,
            position: Vec2::ZERO,
        };
        match self {
            WeaponKind::Pistol => base,
            WeaponKind::Uzi => Weapon {
                bullet_kind: ProjectileKind::EnergyBullet,
                cd_max: 20,
                energy_cost: 4.0,
                life_span: 25,
                bullet_speed: 30.0,
                ..base
            },
            WeaponKind::Shotgun => Weapon {
                bullet_kind: ProjectileKind::EnergyBullet,
                bullet_num: 3,
                cd_max: 40,
                energy_cost: 15.0,
                damage: 40.0,
                life_span: 10,
                ..base
            },
            WeaponKind::Rocket => Weapon {
                bullet_kind: ProjectileKind::Missile,
                cd_max: 40,
                energy_cost: 30.0,
                damage: 60.0,
                bullet_speed: 15.0,
                life_span: 40,
                ..base
            },
            WeaponKind::Wall => Weapon {
                cd_max: CD_MIN,
                energy_cost: 10.0,
                damage: 0.0,
                health: 200.0,
                ..base
            },
            WeaponKind::Barrel => Weapon {
                energy_cost: 20.0,
                damage: 80.0,
                health: 1.0,
                ..base
            },
            WeaponKind::Mine => Weapon {
                energy_cost: 15.0,
                damage: 60.0,
                health: 1.0,
                ..base
            },
        }
    }
}

/// Maps a weapon and an aim direction to projectile velocities (units per tick)
type FirePattern = fn(&Weapon, Vec2) -> Vec<Vec2>;

fn single_shot(weapon: &Weapon, aim: Vec2) -> Vec<Vec2> {
    vec![safe_normalize(aim) * weapon.bullet_speed]
}

/// `bullet_num` shots fanned symmetrically about the aim direction
fn spread_shot(weapon: &Weapon, aim: Vec2) -> Vec<Vec2> {
    let n = weapon.bullet_num.max(1) as f32;
    (1..=weapon.bullet_num.max(1))
        .map(|i| {
            let angle = (-0.02 + 0.04 * i as f32 / (n + 1.0)) * n;
            safe_normalize(rotate(aim, angle)) * weapon.bullet_speed
        })
        .collect()
}

/// One projectile a weapon asks the world to spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub kind: ProjectileKind,
    /// Units per tick
    pub velocity: Vec2,
    pub damage: f32,
    pub life_span: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub damage: f32,
    pub cd_max: i32,
    /// Ticks until the weapon may fire again
    pub cooldown: i32,
    /// Units per tick
    pub bullet_speed: f32,
    pub life_span: i32,
    pub energy_cost: f32,
    pub bullet_num: u32,
    pub bullet_kind: ProjectileKind,
    pub is_gun: bool,
    /// Hit points of the placeable this weapon builds
    pub health: f32,
    pub facing_right: bool,
    pub rotation: f32,
    /// Last aim direction
    pub aim: Vec2,
    pub position: Vec2,
}

impl Weapon {
    pub fn tick_cooldown(&mut self) {
        self.cooldown = (self.cooldown - 1).max(0);
    }

    /// Point the weapon at `aim` from `position`
    pub fn aim_at(&mut self, position: Vec2, aim: Vec2) {
        self.position = position;
        self.aim = aim;
        let sin = safe_normalize(aim).y.clamp(-1.0, 1.0);
        self.facing_right = aim.x >= 0.0;
        self.rotation = if self.facing_right { sin.asin() } else { -sin.asin() };
    }

    /// Check cooldown and energy without changing anything
    pub fn ready(&self, energy: f32) -> Result<(), ActionError> {
        if self.cooldown > 0 {
            return Err(ActionError::CooldownActive);
        }
        if energy < self.energy_cost {
            return Err(ActionError::InsufficientEnergy);
        }
        Ok(())
    }

    /// Pay the energy cost and restart the cooldown
    pub fn commit(&mut self, energy: &mut f32) {
        *energy -= self.energy_cost;
        self.cooldown = self.cd_max;
    }

    /// Fire at `aim`; on success returns the projectiles to spawn
    pub fn fire(&mut self, energy: &mut f32, aim: Vec2) -> Result<Vec<Shot>, ActionError> {
        if !self.is_gun {
            return Err(ActionError::NotAPlaceable);
        }
        self.ready(*energy)?;
        self.commit(energy);
        let pattern = self.kind.fire_pattern();
        Ok(pattern(self, aim)
            .into_iter()
            .map(|velocity| Shot {
                kind: self.bullet_kind,
                velocity,
                damage: self.damage,
                life_span: self.life_span,
            })
            .collect())
    }
}

/// Parameter arena holding one weapon record per kind
///
/// The player's inventory lists the owned kinds; the shop mutates records
/// here by kind, so nothing holds a reference into the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arsenal {
    weapons: [Weapon; 7],
}

impl Default for Arsenal {
    fn default() -> Self {
        Self {
            weapons: WeaponKind::ALL.map(WeaponKind::defaults),
        }
    }
}

impl Arsenal {
    pub fn get(&self, kind: WeaponKind) -> &Weapon {
        &self.weapons[kind.index()]
    }

    pub fn get_mut(&mut self, kind: WeaponKind) -> &mut Weapon {
        &mut self.weapons[kind.index()]
    }

    pub fn reset(&mut self, kind: WeaponKind) {
        self.weapons[kind.index()] = kind.defaults();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pistol_fires_free_and_cools_down() {
        let mut pistol = WeaponKind::Pistol.defaults();
        let mut energy = 0.0;
        let shots = pistol.fire(&mut energy, Vec2::new(0.0, 2.0)).unwrap();
        assert_eq!(shots.len(), 1);
        assert!((shots[0].velocity - Vec2::new(0.0, 25.0)).length() < 1e-4);
        assert_eq!(pistol.cooldown, 30);
        assert_eq!(
            pistol.fire(&mut energy, Vec2::X),
            Err(ActionError::CooldownActive)
        );
    }

    #[test]
    fn test_uzi_needs_energy() {
        let mut uzi = WeaponKind::Uzi.defaults();
        let mut energy = 3.0;
        assert_eq!(uzi.fire(&mut energy, Vec2::X), Err(ActionError::InsufficientEnergy));
        assert_eq!(energy, 3.0);
        assert_eq!(uzi.cooldown, 0);
        energy = 10.0;
        let shots = uzi.fire(&mut energy, Vec2::X).unwrap();
        assert_eq!(shots[0].kind, ProjectileKind::EnergyBullet);
        assert_eq!(energy, 6.0);
        assert_eq!(uzi.cooldown, 20);
    }

    #[test]
    fn test_shotgun_spread_is_symmetric() {
        let mut shotgun = WeaponKind::Shotgun.defaults();
        let mut energy = 100.0;
        let shots = shotgun.fire(&mut energy, Vec2::X).unwrap();
        assert_eq!(shots.len(), 3);
        assert!(shots.iter().all(|s| s.velocity.x > 0.0));
        let sum_y: f32 = shots.iter().map(|s| s.velocity.y).sum();
        assert!(sum_y.abs() < 1e-4);
        assert!(shots[0].velocity.y < 0.0 && shots[2].velocity.y > 0.0);
    }

    #[test]
    fn test_rocket_multi_missiles_spread() {
        let mut rocket = WeaponKind::Rocket.defaults();
        rocket.bullet_num = 2;
        let mut energy = 100.0;
        let shots = rocket.fire(&mut energy, Vec2::X).unwrap();
        assert_eq!(shots.len(), 2);
        assert!(shots[0].velocity != shots[1].velocity);
        assert!(shots.iter().all(|s| s.kind == ProjectileKind::Missile));
    }

    #[test]
    fn test_placeable_cannot_fire() {
        let mut wall = WeaponKind::Wall.defaults();
        let mut energy = 100.0;
        assert_eq!(wall.fire(&mut energy, Vec2::X), Err(ActionError::NotAPlaceable));
        assert_eq!(wall.cd_max, 4);
    }

    #[test]
    fn test_aim_orientation() {
        let mut w = WeaponKind::Pistol.defaults();
        w.aim_at(Vec2::ZERO, Vec2::new(1.0, 1.0));
        assert!(w.facing_right);
        assert!((w.rotation - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
        w.aim_at(Vec2::ZERO, Vec2::new(-1.0, 1.0));
        assert!(!w.facing_right);
        assert!((w.rotation + std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut w = WeaponKind::Pistol.defaults();
        w.tick_cooldown();
        assert_eq!(w.cooldown, 0);
    }

    #[test]
    fn test_arsenal_reset() {
        let mut arsenal = Arsenal::default();
        arsenal.get_mut(WeaponKind::Uzi).damage = 999.0;
        arsenal.reset(WeaponKind::Uzi);
        assert_eq!(arsenal.get(WeaponKind::Uzi), &WeaponKind::Uzi.defaults());
    }
}
