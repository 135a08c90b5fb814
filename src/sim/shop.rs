//! Between-wave shop: catalog, offers and item effects
//!
//! The catalog (`cur_item_list`) is the set of items that may be offered.
//! Four of them are drawn per visit, each with a luck-weighted quality roll
//! and a wave-scaled price. Effects mutate the player by weapon kind through
//! the arsenal, and may grow or shrink the catalog as weapons come and go.
//!
//! Every effect checks its preconditions before touching anything, so a
//! rejected purchase leaves the player and the catalog exactly as they were.

use rand::Rng;
use rand::seq::index::sample;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::Player;
use super::weapon::WeaponKind;
use crate::ActionError;
use crate::consts::*;

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    IncreaseHealth,
    IncreaseSpeed,
    IncreaseLuck,
    IncreaseEnergy,
    IncreaseKillRecover,
    IncreaseExplosionDamage,
    MinusHealth,
    MinusSpeed,
    MinusLuck,
    MinusEnergy,
    Get(WeaponKind),
    Sell(WeaponKind),
    WeaponDamage(WeaponKind),
    WeaponCooldown(WeaponKind),
    WeaponCost(WeaponKind),
    WeaponSpeed(WeaponKind),
    WeaponBullets(WeaponKind),
    WallHealth,
    MultiExplosion(WeaponKind),
}

/// Waves on which the acquisition item for each weapon joins the catalog
const UNLOCKS: [(WeaponKind, u32); 5] = [
    (WeaponKind::Shotgun, 3),
    (WeaponKind::Wall, 4),
    (WeaponKind::Barrel, 5),
    (WeaponKind::Mine, 6),
    (WeaponKind::Rocket, 7),
];

fn weapon_price(kind: WeaponKind) -> i32 {
    match kind {
        WeaponKind::Pistol => 0,
        WeaponKind::Uzi => 5,
        WeaponKind::Shotgun => 8,
        WeaponKind::Rocket => 10,
        WeaponKind::Wall => 4,
        WeaponKind::Barrel | WeaponKind::Mine => 6,
    }
}

impl ItemKind {
    /// `(base_value, base_cost, rolls_quality)`
    fn base(self) -> (f32, i32, bool) {
        match self {
            ItemKind::IncreaseHealth => (50.0, 3, true),
            ItemKind::IncreaseSpeed => (50.0, 3, true),
            ItemKind::IncreaseLuck => (5.0, 4, true),
            ItemKind::IncreaseEnergy => (20.0, 3, true),
            ItemKind::IncreaseKillRecover => (1.0, 4, true),
            ItemKind::IncreaseExplosionDamage => (10.0, 4, true),
            ItemKind::MinusHealth => (50.0, -2, true),
            ItemKind::MinusSpeed => (50.0, -2, true),
            ItemKind::MinusLuck => (5.0, -2, true),
            ItemKind::MinusEnergy => (20.0, -2, true),
            ItemKind::Get(kind) => (0.0, weapon_price(kind), false),
            ItemKind::Sell(kind) => (0.0, -(weapon_price(kind) / 2).max(1), false),
            ItemKind::WeaponDamage(_) => (5.0, 3, true),
            ItemKind::WeaponCooldown(_) => (2.0, 4, true),
            ItemKind::WeaponCost(_) => (1.0, 3, true),
            ItemKind::WeaponSpeed(_) => (3.0, 2, true),
            ItemKind::WeaponBullets(_) => (1.0, 8, false),
            ItemKind::WallHealth => (50.0, 2, true),
            ItemKind::MultiExplosion(_) => (0.0, 10, false),
        }
    }

    pub fn base_value(self) -> f32 {
        self.base().0
    }

    pub fn base_cost(self) -> i32 {
        self.base().1
    }

    /// Quality slot of the catalog entry: -1 for fixed items, else 1
    pub fn quality(self) -> i8 {
        if self.base().2 { 1 } else { -1 }
    }

    /// Weapon this item belongs to, if any
    pub fn weapon(self) -> Option<WeaponKind> {
        match self {
            ItemKind::Get(k)
            | ItemKind::Sell(k)
            | ItemKind::WeaponDamage(k)
            | ItemKind::WeaponCooldown(k)
            | ItemKind::WeaponCost(k)
            | ItemKind::WeaponSpeed(k)
            | ItemKind::WeaponBullets(k)
            | ItemKind::MultiExplosion(k) => Some(k),
            ItemKind::WallHealth => Some(WeaponKind::Wall),
            _ => None,
        }
    }

    pub fn image_id(self) -> String {
        match self.weapon() {
            Some(kind) => format!("item_{}", kind.name()),
            None => format!("item_{}", self.slug()),
        }
    }

    /// Localisation key for the item's description
    pub fn description_key(self) -> String {
        match self.weapon() {
            Some(kind) if self != ItemKind::WallHealth => {
                format!("{}_{}", self.slug(), kind.name())
            }
            _ => self.slug().to_string(),
        }
    }

    fn slug(self) -> &'static str {
        match self {
            ItemKind::IncreaseHealth => "increase_health",
            ItemKind::IncreaseSpeed => "increase_speed",
            ItemKind::IncreaseLuck => "increase_luck",
            ItemKind::IncreaseEnergy => "increase_energy",
            ItemKind::IncreaseKillRecover => "increase_kill_recover",
            ItemKind::IncreaseExplosionDamage => "increase_explosion_damage",
            ItemKind::MinusHealth => "minus_health",
            ItemKind::MinusSpeed => "minus_speed",
            ItemKind::MinusLuck => "minus_luck",
            ItemKind::MinusEnergy => "minus_energy",
            ItemKind::Get(_) => "get",
            ItemKind::Sell(_) => "sell",
            ItemKind::WeaponDamage(_) => "increase_damage",
            ItemKind::WeaponCooldown(_) => "decrease_cooldown",
            ItemKind::WeaponCost(_) => "decrease_cost",
            ItemKind::WeaponSpeed(_) => "increase_bullet_speed",
            ItemKind::WeaponBullets(_) => "increase_bullets",
            ItemKind::WallHealth => "increase_wall_health",
            ItemKind::MultiExplosion(_) => "multi_explosion",
        }
    }
}

/// Items that arrive with a weapon and leave when it is sold
pub fn upgrade_items(kind: WeaponKind) -> Vec<ItemKind> {
    use ItemKind::*;
    match kind {
        WeaponKind::Pistol => vec![WeaponDamage(kind), WeaponCooldown(kind), WeaponSpeed(kind)],
        WeaponKind::Uzi => vec![
            WeaponDamage(kind),
            WeaponCooldown(kind),
            WeaponCost(kind),
            WeaponSpeed(kind),
            Sell(kind),
        ],
        WeaponKind::Shotgun => vec![
            WeaponDamage(kind),
            WeaponCooldown(kind),
            WeaponCost(kind),
            WeaponBullets(kind),
            Sell(kind),
        ],
        WeaponKind::Rocket => vec![
            WeaponDamage(kind),
            WeaponCooldown(kind),
            WeaponCost(kind),
            WeaponBullets(kind),
            MultiExplosion(kind),
            Sell(kind),
        ],
        WeaponKind::Wall => vec![WallHealth, WeaponCost(kind), Sell(kind)],
        WeaponKind::Barrel | WeaponKind::Mine => vec![
            WeaponDamage(kind),
            WeaponCooldown(kind),
            WeaponCost(kind),
            MultiExplosion(kind),
            Sell(kind),
        ],
    }
}

/// Catalog at the start of a run
pub fn initial_catalog() -> Vec<ItemKind> {
    let mut catalog = vec![
        ItemKind::IncreaseHealth,
        ItemKind::IncreaseSpeed,
        ItemKind::IncreaseLuck,
        ItemKind::IncreaseEnergy,
        ItemKind::IncreaseKillRecover,
        ItemKind::MinusHealth,
        ItemKind::MinusSpeed,
        ItemKind::MinusLuck,
        ItemKind::MinusEnergy,
        ItemKind::Get(WeaponKind::Uzi),
    ];
    catalog.extend(upgrade_items(WeaponKind::Pistol));
    catalog
}

/// Quality for a roll `r` in `[0, 99)`
pub fn roll_quality(r: i32, wave: u32, luck: i32) -> i8 {
    let bias = wave as i32 + luck;
    if r < 5 + bias {
        3
    } else if r < 5 + 2 * bias {
        2
    } else {
        1
    }
}

/// Effect multiplier for a rolled quality
pub fn quality_factor(quality: i8) -> f32 {
    match quality {
        3 => 4.0,
        2 => 2.0,
        _ => 1.0,
    }
}

/// One priced item on the shelf
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub kind: ItemKind,
    pub value: f32,
    /// Negative costs pay the player
    pub cost: i32,
    pub quality: i8,
}

impl Offer {
    /// Price an item for this wave, rolling quality where the item allows it
    pub fn roll(kind: ItemKind, wave: u32, luck: i32, rng: &mut Pcg32) -> Self {
        let cost = kind.base_cost() * wave.max(1) as i32 * 2;
        if kind.quality() == -1 {
            return Self {
                kind,
                value: kind.base_value(),
                cost,
                quality: -1,
            };
        }
        let quality = roll_quality(rng.random_range(0..99), wave, luck);
        Self {
            kind,
            value: kind.base_value() * quality_factor(quality),
            cost: cost * quality as i32,
            quality,
        }
    }
}

/// Apply an item's effect; false means nothing changed
pub fn apply_effect(
    kind: ItemKind,
    value: f32,
    player: &mut Player,
    catalog: &mut Vec<ItemKind>,
) -> bool {
    match kind {
        ItemKind::IncreaseHealth => {
            if player.health >= HEALTH_MAX {
                return false;
            }
            player.heal(value);
        }
        ItemKind::IncreaseSpeed => player.speed += value,
        ItemKind::IncreaseLuck => {
            if player.luck >= LUCK_LIMIT {
                return false;
            }
            player.luck = (player.luck + value as i32).min(LUCK_LIMIT);
        }
        ItemKind::IncreaseEnergy => {
            if player.energy_max >= ENERGY_LIMIT {
                return false;
            }
            player.energy_max = (player.energy_max + value).min(ENERGY_LIMIT);
            player.energy = (player.energy + value).min(player.energy_max);
        }
        ItemKind::IncreaseKillRecover => player.kill_recover += value,
        ItemKind::IncreaseExplosionDamage => player.explosion_damage += value,
        ItemKind::MinusHealth => {
            if player.health <= value {
                return false;
            }
            player.health -= value;
        }
        ItemKind::MinusSpeed => {
            if player.speed - value < SPEED_MIN {
                return false;
            }
            player.speed -= value;
        }
        ItemKind::MinusLuck => {
            if player.luck <= value as i32 - (LUCK_LIMIT + 1) {
                return false;
            }
            player.luck -= value as i32;
        }
        ItemKind::MinusEnergy => {
            if player.energy_max < value {
                return false;
            }
            player.energy_max -= value;
            player.energy = player.energy.min(player.energy_max);
        }
        ItemKind::Get(weapon) => return acquire(weapon, player, catalog),
        ItemKind::Sell(weapon) => return sell(weapon, player, catalog),
        ItemKind::WeaponDamage(weapon) => {
            if !player.owns(weapon) {
                return false;
            }
            player.arsenal.get_mut(weapon).damage += value;
        }
        ItemKind::WeaponCooldown(weapon) => {
            let w = player.arsenal.get(weapon);
            if !player.owns(weapon) || w.cd_max <= CD_MIN {
                return false;
            }
            let w = player.arsenal.get_mut(weapon);
            w.cd_max = (w.cd_max - value as i32).max(CD_MIN);
        }
        ItemKind::WeaponCost(weapon) => {
            if !player.owns(weapon) || player.arsenal.get(weapon).energy_cost <= 0.0 {
                return false;
            }
            let w = player.arsenal.get_mut(weapon);
            w.energy_cost = (w.energy_cost - value).max(0.0);
        }
        ItemKind::WeaponSpeed(weapon) => {
            if !player.owns(weapon) {
                return false;
            }
            player.arsenal.get_mut(weapon).bullet_speed += value;
        }
        ItemKind::WeaponBullets(weapon) => {
            if !player.owns(weapon) {
                return false;
            }
            player.arsenal.get_mut(weapon).bullet_num += value.max(1.0) as u32;
            if weapon == WeaponKind::Rocket {
                catalog.retain(|&i| i != kind);
            }
        }
        ItemKind::WallHealth => {
            if !player.owns(WeaponKind::Wall) {
                return false;
            }
            player.arsenal.get_mut(WeaponKind::Wall).health += value;
        }
        ItemKind::MultiExplosion(weapon) => {
            if !player.owns(weapon) || player.multi_for(weapon) {
                return false;
            }
            match weapon {
                WeaponKind::Rocket => player.is_rocket_multi = true,
                WeaponKind::Barrel => player.is_barrel_multi = true,
                WeaponKind::Mine => player.is_mine_multi = true,
                _ => return false,
            }
            catalog.retain(|&i| i != kind);
        }
    }
    true
}

fn acquire(weapon: WeaponKind, player: &mut Player, catalog: &mut Vec<ItemKind>) -> bool {
    if player.owns(weapon) {
        return false;
    }
    player.inventory.push(weapon);
    catalog.retain(|&i| i != ItemKind::Get(weapon));
    for item in upgrade_items(weapon) {
        if !catalog.contains(&item) {
            catalog.push(item);
        }
    }
    if weapon.is_explosive() && !catalog.contains(&ItemKind::IncreaseExplosionDamage) {
        catalog.push(ItemKind::IncreaseExplosionDamage);
    }
    true
}

fn sell(weapon: WeaponKind, player: &mut Player, catalog: &mut Vec<ItemKind>) -> bool {
    let Some(slot) = player.inventory.iter().position(|&k| k == weapon) else {
        return false;
    };
    if weapon == WeaponKind::Pistol || player.inventory.len() <= 1 {
        return false;
    }
    let active = player.active_kind();
    player.inventory.remove(slot);
    player.active_weapon = active
        .and_then(|k| player.inventory.iter().position(|&i| i == k))
        .unwrap_or(0);
    player.arsenal.reset(weapon);
    match weapon {
        WeaponKind::Rocket => player.is_rocket_multi = false,
        WeaponKind::Barrel => player.is_barrel_multi = false,
        WeaponKind::Mine => player.is_mine_multi = false,
        _ => {}
    }

    catalog.retain(|i| i.weapon() != Some(weapon));
    catalog.push(ItemKind::Get(weapon));
    if !player.inventory.iter().any(|k| k.is_explosive()) {
        catalog.retain(|&i| i != ItemKind::IncreaseExplosionDamage);
    }
    true
}

/// Shop state for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Items that may be offered
    pub cur_item_list: Vec<ItemKind>,
    /// Current shelf; bought slots become `None`
    pub offers: Vec<Option<Offer>>,
    pub is_open: bool,
}

impl Default for Shop {
    fn default() -> Self {
        Self::new()
    }
}

impl Shop {
    pub fn new() -> Self {
        Self {
            cur_item_list: initial_catalog(),
            offers: Vec::new(),
            is_open: false,
        }
    }

    /// Add acquisition items for weapons unlocked by `wave`
    pub fn evolve(&mut self, wave: u32, player: &Player) {
        for (weapon, first_wave) in UNLOCKS {
            let item = ItemKind::Get(weapon);
            if wave >= first_wave && !player.owns(weapon) && !self.cur_item_list.contains(&item) {
                self.cur_item_list.push(item);
            }
        }
    }

    /// Draw up to four distinct catalog items and price them
    pub fn generate_offers(&mut self, wave: u32, luck: i32, rng: &mut Pcg32) {
        let n = self.cur_item_list.len().min(OFFER_COUNT);
        let picks = sample(rng, self.cur_item_list.len(), n).into_vec();
        self.offers = picks
            .into_iter()
            .map(|i| Some(Offer::roll(self.cur_item_list[i], wave, luck, rng)))
            .collect();
    }

    pub fn open(&mut self, wave: u32, player: &Player, rng: &mut Pcg32) {
        self.evolve(wave, player);
        self.generate_offers(wave, player.luck, rng);
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.offers.clear();
    }

    /// Buy the offer in `slot`
    pub fn purchase(&mut self, slot: usize, player: &mut Player) -> Result<ItemKind, ActionError> {
        if !self.is_open {
            return Err(ActionError::ShopClosed);
        }
        let offer = self
            .offers
            .get(slot)
            .copied()
            .flatten()
            .ok_or(ActionError::NoSuchOffer(slot))?;

        let money = i64::from(player.money);
        let cost = i64::from(offer.cost);
        if cost > money {
            return Err(ActionError::InsufficientMoney {
                need: offer.cost.max(0) as u32,
                have: player.money,
            });
        }
        if !apply_effect(offer.kind, offer.value, player, &mut self.cur_item_list) {
            return Err(ActionError::EffectRejected);
        }
        player.money = (money - cost).clamp(0, i64::from(u32::MAX)) as u32;
        self.offers[slot] = None;
        Ok(offer.kind)
    }

    /// Pay to redraw the shelf
    pub fn refresh(
        &mut self,
        player: &mut Player,
        wave: u32,
        rng: &mut Pcg32,
    ) -> Result<(), ActionError> {
        if !self.is_open {
            return Err(ActionError::ShopClosed);
        }
        let cost = REFRESH_COST * wave.max(1);
        if player.money < cost {
            return Err(ActionError::InsufficientMoney {
                need: cost,
                have: player.money,
            });
        }
        player.money -= cost;
        self.generate_offers(wave, player.luck, rng);
        Ok(())
    }
}
