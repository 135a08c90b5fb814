//! Wave director
//!
//! `PreWave(n)` waits for the player to confirm, `InWave(n)` releases
//! cohorts until the wave's quota is out and every enemy is dead,
//! `PostWave(n)` holds while the shop is open. Clearing the last wave wins;
//! dying at any point loses.

use serde::{Deserialize, Serialize};

use super::entity::EnemyVariant;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    PreWave(u32),
    InWave(u32),
    PostWave(u32),
    Win,
    Lost,
}

impl WavePhase {
    pub fn wave(self) -> Option<u32> {
        match self {
            WavePhase::PreWave(n) | WavePhase::InWave(n) | WavePhase::PostWave(n) => Some(n),
            WavePhase::Win | WavePhase::Lost => None,
        }
    }

    pub fn is_over(self) -> bool {
        matches!(self, WavePhase::Win | WavePhase::Lost)
    }
}

/// Size and composition of a wave
#[derive(Debug, Clone, PartialEq)]
pub struct WavePlan {
    pub total: u32,
    pub cohort_size: u32,
    /// Variants eligible to spawn, oldest first
    pub variants: Vec<EnemyVariant>,
}

impl WavePlan {
    pub fn for_wave(n: u32) -> Self {
        let n = n.max(1);
        Self {
            total: 4 + 3 * n,
            cohort_size: 2 + n / 2,
            variants: EnemyVariant::ALL
                .into_iter()
                .filter(|v| v.first_wave() <= n)
                .collect(),
        }
    }
}

/// What the world should do after a director update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveSignal {
    Idle,
    /// Spawn this many enemies of wave `n`
    SpawnCohort { wave: u32, count: u32 },
    /// Wave `wave` is clear; pay `award` and open the shop
    Cleared { wave: u32, award: u32 },
    /// Final wave cleared
    Won { award: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDirector {
    pub phase: WavePhase,
    /// Enemies released so far this wave
    pub spawned: u32,
    /// Kills credited this wave
    pub kills: u32,
    /// Ticks until the next cohort
    pub cohort_timer: u32,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            phase: WavePhase::PreWave(1),
            spawned: 0,
            kills: 0,
            cohort_timer: 0,
        }
    }

    /// Start the pending wave; false outside `PreWave`
    pub fn confirm(&mut self) -> bool {
        let WavePhase::PreWave(n) = self.phase else {
            return false;
        };
        self.phase = WavePhase::InWave(n);
        self.spawned = 0;
        self.kills = 0;
        self.cohort_timer = 0;
        log::info!("wave {n} started");
        true
    }

    /// Leave the shop for the next wave; false outside `PostWave`
    pub fn close_shop(&mut self) -> bool {
        let WavePhase::PostWave(n) = self.phase else {
            return false;
        };
        self.phase = WavePhase::PreWave(n + 1);
        true
    }

    /// Enter `Lost`; false if the run had already ended
    pub fn lose(&mut self) -> bool {
        if self.phase.is_over() {
            return false;
        }
        self.phase = WavePhase::Lost;
        true
    }

    pub fn record_kill(&mut self) {
        if matches!(self.phase, WavePhase::InWave(_)) {
            self.kills += 1;
        }
    }

    /// Advance one tick given the number of living enemies
    pub fn update(&mut self, alive: usize) -> WaveSignal {
        let WavePhase::InWave(n) = self.phase else {
            return WaveSignal::Idle;
        };
        let plan = WavePlan::for_wave(n);

        if self.spawned < plan.total {
            if self.cohort_timer > 0 {
                self.cohort_timer -= 1;
                return WaveSignal::Idle;
            }
            let count = plan.cohort_size.min(plan.total - self.spawned);
            self.spawned += count;
            self.cohort_timer = COHORT_INTERVAL;
            return WaveSignal::SpawnCohort { wave: n, count };
        }
        if alive > 0 {
            return WaveSignal::Idle;
        }

        let award = WAVE_AWARD_BASE * n + self.kills * WAVE_AWARD_PER_KILL;
        if n >= N_MAX {
            self.phase = WavePhase::Win;
            log::info!("final wave {n} cleared");
            return WaveSignal::Won { award };
        }
        self.phase = WavePhase::PostWave(n);
        log::info!("wave {n} cleared with {} kills", self.kills);
        WaveSignal::Cleared { wave: n, award }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(director: &mut WaveDirector) -> u32 {
        let mut spawned = 0;
        for _ in 0..10_000 {
            match director.update(spawned as usize) {
                WaveSignal::SpawnCohort { count, .. } => spawned += count,
                WaveSignal::Idle if director.spawned == WavePlan::for_wave(1).total => break,
                _ => {}
            }
        }
        spawned
    }

    #[test]
    fn test_confirm_only_from_prewave() {
        let mut d = WaveDirector::new();
        assert!(!d.close_shop());
        assert!(d.confirm());
        assert_eq!(d.phase, WavePhase::InWave(1));
        assert!(!d.confirm());
    }

    #[test]
    fn test_cohorts_until_quota() {
        let mut d = WaveDirector::new();
        d.confirm();
        let plan = WavePlan::for_wave(1);
        assert_eq!(drain(&mut d), plan.total);
        // Enemies still alive: the wave holds
        assert_eq!(d.update(3), WaveSignal::Idle);
        assert_eq!(d.phase, WavePhase::InWave(1));
    }

    #[test]
    fn test_clear_awards_and_opens_shop() {
        let mut d = WaveDirector::new();
        d.confirm();
        drain(&mut d);
        for _ in 0..5 {
            d.record_kill();
        }
        assert_eq!(
            d.update(0),
            WaveSignal::Cleared {
                wave: 1,
                award: WAVE_AWARD_BASE + 5 * WAVE_AWARD_PER_KILL
            }
        );
        assert_eq!(d.phase, WavePhase::PostWave(1));
        assert!(d.close_shop());
        assert_eq!(d.phase, WavePhase::PreWave(2));
    }

    #[test]
    fn test_final_wave_wins() {
        let mut d = WaveDirector {
            phase: WavePhase::InWave(N_MAX),
            spawned: WavePlan::for_wave(N_MAX).total,
            kills: 0,
            cohort_timer: 0,
        };
        assert!(matches!(d.update(0), WaveSignal::Won { .. }));
        assert_eq!(d.phase, WavePhase::Win);
        assert!(!d.lose());
    }

    #[test]
    fn test_variant_mix_grows() {
        assert_eq!(WavePlan::for_wave(1).variants, vec![EnemyVariant::White]);
        assert_eq!(WavePlan::for_wave(4).variants.len(), 4);
        assert_eq!(WavePlan::for_wave(N_MAX).variants.len(), EnemyVariant::ALL.len());
        assert!(WavePlan::for_wave(5).total > WavePlan::for_wave(4).total);
    }
}
