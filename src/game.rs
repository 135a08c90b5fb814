//! Host-facing game orchestrator
//!
//! Owns the world and everything around it that is not simulation: the
//! fixed-step scheduler, input coalescing, settings and audio cues. A host
//! feeds [`InputEvent`]s, calls [`Game::update`] once per frame with the
//! frame delta, then draws [`Game::snapshot`].

use crate::ActionError;
use crate::audio::{AudioManager, AudioSink, SoundEffect};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::platform::{InputEvent, InputState, Key};
use crate::settings::Settings;
use crate::sim::{GameEvent, ItemKind, WavePhase, World, tick};
use crate::snapshot::Snapshot;

/// Game instance holding all state
pub struct Game {
    pub world: World,
    pub settings: Settings,
    audio: AudioManager,
    input: InputState,
    accumulator: f32,
}

impl Game {
    pub fn new(seed: u64, settings: Settings, sink: Box<dyn AudioSink>) -> Self {
        Self::with_world(World::new(seed), settings, sink)
    }

    pub fn with_world(world: World, settings: Settings, sink: Box<dyn AudioSink>) -> Self {
        let mut audio = AudioManager::new(sink, &settings);
        audio.play_start_music();
        Self {
            world,
            settings,
            audio,
            input: InputState::default(),
            accumulator: 0.0,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.world.phase()
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        self.input.handle(event);
    }

    /// Run as many fixed ticks as `frame_dt` covers; returns the count
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Advance exactly one tick, ignoring the accumulator
    pub fn step(&mut self) {
        let input = self.input.tick_input();
        tick(&mut self.world, &input);
        // One-shots are consumed by the first tick that sees them
        self.input.clear_one_shots();
        self.audio.tick();
        self.route_events();
    }

    /// Start the pending wave, or leave the shop
    pub fn confirm(&mut self) {
        self.handle_event(InputEvent::KeyDown(Key::Enter));
    }

    pub fn purchase(&mut self, slot: usize) -> Result<ItemKind, ActionError> {
        let result = self.world.purchase(slot);
        self.route_events();
        result
    }

    pub fn refresh_shop(&mut self) -> Result<(), ActionError> {
        let result = self.world.refresh_shop();
        self.route_events();
        result
    }

    /// Apply changed settings (volume takes effect immediately)
    pub fn apply_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.settings = settings;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::build(&self.world)
    }

    fn route_events(&mut self) {
        for event in self.world.drain_events() {
            match event {
                GameEvent::WeaponFired { weapon } => {
                    self.audio.play(SoundEffect::Fire(weapon));
                }
                GameEvent::Placed { kind, .. } => {
                    self.audio.play(SoundEffect::Fire(kind.weapon()));
                }
                GameEvent::Explosion { .. } => {
                    self.audio.play(SoundEffect::Explosion);
                }
                GameEvent::WaveStarted(_) => {
                    self.audio.play(SoundEffect::RoundStart);
                    self.audio.play_game_music();
                }
                GameEvent::Purchased(_) => {
                    self.audio.play(SoundEffect::Purchase);
                }
                GameEvent::PurchaseFailed(_) => {
                    self.audio.play(SoundEffect::PurchaseFail);
                }
                GameEvent::Refreshed => {
                    self.audio.play(SoundEffect::Refresh);
                }
                GameEvent::GameOver => {
                    self.audio.play(SoundEffect::GameOver);
                }
                GameEvent::GameWon => {
                    self.audio.play(SoundEffect::GameWin);
                }
                GameEvent::EnemyFired { .. }
                | GameEvent::PlayerHit { .. }
                | GameEvent::EnemyKilled { .. }
                | GameEvent::WaveCleared { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MusicTrack;
    use crate::platform::MouseButton;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<&'static str>>>);

    impl AudioSink for Recorder {
        fn play_effect(&mut self, effect: SoundEffect, _volume: f32) {
            self.0.borrow_mut().push(effect.name());
        }
        fn play_music(&mut self, track: MusicTrack, _volume: f32) {
            self.0.borrow_mut().push(track.name());
        }
        fn set_music_volume(&mut self, _volume: f32) {}
    }

    fn game() -> (Game, Recorder) {
        let rec = Recorder::default();
        let game = Game::new(11, Settings::default(), Box::new(rec.clone()));
        (game, rec)
    }

    #[test]
    fn test_update_clamps_substeps() {
        let (mut game, _) = game();
        assert_eq!(game.update(SIM_DT * 0.5), 0);
        let n = game.update(5.0);
        assert!(n > 0 && n <= MAX_SUBSTEPS);
        assert!(game.world.time_ticks >= 5);
    }

    #[test]
    fn test_confirm_starts_wave_once() {
        let (mut game, rec) = game();
        game.confirm();
        game.step();
        assert_eq!(game.phase(), WavePhase::InWave(1));
        assert!(!game.input.tick_input().confirm);
        assert_eq!(
            *rec.0.borrow(),
            vec!["start_music", "round_start", "game_music"]
        );
    }

    #[test]
    fn test_firing_plays_weapon_cue() {
        let (mut game, rec) = game();
        game.handle_event(InputEvent::MouseDown(MouseButton::Left));
        game.step();
        assert!(rec.0.borrow().contains(&"pistol"));
    }

    #[test]
    fn test_shop_cues() {
        let (mut game, rec) = game();
        game.world.wave.phase = WavePhase::PostWave(1);
        game.world.open_shop(1);

        game.world.player.money = 0;
        assert!(matches!(
            game.refresh_shop(),
            Err(ActionError::InsufficientMoney { .. })
        ));
        game.world.player.money = 100;
        game.refresh_shop().unwrap();
        assert_eq!(game.world.player.money, 95);
        let cues = rec.0.borrow().clone();
        assert_eq!(&cues[cues.len() - 2..], &["purchase_fail", "refresh"]);

        // Arena stays frozen while shopping
        let ticks = game.world.time_ticks;
        game.step();
        assert_eq!(game.world.time_ticks, ticks);
        game.confirm();
        game.step();
        assert_eq!(game.phase(), WavePhase::PreWave(2));
    }

    #[test]
    fn test_snapshot_reflects_world() {
        let (game, _) = game();
        let snap = game.snapshot();
        assert_eq!(snap.hud.money, game.world.player.money);
        assert_eq!(snap.walls.len(), game.world.room.walls.len());
    }
}
