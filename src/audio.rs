//! Audio cues for an external sound backend
//!
//! The game only names sounds; a host-provided [`AudioSink`] plays them.
//! [`AudioManager`] applies the settings volume and rate-limits explosions.

use crate::consts::EXPLOSION_SOUND_INTERVAL;
use crate::settings::Settings;
use crate::sim::WeaponKind;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Menu button pressed
    Button,
    /// Barrel, mine or missile went off
    Explosion,
    /// Shop shelf redrawn
    Refresh,
    /// Item bought
    Purchase,
    /// Purchase or refresh refused
    PurchaseFail,
    /// Wave started
    RoundStart,
    /// Player died
    GameOver,
    /// Final wave cleared
    GameWin,
    /// Weapon fired or placeable built
    Fire(WeaponKind),
}

impl SoundEffect {
    /// Asset name of the effect
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Button => "button",
            SoundEffect::Explosion => "explosion",
            SoundEffect::Refresh => "refresh",
            SoundEffect::Purchase => "purchase",
            SoundEffect::PurchaseFail => "purchase_fail",
            SoundEffect::RoundStart => "round_start",
            SoundEffect::GameOver => "game_over",
            SoundEffect::GameWin => "game_win",
            SoundEffect::Fire(kind) => kind.name(),
        }
    }

    /// Every named effect the host must be able to load
    pub fn all() -> Vec<SoundEffect> {
        let mut all = vec![
            SoundEffect::Button,
            SoundEffect::Explosion,
            SoundEffect::Refresh,
            SoundEffect::Purchase,
            SoundEffect::PurchaseFail,
            SoundEffect::RoundStart,
            SoundEffect::GameOver,
            SoundEffect::GameWin,
        ];
        all.extend(WeaponKind::ALL.map(SoundEffect::Fire));
        all
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicTrack {
    Start,
    Game,
}

impl MusicTrack {
    pub fn name(&self) -> &'static str {
        match self {
            MusicTrack::Start => "start_music",
            MusicTrack::Game => "game_music",
        }
    }
}

/// Playback backend supplied by the host
pub trait AudioSink {
    fn play_effect(&mut self, effect: SoundEffect, volume: f32);
    fn play_music(&mut self, track: MusicTrack, volume: f32);
    fn set_music_volume(&mut self, volume: f32);
}

/// Sink that drops everything (headless runs, tests)
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_effect(&mut self, _effect: SoundEffect, _volume: f32) {}
    fn play_music(&mut self, _track: MusicTrack, _volume: f32) {}
    fn set_music_volume(&mut self, _volume: f32) {}
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    effect_volume: f32,
    music_volume: f32,
    /// Ticks until another explosion may sound
    explosion_sound_cnt: u32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(NullAudio), &Settings::default())
    }
}

impl AudioManager {
    pub fn new(sink: Box<dyn AudioSink>, settings: &Settings) -> Self {
        Self {
            sink,
            effect_volume: settings.effect_gain(),
            music_volume: settings.music_gain(),
            explosion_sound_cnt: 0,
        }
    }

    /// Pick up changed volumes
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.effect_volume = settings.effect_gain();
        self.music_volume = settings.music_gain();
        self.sink.set_music_volume(self.music_volume);
    }

    /// Advance rate-limit counters by one simulation tick
    pub fn tick(&mut self) {
        self.explosion_sound_cnt = self.explosion_sound_cnt.saturating_sub(1);
    }

    /// Play a sound effect; returns false if it was rate-limited
    pub fn play(&mut self, effect: SoundEffect) -> bool {
        if effect == SoundEffect::Explosion {
            if self.explosion_sound_cnt > 0 {
                return false;
            }
            self.explosion_sound_cnt = EXPLOSION_SOUND_INTERVAL;
        }
        self.sink.play_effect(effect, self.effect_volume);
        true
    }

    pub fn play_start_music(&mut self) {
        self.sink.play_music(MusicTrack::Start, self.music_volume);
    }

    pub fn play_game_music(&mut self) {
        self.sink.play_music(MusicTrack::Game, self.music_volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<(&'static str, f32)>>>);

    impl AudioSink for Recorder {
        fn play_effect(&mut self, effect: SoundEffect, volume: f32) {
            self.0.borrow_mut().push((effect.name(), volume));
        }
        fn play_music(&mut self, track: MusicTrack, volume: f32) {
            self.0.borrow_mut().push((track.name(), volume));
        }
        fn set_music_volume(&mut self, _volume: f32) {}
    }

    #[test]
    fn test_explosion_rate_limited() {
        let rec = Recorder::default();
        let mut audio = AudioManager::new(Box::new(rec.clone()), &Settings::default());
        assert!(audio.play(SoundEffect::Explosion));
        assert!(!audio.play(SoundEffect::Explosion));
        // Other effects are never limited
        assert!(audio.play(SoundEffect::Fire(WeaponKind::Pistol)));
        for _ in 0..EXPLOSION_SOUND_INTERVAL - 1 {
            audio.tick();
            assert!(!audio.play(SoundEffect::Explosion));
        }
        audio.tick();
        assert!(audio.play(SoundEffect::Explosion));
        let names: Vec<_> = rec.0.borrow().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["explosion", "pistol", "explosion"]);
    }

    #[test]
    fn test_volume_from_settings() {
        let rec = Recorder::default();
        let settings = Settings {
            effect_volume: 10,
            music_volume: 20,
            ..Settings::default()
        };
        let mut audio = AudioManager::new(Box::new(rec.clone()), &settings);
        audio.play(SoundEffect::Button);
        audio.play_game_music();
        assert_eq!(*rec.0.borrow(), vec![("button", 0.5), ("game_music", 1.0)]);
    }

    #[test]
    fn test_effect_names_unique() {
        let mut names: Vec<_> = SoundEffect::all().iter().map(|e| e.name()).collect();
        let n = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), n);
    }
}
