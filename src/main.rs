//! Room Siege headless runner
//!
//! Seeds a world and lets a simple autopilot play it: aim at the nearest
//! enemy, hold fire, leave the shop as soon as it opens. Useful for smoke
//! runs and for reproducing a seed.
//!
//! Usage:
//!   room-siege --seed 7 --ticks 20000 --settings settings.json
//!   RUST_LOG=debug room-siege --assets ./assets

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glam::Vec2;

use room_siege::assets::load_assets;
use room_siege::audio::NullAudio;
use room_siege::platform::{InputEvent, MouseButton};
use room_siege::sim::{WavePhase, World};
use room_siege::{Game, Settings};

#[derive(Parser)]
#[command(name = "room-siege")]
#[command(about = "Run a seeded Room Siege game with an autopilot")]
struct Args {
    /// World seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Maximum number of simulation ticks
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// Settings file (rewritten with defaults when missing or invalid)
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,
    /// Asset root to verify before starting
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn nearest_enemy(world: &World) -> Option<Vec2> {
    let me = world.player_pos();
    world
        .enemies
        .values()
        .filter_map(|e| world.physics.position(e.body))
        .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Room Siege (headless) starting, seed {}", args.seed);

    if let Some(dir) = &args.assets {
        load_assets(dir).with_context(|| format!("loading assets from {}", dir.display()))?;
    }
    let settings = Settings::load(&args.settings);
    let mut game = Game::new(args.seed, settings, Box::new(NullAudio));
    game.handle_event(InputEvent::MouseDown(MouseButton::Left));

    for _ in 0..args.ticks {
        match game.phase() {
            WavePhase::Win | WavePhase::Lost => break,
            WavePhase::PreWave(_) | WavePhase::PostWave(_) => game.confirm(),
            WavePhase::InWave(_) => {}
        }
        if let Some(target) = nearest_enemy(&game.world) {
            game.handle_event(InputEvent::MouseMove(target));
        }
        game.step();
    }

    let hud = game.snapshot().hud;
    log::info!(
        "finished after {} ticks in {:?}",
        game.world.time_ticks,
        hud.phase
    );
    let summary = serde_json::to_string_pretty(&hud).context("serializing summary")?;
    println!("{summary}");
    Ok(())
}
