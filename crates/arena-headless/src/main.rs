//! Arena Shooter headless runner
//!
//! Loads a game configuration, plays one round with a scripted bot and logs
//! the result. Usage: `arena-headless [config.json] [max-ticks] [seed]`.
//!
//! An invalid configuration is reported and the process exits non-zero
//! before any simulation runs.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use arena_core::{AssetResolver, GameConfig, NullAssets, Session};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Bot;

mod bot;

const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 5;
const DEFAULT_SEED: u64 = 12345;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("[headless] {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<GameConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GameConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            tracing::info!("[headless] no config given, using the built-in arena");
            GameConfig::default_arena()
        }
    };
    let max_ticks = match args.next() {
        Some(value) => value.parse().context("max-ticks must be an integer")?,
        None => DEFAULT_MAX_TICKS,
    };
    let seed = match args.next() {
        Some(value) => value.parse().context("seed must be an integer")?,
        None => DEFAULT_SEED,
    };

    let dt = 1.0 / config.game_settings.target_fps;
    let mut session = Session::new(config, seed)?;
    let mut assets = AssetResolver::new(NullAssets);
    let mut bot = Bot::default();

    session.confirm();
    session.confirm();

    let mut silent_cues = 0u64;
    for tick in 0..max_ticks {
        let input = bot.input(&session);
        let report = session.tick(&input, dt);

        for cue in session.drain_audio_cues() {
            if assets.cue(cue).is_none() {
                silent_cues += 1;
            }
        }

        if report.kills > 0 {
            tracing::debug!(
                "[headless] tick {}: {} kill(s), score {}",
                tick,
                report.kills,
                session.score()
            );
        }
        if tick % 600 == 0 {
            tracing::info!(
                "[headless] tick {}: score {}, health {}, enemies {}, projectiles {}",
                tick,
                session.score(),
                session.player().health,
                session.enemies().active_count(),
                session.projectiles().len()
            );
        }
        if let Some(outcome) = report.finished {
            tracing::info!("[headless] round over after {} ticks: {:?}", tick + 1, outcome);
            break;
        }
    }

    tracing::info!(
        "[headless] final score {} ({} silent audio cues), state hash {:016x}",
        session.score(),
        silent_cues,
        session.compute_hash()
    );
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}
