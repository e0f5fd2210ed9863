#![allow(dead_code)]

use arena_core::{GameConfig, InputSnapshot, PHYSICS_DT, Session, TickReport};

/// Default arena with a spawner that never fires on its own and enemies
/// that stand still and never shoot.
pub fn staged_config() -> GameConfig {
    let mut config = GameConfig::default_arena();
    config.enemy.count = 4;
    config.enemy.initial_count = Some(0);
    config.enemy.spawn_interval = 1.0e9;
    config.enemy.speed = 0.001;
    config.enemy.engage_range = 0.0;
    config
}

/// Session already in `Playing`.
pub fn playing(config: GameConfig, seed: u64) -> Session {
    let mut session = Session::new(config, seed).unwrap();
    session.confirm();
    session.confirm();
    assert!(session.is_playing());
    session
}

pub fn run_idle(session: &mut Session, ticks: u32) -> Vec<TickReport> {
    (0..ticks)
        .map(|_| session.tick(&InputSnapshot::idle(), PHYSICS_DT))
        .collect()
}

pub fn firing() -> InputSnapshot {
    InputSnapshot {
        fire: true,
        ..InputSnapshot::idle()
    }
}
