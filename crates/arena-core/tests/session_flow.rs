mod common;

use arena_core::{AudioCue, GameConfig, GameState, InputSnapshot, Outcome, PHYSICS_DT, Session};

use common::{firing, playing, run_idle, staged_config};

#[test]
fn test_reset_leaves_no_bodies_behind() {
    let mut session = playing(GameConfig::default_arena(), 7);
    for i in 0..240 {
        let input = if i % 2 == 0 { firing() } else { InputSnapshot::idle() };
        session.tick(&input, PHYSICS_DT);
    }
    assert!(!session.enemies().is_empty());

    session.reset();

    assert!(session.enemies().is_empty());
    assert!(session.projectiles().is_empty());
    assert!(session.effects().is_empty());
    assert_eq!(session.score(), 0);
    assert_eq!(session.player().health, session.player().max_health());
    assert!(!session.player().dead);
    // Only the player body remains; the arena is made of static colliders.
    assert_eq!(session.world().body_count(), 1);
    assert_eq!(session.world().collider_set.len(), 6);
}

#[test]
fn test_defeat_is_reported_once() {
    let mut session = playing(staged_config(), 1);
    session.drain_audio_cues();

    let parts = session.parts_mut();
    parts.player.take_damage(parts.world, 10_000, 0.0);

    let report = session.tick(&InputSnapshot::idle(), PHYSICS_DT);
    assert_eq!(report.finished, Some(Outcome::Defeat));
    assert_eq!(session.state(), GameState::GameOver { outcome: Outcome::Defeat });

    let cues = session.drain_audio_cues();
    assert_eq!(cues.iter().filter(|c| **c == AudioCue::GameOver).count(), 1);
    assert!(cues.contains(&AudioCue::MusicStop));

    for report in run_idle(&mut session, 30) {
        assert_eq!(report.finished, None);
    }
    assert!(session.drain_audio_cues().is_empty());
    assert_eq!(session.outcome(), Some(Outcome::Defeat));
}

#[test]
fn test_confirm_after_game_over_restarts() {
    let mut session = playing(GameConfig::default_arena(), 5);
    let parts = session.parts_mut();
    parts.player.take_damage(parts.world, 10_000, 0.0);
    session.tick(&InputSnapshot::idle(), PHYSICS_DT);
    assert!(matches!(session.state(), GameState::GameOver { .. }));

    let old_player = session.player().id;
    assert_eq!(session.confirm(), GameState::Playing);
    assert_ne!(session.player().id, old_player);
    assert!(!session.player().dead);
    assert_eq!(
        session.enemies().active_count(),
        session.config().enemy.initial_wave() as usize
    );
}

#[test]
fn test_victory_after_clearing_the_arena() {
    let mut config = staged_config();
    config.enemy.health = 1;
    config.game_settings.win_score = config.enemy.score_value;
    let mut session = playing(config, 9);

    // Let the player land, then stage a single enemy straight ahead (-Z).
    run_idle(&mut session, 90);
    let parts = session.parts_mut();
    let target = parts.enemies.spawn_at(parts.world, parts.ids, 0.0, -6.0);
    run_idle(&mut session, 30);

    let mut outcome = None;
    for _ in 0..60 {
        let report = session.tick(&firing(), PHYSICS_DT);
        if report.finished.is_some() {
            outcome = report.finished;
            break;
        }
    }

    assert_eq!(outcome, Some(Outcome::Victory));
    assert_eq!(session.score(), session.config().enemy.score_value);
    assert!(session.enemies().get(target).is_none());
    assert!(!session.effects().is_empty());
    let cues = session.drain_audio_cues();
    assert!(cues.contains(&AudioCue::Explosion));
    assert!(cues.contains(&AudioCue::Victory));
}

#[test]
fn test_health_never_goes_below_zero() {
    let mut session = playing(staged_config(), 2);
    let parts = session.parts_mut();
    let mut now = 0.0;
    for _ in 0..20 {
        parts.player.take_damage(parts.world, 35, now);
        now += 1_000.0;
    }
    assert_eq!(session.player().health, 0);
    assert!(session.player().dead);
}

#[test]
fn test_stray_shot_expires_by_range() {
    let mut session = playing(staged_config(), 4);
    run_idle(&mut session, 60);

    // Look up and fire once.
    let aim_up = InputSnapshot {
        look_delta: [0.0, -500.0],
        fire: true,
        ..InputSnapshot::idle()
    };
    session.tick(&aim_up, PHYSICS_DT);
    assert_eq!(session.projectiles().len(), 1);

    // 40 m/s covers the 50 m range in 1.25 s, before the 2 s lifetime.
    let reports = run_idle(&mut session, 90);
    assert!(session.projectiles().is_empty());
    assert_eq!(reports.iter().map(|r| r.projectiles_retired).sum::<usize>(), 1);
    assert!(reports.iter().all(|r| r.kills == 0));
    assert_eq!(session.world().body_count(), 1);
}

#[test]
fn test_focus_loss_stops_the_player() {
    let mut session = playing(staged_config(), 6);
    run_idle(&mut session, 60);

    let run = InputSnapshot {
        move_axes: [0.0, 1.0],
        ..InputSnapshot::idle()
    };
    session.tick(&run, PHYSICS_DT);
    let body = session.player().body_handle;
    assert!(session.world().linvel(body).unwrap().z < 0.0);

    session.tick(&InputSnapshot::unfocused(), PHYSICS_DT);
    let velocity = session.world().linvel(body).unwrap();
    assert!(velocity.x.abs() < 1.0e-3 && velocity.z.abs() < 1.0e-3);
}

#[test]
fn test_new_rejects_invalid_config_before_any_tick() {
    let json = GameConfig::default_arena().to_json().unwrap();
    let broken = json.replace("\"maxRange\": 50.0", "\"maxRange\": -5.0");
    assert!(GameConfig::from_json(&broken).is_err());

    let mut config = GameConfig::default_arena();
    config.game_settings.floor_size = 0.0;
    assert!(Session::new(config, 0).is_err());
}
