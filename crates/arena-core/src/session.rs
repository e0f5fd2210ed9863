//! Game state machine and the per-frame tick pipeline.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rapier3d::prelude::Vector;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::assets::AudioCue;
use crate::combat::CombatResolver;
use crate::config::{ConfigError, GameConfig};
use crate::effects::{Effect, EffectList};
use crate::enemy::{EnemyRoster, SpawnExclusion};
use crate::entity::{EntityKind, IdAllocator};
use crate::input::InputSnapshot;
use crate::physics::{PhysicsWorld, Vec3};
use crate::player::Player;
use crate::projectile::ProjectileManager;

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Defeat,
    Victory,
}

/// Top-level screen/state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameState {
    /// Title screen.
    #[default]
    Title,
    /// Controls screen shown before the first round.
    Controls,
    /// Round in progress.
    Playing,
    /// Round finished.
    GameOver { outcome: Outcome },
}

/// What happened during one [`Session::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub sub_steps: u32,
    pub kills: u32,
    pub score_gained: u32,
    pub projectiles_retired: usize,
    pub player_damaged: bool,
    /// Set when this tick ended the round.
    pub finished: Option<Outcome>,
}

/// One game session: world, entities and the state machine driving them.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    state: GameState,
    world: PhysicsWorld,
    ids: IdAllocator,
    arena: Arena,
    player: Player,
    enemies: EnemyRoster,
    projectiles: ProjectileManager,
    effects: EffectList,
    score: u32,
    clock_ms: f64,
    audio: Vec<AudioCue>,
    music_playing: bool,
}

impl Session {
    /// Builds a session on the title screen. Fails if `config` is invalid.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = PhysicsWorld::with_gravity(Vector::new(0.0, config.game_settings.gravity, 0.0));
        let mut ids = IdAllocator::new();
        let arena = Arena::build(&mut world, &mut ids, &config.game_settings, &config.player);
        let player = Player::spawn(&mut world, ids.next_id(), &config.player);
        let enemies = EnemyRoster::new(config.enemy.clone(), arena.half_extent(), seed);
        let projectiles = ProjectileManager::new(config.bullet.clone());

        tracing::info!("[session] created with seed {}", seed);

        Ok(Self {
            config,
            state: GameState::Title,
            world,
            ids,
            arena,
            player,
            enemies,
            projectiles,
            effects: EffectList::new(),
            score: 0,
            clock_ms: 0.0,
            audio: Vec::new(),
            music_playing: false,
        })
    }

    /// Advances the screen flow: Title -> Controls -> Playing, and
    /// GameOver -> Playing. Ignored while playing.
    pub fn confirm(&mut self) -> GameState {
        match self.state {
            GameState::Title => {
                self.state = GameState::Controls;
                tracing::info!("[session] title -> controls");
            }
            GameState::Controls | GameState::GameOver { .. } => {
                self.start_game();
            }
            GameState::Playing => {
                tracing::debug!("[session] confirm ignored while playing");
            }
        }
        self.state
    }

    /// Starts a round from Controls or GameOver. Returns false when ignored.
    pub fn start_game(&mut self) -> bool {
        match self.state {
            GameState::Controls => {}
            GameState::GameOver { .. } => self.reset(),
            GameState::Title | GameState::Playing => {
                tracing::debug!("[session] start_game ignored in {:?}", self.state);
                return false;
            }
        }

        self.state = GameState::Playing;
        self.enemies.restart_spawn_timer(self.clock_ms);

        let exclusion = self.spawn_exclusion();
        for _ in 0..self.config.enemy.initial_wave() {
            self.enemies
                .spawn_random(&mut self.world, &mut self.ids, &exclusion);
        }

        self.audio.push(AudioCue::MusicStart);
        self.music_playing = true;
        tracing::info!(
            "[session] round started with {} enemies",
            self.enemies.active_count()
        );
        true
    }

    /// Puts every entity back to its initial state.
    ///
    /// Enemies, projectiles and effects are dropped with their bodies, the
    /// player respawns at full health and the score is zeroed. The current
    /// [`GameState`] is left as is.
    pub fn reset(&mut self) {
        self.projectiles.clear(&mut self.world);
        self.enemies.clear(&mut self.world);
        self.effects.clear();

        self.world.remove_rigid_body(self.player.body_handle);
        self.player = Player::spawn(&mut self.world, self.ids.next_id(), &self.config.player);

        self.score = 0;
        self.enemies.restart_spawn_timer(self.clock_ms);
        if self.music_playing {
            self.audio.push(AudioCue::MusicStop);
            self.music_playing = false;
        }
        tracing::info!("[session] reset");
    }

    /// Runs one frame of `dt` seconds.
    ///
    /// Gameplay only advances while [`GameState::Playing`].
    pub fn tick(&mut self, input: &InputSnapshot, dt: f32) -> TickReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock_ms += f64::from(dt) * 1000.0;

        let mut report = TickReport::default();
        if self.state != GameState::Playing {
            return report;
        }
        let now = self.clock_ms;
        let health_before = self.player.health;

        self.update_player(input, dt);
        self.run_spawner(now);
        self.update_enemies(dt, now);

        report.sub_steps = self
            .world
            .step(dt, self.config.game_settings.max_physics_sub_steps);
        self.dispatch_contacts();

        self.player.sync_from_body(&self.world);
        self.enemies.sync_from_bodies(&self.world);

        self.projectiles.update_all(&self.world, dt);
        let retired = self.projectiles.perform_removals(&mut self.world);
        report.projectiles_retired = retired.len();

        let combat = CombatResolver::resolve(
            &retired,
            &mut self.enemies,
            &mut self.player,
            &mut self.world,
            now,
        );
        for (_, position) in &combat.kills {
            self.effects.spawn(Effect::explosion(*position));
            self.audio.push(AudioCue::Explosion);
        }
        self.score = self.score.saturating_add(combat.score);
        report.kills = u32::try_from(combat.kills.len()).unwrap_or(u32::MAX);
        report.score_gained = combat.score;

        self.enemies.sweep_inactive(&mut self.world);
        self.effects.update(dt);

        report.player_damaged = self.player.health < health_before;
        if report.player_damaged {
            self.audio.push(AudioCue::PlayerHurt);
        }

        report.finished = self.check_terminal();
        report
    }

    fn update_player(&mut self, input: &InputSnapshot, dt: f32) {
        self.player.update(&mut self.world, input, dt);
        if !input.focused {
            return;
        }

        if input.jump && self.player.jump(&mut self.world) {
            self.audio.push(AudioCue::Jump);
        }
        if input.fire {
            if let Some(shot) = self.player.shoot() {
                self.projectiles.spawn(&mut self.world, &mut self.ids, &shot);
                self.audio.push(AudioCue::PlayerShot);
            }
        }
    }

    /// Spawns reinforcements until the score target is reached.
    fn run_spawner(&mut self, now: f64) {
        if self.score >= self.config.game_settings.win_score {
            return;
        }
        let exclusion = self.spawn_exclusion();
        self.enemies
            .maybe_spawn(&mut self.world, &mut self.ids, now, &exclusion);
    }

    fn spawn_exclusion(&self) -> SpawnExclusion {
        SpawnExclusion {
            player: self.player.position,
            start: self.spawn_point(),
            radius: self.config.player.safe_zone_radius,
        }
    }

    fn update_enemies(&mut self, dt: f32, now: f64) {
        let shots = self
            .enemies
            .update_all(&mut self.world, &mut self.player, dt, now);
        for shot in &shots {
            self.projectiles.spawn(&mut self.world, &mut self.ids, shot);
            self.audio.push(AudioCue::EnemyShot);
        }
    }

    /// Turns the step's contact events into flags. Nothing is removed here.
    fn dispatch_contacts(&mut self) {
        for contact in self.world.contacts_since_last_step() {
            if let Some((projectile, other)) = contact.involving(EntityKind::Projectile) {
                if contact.began() {
                    self.projectiles.mark_hit(projectile.id, other);
                }
                continue;
            }
            if let Some((_, other)) = contact.involving(EntityKind::Player) {
                if other.is(EntityKind::Ground) {
                    self.player.on_ground_contact(contact.began());
                }
            }
        }
    }

    /// Ends the round on player death or a cleared arena at the score target.
    fn check_terminal(&mut self) -> Option<Outcome> {
        if self.state != GameState::Playing {
            return None;
        }

        let outcome = if self.player.dead {
            Outcome::Defeat
        } else if self.score >= self.config.game_settings.win_score && self.enemies.is_empty() {
            Outcome::Victory
        } else {
            return None;
        };

        self.state = GameState::GameOver { outcome };
        self.audio.push(match outcome {
            Outcome::Defeat => AudioCue::GameOver,
            Outcome::Victory => AudioCue::Victory,
        });
        if self.music_playing {
            self.audio.push(AudioCue::MusicStop);
            self.music_playing = false;
        }
        tracing::info!("[session] game over: {:?}, score {}", outcome, self.score);
        Some(outcome)
    }

    /// Takes every audio cue emitted since the last call.
    pub fn drain_audio_cues(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.audio)
    }

    /// Hash of the physics state plus gameplay counters.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.world.compute_hash().hash(&mut hasher);
        self.state.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.player.health.hash(&mut hasher);
        for enemy in self.enemies.iter() {
            enemy.id.hash(&mut hasher);
            enemy.health.hash(&mut hasher);
        }
        for projectile in self.projectiles.projectiles() {
            projectile.id.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            GameState::GameOver { outcome } => Some(outcome),
            _ => None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &EnemyRoster {
        &self.enemies
    }

    pub fn projectiles(&self) -> &ProjectileManager {
        &self.projectiles
    }

    pub fn effects(&self) -> &EffectList {
        &self.effects
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Player spawn point from the configuration.
    pub fn spawn_point(&self) -> Vec3 {
        let [x, y, z] = self.config.player.spawn_point;
        Vector::new(x, y, z)
    }

    /// Direct access for tests and tooling that stage specific situations.
    pub fn parts_mut(&mut self) -> SessionParts<'_> {
        SessionParts {
            world: &mut self.world,
            ids: &mut self.ids,
            player: &mut self.player,
            enemies: &mut self.enemies,
            projectiles: &mut self.projectiles,
        }
    }
}

/// Mutable borrows of a session's simulation state.
pub struct SessionParts<'a> {
    pub world: &'a mut PhysicsWorld,
    pub ids: &'a mut IdAllocator,
    pub player: &'a mut Player,
    pub enemies: &'a mut EnemyRoster,
    pub projectiles: &'a mut ProjectileManager,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(GameConfig::default_arena(), 42).unwrap()
    }

    #[test]
    fn test_screen_flow() {
        let mut session = session();
        assert_eq!(session.state(), GameState::Title);
        assert_eq!(session.confirm(), GameState::Controls);
        assert_eq!(session.confirm(), GameState::Playing);
        assert_eq!(session.confirm(), GameState::Playing);
    }

    #[test]
    fn test_start_game_ignored_on_title() {
        let mut session = session();
        assert!(!session.start_game());
        assert_eq!(session.state(), GameState::Title);
        assert!(session.drain_audio_cues().is_empty());
    }

    #[test]
    fn test_start_spawns_initial_wave_and_music() {
        let mut session = session();
        session.confirm();
        session.confirm();

        let wave = session.config().enemy.initial_wave() as usize;
        assert_eq!(session.enemies().active_count(), wave);
        assert_eq!(session.drain_audio_cues(), vec![AudioCue::MusicStart]);
    }

    #[test]
    fn test_tick_is_inert_outside_playing() {
        let mut session = session();
        let hash = session.world().compute_hash();
        let report = session.tick(&InputSnapshot::idle(), 1.0 / 60.0);
        assert_eq!(report, TickReport::default());
        assert_eq!(session.world().compute_hash(), hash);
        assert!(session.clock_ms() > 0.0);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let mut config = GameConfig::default_arena();
        config.player.speed = f32::NAN;
        assert!(matches!(
            Session::new(config, 1),
            Err(ConfigError::Invalid { field: "player.speed", .. })
        ));
    }

    #[test]
    fn test_player_lands_on_floor() {
        let mut session = session();
        session.confirm();
        session.confirm();
        for _ in 0..120 {
            session.tick(&InputSnapshot::idle(), 1.0 / 60.0);
        }
        assert!(session.player().is_grounded());
        assert!(session.player().position.y > 0.0);
    }

    #[test]
    fn test_score_saturates_at_max() {
        let mut config = GameConfig::default_arena();
        config.enemy.initial_count = Some(0);
        config.enemy.spawn_interval = 1.0e9;
        config.enemy.speed = 0.001;
        config.enemy.engage_range = 0.0;
        config.enemy.health = 1;
        config.game_settings.win_score = u32::MAX;
        let mut session = Session::new(config, 9).unwrap();
        session.confirm();
        session.confirm();

        let idle = InputSnapshot::idle();
        for _ in 0..90 {
            session.tick(&idle, 1.0 / 60.0);
        }
        let parts = session.parts_mut();
        parts.enemies.spawn_at(parts.world, parts.ids, 0.0, -6.0);
        session.score = u32::MAX - 1;
        for _ in 0..30 {
            session.tick(&idle, 1.0 / 60.0);
        }

        let fire = InputSnapshot {
            fire: true,
            ..InputSnapshot::idle()
        };
        let mut kills = 0;
        for _ in 0..60 {
            kills += session.tick(&fire, 1.0 / 60.0).kills;
            if kills > 0 {
                break;
            }
        }

        assert_eq!(kills, 1);
        assert_eq!(session.score(), u32::MAX);
        assert_eq!(session.outcome(), Some(Outcome::Victory));
    }
}
