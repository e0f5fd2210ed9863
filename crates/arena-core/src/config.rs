//! Game configuration loaded once at startup.
//!
//! Required fields mirror the data file shipped with the game; everything
//! else has a serde default. Times suffixed `_ms` or documented as rates are
//! milliseconds, distances are metres.

use serde::{Deserialize, Serialize};

/// Error raised while loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Player tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Horizontal speed in m/s.
    pub speed: f32,
    pub mass: f32,
    pub health: u32,
    /// Milliseconds between shots.
    pub fire_rate: f32,
    pub bullet_speed: f32,
    pub bullet_damage: u32,
    /// Upward impulse applied on jump.
    pub jump_force: f32,
    pub radius: f32,
    pub height: f32,
    pub friction_vs_ground: f32,
    /// Milliseconds of invulnerability after taking damage.
    #[serde(default = "default_damage_cooldown")]
    pub damage_cooldown: f32,
    #[serde(default = "default_jump_cooldown")]
    pub jump_cooldown: f32,
    #[serde(default = "default_spawn_point")]
    pub spawn_point: [f32; 3],
    /// Radius around the spawn point, and around the player, where enemies
    /// never appear.
    #[serde(default = "default_safe_zone_radius")]
    pub safe_zone_radius: f32,
    /// Radians of camera rotation per unit of look delta.
    #[serde(default = "default_look_sensitivity")]
    pub look_sensitivity: f32,
}

/// Enemy tuning and spawner settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnemyConfig {
    /// Maximum number of enemies alive at once.
    pub count: u32,
    pub spawn_radius: f32,
    pub speed: f32,
    pub health: u32,
    /// Milliseconds between shots.
    pub fire_rate: f32,
    pub bullet_speed: f32,
    pub bullet_damage: u32,
    /// Milliseconds between melee hits.
    pub attack_interval: f32,
    pub radius: f32,
    pub height: f32,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f32,
    /// Enemies spawned at game start; defaults to `count`.
    #[serde(default)]
    pub initial_count: Option<u32>,
    #[serde(default = "default_melee_damage")]
    pub melee_damage: u32,
    #[serde(default = "default_melee_reach")]
    pub melee_reach: f32,
    /// Enemies only shoot while the player is within this distance.
    #[serde(default = "default_engage_range")]
    pub engage_range: f32,
    #[serde(default = "default_score_value")]
    pub score_value: u32,
}

impl EnemyConfig {
    pub fn initial_wave(&self) -> u32 {
        self.initial_count.unwrap_or(self.count).min(self.count)
    }
}

/// Projectile body and expiry settings shared by all shooters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulletConfig {
    pub radius: f32,
    pub mass: f32,
    pub lifetime_seconds: f32,
    pub max_range: f32,
}

/// World-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Vertical acceleration in m/s² (negative is down).
    pub gravity: f32,
    pub max_physics_sub_steps: u32,
    /// Edge length of the square floor.
    pub floor_size: f32,
    pub wall_height: f32,
    pub target_fps: f32,
    /// Score that ends the round in victory once the arena is cleared.
    pub win_score: u32,
    #[serde(default = "default_wall_thickness")]
    pub wall_thickness: f32,
}

/// Complete game configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub bullet: BulletConfig,
    pub game_settings: GameSettings,
}

fn default_damage_cooldown() -> f32 {
    500.0
}

fn default_jump_cooldown() -> f32 {
    250.0
}

fn default_spawn_point() -> [f32; 3] {
    [0.0, 1.5, 0.0]
}

fn default_safe_zone_radius() -> f32 {
    8.0
}

fn default_look_sensitivity() -> f32 {
    0.002
}

fn default_spawn_interval() -> f32 {
    2000.0
}

fn default_melee_damage() -> u32 {
    10
}

fn default_melee_reach() -> f32 {
    0.3
}

fn default_engage_range() -> f32 {
    30.0
}

fn default_score_value() -> u32 {
    100
}

fn default_wall_thickness() -> f32 {
    1.0
}

impl GameConfig {
    /// Parses and validates a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Built-in arena preset.
    pub fn default_arena() -> Self {
        Self {
            player: PlayerConfig {
                speed: 8.0,
                mass: 70.0,
                health: 100,
                fire_rate: 200.0,
                bullet_speed: 40.0,
                bullet_damage: 25,
                jump_force: 350.0,
                radius: 0.5,
                height: 1.8,
                friction_vs_ground: 0.0,
                damage_cooldown: default_damage_cooldown(),
                jump_cooldown: default_jump_cooldown(),
                spawn_point: default_spawn_point(),
                safe_zone_radius: default_safe_zone_radius(),
                look_sensitivity: default_look_sensitivity(),
            },
            enemy: EnemyConfig {
                count: 8,
                spawn_radius: 40.0,
                speed: 3.0,
                health: 50,
                fire_rate: 2500.0,
                bullet_speed: 20.0,
                bullet_damage: 10,
                attack_interval: 1000.0,
                radius: 0.6,
                height: 1.8,
                spawn_interval: default_spawn_interval(),
                initial_count: Some(4),
                melee_damage: default_melee_damage(),
                melee_reach: default_melee_reach(),
                engage_range: default_engage_range(),
                score_value: default_score_value(),
            },
            bullet: BulletConfig {
                radius: 0.1,
                mass: 0.05,
                lifetime_seconds: 2.0,
                max_range: 50.0,
            },
            game_settings: GameSettings {
                gravity: -9.82,
                max_physics_sub_steps: 5,
                floor_size: 100.0,
                wall_height: 4.0,
                target_fps: 60.0,
                win_score: 2000,
                wall_thickness: default_wall_thickness(),
            },
        }
    }

    /// Checks every numeric field; the first offending field is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        positive("player.speed", p.speed)?;
        positive("player.mass", p.mass)?;
        nonzero("player.health", p.health)?;
        non_negative("player.fireRate", p.fire_rate)?;
        positive("player.bulletSpeed", p.bullet_speed)?;
        non_negative("player.jumpForce", p.jump_force)?;
        positive("player.radius", p.radius)?;
        positive("player.height", p.height)?;
        non_negative("player.frictionVsGround", p.friction_vs_ground)?;
        non_negative("player.damageCooldown", p.damage_cooldown)?;
        non_negative("player.jumpCooldown", p.jump_cooldown)?;
        non_negative("player.safeZoneRadius", p.safe_zone_radius)?;
        finite("player.lookSensitivity", p.look_sensitivity)?;
        for value in p.spawn_point {
            finite("player.spawnPoint", value)?;
        }

        let e = &self.enemy;
        positive("enemy.spawnRadius", e.spawn_radius)?;
        positive("enemy.speed", e.speed)?;
        nonzero("enemy.health", e.health)?;
        positive("enemy.fireRate", e.fire_rate)?;
        positive("enemy.bulletSpeed", e.bullet_speed)?;
        non_negative("enemy.attackInterval", e.attack_interval)?;
        positive("enemy.radius", e.radius)?;
        positive("enemy.height", e.height)?;
        non_negative("enemy.spawnInterval", e.spawn_interval)?;
        non_negative("enemy.meleeReach", e.melee_reach)?;
        non_negative("enemy.engageRange", e.engage_range)?;
        if e.spawn_radius <= p.safe_zone_radius {
            return Err(ConfigError::invalid(
                "enemy.spawnRadius",
                format!(
                    "must exceed player.safeZoneRadius ({})",
                    p.safe_zone_radius
                ),
            ));
        }

        let b = &self.bullet;
        positive("bullet.radius", b.radius)?;
        positive("bullet.mass", b.mass)?;
        positive("bullet.lifetimeSeconds", b.lifetime_seconds)?;
        positive("bullet.maxRange", b.max_range)?;

        let g = &self.game_settings;
        finite("gameSettings.gravity", g.gravity)?;
        nonzero("gameSettings.maxPhysicsSubSteps", g.max_physics_sub_steps)?;
        positive("gameSettings.floorSize", g.floor_size)?;
        positive("gameSettings.wallHeight", g.wall_height)?;
        positive("gameSettings.targetFps", g.target_fps)?;
        positive("gameSettings.wallThickness", g.wall_thickness)?;
        if g.floor_size * 0.5 - e.radius <= p.safe_zone_radius {
            return Err(ConfigError::invalid(
                "gameSettings.floorSize",
                format!(
                    "leaves no spawn area outside player.safeZoneRadius ({})",
                    p.safe_zone_radius
                ),
            ));
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn nonzero(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be > 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena_is_valid() {
        let config = GameConfig::default_arena();
        assert!(config.validate().is_ok());
        assert_eq!(config.enemy.initial_wave(), 4);
    }

    #[test]
    fn test_json_serialization_roundtrip() {
        let config = GameConfig::default_arena();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"fireRate\""));
        assert!(json.contains("\"maxPhysicsSubSteps\""));

        let parsed = GameConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "player": {
                "speed": 6, "mass": 80, "health": 100, "fireRate": 150,
                "bulletSpeed": 30, "bulletDamage": 20, "jumpForce": 300,
                "radius": 0.5, "height": 1.8, "frictionVsGround": 0
            },
            "enemy": {
                "count": 5, "spawnRadius": 30, "speed": 2, "health": 40,
                "fireRate": 3000, "bulletSpeed": 15, "bulletDamage": 5,
                "attackInterval": 800, "radius": 0.6, "height": 1.8
            },
            "bullet": { "radius": 0.1, "mass": 0.1, "lifetimeSeconds": 3, "maxRange": 60 },
            "gameSettings": {
                "gravity": -9.82, "maxPhysicsSubSteps": 3, "floorSize": 80,
                "wallHeight": 3, "targetFps": 60, "winScore": 1000
            }
        }"#;

        let config = GameConfig::from_json(json).unwrap();
        assert_eq!(config.player.damage_cooldown, 500.0);
        assert_eq!(config.enemy.spawn_interval, 2000.0);
        assert_eq!(config.enemy.initial_wave(), 5);
        assert_eq!(config.game_settings.wall_thickness, 1.0);
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let mut value = serde_json::to_value(GameConfig::default_arena()).unwrap();
        value["player"].as_object_mut().unwrap().remove("speed");

        let err = GameConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_field_is_named() {
        let mut config = GameConfig::default_arena();
        config.bullet.max_range = -1.0;

        let err = config.validate().unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "bullet.maxRange"),
            ConfigError::Parse(_) => panic!("expected Invalid"),
        }
    }

    #[test]
    fn test_zero_sub_steps_rejected() {
        let mut config = GameConfig::default_arena();
        config.game_settings.max_physics_sub_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_floor_must_extend_past_safe_zone() {
        let mut config = GameConfig::default_arena();
        config.game_settings.floor_size = 2.0 * config.player.safe_zone_radius;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "gameSettings.floorSize", .. })
        ));
    }

    #[test]
    fn test_spawn_radius_must_clear_safe_zone() {
        let mut config = GameConfig::default_arena();
        config.enemy.spawn_radius = config.player.safe_zone_radius;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "enemy.spawnRadius", .. })
        ));
    }
}
