//! Arena Core Library
//!
//! Entity simulation and combat resolution for a first-person arena shooter,
//! built on `Rapier3D`. A [`Session`] owns the physics world, the player,
//! enemies and projectiles, and advances them with [`Session::tick`].

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod assets;
pub mod combat;
pub mod config;
pub mod effects;
pub mod enemy;
pub mod entity;
pub mod groups;
pub mod input;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod session;
pub mod snapshot;

pub use arena::Arena;
pub use assets::{
    AssetCatalog, AssetResolver, AudioCue, Color, NullAssets, SoundHandle, StaticAssets, Surface,
    TextureHandle,
};
pub use combat::{CombatReport, CombatResolver, DamageOutcome, HIT_EPSILON, HitRecord, HitTarget};
pub use config::{BulletConfig, ConfigError, EnemyConfig, GameConfig, GameSettings, PlayerConfig};
pub use effects::{Effect, EffectKind, EffectList};
pub use enemy::{Enemy, EnemyRoster, SpawnExclusion};
pub use entity::{BodyTag, EntityId, EntityKind, IdAllocator};
pub use groups::{CollisionFilter, CollisionGroup};
pub use input::{Camera, InputSnapshot};
pub use physics::{ContactEvent, ContactMaterial, PHYSICS_DT, PhysicsWorld, Vec3, default_gravity};
pub use player::Player;
pub use projectile::{Projectile, ProjectileManager, RemovalReason, Shooter, Shot};
pub use session::{GameState, Outcome, Session, SessionParts, TickReport};
pub use snapshot::RenderSnapshot;
