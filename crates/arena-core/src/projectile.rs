//! Projectile lifecycle: spawn, hit flagging, expiry and deferred removal.
//!
//! A projectile is never removed where its hit is detected. Contact handling
//! only calls [`ProjectileManager::mark_hit`]; bodies are detached later by
//! [`ProjectileManager::perform_removals`], after the physics step returned.

use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::BulletConfig;
use crate::entity::{BodyTag, EntityId, EntityKind, IdAllocator};
use crate::groups::CollisionFilter;
use crate::physics::{PhysicsWorld, Vec3};

/// Slack (ms) when deciding that a lifetime has run out.
const LIFETIME_SLACK_MS: f32 = 0.05;

/// Gap left between the shooter's surface and a freshly spawned projectile.
const MUZZLE_GAP: f32 = 0.05;

/// Who fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shooter {
    Player,
    Enemy(EntityId),
}

/// A fire request produced by a successful `shoot()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub owner: Shooter,
    /// Muzzle point at the shooter's centre line.
    pub origin: Vec3,
    /// Unit direction of travel.
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    /// Shooter radius; the projectile spawns just outside it.
    pub clearance: f32,
}

/// Why a projectile left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Hit,
    LifetimeExpired,
    RangeExceeded,
}

/// A live projectile wrapping a sensor body in the physics world.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub owner: Shooter,
    pub position: Vec3,
    /// Position before the most recent update; with `position` it spans the
    /// path swept during the last step.
    pub previous_position: Vec3,
    pub velocity: Vec3,
    pub origin: Vec3,
    pub damage: u32,
    pub radius: f32,
    pub remaining_lifetime_ms: f32,
    pub max_range: f32,
    pub hit: bool,
    /// What the physics contact reported touching, if anything.
    pub hit_other: Option<BodyTag>,
    pub removal: Option<RemovalReason>,
}

impl Projectile {
    pub fn owner_is_player(&self) -> bool {
        self.owner == Shooter::Player
    }

    /// Sets the hit flag. Returns false if it was already set.
    pub fn mark_hit(&mut self, other: BodyTag) -> bool {
        if self.hit {
            return false;
        }
        self.hit = true;
        self.hit_other = Some(other);
        true
    }

    /// Distance travelled from the spawn point.
    pub fn distance_travelled(&self) -> f32 {
        (self.position - self.origin).norm()
    }

    /// Syncs from the body, consumes lifetime and checks range.
    ///
    /// Returns whether the projectile should be removed. A hit projectile
    /// still records the path it swept but consumes no lifetime.
    pub fn update(&mut self, world: &PhysicsWorld, dt: f32) -> bool {
        if let Some(body) = world.get_rigid_body(self.body_handle) {
            self.previous_position = self.position;
            self.position = *body.translation();
            self.velocity = *body.linvel();
        }

        if self.hit {
            self.removal.get_or_insert(RemovalReason::Hit);
            return true;
        }

        self.remaining_lifetime_ms = (self.remaining_lifetime_ms - dt * 1000.0).max(0.0);

        if self.remaining_lifetime_ms <= LIFETIME_SLACK_MS {
            self.removal = Some(RemovalReason::LifetimeExpired);
        } else if self.distance_travelled() > self.max_range {
            self.removal = Some(RemovalReason::RangeExceeded);
        }

        self.removal.is_some()
    }
}

/// Owns every live projectile.
#[derive(Debug, Clone)]
pub struct ProjectileManager {
    projectiles: Vec<Projectile>,
    config: BulletConfig,
}

impl ProjectileManager {
    pub fn new(config: BulletConfig) -> Self {
        Self {
            projectiles: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &BulletConfig {
        &self.config
    }

    /// Creates the projectile body for `shot` and starts tracking it.
    pub fn spawn(&mut self, world: &mut PhysicsWorld, ids: &mut IdAllocator, shot: &Shot) -> EntityId {
        let id = ids.next_id();
        let radius = self.config.radius;
        let direction = shot
            .direction
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vector::new(0.0, 0.0, -1.0));
        let position = shot.origin + direction * (shot.clearance + radius + MUZZLE_GAP);
        let velocity = direction * shot.speed;
        let filter = CollisionFilter::projectile(shot.owner == Shooter::Player);

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(position)
            .linvel(velocity)
            .gravity_scale(0.0)
            .additional_mass(self.config.mass)
            .user_data(BodyTag::new(EntityKind::Projectile, id).encode())
            .build();
        let body_handle = world.add_rigid_body(rigid_body);

        let collider = ColliderBuilder::ball(radius)
            .sensor(true)
            .collision_groups(filter.to_interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle = world.add_collider(collider, body_handle);

        self.projectiles.push(Projectile {
            id,
            body_handle,
            collider_handle,
            owner: shot.owner,
            position,
            previous_position: position,
            velocity,
            origin: position,
            damage: shot.damage,
            radius,
            remaining_lifetime_ms: self.config.lifetime_seconds * 1000.0,
            max_range: self.config.max_range,
            hit: false,
            hit_other: None,
            removal: None,
        });

        tracing::debug!("[projectile] spawned {} for {:?}", id, shot.owner);
        id
    }

    /// Flags projectile `id` as hit. Unknown ids and repeat hits are ignored.
    pub fn mark_hit(&mut self, id: EntityId, other: BodyTag) -> bool {
        self.projectiles
            .iter_mut()
            .find(|p| p.id == id)
            .is_some_and(|p| p.mark_hit(other))
    }

    /// Runs [`Projectile::update`] on every projectile; returns how many are flagged.
    pub fn update_all(&mut self, world: &PhysicsWorld, dt: f32) -> usize {
        let mut flagged = 0;
        for projectile in &mut self.projectiles {
            if projectile.update(world, dt) {
                flagged += 1;
            }
        }
        flagged
    }

    /// Detaches every flagged projectile from the world and returns them.
    pub fn perform_removals(&mut self, world: &mut PhysicsWorld) -> Vec<Projectile> {
        let (retired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.projectiles)
            .into_iter()
            .partition(|p| p.removal.is_some());
        self.projectiles = live;

        for projectile in &retired {
            world.remove_rigid_body(projectile.body_handle);
        }
        retired
    }

    pub fn get(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Removes every projectile body from the world.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for projectile in self.projectiles.drain(..) {
            world.remove_rigid_body(projectile.body_handle);
        }
    }
}
