//! Enemy agents with deterministic spawning and simple pursuit AI.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rapier3d::prelude::*;

use crate::combat::DamageOutcome;
use crate::config::EnemyConfig;
use crate::entity::{BodyTag, EntityId, EntityKind, IdAllocator};
use crate::groups::CollisionFilter;
use crate::physics::{PhysicsWorld, Vec3};
use crate::player::{Player, capsule_half_segment};
use crate::projectile::{Shooter, Shot};

/// Clearance above the floor for a freshly spawned capsule.
const SPAWN_LIFT: f32 = 0.05;

/// Draws per sampling stage before falling back to the next one.
const SPAWN_ATTEMPTS: usize = 32;

/// Horizontal (XZ) distance between two points.
fn horizontal_distance(a: &Vec3, b: &Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

/// Zones enemies may never spawn in: a circle of `radius` around both the
/// player's current position and the configured start point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnExclusion {
    pub player: Vec3,
    pub start: Vec3,
    pub radius: f32,
}

impl SpawnExclusion {
    pub fn allows(&self, x: f32, z: f32) -> bool {
        let point = Vector::new(x, 0.0, z);
        horizontal_distance(&point, &self.player) >= self.radius
            && horizontal_distance(&point, &self.start) >= self.radius
    }

    /// Smallest horizontal distance from `(x, z)` to either zone centre.
    fn clearance(&self, x: f32, z: f32) -> f32 {
        let point = Vector::new(x, 0.0, z);
        horizontal_distance(&point, &self.player).min(horizontal_distance(&point, &self.start))
    }
}

/// A hostile agent.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub position: Vec3,
    pub health: u32,
    pub fire_cooldown_ms: f32,
    pub attack_cooldown_ms: f32,
    /// Cleared on death; the body stays until the next sweep.
    pub is_active: bool,
}

impl Enemy {
    /// Steers toward the player and lands a melee hit when in reach.
    ///
    /// Returns the melee outcome if an attack was attempted this frame.
    pub fn update(
        &mut self,
        world: &mut PhysicsWorld,
        config: &EnemyConfig,
        player: &mut Player,
        dt: f32,
        now_ms: f64,
    ) -> Option<DamageOutcome> {
        if !self.is_active {
            return None;
        }

        let dt_ms = dt * 1000.0;
        self.fire_cooldown_ms = (self.fire_cooldown_ms - dt_ms).max(0.0);
        self.attack_cooldown_ms = (self.attack_cooldown_ms - dt_ms).max(0.0);

        let mut to_player = player.position - self.position;
        to_player.y = 0.0;
        let direction = to_player
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector::zeros);

        if let Some(body) = world.get_rigid_body_mut(self.body_handle) {
            let vertical = body.linvel().y;
            let velocity = direction * config.speed;
            body.set_linvel(Vector::new(velocity.x, vertical, velocity.z), true);
        }

        let reach = config.radius + player.radius() + config.melee_reach;
        if player.dead
            || self.attack_cooldown_ms > 0.0
            || horizontal_distance(&self.position, &player.position) > reach
        {
            return None;
        }

        self.attack_cooldown_ms = config.attack_interval;
        Some(player.take_damage(world, config.melee_damage, now_ms))
    }

    /// Fires at `target` when the cooldown allows and it is within engage range.
    pub fn shoot(&mut self, config: &EnemyConfig, target: &Vec3) -> Option<Shot> {
        if !self.is_active || self.fire_cooldown_ms > 0.0 {
            return None;
        }
        let offset = target - self.position;
        let distance = offset.norm();
        if distance > config.engage_range || distance <= f32::EPSILON {
            return None;
        }
        self.fire_cooldown_ms = config.fire_rate;

        Some(Shot {
            owner: Shooter::Enemy(self.id),
            origin: self.position,
            direction: offset / distance,
            speed: config.bullet_speed,
            damage: config.bullet_damage,
            clearance: config.radius,
        })
    }

    /// Saturating damage; the first hit that reaches zero deactivates.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_active {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health > 0 {
            return DamageOutcome::Damaged;
        }
        self.is_active = false;
        DamageOutcome::Killed
    }

    pub fn sync_from_body(&mut self, world: &PhysicsWorld) {
        if let Some(position) = world.translation(self.body_handle) {
            self.position = position;
        }
    }
}

/// Owns the enemy collection and the spawn timer.
#[derive(Debug, Clone)]
pub struct EnemyRoster {
    enemies: Vec<Enemy>,
    config: EnemyConfig,
    /// Half extent of the square area enemies may spawn in.
    arena_limit: f32,
    last_spawn_ms: f64,
    rng: ChaCha8Rng,
    seed: u64,
}

impl EnemyRoster {
    /// Creates an empty roster with the given RNG seed.
    pub fn new(config: EnemyConfig, arena_limit: f32, seed: u64) -> Self {
        Self {
            enemies: Vec::new(),
            config,
            arena_limit,
            last_spawn_ms: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn config(&self) -> &EnemyConfig {
        &self.config
    }

    pub fn half_segment(&self) -> f32 {
        capsule_half_segment(self.config.height, self.config.radius)
    }

    /// Half extent of the square enemy centres must stay within.
    fn spawn_limit(&self) -> f32 {
        (self.arena_limit - self.config.radius).max(0.0)
    }

    /// Picks a spawn point inside the arena and outside every exclusion zone.
    ///
    /// Points are drawn uniformly by area from the ring between the safe
    /// radius and `spawn_radius` around the player, and rejected when they
    /// leave the arena or touch an exclusion zone. If the ring keeps missing
    /// (player pinned in a corner), the whole floor is sampled instead, and
    /// as a last resort the arena corner farthest from both zones is used.
    pub fn random_spawn_point(&mut self, exclusion: &SpawnExclusion) -> (f32, f32) {
        let limit = self.spawn_limit();
        let inner = exclusion.radius.min(self.config.spawn_radius);
        let outer = self.config.spawn_radius;
        let inside = |x: f32, z: f32| x.abs() <= limit && z.abs() <= limit;

        for _ in 0..SPAWN_ATTEMPTS {
            let r_squared = if outer * outer > inner * inner {
                self.rng.random_range(inner * inner..outer * outer)
            } else {
                outer * outer
            };
            let r = r_squared.sqrt();
            let angle: f32 = self.rng.random_range(0.0..std::f32::consts::TAU);
            let x = exclusion.player.x + r * angle.cos();
            let z = exclusion.player.z + r * angle.sin();
            if inside(x, z) && exclusion.allows(x, z) {
                return (x, z);
            }
        }

        for _ in 0..SPAWN_ATTEMPTS {
            let x = self.rng.random_range(-limit..=limit);
            let z = self.rng.random_range(-limit..=limit);
            if exclusion.allows(x, z) {
                return (x, z);
            }
        }

        let corners = [(-limit, -limit), (-limit, limit), (limit, -limit), (limit, limit)];
        let (x, z) = corners
            .into_iter()
            .max_by(|a, b| {
                exclusion
                    .clearance(a.0, a.1)
                    .total_cmp(&exclusion.clearance(b.0, b.1))
            })
            .unwrap_or((limit, limit));
        tracing::warn!("[spawner] no free spawn area, using corner ({:.1}, {:.1})", x, z);
        (x, z)
    }

    /// Spawns an enemy at a random point outside `exclusion`.
    pub fn spawn_random(
        &mut self,
        world: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        exclusion: &SpawnExclusion,
    ) -> EntityId {
        let (x, z) = self.random_spawn_point(exclusion);
        self.spawn_at(world, ids, x, z)
    }

    /// Spawns an enemy standing on the floor at `(x, z)`.
    pub fn spawn_at(&mut self, world: &mut PhysicsWorld, ids: &mut IdAllocator, x: f32, z: f32) -> EntityId {
        let id = ids.next_id();
        let position = Vector::new(x, self.config.height * 0.5 + SPAWN_LIFT, z);
        let fire_cooldown_ms = if self.config.fire_rate > 0.0 {
            self.rng.random_range(0.0..self.config.fire_rate)
        } else {
            0.0
        };

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .user_data(BodyTag::new(EntityKind::Enemy, id).encode())
            .build();
        let body_handle = world.add_rigid_body(rigid_body);

        let collider = ColliderBuilder::capsule_y(self.half_segment(), self.config.radius)
            .friction(0.0)
            .collision_groups(CollisionFilter::enemy().to_interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle = world.add_collider(collider, body_handle);

        self.enemies.push(Enemy {
            id,
            body_handle,
            collider_handle,
            position,
            health: self.config.health,
            fire_cooldown_ms,
            attack_cooldown_ms: 0.0,
            is_active: true,
        });

        tracing::debug!("[spawner] enemy {} at ({:.1}, {:.1})", id, x, z);
        id
    }

    /// Restarts the spawn interval from `now_ms`.
    pub fn restart_spawn_timer(&mut self, now_ms: f64) {
        self.last_spawn_ms = now_ms;
    }

    /// Spawns one enemy if below the cap and the spawn interval elapsed.
    pub fn maybe_spawn(
        &mut self,
        world: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        now_ms: f64,
        exclusion: &SpawnExclusion,
    ) -> Option<EntityId> {
        if self.active_count() >= self.config.count as usize {
            return None;
        }
        if now_ms - self.last_spawn_ms < f64::from(self.config.spawn_interval) {
            return None;
        }
        self.last_spawn_ms = now_ms;
        Some(self.spawn_random(world, ids, exclusion))
    }

    /// Runs AI for every active enemy.
    ///
    /// Returns fire requests; melee damage is applied to `player` directly.
    pub fn update_all(
        &mut self,
        world: &mut PhysicsWorld,
        player: &mut Player,
        dt: f32,
        now_ms: f64,
    ) -> Vec<Shot> {
        let mut shots = Vec::new();
        for enemy in self.enemies.iter_mut().filter(|e| e.is_active) {
            if let Some(outcome) = enemy.update(world, &self.config, player, dt, now_ms) {
                tracing::debug!("[combat] enemy {} melee: {:?}", enemy.id, outcome);
            }
            if player.dead {
                continue;
            }
            if let Some(shot) = enemy.shoot(&self.config, &player.position) {
                shots.push(shot);
            }
        }
        shots
    }

    pub fn sync_from_bodies(&mut self, world: &PhysicsWorld) {
        for enemy in &mut self.enemies {
            enemy.sync_from_body(world);
        }
    }

    /// Removes inactive enemies and their bodies; returns their ids.
    pub fn sweep_inactive(&mut self, world: &mut PhysicsWorld) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.enemies.retain(|enemy| {
            if enemy.is_active {
                return true;
            }
            world.remove_rigid_body(enemy.body_handle);
            removed.push(enemy.id);
            false
        });
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.iter_mut()
    }

    pub fn active_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_active).count()
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Removes every enemy body and reseeds the RNG.
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for enemy in self.enemies.drain(..) {
            world.remove_rigid_body(enemy.body_handle);
        }
        self.last_spawn_ms = 0.0;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}
