//! Player controller on a dynamic capsule.

use rapier3d::prelude::*;

use crate::combat::DamageOutcome;
use crate::config::PlayerConfig;
use crate::entity::{BodyTag, EntityId, EntityKind};
use crate::groups::CollisionFilter;
use crate::input::{Camera, InputSnapshot};
use crate::physics::{PhysicsWorld, Vec3};
use crate::projectile::{Shooter, Shot};

/// Eye height above the capsule centre, as a fraction of total height.
const EYE_HEIGHT_FRACTION: f32 = 0.35;

/// Segment half-height of a Y capsule with the given total height and radius.
pub(crate) fn capsule_half_segment(height: f32, radius: f32) -> f32 {
    (height * 0.5 - radius).max(0.05)
}

/// The player-controlled character.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
    pub position: Vec3,
    pub camera: Camera,
    pub health: u32,
    pub fire_cooldown_ms: f32,
    pub jump_cooldown_ms: f32,
    /// Session time of the last damage that was applied.
    pub last_damage_ms: Option<f64>,
    /// Ground colliders currently touching the capsule.
    pub ground_contacts: u32,
    pub dead: bool,
    config: PlayerConfig,
}

impl Player {
    /// Creates the player body at the configured spawn point.
    pub fn spawn(world: &mut PhysicsWorld, id: EntityId, config: &PlayerConfig) -> Self {
        let [x, y, z] = config.spawn_point;
        let position = Vector::new(x, y, z);

        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .ccd_enabled(true)
            .user_data(BodyTag::new(EntityKind::Player, id).encode())
            .build();
        let body_handle = world.add_rigid_body(rigid_body);

        let collider = ColliderBuilder::capsule_y(
            capsule_half_segment(config.height, config.radius),
            config.radius,
        )
        .mass(config.mass)
        .friction(config.friction_vs_ground)
        .restitution(0.0)
        .collision_groups(CollisionFilter::player().to_interaction_groups())
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .build();
        let collider_handle = world.add_collider(collider, body_handle);

        Self {
            id,
            body_handle,
            collider_handle,
            position,
            camera: Camera::default(),
            health: config.health,
            fire_cooldown_ms: 0.0,
            jump_cooldown_ms: 0.0,
            last_damage_ms: None,
            ground_contacts: 0,
            dead: false,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn max_health(&self) -> u32 {
        self.config.health
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn half_segment(&self) -> f32 {
        capsule_half_segment(self.config.height, self.config.radius)
    }

    pub fn is_grounded(&self) -> bool {
        self.ground_contacts > 0
    }

    /// Applies one frame of input.
    ///
    /// Horizontal velocity is set directly (no acceleration); vertical velocity
    /// is left to gravity and jumps. Losing focus stops the player at once.
    pub fn update(&mut self, world: &mut PhysicsWorld, input: &InputSnapshot, dt: f32) {
        if self.dead {
            return;
        }

        let dt_ms = dt * 1000.0;
        self.fire_cooldown_ms = (self.fire_cooldown_ms - dt_ms).max(0.0);
        self.jump_cooldown_ms = (self.jump_cooldown_ms - dt_ms).max(0.0);

        if !input.focused {
            self.halt(world);
            return;
        }

        self.camera.look(input.look_delta, self.config.look_sensitivity);
        let velocity = self.camera.ground_move(input.move_axes) * self.config.speed;

        if let Some(body) = world.get_rigid_body_mut(self.body_handle) {
            let vertical = body.linvel().y;
            body.set_linvel(Vector::new(velocity.x, vertical, velocity.z), true);
        }
    }

    /// Zeroes horizontal velocity.
    pub fn halt(&self, world: &mut PhysicsWorld) {
        if let Some(body) = world.get_rigid_body_mut(self.body_handle) {
            let vertical = body.linvel().y;
            body.set_linvel(Vector::new(0.0, vertical, 0.0), true);
        }
    }

    /// Jumps if standing on ground and the jump cooldown elapsed.
    pub fn jump(&mut self, world: &mut PhysicsWorld) -> bool {
        if self.dead || !self.is_grounded() || self.jump_cooldown_ms > 0.0 {
            return false;
        }
        let Some(body) = world.get_rigid_body_mut(self.body_handle) else {
            return false;
        };

        // Zero the fall first so the jump height does not depend on it, then
        // add the velocity change of a `jump_force` impulse.
        let velocity = *body.linvel();
        body.set_linvel(
            Vector::new(velocity.x, self.jump_velocity(), velocity.z),
            true,
        );
        self.jump_cooldown_ms = self.config.jump_cooldown;
        true
    }

    /// Vertical speed produced by a `jump_force` impulse on a body of `mass`.
    pub fn jump_velocity(&self) -> f32 {
        self.config.jump_force / self.config.mass
    }

    /// Tracks ground contact begin/end notifications.
    pub fn on_ground_contact(&mut self, began: bool) {
        if began {
            self.ground_contacts += 1;
        } else {
            self.ground_contacts = self.ground_contacts.saturating_sub(1);
        }
    }

    /// Applies damage unless still inside the post-hit cooldown.
    ///
    /// Reaching zero health kills the player once: the body is stopped and put
    /// to sleep, and every later call is ignored until the session resets.
    pub fn take_damage(&mut self, world: &mut PhysicsWorld, amount: u32, now_ms: f64) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }
        if let Some(last) = self.last_damage_ms {
            if now_ms - last <= f64::from(self.config.damage_cooldown) {
                return DamageOutcome::Ignored;
            }
        }

        self.health = self.health.saturating_sub(amount);
        self.last_damage_ms = Some(now_ms);

        if self.health > 0 {
            return DamageOutcome::Damaged;
        }

        self.dead = true;
        if let Some(body) = world.get_rigid_body_mut(self.body_handle) {
            body.set_linvel(Vector::zeros(), false);
            body.set_angvel(Vector::zeros(), false);
            body.sleep();
        }
        tracing::info!("[player] player {} died", self.id);
        DamageOutcome::Killed
    }

    /// Fires along the camera direction when the fire cooldown is over.
    pub fn shoot(&mut self) -> Option<Shot> {
        if self.dead || self.fire_cooldown_ms > 0.0 {
            return None;
        }
        self.fire_cooldown_ms = self.config.fire_rate;

        Some(Shot {
            owner: Shooter::Player,
            origin: self.eye_position(),
            direction: self.camera.forward(),
            speed: self.config.bullet_speed,
            damage: self.config.bullet_damage,
            clearance: self.config.radius,
        })
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vector::new(0.0, self.config.height * EYE_HEIGHT_FRACTION, 0.0)
    }

    /// Copies the body position into `position`.
    pub fn sync_from_body(&mut self, world: &PhysicsWorld) {
        if let Some(position) = world.translation(self.body_handle) {
            self.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn setup() -> (PhysicsWorld, Player) {
        let mut world = PhysicsWorld::new();
        let config = GameConfig::default_arena().player;
        let player = Player::spawn(&mut world, 0, &config);
        (world, player)
    }

    fn vertical_velocity(world: &PhysicsWorld, player: &Player) -> f32 {
        world.linvel(player.body_handle).unwrap().y
    }

    #[test]
    fn test_spawn_at_full_health() {
        let (world, player) = setup();
        assert_eq!(player.health, player.max_health());
        assert!(!player.dead);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_move_sets_horizontal_velocity_directly() {
        let (mut world, mut player) = setup();
        let input = InputSnapshot {
            move_axes: [0.0, 1.0],
            ..InputSnapshot::idle()
        };
        player.update(&mut world, &input, 1.0 / 60.0);

        let velocity = world.linvel(player.body_handle).unwrap();
        assert!((velocity.z + player.config().speed).abs() < 1.0e-4);
        assert!(velocity.x.abs() < 1.0e-4);
    }

    #[test]
    fn test_focus_loss_stops_coasting() {
        let (mut world, mut player) = setup();
        let running = InputSnapshot {
            move_axes: [1.0, 0.0],
            ..InputSnapshot::idle()
        };
        player.update(&mut world, &running, 1.0 / 60.0);
        assert!(world.linvel(player.body_handle).unwrap().x > 0.0);

        player.update(&mut world, &InputSnapshot::unfocused(), 1.0 / 60.0);
        let velocity = world.linvel(player.body_handle).unwrap();
        assert_eq!(velocity.x, 0.0);
        assert_eq!(velocity.z, 0.0);
    }

    #[test]
    fn test_jump_requires_ground_contact() {
        let (mut world, mut player) = setup();
        assert_eq!(player.ground_contacts, 0);

        let before = vertical_velocity(&world, &player);
        assert!(!player.jump(&mut world));
        assert_eq!(vertical_velocity(&world, &player), before);
    }

    #[test]
    fn test_jump_from_ground_and_cooldown() {
        let (mut world, mut player) = setup();
        player.on_ground_contact(true);

        assert!(player.jump(&mut world));
        assert!(vertical_velocity(&world, &player) > 0.0);

        // Still touching the ground, but the cooldown blocks a double jump.
        assert!(!player.jump(&mut world));
    }

    #[test]
    fn test_ground_contacts_never_underflow() {
        let (_, mut player) = setup();
        player.on_ground_contact(false);
        assert_eq!(player.ground_contacts, 0);
        player.on_ground_contact(true);
        player.on_ground_contact(true);
        player.on_ground_contact(false);
        assert!(player.is_grounded());
    }

    #[test]
    fn test_shoot_respects_cooldown() {
        let (mut world, mut player) = setup();
        assert!(player.shoot().is_some());
        assert_eq!(player.fire_cooldown_ms, player.config().fire_rate);
        assert!(player.shoot().is_none());

        player.update(&mut world, &InputSnapshot::idle(), 0.1);
        assert!(player.fire_cooldown_ms > 0.0);
        assert!(player.shoot().is_none());

        player.update(&mut world, &InputSnapshot::idle(), 0.1);
        assert_eq!(player.fire_cooldown_ms, 0.0);
        assert!(player.shoot().is_some());
        assert_eq!(player.fire_cooldown_ms, player.config().fire_rate);
    }

    #[test]
    fn test_damage_cooldown() {
        let (mut world, mut player) = setup();
        assert_eq!(player.take_damage(&mut world, 10, 0.0), DamageOutcome::Damaged);
        assert_eq!(player.take_damage(&mut world, 10, 100.0), DamageOutcome::Ignored);
        assert_eq!(player.health, 90);
        assert_eq!(player.take_damage(&mut world, 10, 600.0), DamageOutcome::Damaged);
        assert_eq!(player.health, 80);
    }

    #[test]
    fn test_death_is_terminal_and_floors_health() {
        let (mut world, mut player) = setup();
        assert_eq!(player.take_damage(&mut world, 1_000, 0.0), DamageOutcome::Killed);
        assert_eq!(player.health, 0);
        assert!(player.dead);
        assert!(world.get_rigid_body(player.body_handle).unwrap().is_sleeping());

        assert_eq!(player.take_damage(&mut world, 1_000, 10_000.0), DamageOutcome::Ignored);
        assert_eq!(player.health, 0);
        assert!(player.shoot().is_none());
    }
}
