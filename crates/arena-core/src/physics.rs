//! Physics simulation using `Rapier3D` with fixed sub-stepping.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use parking_lot::Mutex;
use rapier3d::prelude::*;

use crate::entity::{BodyTag, EntityKind};
use crate::groups::CollisionGroup;

/// World-space vector (metres).
pub type Vec3 = Vector<Real>;

/// Fixed timestep for one physics sub-step (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Slack used when comparing the accumulator against [`PHYSICS_DT`].
const ACCUMULATOR_SLACK: f32 = 1.0e-6;

/// Default gravity vector (downward, in m/s²).
pub fn default_gravity() -> Vec3 {
    Vector::new(0.0, -9.82, 0.0)
}

/// Contact notification produced during a physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Began(BodyTag, BodyTag),
    Ended(BodyTag, BodyTag),
}

impl ContactEvent {
    pub fn tags(&self) -> (BodyTag, BodyTag) {
        match *self {
            Self::Began(a, b) | Self::Ended(a, b) => (a, b),
        }
    }

    pub fn began(&self) -> bool {
        matches!(self, Self::Began(..))
    }

    /// If one side is of `kind`, returns `(that side, other side)`.
    pub fn involving(&self, kind: EntityKind) -> Option<(BodyTag, BodyTag)> {
        let (a, b) = self.tags();
        if a.is(kind) {
            Some((a, b))
        } else if b.is(kind) {
            Some((b, a))
        } else {
            None
        }
    }
}

/// Friction/restitution override for contacts between two categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// Per-pair material table, applied to solver contacts through Rapier hooks.
#[derive(Debug, Default)]
struct ContactMaterials {
    table: HashMap<(u32, u32), ContactMaterial>,
}

impl ContactMaterials {
    fn key(a: u32, b: u32) -> (u32, u32) {
        if a <= b { (a, b) } else { (b, a) }
    }

    fn insert(&mut self, a: CollisionGroup, b: CollisionGroup, material: ContactMaterial) {
        self.table.insert(Self::key(a.bits(), b.bits()), material);
    }

    fn lookup(&self, a: u32, b: u32) -> Option<ContactMaterial> {
        self.table.get(&Self::key(a, b)).copied()
    }
}

impl PhysicsHooks for ContactMaterials {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let group1 = context.colliders[context.collider1]
            .collision_groups()
            .memberships
            .bits();
        let group2 = context.colliders[context.collider2]
            .collision_groups()
            .memberships
            .bits();

        if let Some(material) = self.lookup(group1, group2) {
            for contact in context.solver_contacts.iter_mut() {
                contact.friction = material.friction;
                contact.restitution = material.restitution;
            }
        }
    }
}

/// Buffers collision events raised inside the pipeline step.
///
/// The handler only appends; gameplay state is never touched from here.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<ContactEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        // Colliders removed since the last step can no longer be tagged.
        let (Some(a), Some(b)) = (
            collider_tag(bodies, colliders, event.collider1()),
            collider_tag(bodies, colliders, event.collider2()),
        ) else {
            return;
        };

        let contact = if event.started() {
            ContactEvent::Began(a, b)
        } else {
            ContactEvent::Ended(a, b)
        };
        self.events.lock().push(contact);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Maps a collider to the tag stored on its parent body (or on itself when static).
fn collider_tag(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    handle: ColliderHandle,
) -> Option<BodyTag> {
    let collider = colliders.get(handle)?;
    let user_data = match collider.parent() {
        Some(parent) => bodies.get(parent)?.user_data,
        None => collider.user_data,
    };
    BodyTag::decode(user_data)
}

/// Physics world containing all `Rapier3D` components.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub gravity: Vec3,
    pub frame: u64,
    accumulator: f32,
    materials: ContactMaterials,
    collector: ContactCollector,
    contacts: Vec<ContactEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("rigid_body_count", &self.rigid_body_set.len())
            .field("collider_count", &self.collider_set.len())
            .field("gravity", &self.gravity)
            .field("materials", &self.materials.table.len())
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings.
    pub fn new() -> Self {
        Self::with_gravity(default_gravity())
    }

    /// Creates a new physics world with custom gravity.
    pub fn with_gravity(gravity: Vec3) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_DT,
            ..Default::default()
        };

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity,
            frame: 0,
            accumulator: 0.0,
            materials: ContactMaterials::default(),
            collector: ContactCollector::default(),
            contacts: Vec::new(),
        }
    }

    /// Advances the simulation by `dt` seconds in fixed sub-steps.
    ///
    /// At most `max_sub_steps` sub-steps run per call; time beyond that cap is
    /// dropped instead of carried over. Contacts raised by every sub-step are
    /// available from [`Self::contacts_since_last_step`] afterwards.
    /// Returns the number of sub-steps taken.
    pub fn step(&mut self, dt: f32, max_sub_steps: u32) -> u32 {
        self.contacts.clear();
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator + ACCUMULATOR_SLACK >= PHYSICS_DT && steps < max_sub_steps {
            self.step_once();
            self.accumulator -= PHYSICS_DT;
            steps += 1;
        }

        if self.accumulator >= PHYSICS_DT {
            self.accumulator %= PHYSICS_DT;
        }
        self.accumulator = self.accumulator.max(0.0);
        steps
    }

    /// Advances the physics simulation by exactly one fixed sub-step.
    pub fn step_once(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &self.materials,
            &self.collector,
        );
        self.contacts.extend(self.collector.drain());
        self.frame += 1;
    }

    /// Contacts begun or ended during the most recent `step` call.
    pub fn contacts_since_last_step(&self) -> &[ContactEvent] {
        &self.contacts
    }

    /// Overrides friction/restitution for contacts between two categories.
    ///
    /// Only colliders built with `ActiveHooks::MODIFY_SOLVER_CONTACTS` are affected.
    pub fn set_contact_material(
        &mut self,
        a: CollisionGroup,
        b: CollisionGroup,
        material: ContactMaterial,
    ) {
        self.materials.insert(a, b, material);
    }

    pub fn contact_material(&self, a: CollisionGroup, b: CollisionGroup) -> Option<ContactMaterial> {
        self.materials.lookup(a.bits(), b.bits())
    }

    /// Adds a rigid body to the world and returns its handle.
    pub fn add_rigid_body(&mut self, rigid_body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(rigid_body)
    }

    /// Adds a collider attached to a rigid body.
    pub fn add_collider(&mut self, collider: Collider, parent: RigidBodyHandle) -> ColliderHandle {
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    /// Adds a collider without a parent (static collider).
    pub fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Removes a rigid body and its attached colliders.
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        debug_assert!(
            self.rigid_body_set.contains(handle),
            "rigid body {handle:?} removed twice"
        );
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Gets an immutable reference to a rigid body.
    pub fn get_rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Gets a mutable reference to a rigid body.
    pub fn get_rigid_body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.get_rigid_body(handle).map(|body| *body.translation())
    }

    pub fn linvel(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.get_rigid_body(handle).map(|body| *body.linvel())
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Computes a deterministic hash of the current physics state.
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.frame.hash(&mut hasher);

        for (handle, body) in self.rigid_body_set.iter() {
            let (index, generation) = handle.into_raw_parts();
            index.hash(&mut hasher);
            generation.hash(&mut hasher);

            for value in body.translation().iter() {
                hash_f32(*value, &mut hasher);
            }
            for value in body.rotation().coords.iter() {
                hash_f32(*value, &mut hasher);
            }
            for value in body.linvel().iter() {
                hash_f32(*value, &mut hasher);
            }
            for value in body.angvel().iter() {
                hash_f32(*value, &mut hasher);
            }
        }

        hasher.finish()
    }

    /// Returns the current simulation frame number.
    pub fn current_frame(&self) -> u64 {
        self.frame
    }
}

/// Hashes a f32 value by converting to bits.
fn hash_f32(value: f32, hasher: &mut impl Hasher) {
    value.to_bits().hash(hasher);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::CollisionFilter;

    fn tagged_ball(
        world: &mut PhysicsWorld,
        tag: BodyTag,
        filter: CollisionFilter,
        position: Vec3,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .gravity_scale(0.0)
            .user_data(tag.encode())
            .build();
        let handle = world.add_rigid_body(body);
        let collider = ColliderBuilder::ball(0.5)
            .collision_groups(filter.to_interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        world.add_collider(collider, handle);
        handle
    }

    #[test]
    fn test_physics_world_creation() {
        let world = PhysicsWorld::new();
        assert_eq!(world.frame, 0);
        assert_eq!(world.integration_parameters.dt, PHYSICS_DT);
    }

    #[test]
    fn test_sub_steps_are_capped() {
        let mut world = PhysicsWorld::new();
        let steps = world.step(1.0, 3);
        assert_eq!(steps, 3);
        assert_eq!(world.current_frame(), 3);

        // Excess time was dropped, so a tiny delta does not trigger a burst.
        let steps = world.step(0.001, 3);
        assert!(steps <= 1);
    }

    #[test]
    fn test_sub_steps_accumulate() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.step(PHYSICS_DT * 0.5, 5), 0);
        assert_eq!(world.step(PHYSICS_DT * 0.5, 5), 1);
        assert_eq!(world.step(PHYSICS_DT * 2.0, 5), 2);
        assert_eq!(world.current_frame(), 3);
    }

    #[test]
    fn test_non_positive_delta_is_ignored() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.step(0.0, 5), 0);
        assert_eq!(world.step(-1.0, 5), 0);
        assert_eq!(world.step(f32::NAN, 5), 0);
        assert_eq!(world.current_frame(), 0);
    }

    #[test]
    fn test_deterministic_simulation() {
        let mut world1 = PhysicsWorld::new();
        let mut world2 = PhysicsWorld::new();

        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(0.0, 10.0, 0.0))
            .build();
        let collider = ColliderBuilder::ball(0.5).restitution(0.7).build();

        let handle1 = world1.add_rigid_body(body.clone());
        world1.add_collider(collider.clone(), handle1);

        let handle2 = world2.add_rigid_body(body);
        world2.add_collider(collider, handle2);

        for _ in 0..100 {
            world1.step(PHYSICS_DT, 1);
            world2.step(PHYSICS_DT, 1);
        }

        assert_eq!(world1.compute_hash(), world2.compute_hash());
        assert_eq!(world1.translation(handle1), world2.translation(handle2));
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = PhysicsWorld::new();
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(0.0, 10.0, 0.0))
            .build();
        let handle = world.add_rigid_body(body);
        world.add_collider(ColliderBuilder::ball(0.5).build(), handle);

        world.step(PHYSICS_DT * 30.0, 30);
        let y = world.translation(handle).unwrap().y;
        assert!(y < 10.0);
    }

    #[test]
    fn test_add_and_remove_body() {
        let mut world = PhysicsWorld::new();

        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(5.0, 5.0, 5.0))
            .build();
        let handle = world.add_rigid_body(body);
        assert!(world.get_rigid_body(handle).is_some());
        assert_eq!(world.body_count(), 1);

        world.remove_rigid_body(handle);
        assert!(world.get_rigid_body(handle).is_none());
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_overlapping_bodies_report_contacts() {
        let mut world = PhysicsWorld::new();
        let player = BodyTag::new(EntityKind::Player, 0);
        let enemy = BodyTag::new(EntityKind::Enemy, 1);
        tagged_ball(&mut world, player, CollisionFilter::player(), Vector::zeros());
        tagged_ball(&mut world, enemy, CollisionFilter::enemy(), Vector::new(0.5, 0.0, 0.0));

        world.step(PHYSICS_DT, 1);

        let began = world
            .contacts_since_last_step()
            .iter()
            .filter(|e| e.began())
            .count();
        assert_eq!(began, 1);
        let (own, other) = world.contacts_since_last_step()[0]
            .involving(EntityKind::Enemy)
            .unwrap();
        assert_eq!(own, enemy);
        assert_eq!(other, player);
    }

    #[test]
    fn test_filtered_bodies_never_report_contacts() {
        let mut world = PhysicsWorld::new();
        for id in 0..10 {
            let tag = BodyTag::new(EntityKind::Projectile, id);
            tagged_ball(&mut world, tag, CollisionFilter::projectile(true), Vector::zeros());
        }

        world.step(PHYSICS_DT * 5.0, 5);
        assert!(world.contacts_since_last_step().is_empty());
    }

    #[test]
    fn test_contact_materials_are_symmetric() {
        let mut world = PhysicsWorld::new();
        let material = ContactMaterial {
            friction: 0.0,
            restitution: 0.1,
        };
        world.set_contact_material(CollisionGroup::PLAYER, CollisionGroup::GROUND, material);

        assert_eq!(
            world.contact_material(CollisionGroup::GROUND, CollisionGroup::PLAYER),
            Some(material)
        );
        assert_eq!(
            world.contact_material(CollisionGroup::ENEMY, CollisionGroup::GROUND),
            None
        );
    }
}
