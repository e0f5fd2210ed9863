//! Static arena geometry: a floor slab and four perimeter walls.

use rapier3d::prelude::*;

use crate::config::{GameSettings, PlayerConfig};
use crate::entity::{BodyTag, EntityId, EntityKind, IdAllocator};
use crate::groups::{CollisionFilter, CollisionGroup};
use crate::physics::{ContactMaterial, PhysicsWorld};

/// Thickness of the floor slab below y = 0.
const FLOOR_THICKNESS: f32 = 1.0;

/// Handles of the arena's static colliders.
#[derive(Debug, Clone)]
pub struct Arena {
    pub floor_id: EntityId,
    pub floor: ColliderHandle,
    pub walls: Vec<(EntityId, ColliderHandle)>,
    half_extent: f32,
    wall_height: f32,
}

impl Arena {
    /// Builds the arena into `world` and registers the player/ground material.
    ///
    /// The floor's top face lies at y = 0 and the walls enclose the square
    /// `[-floor_size / 2, floor_size / 2]` on X and Z.
    pub fn build(
        world: &mut PhysicsWorld,
        ids: &mut IdAllocator,
        settings: &GameSettings,
        player: &PlayerConfig,
    ) -> Self {
        let half = settings.floor_size * 0.5;
        let thickness = settings.wall_thickness;
        let wall_half_height = settings.wall_height * 0.5;

        let floor_id = ids.next_id();
        let floor = world.add_static_collider(
            ColliderBuilder::cuboid(half, FLOOR_THICKNESS * 0.5, half)
                .translation(Vector::new(0.0, -FLOOR_THICKNESS * 0.5, 0.0))
                .collision_groups(CollisionFilter::ground().to_interaction_groups())
                .user_data(BodyTag::new(EntityKind::Ground, floor_id).encode())
                .build(),
        );

        let offset = half + thickness * 0.5;
        let span = half + thickness;
        let placements = [
            (Vector::new(thickness * 0.5, wall_half_height, span), Vector::new(offset, wall_half_height, 0.0)),
            (Vector::new(thickness * 0.5, wall_half_height, span), Vector::new(-offset, wall_half_height, 0.0)),
            (Vector::new(span, wall_half_height, thickness * 0.5), Vector::new(0.0, wall_half_height, offset)),
            (Vector::new(span, wall_half_height, thickness * 0.5), Vector::new(0.0, wall_half_height, -offset)),
        ];

        let walls = placements
            .into_iter()
            .map(|(extents, center)| {
                let id = ids.next_id();
                let handle = world.add_static_collider(
                    ColliderBuilder::cuboid(extents.x, extents.y, extents.z)
                        .translation(center)
                        .friction(0.0)
                        .collision_groups(CollisionFilter::wall().to_interaction_groups())
                        .user_data(BodyTag::new(EntityKind::Wall, id).encode())
                        .build(),
                );
                (id, handle)
            })
            .collect();

        world.set_contact_material(
            CollisionGroup::PLAYER,
            CollisionGroup::GROUND,
            ContactMaterial {
                friction: player.friction_vs_ground,
                restitution: 0.0,
            },
        );

        tracing::info!(
            "[arena] built {}x{} floor with {}m walls",
            settings.floor_size,
            settings.floor_size,
            settings.wall_height
        );

        Self {
            floor_id,
            floor,
            walls,
            half_extent: half,
            wall_height: settings.wall_height,
        }
    }

    /// Half the floor edge length.
    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    pub fn wall_height(&self) -> f32 {
        self.wall_height
    }
}
