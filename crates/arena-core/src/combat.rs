//! Post-step combat resolution.
//!
//! Physics only says that a projectile touched *something*. The resolver
//! decides which target logically owns the hit by proximity, applies damage
//! and score exactly once per projectile, and reports kills so the session
//! can schedule explosions and sounds.

use rapier3d::parry::query::PointQuery;
use rapier3d::parry::query::closest_points::closest_points_segment_segment_with_locations;
use rapier3d::parry::shape::Segment;
use rapier3d::prelude::{Isometry, Point, Vector};
use serde::{Deserialize, Serialize};

use crate::enemy::EnemyRoster;
use crate::entity::EntityId;
use crate::physics::{PhysicsWorld, Vec3};
use crate::player::Player;
use crate::projectile::{Projectile, Shooter};

/// Extra slack on top of the summed radii when matching a hit to a target.
pub const HIT_EPSILON: f32 = 0.25;

/// Result of applying damage to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageOutcome {
    /// Target already dead/inactive, or inside its damage cooldown.
    Ignored,
    Damaged,
    /// This hit brought health to zero. Fired once per entity.
    Killed,
}

/// Who a projectile was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTarget {
    Player,
    Enemy(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub projectile: EntityId,
    pub target: HitTarget,
    pub damage: u32,
    pub outcome: DamageOutcome,
    pub position: Vec3,
}

/// Everything the resolver changed in one pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub hits: Vec<HitRecord>,
    /// Enemies killed, with their last position.
    pub kills: Vec<(EntityId, Vec3)>,
    pub score: u32,
    pub player_hit: bool,
    pub player_killed: bool,
}

/// Core segment of a vertical capsule centred at `center`.
fn capsule_axis(center: &Vec3, half_segment: f32) -> Segment {
    let offset = Vector::new(0.0, half_segment, 0.0);
    Segment::new(Point::from(center - offset), Point::from(center + offset))
}

/// Distance from `point` to a vertical capsule axis centred at `center`.
pub fn distance_to_capsule_axis(point: &Vec3, center: &Vec3, half_segment: f32) -> f32 {
    capsule_axis(center, half_segment).distance_to_local_point(&Point::from(*point), true)
}

/// Closest approach of the segment `from -> to` to a vertical capsule axis.
///
/// Returns the distance and the point on the segment where it occurs.
pub fn swept_distance_to_capsule_axis(
    from: &Vec3,
    to: &Vec3,
    center: &Vec3,
    half_segment: f32,
) -> (f32, Vec3) {
    let path = Segment::new(Point::from(*from), Point::from(*to));
    let axis = capsule_axis(center, half_segment);
    let (on_path, on_axis) =
        closest_points_segment_segment_with_locations(&Isometry::identity(), &path, &axis);
    let impact = path.point_at(&on_path);
    let distance = (impact - axis.point_at(&on_axis)).norm();
    (distance, impact.coords)
}

/// Stateless resolver for retired projectiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Matches every hit projectile in `retired` to at most one target.
    ///
    /// Player projectiles are tested against active enemies in roster order,
    /// enemy projectiles against the player, using the path swept during the
    /// last step. Projectiles that expired without a hit are skipped.
    pub fn resolve(
        retired: &[Projectile],
        enemies: &mut EnemyRoster,
        player: &mut Player,
        world: &mut PhysicsWorld,
        now_ms: f64,
    ) -> CombatReport {
        let mut report = CombatReport::default();
        let score_value = enemies.config().score_value;
        let enemy_radius = enemies.config().radius;
        let enemy_half_segment = enemies.half_segment();

        for projectile in retired.iter().filter(|p| p.hit) {
            match projectile.owner {
                Shooter::Player => {
                    let threshold = projectile.radius + enemy_radius + HIT_EPSILON;
                    for enemy in enemies.iter_mut().filter(|e| e.is_active) {
                        let (distance, impact) = swept_distance_to_capsule_axis(
                            &projectile.previous_position,
                            &projectile.position,
                            &enemy.position,
                            enemy_half_segment,
                        );
                        if distance > threshold {
                            continue;
                        }

                        let outcome = enemy.take_damage(projectile.damage);
                        report.hits.push(HitRecord {
                            projectile: projectile.id,
                            target: HitTarget::Enemy(enemy.id),
                            damage: projectile.damage,
                            outcome,
                            position: impact,
                        });
                        if outcome == DamageOutcome::Killed {
                            report.kills.push((enemy.id, enemy.position));
                            report.score = report.score.saturating_add(score_value);
                            tracing::debug!(
                                "[combat] projectile {} killed enemy {}",
                                projectile.id,
                                enemy.id
                            );
                        }
                        break;
                    }
                }
                Shooter::Enemy(_) => {
                    let threshold = projectile.radius + player.radius() + HIT_EPSILON;
                    let (distance, impact) = swept_distance_to_capsule_axis(
                        &projectile.previous_position,
                        &projectile.position,
                        &player.position,
                        player.half_segment(),
                    );
                    if distance > threshold {
                        continue;
                    }

                    let outcome = player.take_damage(world, projectile.damage, now_ms);
                    report.hits.push(HitRecord {
                        projectile: projectile.id,
                        target: HitTarget::Player,
                        damage: projectile.damage,
                        outcome,
                        position: impact,
                    });
                    report.player_hit |= outcome != DamageOutcome::Ignored;
                    report.player_killed |= outcome == DamageOutcome::Killed;
                }
            }
        }

        report
    }
}
