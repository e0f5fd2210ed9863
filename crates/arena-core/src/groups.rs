//! Collision categories and group/mask filtering.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use rapier3d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};

/// A set of collision categories stored as bit flags.
///
/// Every named category owns exactly one bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CollisionGroup(u32);

impl CollisionGroup {
    pub const NONE: Self = Self(0);
    pub const PLAYER: Self = Self(1);
    pub const GROUND: Self = Self(2);
    pub const ENEMY: Self = Self(4);
    pub const PROJECTILE: Self = Self(8);
    pub const WALL: Self = Self(16);
    pub const ALL: Self = Self(1 | 2 | 4 | 8 | 16);

    /// Named categories, in bit order.
    pub const CATEGORIES: [(Self, &'static str); 5] = [
        (Self::PLAYER, "player"),
        (Self::GROUND, "ground"),
        (Self::ENEMY, "enemy"),
        (Self::PROJECTILE, "projectile"),
        (Self::WALL, "wall"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CollisionGroup {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for CollisionGroup {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionGroup {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for CollisionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::CATEGORIES
            .iter()
            .filter(|(group, _)| self.intersects(*group))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "CollisionGroup({})", names.join("|"))
    }
}

/// What a body is (`group`) and what it may touch (`mask`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub group: CollisionGroup,
    pub mask: CollisionGroup,
}

impl CollisionFilter {
    pub const fn new(group: CollisionGroup, mask: CollisionGroup) -> Self {
        Self { group, mask }
    }

    /// Two bodies generate a contact only when each one's group is in the other's mask.
    pub const fn can_collide(&self, other: &Self) -> bool {
        self.group.intersects(other.mask) && other.group.intersects(self.mask)
    }

    /// Player capsule: stands on ground, bumps walls and enemies, takes enemy fire.
    pub const fn player() -> Self {
        Self::new(
            CollisionGroup::PLAYER,
            CollisionGroup::GROUND
                .union(CollisionGroup::WALL)
                .union(CollisionGroup::ENEMY)
                .union(CollisionGroup::PROJECTILE),
        )
    }

    pub const fn enemy() -> Self {
        Self::new(
            CollisionGroup::ENEMY,
            CollisionGroup::GROUND
                .union(CollisionGroup::WALL)
                .union(CollisionGroup::ENEMY)
                .union(CollisionGroup::PLAYER)
                .union(CollisionGroup::PROJECTILE),
        )
    }

    /// Projectiles never touch each other or the category that fired them.
    pub const fn projectile(fired_by_player: bool) -> Self {
        let target = if fired_by_player {
            CollisionGroup::ENEMY
        } else {
            CollisionGroup::PLAYER
        };
        Self::new(
            CollisionGroup::PROJECTILE,
            target.union(CollisionGroup::GROUND).union(CollisionGroup::WALL),
        )
    }

    pub const fn ground() -> Self {
        Self::new(CollisionGroup::GROUND, CollisionGroup::ALL)
    }

    pub const fn wall() -> Self {
        Self::new(CollisionGroup::WALL, CollisionGroup::ALL)
    }

    /// Converts to Rapier interaction groups (memberships = group, filter = mask).
    pub fn to_interaction_groups(self) -> InteractionGroups {
        InteractionGroups::all()
            .with_memberships(Group::from_bits_truncate(self.group.bits()))
            .with_filter(Group::from_bits_truncate(self.mask.bits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_bit_per_category() {
        for (group, name) in CollisionGroup::CATEGORIES {
            assert_eq!(group.bits().count_ones(), 1, "{name} must own exactly one bit");
        }
        let combined = CollisionGroup::CATEGORIES
            .iter()
            .fold(CollisionGroup::NONE, |acc, (g, _)| acc | *g);
        assert_eq!(combined, CollisionGroup::ALL);
    }

    #[test]
    fn test_projectiles_never_collide_with_each_other() {
        let a = CollisionFilter::projectile(true);
        let b = CollisionFilter::projectile(false);
        assert!(!a.can_collide(&b));
        assert!(!a.can_collide(&a));
    }

    #[test]
    fn test_projectile_ignores_its_firer() {
        assert!(!CollisionFilter::projectile(true).can_collide(&CollisionFilter::player()));
        assert!(CollisionFilter::projectile(true).can_collide(&CollisionFilter::enemy()));
        assert!(!CollisionFilter::projectile(false).can_collide(&CollisionFilter::enemy()));
        assert!(CollisionFilter::projectile(false).can_collide(&CollisionFilter::player()));
    }

    #[test]
    fn test_empty_mask_never_collides() {
        let cosmetic = CollisionFilter::new(CollisionGroup::ENEMY, CollisionGroup::NONE);
        for (group, _) in CollisionGroup::CATEGORIES {
            let other = CollisionFilter::new(group, CollisionGroup::ALL);
            assert!(!cosmetic.can_collide(&other));
        }
    }

    #[test]
    fn test_filtering_is_symmetric() {
        let filters = [
            CollisionFilter::player(),
            CollisionFilter::enemy(),
            CollisionFilter::projectile(true),
            CollisionFilter::projectile(false),
            CollisionFilter::ground(),
            CollisionFilter::wall(),
        ];
        for a in &filters {
            for b in &filters {
                assert_eq!(a.can_collide(b), b.can_collide(a));
            }
        }
    }

    #[test]
    fn test_debug_lists_names() {
        let g = CollisionGroup::PLAYER | CollisionGroup::WALL;
        assert_eq!(format!("{g:?}"), "CollisionGroup(player|wall)");
    }
}
