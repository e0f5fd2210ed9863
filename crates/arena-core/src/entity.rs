//! Entity identity shared by every gameplay object that owns a rigid body.
//!
//! Ids are never reused within a session, so a stale id held by a contact
//! event or a render snapshot can never alias a newer entity.

use serde::{Deserialize, Serialize};

/// Unique identifier for a gameplay entity.
pub type EntityId = u64;

/// Kind of object a rigid body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Enemy,
    Projectile,
    Ground,
    Wall,
}

impl EntityKind {
    const fn tag(self) -> u64 {
        match self {
            Self::Player => 1,
            Self::Enemy => 2,
            Self::Projectile => 3,
            Self::Ground => 4,
            Self::Wall => 5,
        }
    }

    const fn from_tag(tag: u64) -> Option<Self> {
        match tag {
            1 => Some(Self::Player),
            2 => Some(Self::Enemy),
            3 => Some(Self::Projectile),
            4 => Some(Self::Ground),
            5 => Some(Self::Wall),
            _ => None,
        }
    }
}

/// Kind + id stored in a rigid body's `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyTag {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl BodyTag {
    pub const fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    /// Encodes the tag into u128 user_data (kind in the high half, id in the low half).
    pub const fn encode(self) -> u128 {
        ((self.kind.tag() as u128) << 64) | (self.id as u128)
    }

    /// Decodes user_data; zero (untagged) and unknown kinds yield `None`.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(user_data: u128) -> Option<Self> {
        let tag = (user_data >> 64) as u64;
        let id = user_data as u64;
        match EntityKind::from_tag(tag) {
            Some(kind) => Some(Self { kind, id }),
            None => None,
        }
    }

    pub const fn is(self, kind: EntityKind) -> bool {
        self.kind as u8 == kind as u8
    }
}

/// Hands out monotonically increasing entity ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}
