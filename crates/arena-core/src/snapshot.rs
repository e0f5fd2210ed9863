//! Read-only view of a session handed to the renderer and HUD.

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::entity::EntityId;
use crate::physics::Vec3;
use crate::projectile::Shooter;
use crate::session::{GameState, Session};

fn to_array(v: &Vec3) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub health: u32,
    pub max_health: u32,
    pub dead: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub position: [f32; 3],
    pub health: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub position: [f32; 3],
    pub owner: Shooter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub position: [f32; 3],
    /// `0.0` when spawned, `1.0` when finished.
    pub progress: f32,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub state: GameState,
    pub score: u32,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub effects: Vec<EffectView>,
}

impl RenderSnapshot {
    /// Captures the current session state.
    pub fn from_session(session: &Session) -> Self {
        let player = session.player();
        Self {
            state: session.state(),
            score: session.score(),
            player: PlayerView {
                position: to_array(&player.position),
                yaw: player.camera.yaw,
                pitch: player.camera.pitch,
                health: player.health,
                max_health: player.max_health(),
                dead: player.dead,
            },
            enemies: session
                .enemies()
                .iter()
                .filter(|e| e.is_active)
                .map(|e| EnemyView {
                    id: e.id,
                    position: to_array(&e.position),
                    health: e.health,
                })
                .collect(),
            projectiles: session
                .projectiles()
                .projectiles()
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    position: to_array(&p.position),
                    owner: p.owner,
                })
                .collect(),
            effects: session
                .effects()
                .effects()
                .iter()
                .map(|e| EffectView {
                    kind: e.kind,
                    position: to_array(&e.position),
                    progress: e.progress(),
                })
                .collect(),
        }
    }

    /// Serializes the snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Session {
    /// Creates a render snapshot of the current state.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::from_session(self)
    }
}
