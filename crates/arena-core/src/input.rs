//! Per-tick input snapshot and the first-person camera it steers.

use rapier3d::prelude::Vector;
use serde::{Deserialize, Serialize};

use crate::physics::Vec3;

/// Pitch limit, just short of straight up/down so the forward vector never
/// collapses onto the vertical axis.
pub const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Input sampled once per frame by the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// `[strafe, forward]`, each in `-1.0..=1.0` (right and forward positive).
    pub move_axes: [f32; 2],
    /// Raw look delta `[yaw, pitch]` since the previous frame.
    pub look_delta: [f32; 2],
    pub jump: bool,
    pub fire: bool,
    /// False once pointer lock / window focus is lost.
    pub focused: bool,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            move_axes: [0.0, 0.0],
            look_delta: [0.0, 0.0],
            jump: false,
            fire: false,
            focused: true,
        }
    }
}

impl InputSnapshot {
    /// A snapshot with no buttons held and no movement.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Input reported after focus loss: everything released.
    pub fn unfocused() -> Self {
        Self {
            focused: false,
            ..Self::default()
        }
    }
}

/// Yaw/pitch camera attached to the player. Yaw 0 looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    /// Applies a look delta scaled by `sensitivity`; pitch is clamped to [`MAX_PITCH`].
    pub fn look(&mut self, delta: [f32; 2], sensitivity: f32) {
        if !(delta[0].is_finite() && delta[1].is_finite()) {
            return;
        }
        self.yaw = (self.yaw - delta[0] * sensitivity) % std::f32::consts::TAU;
        self.pitch = (self.pitch - delta[1] * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Unit view direction including pitch.
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Unit right vector, always horizontal.
    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vector::new(cos_yaw, 0.0, -sin_yaw)
    }

    /// Movement direction on the ground plane for the given axes.
    ///
    /// Forward is the view direction with its vertical component removed and
    /// renormalised; the result is unit length, or zero when there is no input.
    pub fn ground_move(&self, axes: [f32; 2]) -> Vec3 {
        let mut forward = self.forward();
        forward.y = 0.0;
        let forward = forward.try_normalize(f32::EPSILON).unwrap_or_else(Vector::zeros);

        let mut direction = forward * axes[1] + self.right() * axes[0];
        direction.y = 0.0;
        direction.try_normalize(f32::EPSILON).unwrap_or_else(Vector::zeros)
    }
}
