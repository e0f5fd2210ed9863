//! Scripted input that plays the game well enough to exercise every system.

use std::f32::consts::{PI, TAU};

use arena_core::{Camera, InputSnapshot, Session, Vec3};

/// Frames between jumps.
const JUMP_PERIOD: u64 = 90;

/// Frames spent strafing in one direction before switching.
const STRAFE_PERIOD: u64 = 180;

/// Aim error (radians) under which the bot pulls the trigger.
const FIRE_TOLERANCE: f32 = 0.05;

/// Wraps an angle into `-PI..=PI`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped < -PI { wrapped + TAU } else { wrapped }
}

/// Yaw and pitch that point the camera from `from` to `to`.
pub fn aim_angles(from: &Vec3, to: &Vec3) -> (f32, f32) {
    let d = to - from;
    let yaw = (-d.x).atan2(-d.z);
    let horizontal = (d.x * d.x + d.z * d.z).sqrt();
    let pitch = d.y.atan2(horizontal);
    (yaw, pitch)
}

/// Look delta that turns `camera` to the given angles in one frame.
fn look_delta(camera: &Camera, yaw: f32, pitch: f32, sensitivity: f32) -> [f32; 2] {
    [
        wrap_angle(camera.yaw - yaw) / sensitivity,
        (camera.pitch - pitch) / sensitivity,
    ]
}

/// Aims at the nearest enemy, strafes and jumps periodically.
#[derive(Debug, Default)]
pub struct Bot {
    frame: u64,
}

impl Bot {
    pub fn input(&mut self, session: &Session) -> InputSnapshot {
        let frame = self.frame;
        self.frame += 1;

        let player = session.player();
        let eye = player.eye_position();
        let strafe = if (frame / STRAFE_PERIOD) % 2 == 0 { 1.0 } else { -1.0 };

        let mut input = InputSnapshot {
            move_axes: [strafe, 0.0],
            jump: frame % JUMP_PERIOD == 0,
            ..InputSnapshot::idle()
        };

        let target = session
            .enemies()
            .iter()
            .filter(|e| e.is_active)
            .min_by(|a, b| {
                let da = (a.position - eye).norm_squared();
                let db = (b.position - eye).norm_squared();
                da.total_cmp(&db)
            });

        if let Some(enemy) = target {
            let sensitivity = player.config().look_sensitivity;
            let (yaw, pitch) = aim_angles(&eye, &enemy.position);
            input.look_delta = look_delta(&player.camera, yaw, pitch, sensitivity);

            let error = wrap_angle(player.camera.yaw - yaw).abs() + (player.camera.pitch - pitch).abs();
            input.fire = error < FIRE_TOLERANCE;
            // Close in on distant targets.
            if (enemy.position - eye).norm() > session.config().enemy.engage_range * 0.5 {
                input.move_axes[1] = 1.0;
            }
        }

        input
    }
}
