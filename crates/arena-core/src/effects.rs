//! Short-lived visual effects spawned by gameplay events.

use serde::{Deserialize, Serialize};

use crate::physics::Vec3;

/// How long an explosion stays on screen.
pub const EXPLOSION_DURATION_MS: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Explosion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub position: Vec3,
    pub elapsed_ms: f32,
    pub duration_ms: f32,
}

impl Effect {
    pub fn explosion(position: Vec3) -> Self {
        Self {
            kind: EffectKind::Explosion,
            position,
            elapsed_ms: 0.0,
            duration_ms: EXPLOSION_DURATION_MS,
        }
    }

    /// Fraction of the effect already played, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

#[derive(Debug, Clone, Default)]
pub struct EffectList {
    effects: Vec<Effect>,
}

impl EffectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Advances every effect and drops the finished ones.
    pub fn update(&mut self, dt: f32) {
        let dt_ms = dt * 1000.0;
        for effect in &mut self.effects {
            effect.elapsed_ms += dt_ms;
        }
        self.effects.retain(|e| !e.is_finished());
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use rapier3d::prelude::Vector;

    use super::*;

    #[test]
    fn test_explosion_progress_and_expiry() {
        let mut list = EffectList::new();
        list.spawn(Effect::explosion(Vector::new(1.0, 0.0, 2.0)));

        list.update(0.25);
        assert_eq!(list.len(), 1);
        assert!((list.effects()[0].progress() - 0.5).abs() < 1.0e-5);

        list.update(0.25);
        assert!(list.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut list = EffectList::new();
        list.spawn(Effect::explosion(Vector::zeros()));
        list.spawn(Effect::explosion(Vector::zeros()));
        list.clear();
        assert!(list.is_empty());
    }
}
