//! Status effects (Stun / Knockdown / Resting) and the knockdown meter.

use bevy::prelude::*;

/// Kind of a timed status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum StatusKind {
    Stun,
    Knockdown,
    /// Forced rest after stamina exhaustion: blocks new commitments only.
    Resting,
}

impl StatusKind {
    /// Higher wins when several effects are active.
    pub fn priority(&self) -> u8 {
        match self {
            StatusKind::Knockdown => 2,
            StatusKind::Stun => 1,
            StatusKind::Resting => 0,
        }
    }

    /// Stun and Knockdown freeze the skill state machine; Resting does not.
    pub fn pauses_skill(&self) -> bool {
        matches!(self, StatusKind::Stun | StatusKind::Knockdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Seconds left.
    pub remaining: f32,
    /// Who caused it (None = self-inflicted, e.g. forced rest).
    pub source: Option<Entity>,
}

/// Active effects of one combatant. At most one entry per kind.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct StatusLedger {
    effects: Vec<StatusEffect>,
}

impl StatusLedger {
    /// Add or refresh an effect. Re-application keeps the longer remaining time.
    pub fn apply(&mut self, kind: StatusKind, duration: f32, source: Option<Entity>) {
        if duration <= 0.0 {
            return;
        }
        match self.effects.iter_mut().find(|e| e.kind == kind) {
            Some(existing) => {
                if duration > existing.remaining {
                    existing.remaining = duration;
                    existing.source = source;
                }
            }
            None => self.effects.push(StatusEffect {
                kind,
                remaining: duration,
                source,
            }),
        }
    }

    /// Count down; returns the kinds that expired this tick.
    pub fn tick(&mut self, dt: f32) -> Vec<StatusKind> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.remaining -= dt;
            if effect.remaining <= 0.0 {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Remove an effect before it runs out. Returns false if it wasn't active.
    pub fn end_early(&mut self, kind: StatusKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        self.effects.len() != before
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn remaining(&self, kind: StatusKind) -> Option<f32> {
        self.effects.iter().find(|e| e.kind == kind).map(|e| e.remaining)
    }

    /// Highest-priority active effect (the one that gates actions).
    pub fn gating(&self) -> Option<StatusKind> {
        self.effects
            .iter()
            .map(|e| e.kind)
            .max_by_key(|kind| kind.priority())
    }

    pub fn permits_acting(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn pauses_skill(&self) -> bool {
        self.effects.iter().any(|e| e.kind.pauses_skill())
    }

    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

/// Accumulated stagger. Filling it forces a knockdown.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct KnockdownMeter {
    pub value: f32,
    pub threshold: f32,
}

impl Default for KnockdownMeter {
    fn default() -> Self {
        Self {
            value: 0.0,
            threshold: 100.0,
        }
    }
}

impl KnockdownMeter {
    pub fn new(threshold: f32) -> Self {
        Self {
            value: 0.0,
            threshold,
        }
    }

    /// Returns true when the meter fills (and resets it).
    pub fn add(&mut self, delta: f32) -> bool {
        self.value += delta.max(0.0);
        if self.value >= self.threshold {
            self.value = 0.0;
            true
        } else {
            false
        }
    }

    pub fn decay(&mut self, amount: f32) {
        self.value = (self.value - amount).max(0.0);
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}
