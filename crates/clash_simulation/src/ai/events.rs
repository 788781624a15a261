//! Admission events (AI → controller → AI).

use bevy::prelude::*;

use super::AdmissionVerdict;

/// AI wants an attack slot this frame.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackSlotRequest {
    pub agent: Entity,
}

/// AI is done attacking (or gave up).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackSlotRelease {
    pub agent: Entity,
}

/// Result of one `AttackSlotRequest`.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AdmissionDecided {
    pub agent: Entity,
    pub verdict: AdmissionVerdict,
    pub at: f64,
}
