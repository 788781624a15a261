//! Combat events: commands in, notifications out.
//!
//! # Flow
//!
//! ```text
//! AI / input → SkillCommand
//!   ↓
//! process_skill_commands → SkillState (or SkillCommandRejected)
//!   ↓
//! advance_skill_states → PhaseChanged
//!   ↓
//! resolve_interactions → InteractionResolved, DamageDealt, EntityDied
//! ```

use bevy::prelude::*;

use super::{InteractionOutcome, Skill, SkillPhase};

// ============================================================================
// Input
// ============================================================================

/// What a combatant wants to do with its commitment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillCommandKind {
    StartCharge { skill: Skill },
    Execute,
    Cancel,
}

/// Command for one combatant (from AI or player input).
#[derive(Event, Debug, Clone, Copy)]
pub struct SkillCommand {
    pub combatant: Entity,
    pub kind: SkillCommandKind,
}

impl SkillCommand {
    pub fn start_charge(combatant: Entity, skill: Skill) -> Self {
        Self {
            combatant,
            kind: SkillCommandKind::StartCharge { skill },
        }
    }

    pub fn execute(combatant: Entity) -> Self {
        Self {
            combatant,
            kind: SkillCommandKind::Execute,
        }
    }

    pub fn cancel(combatant: Entity) -> Self {
        Self {
            combatant,
            kind: SkillCommandKind::Cancel,
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// A combatant's commitment moved to another phase.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PhaseChanged {
    pub combatant: Entity,
    pub skill: Option<Skill>,
    pub from: SkillPhase,
    pub to: SkillPhase,
    pub at: f64,
}

/// Command refused; nothing changed.
#[derive(Event, Debug, Clone)]
pub struct SkillCommandRejected {
    pub combatant: Entity,
    pub command: SkillCommandKind,
    pub reason: crate::error::CommandRejected,
}

/// One resolved interaction (including whiffs and discarded entries).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct InteractionResolved {
    pub attacker: Entity,
    pub defender: Option<Entity>,
    pub offensive: Skill,
    pub defensive: Option<Skill>,
    pub outcome: InteractionOutcome,
    pub at: f64,
}

/// Damage applied to `target`.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub skill: Skill,
    pub critical: bool,
}

/// Health reached zero.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}
