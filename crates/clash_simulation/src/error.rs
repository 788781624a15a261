//! Error types of the combat core.
//!
//! Command errors are local and recoverable: the command is dropped, logged and
//! reported through `SkillCommandRejected`. Setup errors are loud and returned
//! to whoever tries to put a combatant into the world without its records.

use thiserror::Error;

use crate::combat::{Skill, SkillPhase, StatusKind};

/// Why a skill command (start-charge / execute / cancel) was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandRejected {
    #[error("cannot start {skill:?} from phase {phase:?}")]
    CannotStartFrom { skill: Skill, phase: SkillPhase },

    #[error("status {0:?} forbids acting")]
    StatusForbids(StatusKind),

    #[error("insufficient stamina for {skill:?}: need {needed}, have {available}")]
    InsufficientStamina {
        skill: Skill,
        needed: f32,
        available: f32,
    },

    #[error("equipped weapon cannot perform {0:?}")]
    WeaponCannotPerform(Skill),

    #[error("nothing charged to execute (phase {0:?})")]
    NotCharged(SkillPhase),

    #[error("defensive skill {0:?} is never executed manually")]
    DefensiveExecute(Skill),

    #[error("active phase cannot be cancelled")]
    ActiveNotCancellable,

    #[error("nothing to cancel")]
    NothingToCancel,

    #[error("combatant is dead or missing its combat records")]
    NotAvailable,
}

/// Missing or malformed configuration that must be fixed before the simulation runs.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("no combat stats record for character '{0}'")]
    MissingStats(String),

    #[error("no weapon record '{0}'")]
    MissingWeapon(String),

    #[error("invalid tuning config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type SetupResult<T> = std::result::Result<T, SetupError>;
