//! Speed resolver (pure functions).
//!
//! Одно число скорости используется для трёх вещей:
//! - длительности фаз state machine (base timing / speed)
//! - tie-break при взаимной атаке (выше скорость → побеждает)
//! - lookup ограничения движения по (skill, phase)

use crate::components::{CombatStats, WeaponStats};
use crate::config::CombatConfig;

use super::{Skill, SkillPhase};

/// `weapon.speed × skill modifier × (1 + dex / divisor)`, floored at `min_speed`.
pub fn speed(skill: Skill, stats: &CombatStats, weapon: &WeaponStats, config: &CombatConfig) -> f32 {
    let dex_term = 1.0 + stats.dexterity / config.dexterity_speed_divisor;
    let raw = weapon.speed * skill.speed_modifier() * dex_term;
    raw.max(config.min_speed)
}

/// Phase durations of one skill for the current stats/weapon snapshot.
///
/// Computed every frame by the caller but only read when a phase is entered,
/// so a stat or weapon change never resizes a phase that is already running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTimings {
    pub charge: f32,
    pub startup: f32,
    pub active: f32,
    pub recovery: f32,
    pub wait: f32,
}

impl PhaseTimings {
    pub fn resolve(skill: Skill, stats: &CombatStats, weapon: &WeaponStats, config: &CombatConfig) -> Self {
        let s = speed(skill, stats, weapon, config);
        let base = skill.base_timings();
        Self {
            charge: base.charge / s,
            startup: base.startup / s,
            active: base.active / s,
            recovery: base.recovery / s,
            wait: config.defense_wait_timeout,
        }
    }

    /// Fixed timings for state machine tests.
    pub fn uniform(seconds: f32) -> Self {
        Self {
            charge: seconds,
            startup: seconds,
            active: seconds,
            recovery: seconds,
            wait: seconds,
        }
    }

    pub fn for_phase(&self, phase: SkillPhase) -> f32 {
        match phase {
            SkillPhase::Idle | SkillPhase::Charged => 0.0,
            SkillPhase::Charging | SkillPhase::Aiming => self.charge,
            SkillPhase::Startup => self.startup,
            SkillPhase::Active => self.active,
            SkillPhase::Recovery => self.recovery,
            SkillPhase::Waiting => self.wait,
        }
    }
}

/// Movement speed multiplier while `skill` is in `phase` (1.0 = unrestricted).
pub fn movement_multiplier(skill: Option<Skill>, phase: SkillPhase) -> f32 {
    let Some(skill) = skill else {
        return 1.0;
    };

    match phase {
        SkillPhase::Idle => 1.0,
        SkillPhase::Aiming => 0.4,
        SkillPhase::Charging | SkillPhase::Charged | SkillPhase::Waiting => match skill {
            Skill::Counterattack => 0.0, // rooted
            Skill::Defense => 0.5,
            _ => 0.8,
        },
        SkillPhase::Startup | SkillPhase::Active => 0.0,
        SkillPhase::Recovery => 0.5,
    }
}
