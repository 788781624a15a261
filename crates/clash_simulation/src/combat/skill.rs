//! Skill set and its static tables.
//!
//! Every skill is exactly one of Offensive / Defensive (`Skill::class` is an
//! exhaustive match, so adding a skill without classifying it won't compile).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Static partition of the skill set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum SkillClass {
    Offensive,
    Defensive,
}

/// Combat skills a combatant can commit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
pub enum Skill {
    /// Basic combo swing, no charge.
    Attack,
    /// Slow heavy blow, breaks Defense.
    Smash,
    /// Spin attack, beats Counterattack.
    Windmill,
    /// Aimed shot, accuracy grows while aiming.
    RangedAttack,
    /// Raised guard: blocks Attack, Windmill, RangedAttack.
    Defense,
    /// Waits for a melee blow and reflects it.
    Counterattack,
}

/// Base phase lengths (seconds at speed 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillTimings {
    /// Charging / Aiming length.
    pub charge: f32,
    pub startup: f32,
    pub active: f32,
    pub recovery: f32,
}

impl Skill {
    pub const ALL: [Skill; 6] = [
        Skill::Attack,
        Skill::Smash,
        Skill::Windmill,
        Skill::RangedAttack,
        Skill::Defense,
        Skill::Counterattack,
    ];

    pub fn class(&self) -> SkillClass {
        match self {
            Skill::Attack | Skill::Smash | Skill::Windmill | Skill::RangedAttack => {
                SkillClass::Offensive
            }
            Skill::Defense | Skill::Counterattack => SkillClass::Defensive,
        }
    }

    pub fn is_offensive(&self) -> bool {
        self.class() == SkillClass::Offensive
    }

    pub fn is_defensive(&self) -> bool {
        self.class() == SkillClass::Defensive
    }

    /// Uses the Aiming branch instead of Charging.
    pub fn is_ranged(&self) -> bool {
        matches!(self, Skill::RangedAttack)
    }

    /// Stamina paid on start-charge.
    pub fn stamina_cost(&self) -> f32 {
        match self {
            Skill::Attack => 5.0,
            Skill::Smash => 15.0,
            Skill::Windmill => 20.0,
            Skill::RangedAttack => 8.0,
            Skill::Defense => 10.0,
            Skill::Counterattack => 12.0,
        }
    }

    /// Skill factor of the speed formula.
    pub fn speed_modifier(&self) -> f32 {
        match self {
            Skill::Attack => 1.2,
            Skill::Smash => 0.8,
            Skill::Windmill => 1.0,
            Skill::RangedAttack => 1.0,
            Skill::Defense => 1.0,
            Skill::Counterattack => 1.0,
        }
    }

    /// Skill factor of the base damage formula.
    pub fn damage_multiplier(&self) -> f32 {
        match self {
            Skill::Attack => 1.0,
            Skill::Smash => 2.0,
            Skill::Windmill => 1.2,
            Skill::RangedAttack => 1.0,
            Skill::Defense => 0.0,
            Skill::Counterattack => 1.5,
        }
    }

    pub fn base_timings(&self) -> SkillTimings {
        match self {
            Skill::Attack => SkillTimings {
                charge: 0.0,
                startup: 0.25,
                active: 0.1,
                recovery: 0.35,
            },
            Skill::Smash => SkillTimings {
                charge: 1.0,
                startup: 0.45,
                active: 0.1,
                recovery: 0.7,
            },
            Skill::Windmill => SkillTimings {
                charge: 1.2,
                startup: 0.3,
                active: 0.15,
                recovery: 0.9,
            },
            Skill::RangedAttack => SkillTimings {
                charge: 1.5,
                startup: 0.15,
                active: 0.05,
                recovery: 0.5,
            },
            // Defensive skills only use `charge`; Waiting length comes from config.
            Skill::Defense => SkillTimings {
                charge: 1.0,
                startup: 0.0,
                active: 0.0,
                recovery: 0.0,
            },
            Skill::Counterattack => SkillTimings {
                charge: 1.2,
                startup: 0.0,
                active: 0.0,
                recovery: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_exhaustive_and_exclusive() {
        for skill in Skill::ALL {
            assert!(
                skill.is_offensive() ^ skill.is_defensive(),
                "{:?} must be exactly one of offensive/defensive",
                skill
            );
        }
    }

    #[test]
    fn test_only_ranged_attack_aims() {
        let ranged: Vec<_> = Skill::ALL.iter().filter(|s| s.is_ranged()).collect();
        assert_eq!(ranged, vec![&Skill::RangedAttack]);
        assert!(Skill::RangedAttack.is_offensive());
    }

    #[test]
    fn test_defensive_skills_deal_no_direct_damage() {
        assert_eq!(Skill::Defense.damage_multiplier(), 0.0);
        assert!(Skill::Counterattack.damage_multiplier() > 0.0); // reflected
    }
}
