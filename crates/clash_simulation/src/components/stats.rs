//! Stat and weapon records supplied by the external provider.
//!
//! Pure data: the core only reads them. Changes (equipment swap, buffs) take
//! effect at the next phase entry of the state machine, never mid-phase.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::Skill;

/// Per-combatant attributes (base + equipment-modified snapshot).
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CombatStats {
    pub strength: f32,
    pub dexterity: f32,
    pub focus: f32,
    pub will: f32,
    pub physical_defense: f32,
    /// Fractional damage reduction (0.1 = 10%), scaled by physical defense.
    pub protection: f32,
    pub vitality: f32,
    /// Probability in [0, 1].
    pub critical_chance: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            strength: 10.0,
            dexterity: 10.0,
            focus: 10.0,
            will: 10.0,
            physical_defense: 5.0,
            protection: 0.05,
            vitality: 10.0,
            critical_chance: 0.05,
        }
    }
}

impl CombatStats {
    /// Max health derived from vitality.
    pub fn max_health(&self) -> u32 {
        (50.0 + self.vitality * 5.0).max(1.0).round() as u32
    }
}

/// Weapon archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum WeaponKind {
    Melee,
    Ranged,
}

/// Ranged-only weapon fields.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct RangedProfile {
    /// Damage multiplier for ranged skills.
    pub ranged_multiplier: f32,
    /// Damage multiplier when the weapon is used in melee (bow bash).
    pub melee_multiplier: f32,
    /// Reach of melee skills with this weapon (meters).
    pub melee_range: f32,
}

/// Equipped weapon record.
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct WeaponStats {
    pub kind: WeaponKind,
    /// Reach (meters): melee reach for melee weapons, shot range for ranged.
    pub range: f32,
    pub base_damage: f32,
    /// Base speed, multiplied into every phase-duration computation.
    pub speed: f32,
    /// Base stun a clean hit inflicts (seconds).
    pub stun_duration: f32,
    /// Knockdown meter buildup factor.
    pub knockdown_rate: f32,
    /// Attack hits until the finishing blow.
    pub combo_length: u32,
    pub ranged: Option<RangedProfile>,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self::sword()
    }
}

impl WeaponStats {
    pub fn sword() -> Self {
        Self {
            kind: WeaponKind::Melee,
            range: 2.0,
            base_damage: 10.0,
            speed: 1.0,
            stun_duration: 0.8,
            knockdown_rate: 1.0,
            combo_length: 3,
            ranged: None,
        }
    }

    /// Медленное тяжёлое оружие: больше урона и knockdown, короче комбо.
    pub fn greatsword() -> Self {
        Self {
            kind: WeaponKind::Melee,
            range: 2.5,
            base_damage: 18.0,
            speed: 0.75,
            stun_duration: 1.2,
            knockdown_rate: 1.6,
            combo_length: 2,
            ranged: None,
        }
    }

    pub fn dagger() -> Self {
        Self {
            kind: WeaponKind::Melee,
            range: 1.5,
            base_damage: 6.0,
            speed: 1.4,
            stun_duration: 0.5,
            knockdown_rate: 0.6,
            combo_length: 5,
            ranged: None,
        }
    }

    pub fn bow() -> Self {
        Self {
            kind: WeaponKind::Ranged,
            range: 15.0,
            base_damage: 9.0,
            speed: 1.0,
            stun_duration: 0.6,
            knockdown_rate: 0.8,
            combo_length: 1,
            ranged: Some(RangedProfile {
                ranged_multiplier: 1.0,
                melee_multiplier: 0.4,
                melee_range: 1.5,
            }),
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.kind == WeaponKind::Ranged && self.ranged.is_some()
    }

    /// Ranged skills need a ranged profile; melee skills work with anything.
    pub fn can_perform(&self, skill: Skill) -> bool {
        !skill.is_ranged() || self.is_ranged()
    }

    /// Reach used for `skill` (meters).
    pub fn reach(&self, skill: Skill) -> f32 {
        match (&self.ranged, skill.is_ranged()) {
            (Some(_), true) => self.range,
            (Some(profile), false) => profile.melee_range,
            (None, _) => self.range,
        }
    }

    /// Ranged vs melee damage multiplier for `skill`.
    pub fn damage_multiplier(&self, skill: Skill) -> f32 {
        match &self.ranged {
            Some(profile) if skill.is_ranged() => profile.ranged_multiplier,
            Some(profile) => profile.melee_multiplier,
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sword_is_melee() {
        let sword = WeaponStats::sword();
        assert!(!sword.is_ranged());
        assert!(sword.can_perform(Skill::Smash));
        assert!(!sword.can_perform(Skill::RangedAttack));
        assert_eq!(sword.reach(Skill::Attack), 2.0);
        assert_eq!(sword.damage_multiplier(Skill::Attack), 1.0);
    }

    #[test]
    fn test_bow_reach_depends_on_skill() {
        let bow = WeaponStats::bow();
        assert!(bow.is_ranged());
        assert!(bow.can_perform(Skill::RangedAttack));
        assert_eq!(bow.reach(Skill::RangedAttack), 15.0);
        assert_eq!(bow.reach(Skill::Attack), 1.5);
        assert_eq!(bow.damage_multiplier(Skill::Attack), 0.4);
    }

    #[test]
    fn test_max_health_from_vitality() {
        let stats = CombatStats {
            vitality: 20.0,
            ..CombatStats::default()
        };
        assert_eq!(stats.max_health(), 150);
    }
}
