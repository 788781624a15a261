//! Damage & status calculator
//!
//! Чистые функции: (attacker stats, weapon, defender stats, outcome) → числа.
//! Никакого state: resolver сам решает, к кому применить результат.
//!
//! Формулы:
//! - base damage = weapon dmg × weapon mult(skill) × skill mult + STR − DEF, floor min
//! - reduction   = base × (1 − min(max, protection × (1 + DEF / div))), floor min
//! - stun        = base × (1 − FOCUS / div) × crit mult
//! - knockdown Δ = (buildup + STR / div) × rate × (1 − WILL / div) − FOCUS / div, floor 1

use rand::Rng;

use crate::components::{CombatStats, WeaponStats};
use crate::config::CombatConfig;

use super::Skill;

/// Raw hit damage before protection.
pub fn base_damage(
    attacker: &CombatStats,
    weapon: &WeaponStats,
    skill: Skill,
    defender: &CombatStats,
    config: &CombatConfig,
) -> f32 {
    let weapon_part = weapon.base_damage * weapon.damage_multiplier(skill) * skill.damage_multiplier();
    let raw = weapon_part + attacker.strength - defender.physical_defense;
    floor_damage(raw, config)
}

/// Protection-based reduction, capped at `max_damage_reduction`.
pub fn damage_reduction(base: f32, percent: f32, defender: &CombatStats, config: &CombatConfig) -> f32 {
    let scaled = percent * (1.0 + defender.physical_defense / config.protection_defense_divisor);
    let reduction = scaled.clamp(0.0, config.max_damage_reduction);
    floor_damage(base * (1.0 - reduction), config)
}

/// Stun length on `target`; high focus shortens it, never below zero.
pub fn stun_duration(base: f32, target: &CombatStats, critical: bool, config: &CombatConfig) -> f32 {
    let focus_factor = (1.0 - target.focus / config.stun_focus_divisor).max(0.0);
    let crit = if critical {
        config.critical_stun_multiplier
    } else {
        1.0
    };
    (base * focus_factor * crit).max(0.0)
}

/// Knockdown meter increment of one clean hit, at least 1.
pub fn knockdown_meter_delta(
    attacker: &CombatStats,
    defender: &CombatStats,
    weapon_knockdown_rate: f32,
    config: &CombatConfig,
) -> f32 {
    let buildup = config.knockdown_base_buildup + attacker.strength / config.knockdown_strength_divisor;
    let will_factor = 1.0 - defender.will / config.knockdown_will_divisor;
    let delta = buildup * weapon_knockdown_rate * will_factor
        - defender.focus / config.knockdown_focus_divisor;
    delta.max(1.0)
}

/// Uniform draw below the attacker's critical chance.
pub fn roll_critical<R: Rng + ?Sized>(rng: &mut R, attacker: &CombatStats) -> bool {
    rng.gen::<f32>() < attacker.critical_chance
}

/// Full damage of a landed hit: base × crit, then defender protection.
pub fn hit_damage(
    attacker: &CombatStats,
    weapon: &WeaponStats,
    skill: Skill,
    defender: &CombatStats,
    critical: bool,
    config: &CombatConfig,
) -> f32 {
    let mut damage = base_damage(attacker, weapon, skill, defender, config);
    if critical {
        damage *= config.critical_damage_multiplier;
    }
    damage_reduction(damage, defender.protection, defender, config)
}

fn floor_damage(value: f32, config: &CombatConfig) -> f32 {
    if value.is_nan() {
        return config.min_damage;
    }
    value.max(config.min_damage)
}
