//! Tuning config for the combat core.
//!
//! All magic numbers of the resolver, calculators and admission layer live here.
//! Each group is a Bevy resource; `SimulationConfig` bundles them for TOML loading.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SetupError, SetupResult};

/// Resolver, calculator and state machine constants.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Two commitments within this span (seconds) are "simultaneous".
    pub simultaneity_window: f64,

    /// Floor for every damage formula.
    pub min_damage: f32,
    /// Cap for protection-based reduction (0.8 = at most 80% absorbed).
    pub max_damage_reduction: f32,
    /// Physical defense scaling of protection: `percent × (1 + def / divisor)`.
    pub protection_defense_divisor: f32,

    /// `stun × (1 − focus / divisor)`
    pub stun_focus_divisor: f32,
    pub critical_stun_multiplier: f32,
    pub critical_damage_multiplier: f32,
    /// Base stun an attacker takes when its hit is blocked.
    pub block_stun_base: f32,
    /// Counterattack damage multiplier applied to the reflected hit.
    pub reflect_multiplier: f32,
    pub knockdown_duration: f32,

    // === Knockdown meter ===
    pub knockdown_base_buildup: f32,
    pub knockdown_strength_divisor: f32,
    pub knockdown_will_divisor: f32,
    pub knockdown_focus_divisor: f32,
    pub knockdown_threshold: f32,
    /// Meter units drained per second.
    pub knockdown_meter_decay: f32,

    // === Speed resolver ===
    pub dexterity_speed_divisor: f32,
    /// Speed floor, keeps phase durations finite.
    pub min_speed: f32,

    // === State machine ===
    /// How long a defensive skill stays in Waiting before timing out.
    pub defense_wait_timeout: f32,
    /// Idle seconds after which an Attack combo starts over.
    pub combo_reset_time: f32,

    // === Stamina ===
    /// Stamina at or below this forces a rest.
    pub exhaustion_threshold: f32,
    pub forced_rest_duration: f32,
    pub rest_regen_multiplier: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            simultaneity_window: 0.1,

            min_damage: 1.0,
            max_damage_reduction: 0.8,
            protection_defense_divisor: 100.0,

            stun_focus_divisor: 100.0,
            critical_stun_multiplier: 1.5,
            critical_damage_multiplier: 1.5,
            block_stun_base: 1.2,
            reflect_multiplier: 1.5,
            knockdown_duration: 2.0,

            knockdown_base_buildup: 30.0,
            knockdown_strength_divisor: 5.0,
            knockdown_will_divisor: 200.0,
            knockdown_focus_divisor: 20.0,
            knockdown_threshold: 100.0,
            knockdown_meter_decay: 10.0,

            dexterity_speed_divisor: 100.0,
            min_speed: 0.1,

            defense_wait_timeout: 6.0,
            combo_reset_time: 1.5,

            exhaustion_threshold: 1.0,
            forced_rest_duration: 3.0,
            rest_regen_multiplier: 2.0,
        }
    }
}

/// Attack-slot admission parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Max live grants at once.
    pub capacity: usize,
    /// Minimum seconds between two grants.
    pub min_spacing: f64,
    /// Grant lifetime; must cover the slowest full commitment.
    pub reservation_duration: f64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            min_spacing: 0.8,
            reservation_duration: 4.0,
        }
    }
}

/// Formation ring parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    pub slot_count: usize,
    /// Seconds a slot stays locked after (re)assignment or release.
    pub reassign_cooldown: f64,
    /// Max radial offset per slot, keeps agents from stacking visually.
    pub jitter: f32,
    /// Distance gain required before an occupant hops to another slot.
    pub switch_margin: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            slot_count: 8,
            reassign_cooldown: 1.0,
            jitter: 0.25,
            switch_margin: 0.5,
        }
    }
}

/// All tuning groups; missing TOML tables/fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub combat: CombatConfig,
    pub admission: AdmissionConfig,
    pub formation: FormationConfig,
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> SetupResult<Self> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SetupResult<()> {
        if self.combat.simultaneity_window < 0.0 {
            return Err(SetupError::InvalidConfig(
                "simultaneity_window must be >= 0".into(),
            ));
        }
        if self.combat.min_damage <= 0.0 {
            return Err(SetupError::InvalidConfig("min_damage must be > 0".into()));
        }
        if self.combat.min_speed <= 0.0 {
            return Err(SetupError::InvalidConfig("min_speed must be > 0".into()));
        }
        if self.admission.capacity == 0 {
            return Err(SetupError::InvalidConfig(
                "admission capacity must be >= 1".into(),
            ));
        }
        if self.formation.slot_count == 0 {
            return Err(SetupError::InvalidConfig(
                "formation needs at least one slot".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [admission]
            capacity = 1
            min_spacing = 0.8

            [combat]
            simultaneity_window = 0.05
            "#,
        )
        .expect("valid config");

        assert_eq!(config.admission.capacity, 1);
        assert_eq!(config.admission.reservation_duration, 4.0);
        assert_eq!(config.combat.simultaneity_window, 0.05);
        assert_eq!(config.combat.min_damage, 1.0);
        assert_eq!(config.formation.slot_count, 8);
    }

    #[test]
    fn test_zero_capacity_is_setup_error() {
        let err = SimulationConfig::from_toml_str("[admission]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SimulationConfig::from_toml_str("[combat\n").unwrap_err();
        assert!(matches!(err, SetupError::Toml(_)));
    }
}
