//! Stat/weapon provider seam and combatant spawning.
//!
//! Ядро не грузит определения персонажей/оружия само: их отдаёт внешний
//! `StatProvider`. `StatTable`: простая in-memory реализация.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::AttackAgent;
use crate::combat::KnockdownMeter;
use crate::components::{CombatStats, Combatant, Health, WeaponStats};
use crate::config::CombatConfig;
use crate::error::{SetupError, SetupResult};

/// Source of stat and weapon records, keyed by identifier.
pub trait StatProvider {
    fn combat_stats(&self, character: &str) -> Option<CombatStats>;
    fn weapon(&self, weapon: &str) -> Option<WeaponStats>;
}

/// In-memory provider.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatTable {
    pub characters: HashMap<String, CombatStats>,
    pub weapons: HashMap<String, WeaponStats>,
}

impl StatTable {
    pub fn with_character(mut self, id: impl Into<String>, stats: CombatStats) -> Self {
        self.characters.insert(id.into(), stats);
        self
    }

    pub fn with_weapon(mut self, id: impl Into<String>, weapon: WeaponStats) -> Self {
        self.weapons.insert(id.into(), weapon);
        self
    }
}

impl StatProvider for StatTable {
    fn combat_stats(&self, character: &str) -> Option<CombatStats> {
        self.characters.get(character).cloned()
    }

    fn weapon(&self, weapon: &str) -> Option<WeaponStats> {
        self.weapons.get(weapon).cloned()
    }
}

/// What to put into the world.
#[derive(Debug, Clone)]
pub struct CombatantSpec {
    pub character: String,
    pub weapon: String,
    pub faction_id: u64,
    pub position: Vec3,
    /// Autonomous attacker settings; `None` = player-controlled.
    pub agent: Option<AttackAgent>,
}

impl CombatantSpec {
    pub fn new(character: impl Into<String>, weapon: impl Into<String>, faction_id: u64) -> Self {
        Self {
            character: character.into(),
            weapon: weapon.into(),
            faction_id,
            position: Vec3::ZERO,
            agent: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn agent(mut self, agent: AttackAgent) -> Self {
        self.agent = Some(agent);
        self
    }
}

/// Spawn a fully equipped combatant.
///
/// Missing records are a setup error: nothing is spawned and the error is
/// logged at error level.
pub fn spawn_combatant(world: &mut World, provider: &dyn StatProvider, spec: CombatantSpec) -> SetupResult<Entity> {
    let stats = provider.combat_stats(&spec.character).ok_or_else(|| {
        let err = SetupError::MissingStats(spec.character.clone());
        crate::logger::log_error(&format!("❌ spawn_combatant: {}", err));
        err
    })?;
    let weapon = provider.weapon(&spec.weapon).ok_or_else(|| {
        let err = SetupError::MissingWeapon(spec.weapon.clone());
        crate::logger::log_error(&format!("❌ spawn_combatant: {}", err));
        err
    })?;

    let health = Health::new(stats.max_health());
    // Порог нокдауна берём из текущего конфига, а не из дефолта компонента
    let knockdown_threshold = world
        .get_resource::<CombatConfig>()
        .map_or(CombatConfig::default().knockdown_threshold, |c| c.knockdown_threshold);
    let mut entity = world.spawn((
        Combatant {
            faction_id: spec.faction_id,
        },
        health,
        KnockdownMeter::new(knockdown_threshold),
        stats,
        weapon,
        Transform::from_translation(spec.position),
    ));
    if let Some(agent) = spec.agent {
        entity.insert(agent);
    }
    let id = entity.id();

    crate::logger::log_info(&format!(
        "✅ Spawned {:?}: '{}' with '{}' (faction {}, hp {})",
        id, spec.character, spec.weapon, spec.faction_id, health.max
    ));
    Ok(id)
}
