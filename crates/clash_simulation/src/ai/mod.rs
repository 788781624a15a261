//! AI admission module
//!
//! Attack-slot admission (сколько агентов атакуют одновременно) и
//! formation slots (где ждут остальные). Решения "что атаковать" и
//! движение: вне этого крейта.

use bevy::prelude::*;

pub mod admission;
pub mod components;
pub mod events;
pub mod formation;
pub mod systems;

// Re-export основных типов
pub use admission::{AdmissionDenial, AdmissionVerdict, AttackSlotController, AttackSlotGrant, RosterEntry};
pub use components::AttackAgent;
pub use events::{AdmissionDecided, AttackSlotRelease, AttackSlotRequest};
pub use formation::{FormationSlot, FormationSlots};

use crate::combat::{CombatFrame, CombatSet};
use crate::config::{AdmissionConfig, FormationConfig};

/// AI Plugin
///
/// Регистрирует admission системы в `CombatSet::Roster` (до команд кадра):
/// 1. sync_attack_roster: AttackAgent → roster
/// 2. process_attack_slot_requests: release/request события
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        let admission = app
            .world()
            .get_resource::<AdmissionConfig>()
            .cloned()
            .unwrap_or_default();
        let formation = app
            .world()
            .get_resource::<FormationConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(AttackSlotController::new(admission))
            .insert_resource(FormationSlots::new(formation, Vec3::ZERO))
            .register_type::<AttackAgent>()
            .add_event::<AttackSlotRequest>()
            .add_event::<AttackSlotRelease>()
            .add_event::<AdmissionDecided>();

        app.add_systems(
            CombatFrame,
            (systems::sync_attack_roster, systems::process_attack_slot_requests)
                .chain() // Последовательное выполнение для детерминизма
                .after(crate::combat::systems::cleanup_fallen_combatants)
                .in_set(CombatSet::Roster),
        );
    }
}
