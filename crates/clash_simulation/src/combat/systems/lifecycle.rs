//! Combatant lifecycle: setup validation, death and removal cleanup.

use bevy::prelude::*;

use crate::ai::{AttackSlotController, FormationSlots};
use crate::combat::{CombatClock, PendingInteractions, PhaseChanged, SkillState};
use crate::components::{CombatStats, Combatant, Dead, WeaponStats};

use super::commands::write_transitions;

/// Система: громко сообщить о бойце без stat/weapon записей.
///
/// Такой боец не попадает ни в один боевой query (они требуют обе записи),
/// т.е. молча стоит в мире. Это ошибка настройки, а не геймплей.
pub fn validate_combatant_setup(
    query: Query<(Entity, Has<CombatStats>, Has<WeaponStats>), Added<Combatant>>,
) {
    for (entity, has_stats, has_weapon) in query.iter() {
        if !has_stats {
            crate::logger::log_error(&format!(
                "❌ {:?}: Combatant without CombatStats, excluded from combat",
                entity
            ));
        }
        if !has_weapon {
            crate::logger::log_error(&format!(
                "❌ {:?}: Combatant without WeaponStats, excluded from combat",
                entity
            ));
        }
    }
}

/// Система: cleanup после смерти / удаления Combatant.
///
/// - commitment → Idle (engine interrupt)
/// - pending offensive записи удаляются
/// - attack slot grant и formation slot освобождаются, агент снимается с roster
pub fn cleanup_fallen_combatants(
    mut fallen: Query<(Entity, &mut SkillState), Added<Dead>>,
    mut removed: RemovedComponents<Combatant>,
    mut pending: ResMut<PendingInteractions>,
    mut admission: Option<ResMut<AttackSlotController>>,
    mut formation: Option<ResMut<FormationSlots>>,
    clock: Res<CombatClock>,
    mut phase_events: EventWriter<PhaseChanged>,
) {
    let now = clock.now();

    let mut gone: Vec<Entity> = Vec::new();
    for (entity, mut state) in fallen.iter_mut() {
        if let Some(tr) = state.interrupt(now) {
            write_transitions(&mut phase_events, entity, [tr]);
        }
        gone.push(entity);
    }
    gone.extend(removed.read());

    for entity in gone {
        pending.purge(entity);
        if let Some(controller) = admission.as_deref_mut() {
            controller.unregister(entity);
        }
        if let Some(slots) = formation.as_deref_mut() {
            slots.release(entity, now);
        }
        crate::logger::log(&format!("🧹 {:?} removed from combat bookkeeping", entity));
    }
}
