//! Skill commands → state machine.

use bevy::prelude::*;

use crate::ai::AttackSlotController;
use crate::combat::{
    CombatClock, PhaseChanged, PhaseTimings, PhaseTransition, SkillCommand, SkillCommandKind, SkillCommandRejected,
    SkillState, StatusLedger,
};
use crate::components::{CombatStats, Combatant, Dead, Stamina, WeaponStats};
use crate::config::CombatConfig;
use crate::error::CommandRejected;

/// Phase durations for whatever `state` is (or is about to be) committed to.
pub fn current_timings(
    state: &SkillState,
    stats: &CombatStats,
    weapon: &WeaponStats,
    config: &CombatConfig,
) -> PhaseTimings {
    match state.skill {
        Some(skill) => PhaseTimings::resolve(skill, stats, weapon, config),
        None => PhaseTimings::uniform(0.0),
    }
}

pub(crate) fn write_transitions(
    writer: &mut EventWriter<PhaseChanged>,
    combatant: Entity,
    transitions: impl IntoIterator<Item = PhaseTransition>,
) {
    for tr in transitions {
        writer.write(PhaseChanged {
            combatant,
            skill: tr.skill,
            from: tr.from,
            to: tr.to,
            at: tr.at,
        });
    }
}

/// Система: применить SkillCommand events.
///
/// Невалидная команда → `SkillCommandRejected` + лог, состояние не меняется.
/// Cancel освобождает attack slot (если admission подключен).
pub fn process_skill_commands(
    mut commands_in: EventReader<SkillCommand>,
    mut combatants: Query<
        (&mut SkillState, &mut Stamina, &StatusLedger, &CombatStats, &WeaponStats),
        With<Combatant>,
    >,
    dead: Query<(), With<Dead>>,
    clock: Res<CombatClock>,
    config: Res<CombatConfig>,
    mut admission: Option<ResMut<AttackSlotController>>,
    mut phase_events: EventWriter<PhaseChanged>,
    mut rejected: EventWriter<SkillCommandRejected>,
) {
    let now = clock.now();

    for command in commands_in.read() {
        let entity = command.combatant;

        let result = match combatants.get_mut(entity) {
            Ok(_) if dead.contains(entity) => Err(CommandRejected::NotAvailable),
            Err(_) => Err(CommandRejected::NotAvailable),
            Ok((mut state, mut stamina, ledger, stats, weapon)) => match command.kind {
                SkillCommandKind::StartCharge { skill } => {
                    let timings = PhaseTimings::resolve(skill, stats, weapon, &config);
                    state.start_charge(skill, weapon, &mut stamina, ledger, &timings, now)
                }
                SkillCommandKind::Execute => {
                    let timings = current_timings(&state, stats, weapon, &config);
                    state.execute(&timings, now)
                }
                SkillCommandKind::Cancel => state.cancel(now).map(|tr| {
                    if let Some(controller) = admission.as_deref_mut() {
                        controller.release(entity);
                    }
                    vec![tr]
                }),
            },
        };

        match result {
            Ok(transitions) => {
                crate::logger::log(&format!("🎮 {:?}: {:?} accepted", entity, command.kind));
                write_transitions(&mut phase_events, entity, transitions);
            }
            Err(reason) => {
                crate::logger::log_warning(&format!(
                    "⛔ {:?}: {:?} rejected: {}",
                    entity, command.kind, reason
                ));
                rejected.write(SkillCommandRejected {
                    combatant: entity,
                    command: command.kind,
                    reason,
                });
            }
        }
    }
}
