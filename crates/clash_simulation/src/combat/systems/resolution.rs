//! Interaction resolution system: snapshot → resolver → apply effects.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::ai::AttackSlotController;
use crate::combat::{
    CombatClock, CombatEffect, CombatantView, DamageDealt, EntityDied, InteractionResolved, KnockdownMeter,
    PendingInteractions, PhaseChanged, SkillState, StatusKind, StatusLedger,
};
use crate::components::{CombatStats, CombatTarget, Combatant, Dead, Health, WeaponStats};
use crate::config::CombatConfig;
use crate::DeterministicRng;

use super::commands::{current_timings, write_transitions};

type ResolveQuery = (
    Entity,
    &'static Combatant,
    &'static mut Health,
    &'static mut SkillState,
    &'static mut StatusLedger,
    &'static mut KnockdownMeter,
    &'static CombatTarget,
    &'static Transform,
    &'static CombatStats,
    &'static WeaponStats,
    Has<Dead>,
);

/// Система: resolution pass (один раз за кадр, после advance).
///
/// 1. Snapshot всех бойцов → `CombatantView`
/// 2. Новые Active offensive commitments → `PendingInteractions`
/// 3. `PendingInteractions::resolve` (чистая функция, RNG в canonical order)
/// 4. Эффекты → Health / StatusLedger / KnockdownMeter / SkillState
///
/// Движок не хранит урон: всё, что осталось после прохода, лежит в компонентах.
pub fn resolve_interactions(
    mut combatants: Query<ResolveQuery>,
    mut pending: ResMut<PendingInteractions>,
    mut rng: ResMut<DeterministicRng>,
    mut admission: Option<ResMut<AttackSlotController>>,
    clock: Res<CombatClock>,
    config: Res<CombatConfig>,
    mut commands: Commands,
    mut phase_events: EventWriter<PhaseChanged>,
    mut resolved_events: EventWriter<InteractionResolved>,
    mut damage_events: EventWriter<DamageDealt>,
    mut death_events: EventWriter<EntityDied>,
) {
    let now = clock.now();

    // 1-2. Snapshot + ingest
    let mut views = HashMap::new();
    let mut fresh = Vec::new();
    for (entity, combatant, health, state, _, _, target, transform, stats, weapon, dead) in combatants.iter() {
        let view = CombatantView {
            entity,
            faction_id: combatant.faction_id,
            alive: !dead && health.is_alive(),
            health: health.current,
            position: transform.translation,
            stats: stats.clone(),
            weapon: weapon.clone(),
            skill: state.skill,
            phase: state.phase,
            commitment_id: state.commitment_id,
            committed_at: state.committed_at,
            consumed: state.consumed,
            accuracy: state.accuracy,
            combo_step: state.combo_step,
        };
        if let Some(entry) = view.offensive_commitment(target.0) {
            fresh.push(entry);
        }
        views.insert(entity, view);
    }

    // Stable ingest order (query order is not part of the contract)
    fresh.sort_by_key(|entry| entry.attacker.to_bits());
    for entry in fresh {
        if pending.ingest(entry) {
            crate::logger::log(&format!(
                "🗡️ {:?} committed {:?} → {:?} at {:.3}",
                entry.attacker, entry.skill, entry.target, entry.committed_at
            ));
        }
    }

    if pending.is_empty() {
        return;
    }

    // 3. Resolve
    let resolutions = pending.resolve(&views, now, &config, &mut rng.rng);

    // 4. Apply
    let mut fallen: Vec<Entity> = Vec::new();
    for resolution in resolutions {
        for effect in &resolution.effects {
            match *effect {
                CombatEffect::Damage {
                    source,
                    target,
                    amount,
                    skill,
                    critical,
                } => {
                    let Ok((_, _, mut health, ..)) = combatants.get_mut(target) else {
                        continue;
                    };
                    health.take_damage(amount);
                    damage_events.write(DamageDealt {
                        attacker: source,
                        target,
                        damage: amount,
                        skill,
                        critical,
                    });
                    crate::logger::log(&format!(
                        "💥 {:?} → {:?}: {} dmg{} (hp {}/{})",
                        source,
                        target,
                        amount,
                        if critical { " CRIT" } else { "" },
                        health.current,
                        health.max
                    ));

                    if !health.is_alive() && !fallen.contains(&target) {
                        fallen.push(target);
                        commands.entity(target).insert(Dead);
                        death_events.write(EntityDied {
                            entity: target,
                            killer: Some(source),
                        });
                        crate::logger::log_info(&format!("💀 {:?} killed by {:?}", target, source));
                    }
                }
                CombatEffect::Status {
                    target,
                    kind,
                    duration,
                    source,
                } => {
                    let Ok((_, _, _, _, mut ledger, mut meter, ..)) = combatants.get_mut(target) else {
                        continue;
                    };
                    ledger.apply(kind, duration, source);
                    if kind == StatusKind::Knockdown {
                        meter.reset();
                    }
                }
                CombatEffect::KnockdownBuildup { target, amount, source } => {
                    let Ok((_, _, _, _, mut ledger, mut meter, ..)) = combatants.get_mut(target) else {
                        continue;
                    };
                    if meter.add(amount) {
                        ledger.apply(StatusKind::Knockdown, config.knockdown_duration, Some(source));
                        crate::logger::log(&format!("🤕 {:?}: knockdown meter full → Knockdown", target));
                    }
                }
                CombatEffect::Consume {
                    combatant,
                    commitment_id,
                } => {
                    let Ok((_, _, _, mut state, _, _, _, _, stats, weapon, _)) = combatants.get_mut(combatant) else {
                        continue;
                    };
                    let timings = current_timings(&state, stats, weapon, &config);
                    let transitions = state.consume(commitment_id, &timings, now);
                    write_transitions(&mut phase_events, combatant, transitions);
                }
                CombatEffect::Interrupt {
                    combatant,
                    commitment_id,
                } => {
                    let Ok((_, _, _, mut state, ..)) = combatants.get_mut(combatant) else {
                        continue;
                    };
                    if state.commitment_id != commitment_id {
                        continue;
                    }
                    if let Some(tr) = state.interrupt(now) {
                        write_transitions(&mut phase_events, combatant, [tr]);
                    }
                    if let Some(controller) = admission.as_deref_mut() {
                        controller.release(combatant);
                    }
                }
                CombatEffect::ComboAdvance { combatant } => {
                    if let Ok((_, _, _, mut state, ..)) = combatants.get_mut(combatant) {
                        state.combo_step += 1;
                    }
                }
                CombatEffect::ComboReset { combatant } => {
                    if let Ok((_, _, _, mut state, ..)) = combatants.get_mut(combatant) {
                        state.combo_step = 0;
                    }
                }
            }
        }

        crate::logger::log(&format!(
            "⚖️ {:?} {:?} vs {:?} {:?} → {:?}",
            resolution.attacker, resolution.offensive, resolution.defender, resolution.defensive, resolution.outcome
        ));
        resolved_events.write(InteractionResolved {
            attacker: resolution.attacker,
            defender: resolution.defender,
            offensive: resolution.offensive,
            defensive: resolution.defensive,
            outcome: resolution.outcome,
            at: now,
        });
    }
}
