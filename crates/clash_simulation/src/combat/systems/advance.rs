//! Per-frame state machine advance.

use bevy::prelude::*;

use crate::combat::{CombatClock, PhaseChanged, SkillState, StatusLedger};
use crate::components::{CombatStats, Combatant, Dead, WeaponStats};
use crate::config::CombatConfig;

use super::commands::{current_timings, write_transitions};

/// Система: advance(dt) всех живых бойцов.
///
/// Stun / Knockdown ставят state machine на паузу (elapsed не растёт, фаза
/// не сбрасывается). Resting не мешает доиграть текущий commitment.
pub fn advance_skill_states(
    mut query: Query<
        (Entity, &mut SkillState, &StatusLedger, &CombatStats, &WeaponStats),
        (With<Combatant>, Without<Dead>),
    >,
    clock: Res<CombatClock>,
    config: Res<CombatConfig>,
    mut phase_events: EventWriter<PhaseChanged>,
) {
    let now = clock.now();

    for (entity, mut state, ledger, stats, weapon) in query.iter_mut() {
        if ledger.pauses_skill() {
            continue;
        }

        let timings = current_timings(&state, stats, weapon, &config);
        let transitions = state.advance(clock.delta, &timings, now);
        state.tick_combo(config.combo_reset_time);

        for tr in &transitions {
            crate::logger::log(&format!(
                "⏱️ {:?}: {:?} {:?} → {:?}",
                entity, tr.skill, tr.from, tr.to
            ));
        }
        write_transitions(&mut phase_events, entity, transitions);
    }
}
