//! Stamina management systems.

use bevy::prelude::*;

use crate::combat::{CombatClock, StatusKind, StatusLedger};
use crate::components::{Combatant, Dead, Stamina};
use crate::config::CombatConfig;

/// Система: regenerate stamina для всех живых бойцов
///
/// Regen rate берется из Stamina::regen_rate (default 10.0 units/sec),
/// во время Resting умножается на `rest_regen_multiplier`.
pub fn regenerate_stamina(
    mut query: Query<(&mut Stamina, &StatusLedger), (With<Combatant>, Without<Dead>)>,
    clock: Res<CombatClock>,
    config: Res<CombatConfig>,
) {
    for (mut stamina, ledger) in query.iter_mut() {
        let delta = if ledger.has(StatusKind::Resting) {
            clock.delta * config.rest_regen_multiplier
        } else {
            clock.delta
        };
        stamina.regenerate(delta);
    }
}

/// Система: forced rest при истощении
///
/// Stamina ≤ `exhaustion_threshold` → Resting на `forced_rest_duration`.
/// Resting блокирует только новые commitments, текущий продолжается.
pub fn enforce_forced_rest(
    mut query: Query<(Entity, &Stamina, &mut StatusLedger), (With<Combatant>, Without<Dead>)>,
    config: Res<CombatConfig>,
) {
    for (entity, stamina, mut ledger) in query.iter_mut() {
        if stamina.current <= config.exhaustion_threshold && !ledger.has(StatusKind::Resting) {
            ledger.apply(StatusKind::Resting, config.forced_rest_duration, None);
            crate::logger::log(&format!(
                "😮‍💨 {:?} exhausted (stamina {:.1}) → Resting {:.1}s",
                entity, stamina.current, config.forced_rest_duration
            ));
        }
    }
}
