//! Status ledger ticking and knockdown meter decay.

use bevy::prelude::*;

use crate::combat::{CombatClock, KnockdownMeter, StatusLedger};
use crate::components::{Combatant, Dead};
use crate::config::CombatConfig;

/// Система: countdown статусов + decay knockdown meter.
pub fn tick_status_effects(
    mut query: Query<(Entity, &mut StatusLedger, &mut KnockdownMeter), (With<Combatant>, Without<Dead>)>,
    clock: Res<CombatClock>,
    config: Res<CombatConfig>,
) {
    let delta = clock.delta;

    for (entity, mut ledger, mut meter) in query.iter_mut() {
        for kind in ledger.tick(delta) {
            crate::logger::log(&format!("✅ {:?}: {:?} expired", entity, kind));
        }
        meter.decay(config.knockdown_meter_decay * delta);
    }
}
