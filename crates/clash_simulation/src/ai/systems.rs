//! Admission systems: roster sync and slot requests.

use bevy::prelude::*;

use crate::combat::CombatClock;

use super::{AdmissionDecided, AdmissionVerdict, AttackAgent, AttackSlotController, AttackSlotRelease, AttackSlotRequest};

/// System: AttackAgent components → controller roster.
///
/// Новые агенты регистрируются в порядке entity index (стабильно между
/// прогонами), изменения priority/ready копируются, удалённые снимаются.
pub fn sync_attack_roster(
    added: Query<(Entity, &AttackAgent), Added<AttackAgent>>,
    changed: Query<(Entity, &AttackAgent), Changed<AttackAgent>>,
    mut removed: RemovedComponents<AttackAgent>,
    mut controller: ResMut<AttackSlotController>,
) {
    for entity in removed.read() {
        controller.unregister(entity);
    }

    let mut fresh: Vec<_> = added.iter().collect();
    fresh.sort_by_key(|(entity, _)| entity.index());
    for (entity, agent) in fresh {
        controller.register(entity, agent.priority, agent.ready);
    }

    for (entity, agent) in changed.iter() {
        controller.set_priority(entity, agent.priority);
        controller.set_ready(entity, agent.ready);
    }
}

/// System: AttackSlotRelease / AttackSlotRequest → controller.
///
/// Releases первыми; запросы одного кадра оцениваются в порядке roster.
pub fn process_attack_slot_requests(
    mut requests: EventReader<AttackSlotRequest>,
    mut releases: EventReader<AttackSlotRelease>,
    mut controller: ResMut<AttackSlotController>,
    clock: Res<CombatClock>,
    mut decided: EventWriter<AdmissionDecided>,
) {
    let now = clock.now();

    for release in releases.read() {
        if controller.release(release.agent) {
            crate::logger::log(&format!("🎟️ {:?} released attack slot", release.agent));
        }
    }

    let mut batch: Vec<Entity> = requests.read().map(|r| r.agent).collect();
    batch.sort_by_key(|agent| (controller.roster_position(*agent).unwrap_or(usize::MAX), agent.to_bits()));
    batch.dedup();

    for agent in batch {
        let verdict = controller.request(agent, now);
        match verdict {
            AdmissionVerdict::Granted { expires_at } => crate::logger::log(&format!(
                "🎟️ {:?} granted attack slot until {:.2}",
                agent, expires_at
            )),
            AdmissionVerdict::Denied(reason) => {
                crate::logger::log(&format!("🚫 {:?} denied attack slot: {:?}", agent, reason))
            }
        }
        decided.write(AdmissionDecided {
            agent,
            verdict,
            at: now,
        });
    }
}
