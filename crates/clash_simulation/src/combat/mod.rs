//! Combat module: skill state machines + interaction resolution.
//!
//! ECS ответственность:
//! - Per-combatant state: SkillState, StatusLedger, KnockdownMeter, Health, Stamina
//! - Rules: speed, damage, interaction matrix (pure functions)
//! - Events: SkillCommand in; PhaseChanged, InteractionResolved, DamageDealt, EntityDied out
//!
//! Один кадр = один прогон `CombatFrame`:
//!
//! ```text
//! Roster → Commands → Status → Advance → Resolve → Notify
//! ```
//!
//! Все state machines продвигаются ДО resolution pass: resolver видит
//! согласованный snapshot кадра.

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;

pub mod components;
pub mod damage;
pub mod events;
pub mod interaction;
pub mod skill;
pub mod speed;
pub mod systems;

#[cfg(test)]
mod interaction_tests;

// Re-export основных типов
pub use components::*;
pub use events::*;
pub use interaction::{
    matrix, CombatEffect, CombatantView, DefensiveCommitment, InteractionOutcome, OffensiveCommitment,
    PendingInteractions, Resolution,
};
pub use skill::{Skill, SkillClass, SkillTimings};
pub use speed::{movement_multiplier, speed, PhaseTimings};

use crate::config::CombatConfig;

/// Schedule of one combat frame. Run it through `step_combat_frame`.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombatFrame;

/// Stages of a combat frame (chained in this order).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Spawn validation, death/removal cleanup, admission roster + requests.
    Roster,
    /// SkillCommand → state machine.
    Commands,
    /// Status ledger, knockdown meter, stamina.
    Status,
    /// advance(dt) for every live combatant.
    Advance,
    /// Interaction resolution pass.
    Resolve,
    /// Observer fan-out.
    Notify,
}

/// Simulation time as seen by the combat core.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct CombatClock {
    /// Seconds since the simulation started.
    pub elapsed: f64,
    /// Length of the current frame.
    pub delta: f32,
    pub frame: u64,
}

impl CombatClock {
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.delta = dt;
        self.elapsed += dt as f64;
        self.frame += 1;
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }
}

/// Combat Plugin
///
/// Регистрирует события, ресурсы и `CombatFrame` schedule.
///
/// Порядок внутри кадра:
/// 1. lifecycle: проверка записей, cleanup мёртвых/удалённых
/// 2. process_skill_commands: start-charge / execute / cancel
/// 3. tick_status_effects, regenerate_stamina, enforce_forced_rest
/// 4. advance_skill_states: фазы (Stun/Knockdown = пауза)
/// 5. resolve_interactions: snapshot → resolver → effects
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .init_resource::<CombatClock>()
            .init_resource::<PendingInteractions>()
            .register_type::<SkillState>()
            .register_type::<StatusLedger>()
            .register_type::<KnockdownMeter>();

        app.add_event::<SkillCommand>()
            .add_event::<PhaseChanged>()
            .add_event::<SkillCommandRejected>()
            .add_event::<InteractionResolved>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.init_schedule(CombatFrame);
        app.configure_sets(
            CombatFrame,
            (
                CombatSet::Roster,
                CombatSet::Commands,
                CombatSet::Status,
                CombatSet::Advance,
                CombatSet::Resolve,
                CombatSet::Notify,
            )
                .chain(),
        );

        app.add_systems(
            CombatFrame,
            (
                (systems::validate_combatant_setup, systems::cleanup_fallen_combatants)
                    .chain()
                    .in_set(CombatSet::Roster),
                systems::process_skill_commands.in_set(CombatSet::Commands),
                (
                    systems::tick_status_effects,
                    systems::regenerate_stamina,
                    systems::enforce_forced_rest,
                )
                    .chain()
                    .in_set(CombatSet::Status),
                systems::advance_skill_states.in_set(CombatSet::Advance),
                systems::resolve_interactions.in_set(CombatSet::Resolve),
            ),
        );
    }
}
