//! Skill state machine component (one per combatant).
//!
//! # Phases
//!
//! ```text
//! Idle → Charging → Charged → Startup → Active → Recovery → Idle   (offensive)
//! Idle → Charging → Charged → Waiting → Idle                       (defensive)
//! Idle → Aiming   → Charged → ...                                  (ranged)
//! ```
//!
//! Transitions are a pure table (`next_phase`) driven by `advance(dt)`;
//! cancellation / engine interrupt return straight to Idle.
//! Phase duration is fixed at phase entry from `PhaseTimings`.

use bevy::prelude::*;

use crate::combat::{PhaseTimings, Skill, SkillClass};
use crate::components::{Stamina, WeaponStats};
use crate::error::CommandRejected;

use super::status::StatusLedger;

/// Named stage of a commitment's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum SkillPhase {
    #[default]
    Idle,
    Charging,
    /// Ranged equivalent of Charging: accuracy accumulates.
    Aiming,
    Charged,
    Startup,
    Active,
    Recovery,
    /// Defensive skill raised and waiting for a blow.
    Waiting,
}

impl SkillPhase {
    /// Position in the canonical order, used by the monotonicity checks.
    pub fn order(&self) -> u8 {
        match self {
            SkillPhase::Idle => 0,
            SkillPhase::Charging | SkillPhase::Aiming => 1,
            SkillPhase::Charged => 2,
            SkillPhase::Startup | SkillPhase::Waiting => 3,
            SkillPhase::Active => 4,
            SkillPhase::Recovery => 5,
        }
    }
}

/// One phase change, emitted as `PhaseChanged`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTransition {
    pub skill: Option<Skill>,
    pub from: SkillPhase,
    pub to: SkillPhase,
    pub at: f64,
}

/// Natural successor of `phase` once its duration has elapsed.
///
/// `None` = phase is held until an external event (execute, resolution).
pub fn next_phase(class: SkillClass, phase: SkillPhase) -> Option<SkillPhase> {
    match (class, phase) {
        (_, SkillPhase::Idle) => None,
        (_, SkillPhase::Charging | SkillPhase::Aiming) => Some(SkillPhase::Charged),
        (SkillClass::Defensive, SkillPhase::Charged) => Some(SkillPhase::Waiting),
        (SkillClass::Offensive, SkillPhase::Charged) => None,
        (_, SkillPhase::Startup) => Some(SkillPhase::Active),
        (_, SkillPhase::Active) => Some(SkillPhase::Recovery),
        (_, SkillPhase::Recovery) => Some(SkillPhase::Idle),
        (_, SkillPhase::Waiting) => Some(SkillPhase::Idle),
    }
}

/// The live commitment of a combatant. Idle is a phase, not an absence.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SkillState {
    pub skill: Option<Skill>,
    pub phase: SkillPhase,
    /// Seconds spent in the current phase.
    pub elapsed: f32,
    /// Length of the current phase, fixed at entry.
    pub phase_duration: f32,
    /// Incremented on every start-charge; lets the resolver detect stale records.
    pub commitment_id: u64,
    /// When the commitment became executable (Active / Waiting entry).
    pub committed_at: Option<f64>,
    /// Resolver has already used this commitment.
    pub consumed: bool,
    /// Ranged hit chance in [0, 1].
    pub accuracy: f32,
    /// Consecutive Attack hits landed.
    pub combo_step: u32,
    /// Idle seconds since the last commitment ended.
    pub idle_time: f32,
}

impl SkillState {
    pub fn is_idle(&self) -> bool {
        self.phase == SkillPhase::Idle
    }

    pub fn current_skill(&self) -> Option<Skill> {
        self.skill
    }

    pub fn current_phase(&self) -> SkillPhase {
        self.phase
    }

    /// Progress through the current phase in [0, 1]. Held phases report 1.
    pub fn elapsed_fraction(&self) -> f32 {
        if self.phase_duration <= 0.0 {
            return if self.is_idle() { 0.0 } else { 1.0 };
        }
        (self.elapsed / self.phase_duration).clamp(0.0, 1.0)
    }

    /// Idle and not gated by any status.
    pub fn is_ready_to_act(&self, ledger: &StatusLedger) -> bool {
        self.is_idle() && ledger.permits_acting()
    }

    /// Offensive commitment waiting for resolution.
    pub fn is_executable_offense(&self) -> bool {
        self.phase == SkillPhase::Active
            && !self.consumed
            && self.skill.is_some_and(|s| s.is_offensive())
    }

    /// Defensive commitment raised and not yet used.
    pub fn is_waiting_defense(&self) -> bool {
        self.phase == SkillPhase::Waiting && !self.consumed
    }

    /// start-charge: Idle (or Charged, to switch skills) → Charging / Aiming.
    ///
    /// All checks run before anything is mutated; stamina is paid last.
    pub fn start_charge(
        &mut self,
        skill: Skill,
        weapon: &WeaponStats,
        stamina: &mut Stamina,
        ledger: &StatusLedger,
        timings: &PhaseTimings,
        now: f64,
    ) -> Result<Vec<PhaseTransition>, CommandRejected> {
        if !matches!(self.phase, SkillPhase::Idle | SkillPhase::Charged) {
            return Err(CommandRejected::CannotStartFrom {
                skill,
                phase: self.phase,
            });
        }
        if let Some(status) = ledger.gating() {
            return Err(CommandRejected::StatusForbids(status));
        }
        if !weapon.can_perform(skill) {
            return Err(CommandRejected::WeaponCannotPerform(skill));
        }
        let cost = skill.stamina_cost();
        if !stamina.consume(cost) {
            return Err(CommandRejected::InsufficientStamina {
                skill,
                needed: cost,
                available: stamina.current,
            });
        }

        let from = self.phase;
        self.skill = Some(skill);
        self.commitment_id += 1;
        self.committed_at = None;
        self.consumed = false;
        self.accuracy = 0.0;
        self.idle_time = 0.0;

        let entry = if skill.is_ranged() {
            SkillPhase::Aiming
        } else {
            SkillPhase::Charging
        };

        let mut transitions = vec![PhaseTransition {
            skill: Some(skill),
            from,
            to: entry,
            at: now,
        }];
        self.enter(entry, timings, now);
        // Zero-length charge (basic Attack) passes straight to Charged.
        self.settle(timings, now, &mut transitions);
        Ok(transitions)
    }

    /// execute: Charged → Startup. Ranged skills have to finish aiming first.
    pub fn execute(&mut self, timings: &PhaseTimings, now: f64) -> Result<Vec<PhaseTransition>, CommandRejected> {
        let Some(skill) = self.skill else {
            return Err(CommandRejected::NotCharged(self.phase));
        };
        if skill.is_defensive() {
            return Err(CommandRejected::DefensiveExecute(skill));
        }
        if self.phase != SkillPhase::Charged {
            return Err(CommandRejected::NotCharged(self.phase));
        }

        let mut transitions = Vec::new();
        self.transition(SkillPhase::Startup, timings, now, &mut transitions);
        self.settle(timings, now, &mut transitions);
        Ok(transitions)
    }

    /// cancel: any non-Active phase → Idle. No stamina refund.
    pub fn cancel(&mut self, now: f64) -> Result<PhaseTransition, CommandRejected> {
        match self.phase {
            SkillPhase::Idle => Err(CommandRejected::NothingToCancel),
            SkillPhase::Active => Err(CommandRejected::ActiveNotCancellable),
            _ => Ok(self.reset_to_idle(now)),
        }
    }

    /// Engine-side interrupt (lost a speed clash, died). Works from any phase.
    pub fn interrupt(&mut self, now: f64) -> Option<PhaseTransition> {
        if self.is_idle() {
            return None;
        }
        Some(self.reset_to_idle(now))
    }

    /// Resolver consumed this commitment.
    ///
    /// Defensive → Idle immediately. Offensive → Recovery once its active
    /// time has also run out (possibly right now).
    pub fn consume(&mut self, commitment_id: u64, timings: &PhaseTimings, now: f64) -> Vec<PhaseTransition> {
        let mut transitions = Vec::new();
        if commitment_id != self.commitment_id || self.consumed {
            return transitions;
        }
        self.consumed = true;

        match self.phase {
            SkillPhase::Waiting => {
                transitions.push(self.reset_to_idle(now));
            }
            SkillPhase::Active => {
                self.settle(timings, now, &mut transitions);
            }
            _ => {}
        }
        transitions
    }

    /// Per-frame tick. Caller skips it while a Stun/Knockdown pauses the combatant.
    pub fn advance(&mut self, dt: f32, timings: &PhaseTimings, now: f64) -> Vec<PhaseTransition> {
        let mut transitions = Vec::new();
        if self.is_idle() {
            self.idle_time += dt;
            return transitions;
        }

        self.elapsed += dt;
        if self.phase == SkillPhase::Aiming {
            self.update_accuracy();
        }
        self.settle(timings, now, &mut transitions);
        transitions
    }

    /// Drop the combo after a long enough pause.
    pub fn tick_combo(&mut self, reset_after: f32) {
        if self.is_idle() && self.idle_time >= reset_after {
            self.combo_step = 0;
        }
    }

    /// Run every transition whose duration has already elapsed.
    fn settle(&mut self, timings: &PhaseTimings, now: f64, transitions: &mut Vec<PhaseTransition>) {
        // Longest chain: Charging → Charged → Waiting/… → Idle; the bound only guards bad data.
        for _ in 0..8 {
            let Some(skill) = self.skill else {
                return;
            };
            let Some(next) = next_phase(skill.class(), self.phase) else {
                return;
            };

            let timed_out = self.elapsed >= self.phase_duration;
            let ready = match self.phase {
                // Entering Charged from a defensive charge jumps to Waiting at once.
                SkillPhase::Charged => true,
                // Active is held until the resolver consumes it.
                SkillPhase::Active => timed_out && self.consumed,
                _ => timed_out,
            };
            if !ready {
                return;
            }

            if next == SkillPhase::Idle {
                transitions.push(self.reset_to_idle(now));
                return;
            }
            self.transition(next, timings, now, transitions);
        }
    }

    fn transition(&mut self, to: SkillPhase, timings: &PhaseTimings, now: f64, transitions: &mut Vec<PhaseTransition>) {
        let from = self.phase;
        // Overflow carries into the next phase; held phases (Charged, Active) don't carry.
        let carry = if matches!(from, SkillPhase::Charged | SkillPhase::Active) {
            0.0
        } else {
            (self.elapsed - self.phase_duration).max(0.0)
        };
        self.enter(to, timings, now);
        self.elapsed = carry;
        transitions.push(PhaseTransition {
            skill: self.skill,
            from,
            to,
            at: now,
        });
    }

    fn enter(&mut self, phase: SkillPhase, timings: &PhaseTimings, now: f64) {
        self.phase = phase;
        self.elapsed = 0.0;
        self.phase_duration = timings.for_phase(phase);
        match phase {
            SkillPhase::Active | SkillPhase::Waiting => self.committed_at = Some(now),
            SkillPhase::Charged if self.skill.is_some_and(|s| s.is_ranged()) => self.accuracy = 1.0,
            _ => {}
        }
    }

    fn update_accuracy(&mut self) {
        self.accuracy = if self.phase_duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.phase_duration).clamp(0.0, 1.0)
        };
    }

    fn reset_to_idle(&mut self, now: f64) -> PhaseTransition {
        let transition = PhaseTransition {
            skill: self.skill,
            from: self.phase,
            to: SkillPhase::Idle,
            at: now,
        };
        self.skill = None;
        self.phase = SkillPhase::Idle;
        self.elapsed = 0.0;
        self.phase_duration = 0.0;
        self.committed_at = None;
        self.consumed = false;
        self.accuracy = 0.0;
        self.idle_time = 0.0;
        transition
    }
}
