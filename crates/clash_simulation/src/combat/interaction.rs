//! Interaction resolution engine (pure part).
//!
//! Offensive commitments that reached Active are queued in
//! `PendingInteractions`; once an entry has waited one simultaneity window it
//! is *ripe* and gets resolved against a frame snapshot of all combatants.
//!
//! # Pass order
//!
//! ```text
//! drop stale attackers
//!   ↓
//! canonical sort (speed ↓, committed_at ↑, entity bits ↑)
//!   ↓
//! mutual engagements (A→B and B→A inside the window) → speed tie-break
//!   ↓
//! remaining ripe entries → matrix vs. waiting defense, or default strike
//!                           (defense counts only if Waiting began within
//!                            the window of the attack, either side)
//! ```
//!
//! All randomness is drawn in canonical order, so the same snapshot and seed
//! give the same result no matter how entries were queued.
//!
//! Output is data only (`Resolution` + `CombatEffect`); the resolution
//! system applies it to components.

use std::cmp::Ordering;
use std::collections::HashMap;

use bevy::prelude::*;
use rand::Rng;

use crate::components::{CombatStats, WeaponStats};
use crate::config::CombatConfig;

use super::damage::{base_damage, damage_reduction, hit_damage, knockdown_meter_delta, roll_critical, stun_duration};
use super::speed::speed;
use super::{Skill, SkillPhase, StatusKind};

/// Tolerance for time comparisons (clock is an f64 sum of f32 steps).
const TIME_EPSILON: f64 = 1e-6;

/// Result category of one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum InteractionOutcome {
    AttackerWins,
    DefenderBlocks,
    DefenderReflects,
    DefenderKnockedDown,
    SimultaneousExecution,
    NoInteraction,
}

/// Fixed offensive × defensive table.
///
/// Pairs that are not (offensive, defensive) have no entry.
pub fn matrix(offensive: Skill, defensive: Skill) -> InteractionOutcome {
    use InteractionOutcome::*;

    match (offensive, defensive) {
        (Skill::Attack, Skill::Defense) => DefenderBlocks,
        (Skill::Attack, Skill::Counterattack) => DefenderReflects,
        (Skill::Smash, Skill::Defense) => DefenderKnockedDown,
        (Skill::Smash, Skill::Counterattack) => DefenderReflects,
        (Skill::Windmill, Skill::Defense) => DefenderBlocks,
        (Skill::Windmill, Skill::Counterattack) => DefenderKnockedDown,
        (Skill::RangedAttack, Skill::Defense) => DefenderBlocks,
        (Skill::RangedAttack, Skill::Counterattack) => AttackerWins,
        _ => NoInteraction,
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only frame snapshot of one combatant, taken right before the pass.
#[derive(Debug, Clone)]
pub struct CombatantView {
    pub entity: Entity,
    pub faction_id: u64,
    pub alive: bool,
    pub health: u32,
    pub position: Vec3,
    pub stats: CombatStats,
    pub weapon: WeaponStats,
    pub skill: Option<Skill>,
    pub phase: SkillPhase,
    pub commitment_id: u64,
    pub committed_at: Option<f64>,
    pub consumed: bool,
    pub accuracy: f32,
    pub combo_step: u32,
}

impl CombatantView {
    /// Offensive commitment the resolver should know about, if any.
    pub fn offensive_commitment(&self, target: Option<Entity>) -> Option<OffensiveCommitment> {
        let skill = self.skill?;
        if !self.alive || self.phase != SkillPhase::Active || self.consumed || !skill.is_offensive() {
            return None;
        }
        Some(OffensiveCommitment {
            attacker: self.entity,
            commitment_id: self.commitment_id,
            skill,
            target,
            committed_at: self.committed_at?,
            accuracy: self.accuracy,
        })
    }

    /// Raised, unused defensive commitment.
    pub fn defensive_commitment(&self) -> Option<DefensiveCommitment> {
        let skill = self.skill?;
        if !self.alive || self.phase != SkillPhase::Waiting || self.consumed || !skill.is_defensive() {
            return None;
        }
        Some(DefensiveCommitment {
            defender: self.entity,
            commitment_id: self.commitment_id,
            skill,
            waiting_since: self.committed_at?,
        })
    }

    fn reaches(&self, other: &CombatantView, skill: Skill) -> bool {
        let reach = self.weapon.reach(skill);
        self.position.distance_squared(other.position) <= reach * reach
    }

    /// Still holds exactly this offensive commitment, unconsumed.
    fn holds(&self, entry: &OffensiveCommitment) -> bool {
        self.alive
            && self.commitment_id == entry.commitment_id
            && self.phase == SkillPhase::Active
            && !self.consumed
            && self.skill == Some(entry.skill)
    }
}

/// Queued offensive commitment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffensiveCommitment {
    pub attacker: Entity,
    pub commitment_id: u64,
    pub skill: Skill,
    pub target: Option<Entity>,
    pub committed_at: f64,
    pub accuracy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefensiveCommitment {
    pub defender: Entity,
    pub commitment_id: u64,
    pub skill: Skill,
    pub waiting_since: f64,
}

// ============================================================================
// Output
// ============================================================================

/// One change to apply to the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEffect {
    Damage {
        source: Entity,
        target: Entity,
        amount: u32,
        skill: Skill,
        critical: bool,
    },
    Status {
        target: Entity,
        kind: StatusKind,
        duration: f32,
        source: Option<Entity>,
    },
    KnockdownBuildup {
        target: Entity,
        amount: f32,
        source: Entity,
    },
    Consume {
        combatant: Entity,
        commitment_id: u64,
    },
    /// Lost a speed clash: back to Idle, admission grant released.
    Interrupt {
        combatant: Entity,
        commitment_id: u64,
    },
    ComboAdvance {
        combatant: Entity,
    },
    ComboReset {
        combatant: Entity,
    },
}

/// One resolved (or discarded) offensive entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub attacker: Entity,
    pub defender: Option<Entity>,
    pub offensive: Skill,
    pub defensive: Option<Skill>,
    pub outcome: InteractionOutcome,
    pub effects: Vec<CombatEffect>,
}

impl Resolution {
    fn discarded(entry: &OffensiveCommitment) -> Self {
        Self {
            attacker: entry.attacker,
            defender: entry.target,
            offensive: entry.skill,
            defensive: None,
            outcome: InteractionOutcome::NoInteraction,
            effects: vec![CombatEffect::Consume {
                combatant: entry.attacker,
                commitment_id: entry.commitment_id,
            }],
        }
    }

    /// Total damage dealt to `target` by this resolution.
    pub fn damage_to(&self, target: Entity) -> u32 {
        self.effects
            .iter()
            .map(|effect| match effect {
                CombatEffect::Damage { target: t, amount, .. } if *t == target => *amount,
                _ => 0,
            })
            .sum()
    }
}

// ============================================================================
// Pending queue
// ============================================================================

/// Offensive commitments waiting for their simultaneity window to close.
#[derive(Resource, Debug, Default)]
pub struct PendingInteractions {
    entries: Vec<OffensiveCommitment>,
}

impl PendingInteractions {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[OffensiveCommitment] {
        &self.entries
    }

    pub fn contains(&self, attacker: Entity, commitment_id: u64) -> bool {
        self.entries
            .iter()
            .any(|e| e.attacker == attacker && e.commitment_id == commitment_id)
    }

    /// Queue a commitment unless it is already pending. Returns true if added.
    pub fn ingest(&mut self, entry: OffensiveCommitment) -> bool {
        if self.contains(entry.attacker, entry.commitment_id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Forget everything `entity` queued (death / despawn).
    pub fn purge(&mut self, entity: Entity) {
        self.entries.retain(|e| e.attacker != entity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One resolution pass at `now`. Resolved and stale entries leave the
    /// queue; unripe ones stay.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        views: &HashMap<Entity, CombatantView>,
        now: f64,
        config: &CombatConfig,
        rng: &mut R,
    ) -> Vec<Resolution> {
        // Stale attackers vanish silently
        self.entries
            .retain(|entry| views.get(&entry.attacker).is_some_and(|view| view.holds(entry)));

        let mut ordered: Vec<(OffensiveCommitment, f32)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let view = views.get(&entry.attacker)?;
                Some((*entry, speed(entry.skill, &view.stats, &view.weapon, config)))
            })
            .collect();
        ordered.sort_by(canonical_order);

        let mut pass = Pass {
            views,
            config,
            window: config.simultaneity_window,
            now,
            health: views.iter().map(|(e, v)| (*e, v.health)).collect(),
            used_defense: Vec::new(),
            handled: vec![false; ordered.len()],
            resolutions: Vec::new(),
        };

        pass.mutual_engagements(&ordered, rng);
        pass.remaining(&ordered, rng);

        let handled: Vec<(Entity, u64)> = ordered
            .iter()
            .zip(&pass.handled)
            .filter(|(_, done)| **done)
            .map(|((entry, _), _)| (entry.attacker, entry.commitment_id))
            .collect();
        self.entries
            .retain(|e| !handled.contains(&(e.attacker, e.commitment_id)));

        pass.resolutions
    }
}

/// Ranged accuracy roll; melee always lands.
fn lands<R: Rng + ?Sized>(entry: &OffensiveCommitment, rng: &mut R) -> bool {
    !entry.skill.is_ranged() || rng.gen::<f32>() < entry.accuracy
}

/// Speed descending, then earliest commit, then lowest entity bits.
fn canonical_order(a: &(OffensiveCommitment, f32), b: &(OffensiveCommitment, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            a.0.committed_at
                .partial_cmp(&b.0.committed_at)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.0.attacker.to_bits().cmp(&b.0.attacker.to_bits()))
}

/// Working state of one resolution pass.
struct Pass<'a> {
    views: &'a HashMap<Entity, CombatantView>,
    config: &'a CombatConfig,
    window: f64,
    now: f64,
    /// Health as damage lands during the pass.
    health: HashMap<Entity, u32>,
    /// Defensive commitments already consumed in this pass.
    used_defense: Vec<Entity>,
    handled: Vec<bool>,
    resolutions: Vec<Resolution>,
}

impl<'a> Pass<'a> {
    fn is_ripe(&self, entry: &OffensiveCommitment) -> bool {
        self.now + TIME_EPSILON >= entry.committed_at + self.window
    }

    fn is_alive(&self, entity: Entity) -> bool {
        self.views.get(&entity).is_some_and(|v| v.alive)
            && self.health.get(&entity).is_some_and(|hp| *hp > 0)
    }

    /// A→B and B→A in the same window: faster one strikes, tie = both strike.
    fn mutual_engagements<R: Rng + ?Sized>(&mut self, ordered: &[(OffensiveCommitment, f32)], rng: &mut R) {
        let views = self.views;
        for i in 0..ordered.len() {
            let (a, speed_a) = ordered[i];
            if self.handled[i] || !self.is_ripe(&a) {
                continue;
            }
            let Some(target) = a.target else {
                continue;
            };

            let partner = (0..ordered.len()).find(|&j| {
                let (b, _) = ordered[j];
                j != i
                    && !self.handled[j]
                    && b.attacker == target
                    && b.target == Some(a.attacker)
                    && (a.committed_at - b.committed_at).abs() <= self.window + TIME_EPSILON
            });
            let Some(j) = partner else {
                continue;
            };
            let (b, speed_b) = ordered[j];

            let (Some(view_a), Some(view_b)) = (views.get(&a.attacker), views.get(&b.attacker)) else {
                continue;
            };
            if view_a.faction_id == view_b.faction_id
                || !self.is_alive(a.attacker)
                || !self.is_alive(b.attacker)
                || !view_a.reaches(view_b, a.skill)
                || !view_b.reaches(view_a, b.skill)
            {
                continue;
            }

            self.handled[i] = true;
            self.handled[j] = true;

            if speed_a == speed_b {
                crate::logger::log(&format!(
                    "⚔️ Clash tie {:?} ↔ {:?} (speed {:.3}) → SimultaneousExecution",
                    a.attacker, b.attacker, speed_a
                ));
                for (entry, attacker, defender) in [(a, view_a, view_b), (b, view_b, view_a)] {
                    let mut effects = if lands(&entry, rng) {
                        self.strike(&entry, attacker, defender, rng)
                    } else {
                        vec![CombatEffect::ComboReset {
                            combatant: entry.attacker,
                        }]
                    };
                    effects.push(CombatEffect::Consume {
                        combatant: entry.attacker,
                        commitment_id: entry.commitment_id,
                    });
                    self.resolutions.push(Resolution {
                        attacker: entry.attacker,
                        defender: Some(defender.entity),
                        offensive: entry.skill,
                        defensive: None,
                        outcome: InteractionOutcome::SimultaneousExecution,
                        effects,
                    });
                }
                continue;
            }

            // Canonical sort puts the faster one first, but compare explicitly
            let (winner, loser, w_view, l_view) = if speed_a > speed_b {
                (a, b, view_a, view_b)
            } else {
                (b, a, view_b, view_a)
            };
            crate::logger::log(&format!(
                "⚔️ Clash {:?} beats {:?} on speed",
                winner.attacker, loser.attacker
            ));

            let mut effects = if lands(&winner, rng) {
                self.strike(&winner, w_view, l_view, rng)
            } else {
                Vec::new()
            };
            effects.push(CombatEffect::Consume {
                combatant: winner.attacker,
                commitment_id: winner.commitment_id,
            });
            effects.push(CombatEffect::Interrupt {
                combatant: loser.attacker,
                commitment_id: loser.commitment_id,
            });
            let outcome = if effects.iter().any(|e| matches!(e, CombatEffect::Damage { .. })) {
                InteractionOutcome::AttackerWins
            } else {
                InteractionOutcome::NoInteraction
            };
            self.resolutions.push(Resolution {
                attacker: winner.attacker,
                defender: Some(loser.attacker),
                offensive: winner.skill,
                defensive: None,
                outcome,
                effects,
            });
        }
    }

    /// Everything ripe that wasn't a mutual engagement.
    fn remaining<R: Rng + ?Sized>(&mut self, ordered: &[(OffensiveCommitment, f32)], rng: &mut R) {
        for i in 0..ordered.len() {
            let (entry, _) = ordered[i];
            if self.handled[i] || !self.is_ripe(&entry) {
                continue;
            }
            self.handled[i] = true;
            let resolution = self.resolve_single(&entry, rng);
            self.resolutions.push(resolution);
        }
    }

    fn resolve_single<R: Rng + ?Sized>(&mut self, entry: &OffensiveCommitment, rng: &mut R) -> Resolution {
        let views = self.views;
        let Some(attacker) = views.get(&entry.attacker) else {
            return Resolution::discarded(entry);
        };
        let Some(defender) = entry.target.and_then(|t| views.get(&t)) else {
            crate::logger::log_warning(&format!(
                "⚠️ {:?} {:?}: target {:?} is gone, discarded",
                entry.attacker, entry.skill, entry.target
            ));
            return Resolution::discarded(entry);
        };
        if !self.is_alive(defender.entity) {
            crate::logger::log(&format!(
                "{:?} {:?}: target {:?} already dead, discarded",
                entry.attacker, entry.skill, defender.entity
            ));
            return Resolution::discarded(entry);
        }
        if attacker.faction_id == defender.faction_id || attacker.entity == defender.entity {
            crate::logger::log_warning(&format!(
                "⚠️ {:?} {:?}: target {:?} is not hostile, discarded",
                entry.attacker, entry.skill, defender.entity
            ));
            return Resolution::discarded(entry);
        }

        let mut resolution = Resolution::discarded(entry);

        if !lands(entry, rng) {
            crate::logger::log(&format!(
                "🏹 {:?} missed {:?} (accuracy {:.2})",
                entry.attacker, defender.entity, entry.accuracy
            ));
            resolution.effects.push(CombatEffect::ComboReset {
                combatant: entry.attacker,
            });
            return resolution;
        }

        if !attacker.reaches(defender, entry.skill) {
            // Whiff
            return resolution;
        }

        let defense = defender
            .defensive_commitment()
            .filter(|d| !self.used_defense.contains(&d.defender))
            .filter(|d| (entry.committed_at - d.waiting_since).abs() <= self.window + TIME_EPSILON)
            .filter(|d| d.skill != Skill::Counterattack || defender.reaches(attacker, Skill::Counterattack));

        let Some(defense) = defense else {
            let effects = self.strike(entry, attacker, defender, rng);
            resolution.outcome = if effects.iter().any(|e| {
                matches!(e, CombatEffect::Status { kind: StatusKind::Knockdown, target, .. } if *target == defender.entity)
            }) {
                InteractionOutcome::DefenderKnockedDown
            } else {
                InteractionOutcome::AttackerWins
            };
            resolution.effects.extend(effects);
            return resolution;
        };

        self.used_defense.push(defense.defender);
        let outcome = matrix(entry.skill, defense.skill);
        resolution.outcome = outcome;
        resolution.defensive = Some(defense.skill);
        resolution.effects.push(CombatEffect::Consume {
            combatant: defense.defender,
            commitment_id: defense.commitment_id,
        });

        let effects = self.matrix_effects(outcome, entry, attacker, defender, rng);
        resolution.effects.extend(effects);
        resolution
    }

    fn matrix_effects<R: Rng + ?Sized>(
        &mut self,
        outcome: InteractionOutcome,
        entry: &OffensiveCommitment,
        attacker: &CombatantView,
        defender: &CombatantView,
        rng: &mut R,
    ) -> Vec<CombatEffect> {
        let config = self.config;
        match outcome {
            InteractionOutcome::AttackerWins => self.strike(entry, attacker, defender, rng),
            InteractionOutcome::DefenderBlocks => vec![
                CombatEffect::Status {
                    target: attacker.entity,
                    kind: StatusKind::Stun,
                    duration: stun_duration(config.block_stun_base, &defender.stats, false, config),
                    source: Some(defender.entity),
                },
                CombatEffect::ComboReset {
                    combatant: attacker.entity,
                },
            ],
            InteractionOutcome::DefenderReflects => {
                let counter = base_damage(
                    &defender.stats,
                    &defender.weapon,
                    Skill::Counterattack,
                    &attacker.stats,
                    config,
                ) * config.reflect_multiplier;
                let amount = damage_reduction(counter, attacker.stats.protection, &attacker.stats, config);
                let mut effects = vec![self.damage(defender.entity, attacker.entity, amount, Skill::Counterattack, false)];
                effects.push(CombatEffect::Status {
                    target: attacker.entity,
                    kind: StatusKind::Knockdown,
                    duration: config.knockdown_duration,
                    source: Some(defender.entity),
                });
                effects.push(CombatEffect::ComboReset {
                    combatant: attacker.entity,
                });
                effects
            }
            InteractionOutcome::DefenderKnockedDown => {
                let critical = roll_critical(rng, &attacker.stats);
                let amount = hit_damage(&attacker.stats, &attacker.weapon, entry.skill, &defender.stats, critical, config);
                vec![
                    self.damage(attacker.entity, defender.entity, amount, entry.skill, critical),
                    CombatEffect::Status {
                        target: defender.entity,
                        kind: StatusKind::Knockdown,
                        duration: config.knockdown_duration,
                        source: Some(attacker.entity),
                    },
                    CombatEffect::ComboReset {
                        combatant: attacker.entity,
                    },
                ]
            }
            InteractionOutcome::SimultaneousExecution | InteractionOutcome::NoInteraction => Vec::new(),
        }
    }

    /// Attacker-wins-by-default hit: damage, stun, meter buildup, combo.
    fn strike<R: Rng + ?Sized>(
        &mut self,
        entry: &OffensiveCommitment,
        attacker: &CombatantView,
        defender: &CombatantView,
        rng: &mut R,
    ) -> Vec<CombatEffect> {
        let config = self.config;
        let critical = roll_critical(rng, &attacker.stats);
        let amount = hit_damage(&attacker.stats, &attacker.weapon, entry.skill, &defender.stats, critical, config);

        let mut effects = vec![
            self.damage(attacker.entity, defender.entity, amount, entry.skill, critical),
            CombatEffect::Status {
                target: defender.entity,
                kind: StatusKind::Stun,
                duration: stun_duration(attacker.weapon.stun_duration, &defender.stats, critical, config),
                source: Some(attacker.entity),
            },
            CombatEffect::KnockdownBuildup {
                target: defender.entity,
                amount: knockdown_meter_delta(&attacker.stats, &defender.stats, attacker.weapon.knockdown_rate, config),
                source: attacker.entity,
            },
        ];

        if entry.skill == Skill::Attack {
            let finishing = attacker.combo_step + 1 >= attacker.weapon.combo_length.max(1);
            if finishing {
                effects.push(CombatEffect::Status {
                    target: defender.entity,
                    kind: StatusKind::Knockdown,
                    duration: config.knockdown_duration,
                    source: Some(attacker.entity),
                });
                effects.push(CombatEffect::ComboReset {
                    combatant: attacker.entity,
                });
            } else {
                effects.push(CombatEffect::ComboAdvance {
                    combatant: attacker.entity,
                });
            }
        } else {
            effects.push(CombatEffect::ComboReset {
                combatant: attacker.entity,
            });
        }
        effects
    }

    fn damage(&mut self, source: Entity, target: Entity, amount: f32, skill: Skill, critical: bool) -> CombatEffect {
        let amount = amount.round().max(0.0) as u32;
        if let Some(hp) = self.health.get_mut(&target) {
            *hp = hp.saturating_sub(amount);
        }
        CombatEffect::Damage {
            source,
            target,
            amount,
            skill,
            critical,
        }
    }
}
