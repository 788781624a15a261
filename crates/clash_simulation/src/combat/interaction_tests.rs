//! Tests for the interaction resolver.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::super::interaction::*;
    use crate::combat::{Skill, SkillPhase, StatusKind};
    use crate::components::{CombatStats, WeaponStats};
    use crate::config::CombatConfig;

    fn view(id: u32, faction_id: u64, x: f32) -> CombatantView {
        CombatantView {
            entity: Entity::from_raw(id),
            faction_id,
            alive: true,
            health: 100,
            position: Vec3::new(x, 0.0, 0.0),
            stats: CombatStats {
                critical_chance: 0.0,
                ..CombatStats::default()
            },
            weapon: WeaponStats::sword(),
            skill: None,
            phase: SkillPhase::Idle,
            commitment_id: 0,
            committed_at: None,
            consumed: false,
            accuracy: 0.0,
            combo_step: 0,
        }
    }

    fn attacking(mut v: CombatantView, skill: Skill, at: f64) -> CombatantView {
        v.skill = Some(skill);
        v.phase = SkillPhase::Active;
        v.commitment_id = 1;
        v.committed_at = Some(at);
        v.accuracy = 1.0;
        v
    }

    fn defending(mut v: CombatantView, skill: Skill, since: f64) -> CombatantView {
        v.skill = Some(skill);
        v.phase = SkillPhase::Waiting;
        v.commitment_id = 1;
        v.committed_at = Some(since);
        v
    }

    fn world_of(views: Vec<CombatantView>) -> HashMap<Entity, CombatantView> {
        views.into_iter().map(|v| (v.entity, v)).collect()
    }

    fn queue(views: &HashMap<Entity, CombatantView>, targets: &[(u32, Option<u32>)]) -> PendingInteractions {
        let mut pending = PendingInteractions::default();
        for (attacker, target) in targets {
            let entity = Entity::from_raw(*attacker);
            let entry = views[&entity]
                .offensive_commitment(target.map(Entity::from_raw))
                .expect("attacker must be Active");
            pending.ingest(entry);
        }
        pending
    }

    fn resolve(
        pending: &mut PendingInteractions,
        views: &HashMap<Entity, CombatantView>,
        now: f64,
        seed: u64,
    ) -> Vec<Resolution> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        pending.resolve(views, now, &CombatConfig::default(), &mut rng)
    }

    fn has_status(resolution: &Resolution, target: Entity, kind: StatusKind) -> bool {
        resolution.effects.iter().any(|e| {
            matches!(e, CombatEffect::Status { target: t, kind: k, .. } if *t == target && *k == kind)
        })
    }

    fn consumes(resolution: &Resolution, combatant: Entity) -> bool {
        resolution
            .effects
            .iter()
            .any(|e| matches!(e, CombatEffect::Consume { combatant: c, .. } if *c == combatant))
    }

    #[test]
    fn test_matrix_table() {
        use InteractionOutcome::*;
        assert_eq!(matrix(Skill::Attack, Skill::Defense), DefenderBlocks);
        assert_eq!(matrix(Skill::Attack, Skill::Counterattack), DefenderReflects);
        assert_eq!(matrix(Skill::Smash, Skill::Defense), DefenderKnockedDown);
        assert_eq!(matrix(Skill::Smash, Skill::Counterattack), DefenderReflects);
        assert_eq!(matrix(Skill::Windmill, Skill::Defense), DefenderBlocks);
        assert_eq!(matrix(Skill::Windmill, Skill::Counterattack), DefenderKnockedDown);
        assert_eq!(matrix(Skill::RangedAttack, Skill::Defense), DefenderBlocks);
        assert_eq!(matrix(Skill::RangedAttack, Skill::Counterattack), AttackerWins);
        assert_eq!(matrix(Skill::Defense, Skill::Attack), NoInteraction);
    }

    #[test]
    fn test_basic_block() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 1.0);
        let b = defending(view(2, 2, 1.5), Skill::Defense, 0.95);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let results = resolve(&mut pending, &views, 1.1, 7);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.outcome, InteractionOutcome::DefenderBlocks);
        assert_eq!(r.defensive, Some(Skill::Defense));
        assert_eq!(r.damage_to(Entity::from_raw(2)), 0);
        assert!(has_status(r, Entity::from_raw(1), StatusKind::Stun));
        assert!(consumes(r, Entity::from_raw(1)));
        assert!(consumes(r, Entity::from_raw(2)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_entry_waits_for_window() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 1.0);
        let b = view(2, 2, 1.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        assert!(resolve(&mut pending, &views, 1.05, 1).is_empty());
        assert_eq!(pending.len(), 1);

        let results = resolve(&mut pending, &views, 1.1, 1);
        assert_eq!(results[0].outcome, InteractionOutcome::AttackerWins);
        assert!(results[0].damage_to(Entity::from_raw(2)) >= 1);
    }

    #[test]
    fn test_speed_tie_is_simultaneous() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = attacking(view(2, 2, 1.0), Skill::Attack, 0.05);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2)), (2, Some(1))]);

        let results = resolve(&mut pending, &views, 0.1, 3);
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.outcome, InteractionOutcome::SimultaneousExecution);
        }
        assert!(results.iter().any(|r| r.damage_to(Entity::from_raw(1)) > 0));
        assert!(results.iter().any(|r| r.damage_to(Entity::from_raw(2)) > 0));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_faster_combatant_wins_clash() {
        let mut fast = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        fast.weapon = WeaponStats::dagger();
        let mut slow = attacking(view(2, 2, 1.0), Skill::Attack, 0.02);
        slow.weapon = WeaponStats::greatsword();
        let views = world_of(vec![fast, slow]);
        let mut pending = queue(&views, &[(2, Some(1)), (1, Some(2))]);

        let results = resolve(&mut pending, &views, 0.1, 3);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.attacker, Entity::from_raw(1));
        assert_eq!(r.outcome, InteractionOutcome::AttackerWins);
        assert!(r.effects.iter().any(|e| matches!(
            e,
            CombatEffect::Interrupt { combatant, .. } if *combatant == Entity::from_raw(2)
        )));
        assert_eq!(r.damage_to(Entity::from_raw(1)), 0);
    }

    #[test]
    fn test_resolution_independent_of_queue_order() {
        let mut stats = CombatStats::default();
        stats.critical_chance = 0.5;
        let mut a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        a.stats = stats.clone();
        let mut b = attacking(view(2, 2, 1.0), Skill::Windmill, 0.03);
        b.stats = stats.clone();
        let mut c = attacking(view(3, 1, 1.5), Skill::Smash, 0.01);
        c.stats = stats;
        let d = defending(view(4, 2, 1.2), Skill::Defense, 0.0);
        let views = world_of(vec![a, b, c, d]);

        let mut forward = queue(&views, &[(1, Some(2)), (2, Some(1)), (3, Some(4))]);
        let mut backward = queue(&views, &[(3, Some(4)), (2, Some(1)), (1, Some(2))]);

        let first = resolve(&mut forward, &views, 0.2, 99);
        let second = resolve(&mut backward, &views, 0.2, 99);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut a = attacking(view(1, 1, 0.0), Skill::Smash, 0.0);
        a.stats.critical_chance = 0.5;
        let b = view(2, 2, 1.0);
        let views = world_of(vec![a, b]);

        let run = |seed| {
            let mut pending = queue(&views, &[(1, Some(2))]);
            resolve(&mut pending, &views, 0.1, seed)
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_missing_target_is_discarded() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let views = world_of(vec![a]);
        let mut pending = queue(&views, &[(1, None)]);

        let results = resolve(&mut pending, &views, 0.1, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, InteractionOutcome::NoInteraction);
        assert!(consumes(&results[0], Entity::from_raw(1)));

        // Target despawned
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let views = world_of(vec![a]);
        let mut pending = queue(&views, &[(1, Some(9))]);
        let results = resolve(&mut pending, &views, 0.1, 1);
        assert_eq!(results[0].outcome, InteractionOutcome::NoInteraction);
        assert_eq!(results[0].damage_to(Entity::from_raw(9)), 0);
    }

    #[test]
    fn test_dead_target_is_discarded() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let mut b = view(2, 2, 1.0);
        b.alive = false;
        b.health = 0;
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let results = resolve(&mut pending, &views, 0.1, 1);
        assert_eq!(results[0].outcome, InteractionOutcome::NoInteraction);
    }

    #[test]
    fn test_stale_attacker_dropped_silently() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = view(2, 2, 1.0);
        let mut views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        // Attacker started a new commitment in the meantime
        if let Some(a) = views.get_mut(&Entity::from_raw(1)) {
            a.commitment_id = 2;
        }
        assert!(resolve(&mut pending, &views, 0.1, 1).is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_same_faction_target_discarded() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = view(2, 1, 1.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let results = resolve(&mut pending, &views, 0.1, 1);
        assert_eq!(results[0].outcome, InteractionOutcome::NoInteraction);
        assert_eq!(results[0].damage_to(Entity::from_raw(2)), 0);
    }

    #[test]
    fn test_out_of_reach_whiffs() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = view(2, 2, 5.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let results = resolve(&mut pending, &views, 0.1, 1);
        assert_eq!(results[0].outcome, InteractionOutcome::NoInteraction);
    }

    #[test]
    fn test_smash_breaks_defense() {
        let a = attacking(view(1, 1, 0.0), Skill::Smash, 0.0);
        let b = defending(view(2, 2, 1.0), Skill::Defense, 0.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 0.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::DefenderKnockedDown);
        assert!(r.damage_to(Entity::from_raw(2)) > 0);
        assert!(has_status(r, Entity::from_raw(2), StatusKind::Knockdown));
    }

    #[test]
    fn test_counterattack_reflects() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = defending(view(2, 2, 1.0), Skill::Counterattack, 0.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 0.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::DefenderReflects);
        assert!(r.damage_to(Entity::from_raw(1)) > 0);
        assert_eq!(r.damage_to(Entity::from_raw(2)), 0);
        assert!(has_status(r, Entity::from_raw(1), StatusKind::Knockdown));
    }

    #[test]
    fn test_late_defense_is_ignored() {
        // Defense raised after the window closed: default strike
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let b = defending(view(2, 2, 1.0), Skill::Defense, 0.5);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 0.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::AttackerWins);
        assert!(!consumes(r, Entity::from_raw(2)));
    }

    #[test]
    fn test_stale_defense_is_ignored() {
        // Guard held since the start of the fight does not catch a much later swing
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 3.0);
        let b = defending(view(2, 2, 1.0), Skill::Defense, 0.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 3.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::AttackerWins);
        assert_eq!(r.defensive, None);
        assert!(r.damage_to(Entity::from_raw(2)) > 0);
        assert!(!consumes(r, Entity::from_raw(2)));
    }

    #[test]
    fn test_defense_just_before_attack_blocks() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 3.0);
        let b = defending(view(2, 2, 1.0), Skill::Defense, 2.92);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 3.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::DefenderBlocks);
    }

    #[test]
    fn test_first_attacker_consumes_defense() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let c = attacking(view(3, 1, 2.0), Skill::Attack, 0.02);
        let d = defending(view(4, 2, 1.0), Skill::Defense, 0.0);
        let views = world_of(vec![a, c, d]);
        let mut pending = queue(&views, &[(3, Some(4)), (1, Some(4))]);

        let results = resolve(&mut pending, &views, 0.2, 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].attacker, Entity::from_raw(1));
        assert_eq!(results[0].outcome, InteractionOutcome::DefenderBlocks);
        assert_eq!(results[1].attacker, Entity::from_raw(3));
        assert_eq!(results[1].outcome, InteractionOutcome::AttackerWins);
    }

    #[test]
    fn test_ranged_accuracy_roll() {
        let mut archer = attacking(view(1, 1, 0.0), Skill::RangedAttack, 0.0);
        archer.weapon = WeaponStats::bow();
        archer.accuracy = 0.0;
        let b = view(2, 2, 10.0);
        let views = world_of(vec![archer.clone(), b.clone()]);
        let mut pending = queue(&views, &[(1, Some(2))]);
        let r = &resolve(&mut pending, &views, 0.1, 5)[0];
        assert_eq!(r.outcome, InteractionOutcome::NoInteraction);

        // Full aim vs Counterattack: arrow goes through
        archer.accuracy = 1.0;
        let b = defending(b, Skill::Counterattack, 0.0);
        let views = world_of(vec![archer, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);
        let r = &resolve(&mut pending, &views, 0.1, 5)[0];
        assert_eq!(r.outcome, InteractionOutcome::AttackerWins);
        assert!(r.damage_to(Entity::from_raw(2)) > 0);
    }

    #[test]
    fn test_combo_finisher_knocks_down() {
        let mut a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        a.combo_step = 2; // sword combo_length = 3
        let b = view(2, 2, 1.0);
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 0.1, 1)[0];
        assert_eq!(r.outcome, InteractionOutcome::DefenderKnockedDown);
        assert!(has_status(r, Entity::from_raw(2), StatusKind::Knockdown));
        assert!(r.effects.contains(&CombatEffect::ComboReset {
            combatant: Entity::from_raw(1)
        }));
    }

    #[test]
    fn test_damage_floor_on_armored_target() {
        let a = attacking(view(1, 1, 0.0), Skill::Attack, 0.0);
        let mut b = view(2, 2, 1.0);
        b.stats.physical_defense = 1000.0;
        b.stats.protection = 1.0;
        let views = world_of(vec![a, b]);
        let mut pending = queue(&views, &[(1, Some(2))]);

        let r = &resolve(&mut pending, &views, 0.1, 1)[0];
        assert_eq!(r.damage_to(Entity::from_raw(2)), 1);
    }
}
