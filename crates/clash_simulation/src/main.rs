//! Headless skirmish
//!
//! Два на два, простейший скриптовый AI, N фиксированных кадров, сводка в конце.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use clash_simulation::*;

const FRAME: f32 = 1.0 / 60.0;
const FRAMES: u32 = 1200;

fn stat_table() -> StatTable {
    StatTable::default()
        .with_character("knight", CombatStats::default())
        .with_character(
            "brute",
            CombatStats {
                strength: 20.0,
                dexterity: 5.0,
                vitality: 14.0,
                ..CombatStats::default()
            },
        )
        .with_character(
            "duelist",
            CombatStats {
                dexterity: 30.0,
                focus: 20.0,
                critical_chance: 0.15,
                ..CombatStats::default()
            },
        )
        .with_weapon("sword", WeaponStats::sword())
        .with_weapon("greatsword", WeaponStats::greatsword())
        .with_weapon("dagger", WeaponStats::dagger())
}

/// Тупой скриптовый AI: цель = ближайший враг, рядом → просить слот и бить.
fn think(world: &mut World, frame: u32) {
    let mut query = world.query_filtered::<(Entity, &Combatant, &Transform), Without<Dead>>();
    let living: Vec<(Entity, u64, Vec3)> = query
        .iter(world)
        .map(|(e, c, t)| (e, c.faction_id, t.translation))
        .collect();

    for &(entity, faction, position) in &living {
        let target = living
            .iter()
            .filter(|(_, f, _)| *f != faction)
            .min_by(|a, b| {
                a.2.distance_squared(position)
                    .total_cmp(&b.2.distance_squared(position))
                    .then(a.0.index().cmp(&b.0.index()))
            })
            .map(|(e, _, p)| (*e, *p));

        let Some((target, target_pos)) = target else {
            continue;
        };
        if let Some(mut combat_target) = world.get_mut::<CombatTarget>(entity) {
            combat_target.0 = Some(target);
        }

        let now = world.resource::<CombatClock>().now();
        let is_agent = world.get::<AttackAgent>(entity).is_some();
        let granted = world
            .get_resource::<AttackSlotController>()
            .is_some_and(|c| c.holds_grant(entity, now));

        // Агент без слота ждёт на кольце формации вокруг цели
        if is_agent && !granted && world.get::<SkillState>(entity).is_some_and(|s| s.is_idle()) {
            world.send_event(AttackSlotRequest { agent: entity });
            let slot = world.get_resource_mut::<FormationSlots>().and_then(|mut slots| {
                slots.set_reference(target_pos);
                slots.request(entity, position, 3.0, now)
            });
            if let Some(slot) = slot {
                if let Some(mut transform) = world.get_mut::<Transform>(entity) {
                    let step = (slot - position).clamp_length_max(3.0 * FRAME);
                    transform.translation += step;
                }
            }
            continue;
        }
        if granted {
            if let Some(mut slots) = world.get_resource_mut::<FormationSlots>() {
                slots.release(entity, now);
            }
        }

        // Подходим на дистанцию удара
        if position.distance(target_pos) > 1.5 {
            if let Some(mut transform) = world.get_mut::<Transform>(entity) {
                let step = (target_pos - position).normalize_or_zero() * 3.0 * FRAME;
                transform.translation += step;
            }
            continue;
        }

        let Some(state) = world.get::<SkillState>(entity).cloned() else {
            continue;
        };
        match state.phase {
            SkillPhase::Idle => {
                let skill = match (frame / 7 + entity.index()) % 5 {
                    0 | 1 => Skill::Attack,
                    2 => Skill::Smash,
                    3 => Skill::Defense,
                    _ => Skill::Counterattack,
                };
                world.send_event(SkillCommand::start_charge(entity, skill));
            }
            SkillPhase::Charged => {
                world.send_event(SkillCommand::execute(entity));
            }
            SkillPhase::Recovery => {
                world.send_event(AttackSlotRelease { agent: entity });
            }
            _ => {}
        }
    }
}

fn main() {
    let seed = 42;
    println!("Starting Clash headless skirmish (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let table = stat_table();
    let specs = [
        CombatantSpec::new("knight", "sword", 1).at(Vec3::new(-3.0, 0.0, 0.0)),
        CombatantSpec::new("duelist", "dagger", 1)
            .at(Vec3::new(-3.0, 0.0, 2.0))
            .agent(AttackAgent::with_priority(1.0)),
        CombatantSpec::new("brute", "greatsword", 2)
            .at(Vec3::new(3.0, 0.0, 0.0))
            .agent(AttackAgent::with_priority(2.0)),
        CombatantSpec::new("knight", "sword", 2)
            .at(Vec3::new(3.0, 0.0, 2.0))
            .agent(AttackAgent::default()),
    ];
    for spec in specs {
        if let Err(err) = spawn_combatant(app.world_mut(), &table, spec) {
            eprintln!("setup failed: {}", err);
            return;
        }
    }

    let outcomes: Arc<Mutex<Vec<InteractionOutcome>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    app.world_mut()
        .resource_mut::<CombatObservers>()
        .add_listener(Box::new(move |note: &CombatNotification| {
            if let CombatNotification::InteractionResolved(resolved) = note {
                if let Ok(mut list) = sink.lock() {
                    list.push(resolved.outcome);
                }
            }
        }));

    for frame in 0..FRAMES {
        think(app.world_mut(), frame);
        step_combat_frame(app.world_mut(), FRAME);

        if frame % 300 == 0 {
            let clock = *app.world().resource::<CombatClock>();
            println!("Frame {} (t = {:.2}s)", clock.frame, clock.elapsed);
        }
    }

    println!("--- Summary ---");
    let world = app.world_mut();
    let mut query = world.query::<(Entity, &Combatant, &Health, Has<Dead>)>();
    let mut rows: Vec<_> = query.iter(world).collect();
    rows.sort_by_key(|(e, ..)| e.index());
    for (entity, combatant, health, dead) in rows {
        println!(
            "{:?} faction {} hp {}/{}{}",
            entity,
            combatant.faction_id,
            health.current,
            health.max,
            if dead { " (dead)" } else { "" }
        );
    }
    if let Ok(list) = outcomes.lock() {
        println!("{} interactions resolved", list.len());
    }
    println!("Simulation complete!");
}
