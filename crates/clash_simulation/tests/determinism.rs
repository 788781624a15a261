//! Тесты детерминизма
//!
//! Один и тот же seed + одинаковые команды → идентичный мир и идентичный
//! поток уведомлений. Разный seed может (и обычно должен) дать другой исход.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use clash_simulation::*;

const DT: f32 = 1.0 / 60.0;

fn table() -> StatTable {
    StatTable::default()
        .with_character(
            "knight",
            CombatStats {
                critical_chance: 0.3,
                ..CombatStats::default()
            },
        )
        .with_character(
            "archer",
            CombatStats {
                dexterity: 25.0,
                critical_chance: 0.2,
                ..CombatStats::default()
            },
        )
        .with_weapon("sword", WeaponStats::sword())
        .with_weapon("bow", WeaponStats::bow())
}

/// Скриптованная схватка: 2 vs 2, команды зависят только от номера кадра.
fn run_skirmish(seed: u64, frames: u32) -> (Vec<u8>, Vec<String>) {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let table = table();
    let fighters: Vec<Entity> = [
        CombatantSpec::new("knight", "sword", 1).at(Vec3::new(0.0, 0.0, 0.0)),
        CombatantSpec::new("archer", "bow", 1).at(Vec3::new(-6.0, 0.0, 0.0)),
        CombatantSpec::new("knight", "sword", 2).at(Vec3::new(1.0, 0.0, 0.0)),
        CombatantSpec::new("knight", "sword", 2).at(Vec3::new(1.0, 0.0, 1.0)),
    ]
    .into_iter()
    .map(|spec| spawn_combatant(app.world_mut(), &table, spec).expect("spawn"))
    .collect();

    // 0,1 → 2; 2,3 → 0
    for (who, whom) in [(0, 2), (1, 2), (2, 0), (3, 0)] {
        app.world_mut().get_mut::<CombatTarget>(fighters[who]).expect("target").0 = Some(fighters[whom]);
    }

    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    app.world_mut()
        .resource_mut::<CombatObservers>()
        .add_listener(Box::new(move |note: &CombatNotification| {
            sink.lock().expect("log").push(format!("{:?}", note));
        }));

    let script = [Skill::Attack, Skill::Smash, Skill::Defense, Skill::Attack, Skill::Counterattack];
    for frame in 0..frames {
        for (i, &fighter) in fighters.iter().enumerate() {
            let Some(state) = app.world().get::<SkillState>(fighter) else {
                continue;
            };
            let command = match state.phase {
                SkillPhase::Idle if (frame as usize + i * 13) % 20 == 0 => {
                    let skill = if i == 1 {
                        Skill::RangedAttack
                    } else {
                        script[(frame as usize / 20 + i) % script.len()]
                    };
                    Some(SkillCommand::start_charge(fighter, skill))
                }
                SkillPhase::Charged => Some(SkillCommand::execute(fighter)),
                _ => None,
            };
            if let Some(command) = command {
                app.world_mut().send_event(command);
            }
        }
        step_combat_frame(app.world_mut(), DT);
    }

    let snapshot = world_snapshot::<Health>(app.world_mut());
    let notes = log.lock().expect("log").clone();
    (snapshot, notes)
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;

    let (snapshot1, notes1) = run_skirmish(SEED, 900);
    let (snapshot2, notes2) = run_skirmish(SEED, 900);

    assert!(!notes1.is_empty(), "скрипт не породил ни одного уведомления");
    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
    assert_eq!(notes1, notes2);
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;

    let runs: Vec<_> = (0..3).map(|_| run_skirmish(SEED, 600)).collect();

    for (i, run) in runs.iter().enumerate().skip(1) {
        assert_eq!(runs[0], *run, "Прогон {} дал результат отличный от прогона 0", i);
    }
}

#[test]
fn test_notifications_carry_interactions() {
    let (_, notes) = run_skirmish(7, 900);
    assert!(notes.iter().any(|n| n.starts_with("InteractionResolved")));
    assert!(notes.iter().any(|n| n.starts_with("PhaseChanged")));
}
