//! Clash Simulation Core
//!
//! Real-time combat resolution на Bevy 0.16 ECS:
//! - skill state machine (charge → commit → recovery) на каждого бойца
//! - interaction resolver: одновременные commitments → matrix outcome
//! - attack-slot admission + formation slots для автономных агентов
//!
//! Рендер, анимация, навигация: на стороне хоста. Ядро получает команды
//! событиями и отдаёт уведомления событиями / через `CombatObservers`.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod observers;
pub mod provider;

// Re-export базовых типов для удобства
pub use ai::{
    AIPlugin, AdmissionDecided, AdmissionDenial, AdmissionVerdict, AttackAgent, AttackSlotController,
    AttackSlotRelease, AttackSlotRequest, FormationSlots,
};
pub use combat::{
    CombatClock, CombatFrame, CombatPlugin, CombatSet, DamageDealt, EntityDied, InteractionOutcome,
    InteractionResolved, KnockdownMeter, PendingInteractions, PhaseChanged, Skill, SkillCommand, SkillCommandKind,
    SkillCommandRejected, SkillPhase, SkillState, StatusKind, StatusLedger,
};
pub use components::*;
pub use config::{AdmissionConfig, CombatConfig, FormationConfig, SimulationConfig};
pub use error::{CommandRejected, SetupError, SetupResult};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use observers::{CombatListener, CombatNotification, CombatObservers, ListenerId, ObserverPlugin};
pub use provider::{spawn_combatant, CombatantSpec, StatProvider, StatTable};

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// Кадр боя гоняется из FixedUpdate (`drive_combat_frame`); тесты и хосты со
/// своим циклом зовут `step_combat_frame` напрямую.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Детерминистичный RNG (seed по умолчанию, если хост не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick (легче считать интервалы)
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Подсистемы
            .add_plugins((CombatPlugin, AIPlugin, ObserverPlugin))
            .add_systems(FixedUpdate, drive_combat_frame);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Подменить tuning. Вызывать до спавна бойцов: roster и формация пересоздаются.
pub fn apply_config(world: &mut World, config: SimulationConfig) {
    world.insert_resource(AttackSlotController::new(config.admission.clone()));
    world.insert_resource(FormationSlots::new(config.formation.clone(), Vec3::ZERO));
    world.insert_resource(config.combat);
    world.insert_resource(config.admission);
    world.insert_resource(config.formation);
}

/// Один кадр боя: продвинуть `CombatClock` на `dt` и прогнать `CombatFrame`.
pub fn step_combat_frame(world: &mut World, dt: f32) {
    match world.get_resource_mut::<CombatClock>() {
        Some(mut clock) => clock.advance(dt),
        None => {
            logger::log_error("❌ step_combat_frame: CombatPlugin is not installed");
            return;
        }
    }

    if let Err(err) = world.try_run_schedule(CombatFrame) {
        logger::log_error(&format!("❌ step_combat_frame: {}", err));
    }
}

/// Exclusive system: FixedUpdate tick → один кадр боя.
pub fn drive_combat_frame(world: &mut World) {
    let dt = world
        .get_resource::<Time>()
        .map(|time| time.delta_secs())
        .unwrap_or_default();
    step_combat_frame(world, dt);
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
