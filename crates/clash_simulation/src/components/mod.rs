//! ECS Components для бойцов
//!
//! Организация по доменам:
//! - actor: базовые характеристики (Combatant, Health, Stamina, CombatTarget, Dead)
//! - stats: записи провайдера (CombatStats, WeaponStats)
//!
//! Боевое состояние (SkillState, StatusLedger, KnockdownMeter) живёт в `combat::components`.

pub mod actor;
pub mod stats;

// Re-exports для удобного импорта
pub use actor::*;
pub use stats::*;
