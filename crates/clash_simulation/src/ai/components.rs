//! AI-side components of the admission layer.

use bevy::prelude::*;

/// Autonomous attacker: must obtain an attack slot before committing.
///
/// Добавление регистрирует агента в `AttackSlotController` (roster order =
/// порядок регистрации), изменение синхронизирует priority/ready,
/// удаление снимает с roster и освобождает grant.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackAgent {
    /// Higher goes first.
    pub priority: f32,
    /// AI-supplied readiness (in range, has a target, not busy).
    pub ready: bool,
}

impl Default for AttackAgent {
    fn default() -> Self {
        Self {
            priority: 0.0,
            ready: true,
        }
    }
}

impl AttackAgent {
    pub fn with_priority(priority: f32) -> Self {
        Self {
            priority,
            ..Default::default()
        }
    }
}
