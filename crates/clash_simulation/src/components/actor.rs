//! Базовые компоненты бойца: Combatant, Health, Stamina, CombatTarget, Dead

use bevy::prelude::*;

use crate::combat::{KnockdownMeter, SkillState, StatusLedger};

/// Боец (игрок, NPC): участник боевой симуляции.
///
/// Required Components подтягивают state machine, ledger, meter, health, stamina.
/// `CombatStats` и `WeaponStats` НЕ required: без записей от провайдера боец
/// не должен молча получить дефолты (см. `spawn_combatant`).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(
    Health,
    Stamina,
    SkillState,
    StatusLedger,
    KnockdownMeter,
    CombatTarget,
    Transform
)]
pub struct Combatant {
    /// Stable ID фракции (friend/foe check)
    pub faction_id: u64,
}

impl Combatant {
    pub fn is_hostile_to(&self, other: &Combatant) -> bool {
        self.faction_id != other.faction_id
    }
}

/// Текущая цель бойца (выставляется AI/input, читается при commit).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CombatTarget(pub Option<Entity>);

/// Маркер: боец погиб (Health == 0). Все боевые системы его пропускают.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

/// Здоровье бойца: внешний sink для урона.
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// Выносливость: ресурс для start-charge.
///
/// Инвариант: 0.0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
    pub regen_rate: f32, // units per second
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 10.0,
        }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// All-or-nothing: на нехватку stamina не меняется.
    pub fn consume(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    pub fn regenerate(&mut self, delta_time: f32) {
        self.current = (self.current + self.regen_rate * delta_time).min(self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        health.take_damage(30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        health.take_damage(100); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_stamina_consume_all_or_nothing() {
        let mut stamina = Stamina::new(100.0);

        assert!(stamina.consume(30.0));
        assert_eq!(stamina.current, 70.0);

        assert!(!stamina.consume(80.0)); // Недостаточно
        assert_eq!(stamina.current, 70.0); // Не изменилась
    }

    #[test]
    fn test_stamina_regenerate() {
        let mut stamina = Stamina::new(100.0);
        stamina.consume(50.0);

        stamina.regenerate(2.0); // 2 sec × 10 units/sec = +20
        assert_eq!(stamina.current, 70.0);

        stamina.regenerate(10.0); // Clamp to max
        assert_eq!(stamina.current, 100.0);
    }

    #[test]
    fn test_hostility_by_faction() {
        let a = Combatant { faction_id: 1 };
        let b = Combatant { faction_id: 2 };
        assert!(a.is_hostile_to(&b));
        assert!(!a.is_hostile_to(&a.clone()));
    }
}
