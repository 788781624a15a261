//! Formation slots around a reference point (usually the player).
//!
//! N слотов через равные углы. Агент получает ближайший свободный слот,
//! слот после освобождения/назначения "остывает" `reassign_cooldown` секунд,
//! чтобы агенты не прыгали между соседними слотами каждый кадр.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::FormationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FormationSlot {
    pub index: usize,
    /// Radians around +Y, 0 = +X.
    pub angle: f32,
    pub occupant: Option<Entity>,
    pub last_assigned_at: Option<f64>,
    /// Deterministic per-slot radial jitter (meters).
    pub radial_offset: f32,
}

impl FormationSlot {
    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.angle.cos(), 0.0, self.angle.sin())
    }

    fn cooled_down(&self, now: f64, cooldown: f64) -> bool {
        self.last_assigned_at.is_none_or(|t| now - t >= cooldown)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct FormationSlots {
    config: FormationConfig,
    reference: Vec3,
    slots: Vec<FormationSlot>,
}

impl Default for FormationSlots {
    fn default() -> Self {
        Self::new(FormationConfig::default(), Vec3::ZERO)
    }
}

impl FormationSlots {
    pub fn new(config: FormationConfig, reference: Vec3) -> Self {
        let count = config.slot_count.max(1);
        let slots = (0..count)
            .map(|index| {
                let mut rng = ChaCha8Rng::seed_from_u64(index as u64);
                let jitter = config.jitter.abs();
                let radial_offset = if jitter > 0.0 {
                    rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
                FormationSlot {
                    index,
                    angle: index as f32 * std::f32::consts::TAU / count as f32,
                    occupant: None,
                    last_assigned_at: None,
                    radial_offset,
                }
            })
            .collect();

        Self {
            config,
            reference,
            slots,
        }
    }

    pub fn reference(&self) -> Vec3 {
        self.reference
    }

    pub fn set_reference(&mut self, reference: Vec3) {
        self.reference = reference;
    }

    pub fn slots(&self) -> &[FormationSlot] {
        &self.slots
    }

    pub fn slot_of(&self, agent: Entity) -> Option<usize> {
        self.slots.iter().position(|s| s.occupant == Some(agent))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.occupant.is_some()).count()
    }

    /// World position of slot `index` at `distance` from the reference.
    pub fn slot_position(&self, index: usize, distance: f32) -> Option<Vec3> {
        let slot = self.slots.get(index)?;
        Some(self.reference + slot.direction() * (distance + slot.radial_offset))
    }

    /// Assign (or keep) a slot for `agent` and return where it should stand.
    ///
    /// `None` = every free slot is still cooling down.
    pub fn request(&mut self, agent: Entity, agent_position: Vec3, distance: f32, now: f64) -> Option<Vec3> {
        let cooldown = self.config.reassign_cooldown;

        if let Some(current) = self.slot_of(agent) {
            if self.slots[current].cooled_down(now, cooldown) {
                let current_dist = self.distance_to(current, agent_position, distance);
                if let Some((better, dist)) = self.nearest_free(agent_position, distance, now) {
                    if dist + self.config.switch_margin < current_dist {
                        self.slots[current].occupant = None;
                        self.slots[current].last_assigned_at = Some(now);
                        self.assign(better, agent, now);
                        crate::logger::log(&format!(
                            "🔁 {:?}: formation slot {} → {}",
                            agent, current, better
                        ));
                        return self.slot_position(better, distance);
                    }
                }
            }
            return self.slot_position(current, distance);
        }

        let (index, _) = self.nearest_free(agent_position, distance, now)?;
        self.assign(index, agent, now);
        self.slot_position(index, distance)
    }

    /// Free the agent's slot; it cools down from `now`.
    pub fn release(&mut self, agent: Entity, now: f64) -> bool {
        let Some(index) = self.slot_of(agent) else {
            return false;
        };
        let slot = &mut self.slots[index];
        slot.occupant = None;
        slot.last_assigned_at = Some(now);
        true
    }

    fn assign(&mut self, index: usize, agent: Entity, now: f64) {
        let slot = &mut self.slots[index];
        slot.occupant = Some(agent);
        slot.last_assigned_at = Some(now);
    }

    fn distance_to(&self, index: usize, from: Vec3, distance: f32) -> f32 {
        self.slot_position(index, distance)
            .map(|p| p.distance(from))
            .unwrap_or(f32::MAX)
    }

    /// Nearest unoccupied, cooled-down slot (lowest index on ties).
    fn nearest_free(&self, from: Vec3, distance: f32, now: f64) -> Option<(usize, f32)> {
        let cooldown = self.config.reassign_cooldown;
        self.slots
            .iter()
            .filter(|s| s.occupant.is_none() && s.cooled_down(now, cooldown))
            .map(|s| (s.index, self.distance_to(s.index, from, distance)))
            .fold(None, |best: Option<(usize, f32)>, (index, dist)| match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((index, dist)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> FormationSlots {
        FormationSlots::new(
            FormationConfig {
                slot_count: 8,
                reassign_cooldown: 1.0,
                jitter: 0.0,
                switch_margin: 0.5,
            },
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_nearest_slot_assigned() {
        let mut f = slots();
        let agent = Entity::from_raw(1);
        let pos = f.request(agent, Vec3::new(10.0, 0.0, 0.0), 3.0, 0.0).expect("slot");
        assert_eq!(f.slot_of(agent), Some(0));
        assert!((pos - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_one_occupant_per_slot() {
        let mut f = slots();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        f.request(a, Vec3::new(10.0, 0.0, 0.0), 3.0, 0.0);
        f.request(b, Vec3::new(10.0, 0.0, 0.0), 3.0, 0.0);
        assert_ne!(f.slot_of(a), f.slot_of(b));
        assert_eq!(f.occupied(), 2);
    }

    #[test]
    fn test_released_slot_cools_down() {
        let mut f = FormationSlots::new(
            FormationConfig {
                slot_count: 1,
                reassign_cooldown: 1.0,
                jitter: 0.0,
                switch_margin: 0.5,
            },
            Vec3::ZERO,
        );
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        f.request(a, Vec3::X, 2.0, 0.0);
        assert!(f.release(a, 2.0));

        assert!(f.request(b, Vec3::X, 2.0, 2.5).is_none());
        assert!(f.request(b, Vec3::X, 2.0, 3.0).is_some());
    }

    #[test]
    fn test_occupant_moves_only_after_cooldown() {
        let mut f = slots();
        let agent = Entity::from_raw(1);
        f.request(agent, Vec3::new(10.0, 0.0, 0.0), 3.0, 0.0);
        assert_eq!(f.slot_of(agent), Some(0));

        // Agent walked around to -X
        let west = Vec3::new(-10.0, 0.0, 0.0);
        f.request(agent, west, 3.0, 0.5);
        assert_eq!(f.slot_of(agent), Some(0));

        f.request(agent, west, 3.0, 1.5);
        assert_eq!(f.slot_of(agent), Some(4));
    }

    #[test]
    fn test_jitter_is_deterministic() {
        let config = FormationConfig {
            jitter: 0.25,
            ..FormationConfig::default()
        };
        let a = FormationSlots::new(config.clone(), Vec3::ZERO);
        let b = FormationSlots::new(config, Vec3::ZERO);
        for (sa, sb) in a.slots().iter().zip(b.slots()) {
            assert_eq!(sa.radial_offset, sb.radial_offset);
            assert!(sa.radial_offset.abs() <= 0.25);
        }
    }
}
