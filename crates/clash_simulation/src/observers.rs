//! Observer list: fire-and-forget notifications for code outside the ECS.
//!
//! Listener не может испортить состояние ядра: получает `&CombatNotification`,
//! паника внутри listener ловится и логируется, остальные listeners
//! продолжают получать уведомления.

use std::panic::{catch_unwind, AssertUnwindSafe};

use bevy::prelude::*;

use crate::ai::AdmissionDecided;
use crate::combat::{CombatFrame, CombatSet, InteractionResolved, PhaseChanged};

/// Everything an outside observer can hear about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatNotification {
    PhaseChanged(PhaseChanged),
    InteractionResolved(InteractionResolved),
    AdmissionDecided(AdmissionDecided),
}

pub trait CombatListener: Send + Sync {
    fn on_notification(&self, notification: &CombatNotification);
}

impl<F> CombatListener for F
where
    F: Fn(&CombatNotification) + Send + Sync,
{
    fn on_notification(&self, notification: &CombatNotification) {
        self(notification)
    }
}

/// Handle returned by `add_listener`, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Resource, Default)]
pub struct CombatObservers {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn CombatListener>)>,
}

impl CombatObservers {
    pub fn add_listener(&mut self, listener: Box<dyn CombatListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver to every listener in registration order.
    pub fn emit(&self, notification: &CombatNotification) {
        for (id, listener) in &self.listeners {
            let delivered = catch_unwind(AssertUnwindSafe(|| listener.on_notification(notification)));
            if delivered.is_err() {
                crate::logger::log_error(&format!(
                    "❌ combat listener {:?} panicked on {:?}",
                    id, notification
                ));
            }
        }
    }
}

/// System: forward this frame's notifications to `CombatObservers`.
pub fn notify_observers(
    observers: Res<CombatObservers>,
    mut phases: EventReader<PhaseChanged>,
    mut interactions: EventReader<InteractionResolved>,
    mut admissions: EventReader<AdmissionDecided>,
) {
    if observers.is_empty() {
        // Still advance the readers so a late listener doesn't get a backlog
        phases.clear();
        interactions.clear();
        admissions.clear();
        return;
    }

    for event in admissions.read() {
        observers.emit(&CombatNotification::AdmissionDecided(*event));
    }
    for event in phases.read() {
        observers.emit(&CombatNotification::PhaseChanged(*event));
    }
    for event in interactions.read() {
        observers.emit(&CombatNotification::InteractionResolved(*event));
    }
}

/// Registers `CombatObservers` and the Notify stage of the combat frame.
pub struct ObserverPlugin;

impl Plugin for ObserverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatObservers>()
            .add_event::<PhaseChanged>()
            .add_event::<InteractionResolved>()
            .add_event::<AdmissionDecided>()
            .add_systems(CombatFrame, notify_observers.in_set(CombatSet::Notify));
    }
}
