//! Attack-slot admission controller.
//!
//! Ограничивает число автономных агентов, одновременно пытающихся атаковать:
//! capacity живых grants, минимальный интервал между выдачами, приоритет.
//! Resolver об этом слое ничего не знает.
//!
//! # Порядок проверок `request`
//!
//! ```text
//! purge expired → unregistered? → already granted? → not ready?
//!   → capacity full? → spacing? → out-prioritized? → Granted
//! ```

use bevy::prelude::*;

use crate::config::AdmissionConfig;

const TIME_EPSILON: f64 = 1e-6;

/// Live permission for one agent to start an offensive commitment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSlotGrant {
    pub agent: Entity,
    pub granted_at: f64,
    pub expires_at: f64,
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDenial {
    Unregistered,
    NotReady,
    CapacityFull,
    SpacingNotElapsed,
    OutPrioritized { by: Entity },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdmissionVerdict {
    Granted { expires_at: f64 },
    Denied(AdmissionDenial),
}

impl AdmissionVerdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, AdmissionVerdict::Granted { .. })
    }
}

/// Roster entry (registration order = evaluation order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterEntry {
    pub agent: Entity,
    pub priority: f32,
    pub ready: bool,
}

/// Admission state of one simulation.
///
/// Инвариант: `grants.len() <= config.capacity` после любой операции.
#[derive(Resource, Debug, Clone, Default)]
pub struct AttackSlotController {
    config: AdmissionConfig,
    roster: Vec<RosterEntry>,
    grants: Vec<AttackSlotGrant>,
    last_grant_at: Option<f64>,
}

impl AttackSlotController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------------

    /// Add an agent (or update it if already registered).
    pub fn register(&mut self, agent: Entity, priority: f32, ready: bool) {
        match self.roster.iter_mut().find(|e| e.agent == agent) {
            Some(entry) => {
                entry.priority = priority;
                entry.ready = ready;
            }
            None => self.roster.push(RosterEntry { agent, priority, ready }),
        }
    }

    /// Remove an agent and its grant.
    pub fn unregister(&mut self, agent: Entity) {
        self.roster.retain(|e| e.agent != agent);
        self.grants.retain(|g| g.agent != agent);
    }

    pub fn set_ready(&mut self, agent: Entity, ready: bool) {
        if let Some(entry) = self.roster.iter_mut().find(|e| e.agent == agent) {
            entry.ready = ready;
        }
    }

    pub fn set_priority(&mut self, agent: Entity, priority: f32) {
        if let Some(entry) = self.roster.iter_mut().find(|e| e.agent == agent) {
            entry.priority = priority;
        }
    }

    pub fn is_registered(&self, agent: Entity) -> bool {
        self.roster.iter().any(|e| e.agent == agent)
    }

    /// Registration index, used to order same-frame requests.
    pub fn roster_position(&self, agent: Entity) -> Option<usize> {
        self.roster.iter().position(|e| e.agent == agent)
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    // ------------------------------------------------------------------------
    // Grants
    // ------------------------------------------------------------------------

    pub fn grants(&self) -> &[AttackSlotGrant] {
        &self.grants
    }

    pub fn live_grants(&self, now: f64) -> usize {
        self.grants.iter().filter(|g| g.expires_at > now).count()
    }

    pub fn holds_grant(&self, agent: Entity, now: f64) -> bool {
        self.grants.iter().any(|g| g.agent == agent && g.expires_at > now)
    }

    /// Lazy expiry: dropped on the next evaluation.
    fn purge_expired(&mut self, now: f64) {
        self.grants.retain(|g| g.expires_at > now);
    }

    /// Ask for permission to attack at `now`.
    pub fn request(&mut self, agent: Entity, now: f64) -> AdmissionVerdict {
        self.purge_expired(now);

        let Some(entry) = self.roster.iter().find(|e| e.agent == agent).copied() else {
            return AdmissionVerdict::Denied(AdmissionDenial::Unregistered);
        };

        if let Some(grant) = self.grants.iter().find(|g| g.agent == agent) {
            return AdmissionVerdict::Granted {
                expires_at: grant.expires_at,
            };
        }

        if !entry.ready {
            return AdmissionVerdict::Denied(AdmissionDenial::NotReady);
        }

        if self.grants.len() >= self.config.capacity {
            return AdmissionVerdict::Denied(AdmissionDenial::CapacityFull);
        }

        if let Some(last) = self.last_grant_at {
            if now - last < self.config.min_spacing - TIME_EPSILON {
                return AdmissionVerdict::Denied(AdmissionDenial::SpacingNotElapsed);
            }
        }

        // Someone ready, without a grant, with strictly higher priority goes first
        let grants = &self.grants;
        let rival = self
            .roster
            .iter()
            .filter(|other| other.agent != agent && other.ready && other.priority > entry.priority)
            .find(|other| !grants.iter().any(|g| g.agent == other.agent));
        if let Some(rival) = rival {
            return AdmissionVerdict::Denied(AdmissionDenial::OutPrioritized { by: rival.agent });
        }

        let expires_at = now + self.config.reservation_duration;
        self.grants.push(AttackSlotGrant {
            agent,
            granted_at: now,
            expires_at,
        });
        self.last_grant_at = Some(now);
        AdmissionVerdict::Granted { expires_at }
    }

    /// Give the slot back. Returns false if the agent held nothing.
    pub fn release(&mut self, agent: Entity) -> bool {
        let before = self.grants.len();
        self.grants.retain(|g| g.agent != agent);
        self.grants.len() != before
    }
}
