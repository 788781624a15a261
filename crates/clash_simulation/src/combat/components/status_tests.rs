//! Tests for StatusLedger and KnockdownMeter.

#[cfg(test)]
mod tests {
    use super::super::status::*;

    #[test]
    fn test_reapply_refreshes_to_longer_duration() {
        let mut ledger = StatusLedger::default();
        ledger.apply(StatusKind::Stun, 1.0, None);
        ledger.apply(StatusKind::Stun, 0.5, None); // shorter → ignored
        assert_eq!(ledger.remaining(StatusKind::Stun), Some(1.0));

        ledger.apply(StatusKind::Stun, 2.0, None);
        assert_eq!(ledger.remaining(StatusKind::Stun), Some(2.0));
        assert_eq!(ledger.effects().len(), 1); // no stacking
    }

    #[test]
    fn test_priority_selects_gating_effect() {
        let mut ledger = StatusLedger::default();
        assert_eq!(ledger.gating(), None);
        assert!(ledger.permits_acting());

        ledger.apply(StatusKind::Resting, 3.0, None);
        assert_eq!(ledger.gating(), Some(StatusKind::Resting));
        assert!(!ledger.permits_acting());
        assert!(!ledger.pauses_skill());

        ledger.apply(StatusKind::Stun, 1.0, None);
        assert_eq!(ledger.gating(), Some(StatusKind::Stun));

        ledger.apply(StatusKind::Knockdown, 0.5, None);
        assert_eq!(ledger.gating(), Some(StatusKind::Knockdown));
        assert!(ledger.pauses_skill());
    }

    #[test]
    fn test_tick_expires_effects() {
        let mut ledger = StatusLedger::default();
        ledger.apply(StatusKind::Stun, 0.5, None);
        ledger.apply(StatusKind::Resting, 2.0, None);

        assert!(ledger.tick(0.25).is_empty());
        assert_eq!(ledger.tick(0.25), vec![StatusKind::Stun]);
        assert!(!ledger.has(StatusKind::Stun));
        assert!(ledger.has(StatusKind::Resting));
    }

    #[test]
    fn test_end_early() {
        let mut ledger = StatusLedger::default();
        ledger.apply(StatusKind::Knockdown, 2.0, None);
        assert!(ledger.end_early(StatusKind::Knockdown));
        assert!(!ledger.end_early(StatusKind::Knockdown));
        assert!(ledger.permits_acting());
    }

    #[test]
    fn test_zero_duration_is_not_applied() {
        let mut ledger = StatusLedger::default();
        ledger.apply(StatusKind::Stun, 0.0, None);
        assert!(ledger.permits_acting());
    }

    #[test]
    fn test_knockdown_meter_fills_and_resets() {
        let mut meter = KnockdownMeter::new(50.0);
        assert!(!meter.add(30.0));
        assert!(meter.add(25.0));
        assert_eq!(meter.value, 0.0);

        meter.add(20.0);
        meter.decay(5.0);
        assert_eq!(meter.value, 15.0);
        meter.decay(100.0);
        assert_eq!(meter.value, 0.0);
    }
}
