//! Auto-resolution heuristic for stalled disputes.
//!
//! Pure decision function, advisory only. Nothing in this crate calls
//! it; an external scheduler polls open disputes, evaluates the
//! decision, and drives the resolution through the service when it
//! chooses to act on the advice.

use escra_core::{Percent, Timestamp};
use escra_state::DisputeStatus;
use serde::{Deserialize, Serialize};

/// Days without any seller response before a dispute defaults in the
/// buyer's favor.
pub const SELLER_RESPONSE_WINDOW_DAYS: i64 = 7;

/// Minimum evidence items for a dispute to be considered substantiated.
pub const MIN_EVIDENCE_ITEMS: usize = 1;

/// Minimum reason length (characters) for a dispute to be considered
/// substantiated.
pub const MIN_REASON_CHARS: usize = 50;

/// The facts the heuristic looks at, extracted from a dispute and its
/// event history.
#[derive(Debug, Clone)]
pub struct DisputeSnapshot {
    pub status: DisputeStatus,
    pub opened_at: Timestamp,
    pub evidence_count: usize,
    pub reason_chars: usize,
    /// Dispute events authored by the seller (responses, evidence).
    pub seller_event_count: usize,
}

/// Advice produced by [`check_auto_resolution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResolutionDecision {
    pub should_auto_resolve: bool,
    /// Suggested buyer refund when `should_auto_resolve` is set.
    pub buyer_refund_percent: Percent,
    pub rationale: String,
}

impl AutoResolutionDecision {
    fn none() -> Self {
        Self {
            should_auto_resolve: false,
            buyer_refund_percent: Percent::ZERO,
            rationale: "no auto-resolution condition met".into(),
        }
    }
}

/// Evaluate whether a stalled dispute qualifies for automatic
/// resolution.
///
/// Two conditions, checked in order:
///
/// 1. Seller silence: more than [`SELLER_RESPONSE_WINDOW_DAYS`] days
///    old with zero seller-authored events — resolve fully in the
///    buyer's favor.
/// 2. Unsubstantiated claim: evidence count below
///    [`MIN_EVIDENCE_ITEMS`] and reason shorter than
///    [`MIN_REASON_CHARS`] — resolve in the seller's favor (zero
///    refund).
///
/// Terminal disputes never qualify.
pub fn check_auto_resolution(snapshot: &DisputeSnapshot, now: Timestamp) -> AutoResolutionDecision {
    if snapshot.status.is_terminal() {
        return AutoResolutionDecision::none();
    }

    let age_days = snapshot.opened_at.days_until(now);
    if age_days > SELLER_RESPONSE_WINDOW_DAYS && snapshot.seller_event_count == 0 {
        return AutoResolutionDecision {
            should_auto_resolve: true,
            buyer_refund_percent: Percent::FULL,
            rationale: format!(
                "seller has not responded in {age_days} days (window {SELLER_RESPONSE_WINDOW_DAYS})"
            ),
        };
    }

    if snapshot.evidence_count < MIN_EVIDENCE_ITEMS && snapshot.reason_chars < MIN_REASON_CHARS {
        return AutoResolutionDecision {
            should_auto_resolve: true,
            buyer_refund_percent: Percent::ZERO,
            rationale: format!(
                "claim unsubstantiated: {} evidence items, {}-character reason",
                snapshot.evidence_count, snapshot.reason_chars
            ),
        };
    }

    AutoResolutionDecision::none()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(age_days: i64, now: Timestamp) -> DisputeSnapshot {
        DisputeSnapshot {
            status: DisputeStatus::Open,
            opened_at: now.minus_days(age_days),
            evidence_count: 2,
            reason_chars: 120,
            seller_event_count: 0,
        }
    }

    #[test]
    fn silent_seller_past_the_window_defaults_to_the_buyer() {
        let now = Timestamp::now();
        let decision = check_auto_resolution(&snapshot(8, now), now);
        assert!(decision.should_auto_resolve);
        assert_eq!(decision.buyer_refund_percent, Percent::FULL);
    }

    #[test]
    fn a_seller_response_stops_the_silence_clock() {
        let now = Timestamp::now();
        let mut snap = snapshot(30, now);
        snap.seller_event_count = 1;
        let decision = check_auto_resolution(&snap, now);
        assert!(!decision.should_auto_resolve);
    }

    #[test]
    fn the_window_is_exclusive_at_seven_days() {
        let now = Timestamp::now();
        let decision = check_auto_resolution(&snapshot(7, now), now);
        assert!(!decision.should_auto_resolve);
    }

    #[test]
    fn unsubstantiated_claims_default_to_the_seller() {
        let now = Timestamp::now();
        let mut snap = snapshot(1, now);
        snap.evidence_count = 0;
        snap.reason_chars = 20;
        let decision = check_auto_resolution(&snap, now);
        assert!(decision.should_auto_resolve);
        assert_eq!(decision.buyer_refund_percent, Percent::ZERO);
    }

    #[test]
    fn either_evidence_or_a_long_reason_substantiates() {
        let now = Timestamp::now();

        let mut with_evidence = snapshot(1, now);
        with_evidence.evidence_count = 1;
        with_evidence.reason_chars = 10;
        assert!(!check_auto_resolution(&with_evidence, now).should_auto_resolve);

        let mut with_reason = snapshot(1, now);
        with_reason.evidence_count = 0;
        with_reason.reason_chars = 50;
        assert!(!check_auto_resolution(&with_reason, now).should_auto_resolve);
    }

    #[test]
    fn terminal_disputes_never_qualify() {
        let now = Timestamp::now();
        let mut snap = snapshot(30, now);
        snap.status = DisputeStatus::Resolved;
        assert!(!check_auto_resolution(&snap, now).should_auto_resolve);
    }
}
