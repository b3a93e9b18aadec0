//! Chronological order timelines.
//!
//! The timeline is a read-side projection of an order's history. The
//! primary source is the event log; when the log cannot be read the
//! timeline is reconstructed from entity timestamps instead. The two
//! sources are not equivalent: reconstructed entries carry no actor and
//! no metadata, only what the entities themselves record. Each entry is
//! tagged with its source so consumers can tell them apart.

use escra_core::{OrderId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use crate::event::OrderEventType;
use crate::log::EventLog;

// ── Entity snapshots ─────────────────────────────────────────────────────────

/// Timestamps lifted from an order for timeline reconstruction.
///
/// The audit crate sits below the entity crates, so callers hand it
/// these flat views rather than the entities themselves.
#[derive(Debug, Clone)]
pub struct OrderStamps {
    pub order_id: OrderId,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
}

/// Timestamps lifted from a milestone.
#[derive(Debug, Clone)]
pub struct MilestoneStamps {
    pub title: String,
    pub submitted_at: Option<Timestamp>,
    pub approved_at: Option<Timestamp>,
}

/// Timestamps lifted from a dispute.
#[derive(Debug, Clone)]
pub struct DisputeStamps {
    pub opened_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

// ── Timeline entries ─────────────────────────────────────────────────────────

/// Where a timeline entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineSource {
    /// Read from the event log.
    Log,
    /// Derived from entity timestamps because the log was unreadable.
    Reconstructed,
}

/// One row of an order's chronological history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: Timestamp,
    pub label: String,
    pub actor: Option<UserId>,
    pub source: TimelineSource,
}

/// Builds the chronological history of one order.
///
/// Prefers the event log; any log read failure degrades to
/// reconstruction rather than surfacing an error, since the timeline is
/// a best-effort view.
pub fn build_order_timeline(
    log: &dyn EventLog,
    order: &OrderStamps,
    milestones: &[MilestoneStamps],
    disputes: &[DisputeStamps],
) -> Vec<TimelineEntry> {
    match log.order_events(order.order_id) {
        Ok(events) if !events.is_empty() => events
            .into_iter()
            .map(|e| TimelineEntry {
                timestamp: e.recorded_at,
                label: e.description,
                actor: e.actor,
                source: TimelineSource::Log,
            })
            .collect(),
        // An empty log for an existing order means events were lost;
        // reconstruct in that case too.
        Ok(_) | Err(_) => reconstruct(order, milestones, disputes),
    }
}

fn reconstruct(
    order: &OrderStamps,
    milestones: &[MilestoneStamps],
    disputes: &[DisputeStamps],
) -> Vec<TimelineEntry> {
    let entry = |timestamp: Timestamp, label: String| TimelineEntry {
        timestamp,
        label,
        actor: None,
        source: TimelineSource::Reconstructed,
    };

    let mut entries = vec![entry(
        order.created_at,
        OrderEventType::Created.as_str().to_string(),
    )];

    for milestone in milestones {
        if let Some(at) = milestone.submitted_at {
            entries.push(entry(
                at,
                format!("milestone submitted: {}", milestone.title),
            ));
        }
        if let Some(at) = milestone.approved_at {
            entries.push(entry(at, format!("milestone approved: {}", milestone.title)));
        }
    }

    for dispute in disputes {
        entries.push(entry(dispute.opened_at, "dispute opened".to_string()));
        if let Some(at) = dispute.resolved_at {
            entries.push(entry(at, "dispute resolved".to_string()));
        }
    }

    if let Some(at) = order.completed_at {
        entries.push(entry(at, OrderEventType::Completed.as_str().to_string()));
    }
    if let Some(at) = order.cancelled_at {
        entries.push(entry(at, OrderEventType::Cancelled.as_str().to_string()));
    }

    entries.sort_by_key(|e| e.timestamp);
    entries
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OrderEvent;
    use crate::log::InMemoryEventLog;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_epoch_secs(secs).expect("valid epoch")
    }

    fn stamps(order_id: OrderId) -> OrderStamps {
        OrderStamps {
            order_id,
            created_at: ts(1_700_000_000),
            completed_at: Some(ts(1_700_400_000)),
            cancelled_at: None,
        }
    }

    #[test]
    fn logged_events_win_over_reconstruction() {
        let log = InMemoryEventLog::new();
        let order_id = OrderId::new();
        let actor = UserId::new();
        log.append_order_event(OrderEvent::new(
            order_id,
            OrderEventType::Created,
            "order placed",
            Some(actor),
        ))
        .expect("append");

        let timeline = build_order_timeline(&log, &stamps(order_id), &[], &[]);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].source, TimelineSource::Log);
        assert_eq!(timeline[0].label, "order placed");
        assert_eq!(timeline[0].actor, Some(actor));
    }

    #[test]
    fn unavailable_log_falls_back_to_entity_timestamps() {
        let log = InMemoryEventLog::unavailable();
        let order_id = OrderId::new();
        let milestones = [MilestoneStamps {
            title: "wireframes".to_string(),
            submitted_at: Some(ts(1_700_100_000)),
            approved_at: Some(ts(1_700_200_000)),
        }];
        let disputes = [DisputeStamps {
            opened_at: ts(1_700_250_000),
            resolved_at: Some(ts(1_700_300_000)),
        }];

        let timeline = build_order_timeline(&log, &stamps(order_id), &milestones, &disputes);
        assert_eq!(timeline.len(), 6);
        assert!(timeline
            .iter()
            .all(|e| e.source == TimelineSource::Reconstructed && e.actor.is_none()));
        // Chronological regardless of which entity contributed the entry.
        let times: Vec<_> = timeline.iter().map(|e| e.timestamp).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(timeline[0].label, "created");
        assert_eq!(timeline[5].label, "completed");
    }

    #[test]
    fn empty_log_for_an_existing_order_reconstructs() {
        let log = InMemoryEventLog::new();
        let order_id = OrderId::new();
        let timeline = build_order_timeline(&log, &stamps(order_id), &[], &[]);
        assert!(!timeline.is_empty());
        assert!(timeline
            .iter()
            .all(|e| e.source == TimelineSource::Reconstructed));
    }
}
