use crate::models::{
    activity::{ActivityEvent, ActivityKind, ActivityPayload},
    repair::{PaymentRecord, RepairRecord},
};

/// Number of events shown in a recent-activity feed when the caller has no preference.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

/// Shown when a record has no name for the person involved.
pub const UNKNOWN_ACTOR: &str = "Unknown";

/// Whose activity to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityScope {
    /// Whole shop (admin dashboard).
    Shop,
    /// One user by uid (technician / cashier dashboard).
    Actor(String),
}

impl ActivityScope {
    pub fn actor(&self) -> Option<&str> {
        match self {
            ActivityScope::Shop => None,
            ActivityScope::Actor(uid) => Some(uid),
        }
    }

    /// True when the scope is shop-wide or `uid` is the scoped actor.
    pub fn includes(&self, uid: Option<&str>) -> bool {
        match self {
            ActivityScope::Shop => true,
            ActivityScope::Actor(actor) => uid == Some(actor.as_str()),
        }
    }
}

pub struct ActivityCollector;

impl ActivityCollector {
    /// Recent lifecycle events (created / accepted / completed), newest first,
    /// at most `limit` of them. Deleted records are skipped.
    ///
    /// Shop scope emits `created` and `completed`. Actor scope emits `created`
    /// for records the actor logged, and `accepted` / `completed` for records
    /// the actor accepted.
    pub fn collect(
        records: &[RepairRecord],
        scope: &ActivityScope,
        limit: usize,
    ) -> Vec<ActivityEvent> {
        let mut events = Vec::new();

        for record in records.iter().filter(|r| !r.deleted) {
            match scope {
                ActivityScope::Shop => {
                    if let Some(at) = record.created_at {
                        events.push(lifecycle_event(
                            ActivityKind::Created,
                            at,
                            record.created_by_name.as_deref(),
                            record,
                        ));
                    }
                    if let Some(at) = record.completed_at {
                        events.push(lifecycle_event(
                            ActivityKind::Completed,
                            at,
                            record.accepted_by_name.as_deref(),
                            record,
                        ));
                    }
                }
                ActivityScope::Actor(uid) => {
                    let is_creator = record.created_by.as_deref() == Some(uid.as_str());
                    let is_acceptor = record.accepted_by.as_deref() == Some(uid.as_str());

                    if is_creator {
                        if let Some(at) = record.created_at {
                            events.push(lifecycle_event(
                                ActivityKind::Created,
                                at,
                                record.created_by_name.as_deref(),
                                record,
                            ));
                        }
                    }
                    if is_acceptor {
                        if let Some(at) = record.accepted_at {
                            events.push(lifecycle_event(
                                ActivityKind::Accepted,
                                at,
                                record.accepted_by_name.as_deref(),
                                record,
                            ));
                        }
                        if let Some(at) = record.completed_at {
                            events.push(lifecycle_event(
                                ActivityKind::Completed,
                                at,
                                record.accepted_by_name.as_deref(),
                                record,
                            ));
                        }
                    }
                }
            }
        }

        let candidates = events.len();
        let events = newest_first(events, limit);
        tracing::debug!(
            "activity: {} candidate event(s), returning {} (limit {})",
            candidates,
            events.len(),
            limit
        );
        events
    }

    /// `collect` with [`DEFAULT_ACTIVITY_LIMIT`].
    pub fn collect_recent(records: &[RepairRecord], scope: &ActivityScope) -> Vec<ActivityEvent> {
        Self::collect(records, scope, DEFAULT_ACTIVITY_LIMIT)
    }

    /// One `payment_recorded` event per timestamped payment on a live record.
    /// Actor scope keeps only payments recorded by that actor.
    pub fn collect_payments(
        records: &[RepairRecord],
        scope: &ActivityScope,
        limit: usize,
    ) -> Vec<ActivityEvent> {
        let mut events = Vec::new();
        for record in records.iter().filter(|r| !r.deleted) {
            for payment in &record.payments {
                if !scope.includes(payment.recorded_by.as_deref()) {
                    continue;
                }
                if let Some(event) = payment_event(record, payment) {
                    events.push(event);
                }
            }
        }
        newest_first(events, limit)
    }

    /// Merge two event lists into one newest-first list of at most `limit`.
    pub fn merge_recent(
        a: Vec<ActivityEvent>,
        b: Vec<ActivityEvent>,
        limit: usize,
    ) -> Vec<ActivityEvent> {
        let mut all = a;
        all.extend(b);
        newest_first(all, limit)
    }
}

/// Stable descending sort, so equal timestamps keep insertion order.
fn newest_first(mut events: Vec<ActivityEvent>, limit: usize) -> Vec<ActivityEvent> {
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    events
}

fn lifecycle_event(
    kind: ActivityKind,
    at: chrono::DateTime<chrono::Utc>,
    actor_name: Option<&str>,
    record: &RepairRecord,
) -> ActivityEvent {
    ActivityEvent {
        kind,
        timestamp: at,
        actor: Some(actor_name.unwrap_or(UNKNOWN_ACTOR).to_string()),
        repair_id: record.id.clone(),
        payload: payload_for(record),
    }
}

fn payment_event(record: &RepairRecord, payment: &PaymentRecord) -> Option<ActivityEvent> {
    let at = payment.recorded_at?;
    Some(ActivityEvent {
        kind: ActivityKind::PaymentRecorded,
        timestamp: at,
        actor: Some(
            payment
                .recorded_by_name
                .as_deref()
                .unwrap_or(UNKNOWN_ACTOR)
                .to_string(),
        ),
        repair_id: record.id.clone(),
        payload: ActivityPayload {
            amount: Some(payment.amount),
            ..payload_for(record)
        },
    })
}

fn payload_for(record: &RepairRecord) -> ActivityPayload {
    let device = record.device();
    ActivityPayload {
        customer_name: record.customer_name.clone(),
        device: (!device.is_empty()).then_some(device),
        status: record.status.clone(),
        amount: None,
    }
}
