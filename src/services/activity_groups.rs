use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::models::activity::{ActivityEvent, ActivityKind};

/// Events of one kind, split by calendar day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeGroup {
    pub kind: ActivityKind,
    pub dates: Vec<DateGroup>,
}

impl TypeGroup {
    /// Total events across all days.
    pub fn len(&self) -> usize {
        self.dates.iter().map(|d| d.events.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub events: Vec<ActivityEvent>,
}

/// Calendar day of an event in the shop's local offset.
pub fn date_key(event: &ActivityEvent, offset: FixedOffset) -> NaiveDate {
    event.timestamp.with_timezone(&offset).date_naive()
}

/// Bucket events by kind, then by day.
///
/// Kinds come out in [`ActivityKind::ALL`] order and kinds without events are
/// dropped. Within a kind, days are ordered by their first event, newest first.
/// Events keep the order they were given in.
pub fn group_events(events: &[ActivityEvent], offset: FixedOffset) -> Vec<TypeGroup> {
    let mut groups = Vec::new();

    for kind in ActivityKind::ALL {
        let mut dates: Vec<DateGroup> = Vec::new();
        for event in events.iter().filter(|e| e.kind == kind) {
            let day = date_key(event, offset);
            match dates.iter_mut().find(|g| g.date == day) {
                Some(group) => group.events.push(event.clone()),
                None => dates.push(DateGroup {
                    date: day,
                    events: vec![event.clone()],
                }),
            }
        }

        if dates.is_empty() {
            continue;
        }

        // Stable, so days whose first events tie keep first-seen order.
        dates.sort_by(|a, b| b.events[0].timestamp.cmp(&a.events[0].timestamp));
        groups.push(TypeGroup { kind, dates });
    }

    tracing::debug!(
        "activity: grouped {} event(s) into {} kind group(s)",
        events.len(),
        groups.len()
    );
    groups
}
