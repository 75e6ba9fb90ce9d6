use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::models::activity::{ActivityEvent, ActivityKind, ActivityPayload};
use crate::services::{
    activity_groups::TypeGroup,
    dashboard::DashboardStats,
    expansion::{ExpansionState, NodeKey},
};

pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";
pub const DEFAULT_EMPTY_MESSAGE: &str = "No recent activity";

/// Presentation knobs that come from configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// chrono format string for day headers.
    pub date_format: String,
    pub empty_message: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.into(),
            empty_message: DEFAULT_EMPTY_MESSAGE.into(),
        }
    }
}

/// The activity feed as the display layer consumes it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedFeed {
    Empty { message: String },
    Groups { groups: Vec<TypeNode> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeNode {
    pub key: NodeKey,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub count: usize,
    pub expanded: bool,
    pub dates: Vec<DateNode>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateNode {
    pub key: NodeKey,
    pub label: String,
    pub is_today: bool,
    pub count: usize,
    pub expanded: bool,
    pub items: Vec<ItemNode>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemNode {
    pub repair_id: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub text: String,
    pub relative_time: String,
    pub timestamp: DateTime<Utc>,
}

/// Build the render tree for grouped activity.
///
/// Expansion flags are read from `state`; nodes it does not know are collapsed.
/// Collapsed nodes still carry their children so the display layer can open
/// them without re-rendering.
pub fn render_feed(
    groups: &[TypeGroup],
    state: &ExpansionState,
    now: DateTime<Utc>,
    offset: FixedOffset,
    options: &RenderOptions,
) -> RenderedFeed {
    if groups.iter().all(|g| g.is_empty()) {
        return RenderedFeed::Empty {
            message: options.empty_message.clone(),
        };
    }

    let today = now.with_timezone(&offset).date_naive();
    let nodes = groups
        .iter()
        .filter(|g| !g.is_empty())
        .map(|group| {
            let descriptor = group.kind.descriptor();
            let type_key = NodeKey::Type(group.kind);
            TypeNode {
                key: type_key,
                label: descriptor.label,
                icon: descriptor.icon,
                color: descriptor.color,
                count: group.len(),
                expanded: state.is_expanded(&type_key),
                dates: group
                    .dates
                    .iter()
                    .map(|date_group| {
                        let date_key = NodeKey::Date(group.kind, date_group.date);
                        DateNode {
                            key: date_key,
                            label: date_label(date_group.date, &options.date_format),
                            is_today: date_group.date == today,
                            count: date_group.events.len(),
                            expanded: state.is_expanded(&date_key),
                            items: date_group
                                .events
                                .iter()
                                .map(|event| render_item(event, now))
                                .collect(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    RenderedFeed::Groups { groups: nodes }
}

/// The single JSON document handed to the display layer: the feed alone, or
/// `{"feed": ..., "stats": ...}` when dashboard counters are included.
pub fn feed_document(
    feed: &RenderedFeed,
    stats: Option<&DashboardStats>,
) -> serde_json::Result<serde_json::Value> {
    let feed = serde_json::to_value(feed)?;
    match stats {
        None => Ok(feed),
        Some(stats) => {
            let mut document = serde_json::Map::new();
            document.insert("feed".into(), feed);
            document.insert("stats".into(), serde_json::to_value(stats)?);
            Ok(serde_json::Value::Object(document))
        }
    }
}

fn render_item(event: &ActivityEvent, now: DateTime<Utc>) -> ItemNode {
    let descriptor = event.kind.descriptor();
    ItemNode {
        repair_id: event.repair_id.clone(),
        icon: descriptor.icon,
        color: descriptor.color,
        text: describe(event),
        relative_time: relative_time(event.timestamp, now),
        timestamp: event.timestamp,
    }
}

fn date_label(date: NaiveDate, format: &str) -> String {
    use std::fmt::Write;

    // A bad user-supplied format makes chrono's Display fail; fall back to ISO.
    let mut label = String::new();
    match write!(label, "{}", date.format(format)) {
        Ok(()) => label,
        Err(_) => date.format("%Y-%m-%d").to_string(),
    }
}

/// One-line description of an event.
pub fn describe(event: &ActivityEvent) -> String {
    describe_key(
        event.kind.key(),
        event.actor.as_deref().unwrap_or(""),
        &event.payload,
    )
}

/// Text template by kind key. Missing fields interpolate as empty strings and
/// unknown keys get a generic marker.
pub fn describe_key(kind_key: &str, actor: &str, payload: &ActivityPayload) -> String {
    let customer = payload.customer_name.as_deref().unwrap_or("");
    let device = payload.device.as_deref().unwrap_or("");

    match kind_key.parse::<ActivityKind>() {
        Ok(ActivityKind::Created) => format!("{actor} logged {device} for {customer}"),
        Ok(ActivityKind::Accepted) => format!("{actor} accepted {device} for {customer}"),
        Ok(ActivityKind::Completed) => match payload.status.as_deref() {
            Some(status) => format!("{actor} completed {device} for {customer} ({status})"),
            None => format!("{actor} completed {device} for {customer}"),
        },
        Ok(ActivityKind::PaymentRecorded) => {
            let amount = payload
                .amount
                .map(|a| format!("{a:.2}"))
                .unwrap_or_default();
            format!("{actor} recorded a payment of {amount} for {customer}")
        }
        Err(_) => "Activity".to_string(),
    }
}

/// "3 hours ago" style label. Timestamps in the future count as "just now".
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }

    match elapsed.num_days() {
        1 => "Yesterday".to_string(),
        days => plural(days, "day"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

impl RenderedFeed {
    pub fn is_empty(&self) -> bool {
        matches!(self, RenderedFeed::Empty { .. })
    }

    /// Indented outline for terminals and logs. Collapsed nodes show only
    /// their header line.
    pub fn to_text(&self) -> String {
        let groups = match self {
            RenderedFeed::Empty { message } => return format!("{message}\n"),
            RenderedFeed::Groups { groups } => groups,
        };

        let mut out = String::new();
        for group in groups {
            out.push_str(&format!(
                "{} {} ({})\n",
                marker(group.expanded),
                group.label,
                group.count
            ));
            if !group.expanded {
                continue;
            }
            for date in &group.dates {
                let today = if date.is_today { " · today" } else { "" };
                out.push_str(&format!(
                    "  {} {}{} ({})\n",
                    marker(date.expanded),
                    date.label,
                    today,
                    date.count
                ));
                if !date.expanded {
                    continue;
                }
                for item in &date.items {
                    out.push_str(&format!("      • {} · {}\n", item.text, item.relative_time));
                }
            }
        }
        out
    }
}

fn marker(expanded: bool) -> &'static str {
    if expanded {
        "▾"
    } else {
        "▸"
    }
}
