use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::activity::ActivityKind;
use crate::services::activity_groups::TypeGroup;

/// Identifies a collapsible node in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Type(ActivityKind),
    Date(ActivityKind, NaiveDate),
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKey::Type(kind) => write!(f, "{kind}"),
            NodeKey::Date(kind, date) => write!(f, "{kind}:{}", date.format("%Y-%m-%d")),
        }
    }
}

impl std::str::FromStr for NodeKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None => Ok(NodeKey::Type(s.parse()?)),
            Some((kind, date)) => {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| anyhow::anyhow!("Invalid date in node key {s}: {e}"))?;
                Ok(NodeKey::Date(kind.parse()?, date))
            }
        }
    }
}

impl Serialize for NodeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Emitted after a toggle so the display layer can update just that node.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ToggleEvent {
    pub key: NodeKey,
    pub expanded: bool,
}

/// Expanded/collapsed flags for the feed, owned by the presentation layer.
///
/// Defaults are derived from the current groups and are replaced on every
/// refresh. Only flags the user set are carried over. Unknown nodes are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    defaults: HashMap<NodeKey, bool>,
    overrides: HashMap<NodeKey, bool>,
}

impl ExpansionState {
    /// Initial state for freshly grouped activity: the first kind is open and,
    /// inside it, the newest day is open if that day is `today`.
    pub fn defaults_for(groups: &[TypeGroup], today: NaiveDate) -> Self {
        let mut state = Self::default();
        state.reconcile(groups, today);
        state
    }

    /// Recompute defaults for refreshed groups. User-set flags are kept.
    pub fn reconcile(&mut self, groups: &[TypeGroup], today: NaiveDate) {
        self.defaults.clear();
        for (i, group) in groups.iter().enumerate() {
            let type_open = i == 0;
            self.defaults.insert(NodeKey::Type(group.kind), type_open);

            for (j, date_group) in group.dates.iter().enumerate() {
                let date_open = type_open && j == 0 && date_group.date == today;
                self.defaults
                    .insert(NodeKey::Date(group.kind, date_group.date), date_open);
            }
        }
    }

    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        self.overrides
            .get(key)
            .or_else(|| self.defaults.get(key))
            .copied()
            .unwrap_or(false)
    }

    /// Record a user choice. A choice equal to the default is dropped.
    pub fn set(&mut self, key: NodeKey, expanded: bool) {
        let default = self.defaults.get(&key).copied().unwrap_or(false);
        if expanded == default {
            self.overrides.remove(&key);
        } else {
            self.overrides.insert(key, expanded);
        }
    }

    /// Flip one node. Siblings are never touched.
    pub fn toggle(&mut self, key: NodeKey) -> ToggleEvent {
        let expanded = !self.is_expanded(&key);
        self.set(key, expanded);
        tracing::debug!(
            "activity: node {} -> {}",
            key,
            if expanded { "expanded" } else { "collapsed" }
        );
        ToggleEvent { key, expanded }
    }

    pub fn toggle_type(&mut self, kind: ActivityKind) -> ToggleEvent {
        self.toggle(NodeKey::Type(kind))
    }

    pub fn toggle_date(&mut self, kind: ActivityKind, date: NaiveDate) -> ToggleEvent {
        self.toggle(NodeKey::Date(kind, date))
    }
}
