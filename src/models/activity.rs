use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kinds of activity shown on the dashboard feed, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Accepted,
    Completed,
    PaymentRecorded,
}

/// Display configuration for one activity kind. Shared by grouping and rendering.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct KindDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const DESCRIPTORS: [KindDescriptor; 4] = [
    KindDescriptor {
        key: "created",
        label: "New Repairs",
        icon: "plus-circle",
        color: "#2563eb",
    },
    KindDescriptor {
        key: "accepted",
        label: "Accepted Repairs",
        icon: "hand",
        color: "#d97706",
    },
    KindDescriptor {
        key: "completed",
        label: "Completed Repairs",
        icon: "check-circle",
        color: "#16a34a",
    },
    KindDescriptor {
        key: "payment_recorded",
        label: "Payments Recorded",
        icon: "cash",
        color: "#7c3aed",
    },
];

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Created,
        ActivityKind::Accepted,
        ActivityKind::Completed,
        ActivityKind::PaymentRecorded,
    ];

    /// Position in the fixed display order.
    pub fn index(self) -> usize {
        match self {
            ActivityKind::Created => 0,
            ActivityKind::Accepted => 1,
            ActivityKind::Completed => 2,
            ActivityKind::PaymentRecorded => 3,
        }
    }

    pub fn descriptor(self) -> &'static KindDescriptor {
        &DESCRIPTORS[self.index()]
    }

    pub fn key(self) -> &'static str {
        self.descriptor().key
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown activity kind: {s}"))
    }
}

/// Details copied out of the repair record for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityPayload {
    pub customer_name: Option<String>,
    pub device: Option<String>,
    pub status: Option<String>,
    pub amount: Option<f64>,
}

/// A derived, display-only fact about a repair. Rebuilt on every render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<String>,
    pub repair_id: String,
    pub payload: ActivityPayload,
}
