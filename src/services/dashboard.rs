use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::models::repair::RepairRecord;
use crate::services::activity::ActivityScope;

/// Counters shown on the top row of a dashboard.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub received_today: usize,
    pub completed_today: usize,
    pub payments_total: f64,
    pub unverified_remittances: usize,
    pub outstanding_balance: f64,
}

impl DashboardStats {
    /// Compose the counters for the shop, or for the repairs one user logged
    /// or accepted. Payment figures only count payments the user recorded.
    pub fn compose(
        records: &[RepairRecord],
        scope: &ActivityScope,
        today: NaiveDate,
        offset: FixedOffset,
    ) -> Self {
        let on_today = |at: Option<DateTime<Utc>>| {
            at.map(|t| t.with_timezone(&offset).date_naive() == today)
                .unwrap_or(false)
        };

        let mut stats = Self::default();
        for record in records.iter().filter(|r| !r.deleted) {
            for payment in &record.payments {
                if scope.includes(payment.recorded_by.as_deref()) {
                    stats.payments_total += payment.amount;
                    if !payment.verified {
                        stats.unverified_remittances += 1;
                    }
                }
            }

            let involved = scope.includes(record.created_by.as_deref())
                || scope.includes(record.accepted_by.as_deref());
            if !involved {
                continue;
            }

            stats.total += 1;
            if record.completed_at.is_some() {
                stats.completed += 1;
                if let Some(price) = record.total {
                    stats.outstanding_balance += (price - record.amount_paid()).max(0.0);
                }
            } else if record.accepted_at.is_some() || record.accepted_by.is_some() {
                stats.in_progress += 1;
            } else {
                stats.pending += 1;
            }

            if on_today(record.created_at) {
                stats.received_today += 1;
            }
            if on_today(record.completed_at) {
                stats.completed_today += 1;
            }
        }

        tracing::debug!(
            "dashboard: {} repair(s) in scope, {} pending, {} in progress, {} completed",
            stats.total,
            stats.pending,
            stats.in_progress,
            stats.completed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::repair::PaymentRecord;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, hour, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn records() -> Vec<RepairRecord> {
        vec![
            // Pending, logged today by the cashier.
            RepairRecord {
                created_at: Some(at(10, 9)),
                created_by: Some("cashier".into()),
                ..Default::default()
            },
            // In progress with the technician.
            RepairRecord {
                created_at: Some(at(8, 9)),
                created_by: Some("cashier".into()),
                accepted_at: Some(at(8, 10)),
                accepted_by: Some("tech".into()),
                ..Default::default()
            },
            // Completed today, partly paid.
            RepairRecord {
                created_at: Some(at(7, 9)),
                created_by: Some("cashier".into()),
                accepted_by: Some("tech".into()),
                completed_at: Some(at(10, 14)),
                total: Some(1500.0),
                payments: vec![
                    PaymentRecord {
                        amount: 1000.0,
                        recorded_by: Some("cashier".into()),
                        verified: true,
                        ..Default::default()
                    },
                    PaymentRecord {
                        amount: 200.0,
                        recorded_by: Some("tech".into()),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            RepairRecord {
                created_at: Some(at(10, 8)),
                deleted: true,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_shop_counters() {
        let stats = DashboardStats::compose(&records(), &ActivityScope::Shop, today(), utc());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.received_today, 1);
        assert_eq!(stats.completed_today, 1);
        assert_eq!(stats.payments_total, 1200.0);
        assert_eq!(stats.unverified_remittances, 1);
        assert_eq!(stats.outstanding_balance, 300.0);
    }

    #[test]
    fn test_technician_counters() {
        let scope = ActivityScope::Actor("tech".into());
        let stats = DashboardStats::compose(&records(), &scope, today(), utc());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.received_today, 0);
        assert_eq!(stats.payments_total, 200.0);
        assert_eq!(stats.unverified_remittances, 1);
    }

    #[test]
    fn test_no_records() {
        let stats = DashboardStats::compose(&[], &ActivityScope::Shop, today(), utc());
        assert_eq!(stats, DashboardStats::default());
    }
}
