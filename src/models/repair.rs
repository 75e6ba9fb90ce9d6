use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One repair case as stored by the realtime database.
/// Owned by the repair-management side; the activity feed only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_by: Option<String>,
    #[serde(default)]
    pub accepted_by_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete flag. Deleted records never show up in activity or stats.
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, deserialize_with = "lenient_payments")]
    pub payments: Vec<PaymentRecord>,
    /// Quoted price of the repair.
    #[serde(default)]
    pub total: Option<f64>,
}

impl RepairRecord {
    /// "Brand Model", trimmed. Empty when neither is known.
    pub fn device(&self) -> String {
        let brand = self.brand.as_deref().unwrap_or("");
        let model = self.model.as_deref().unwrap_or("");
        format!("{brand} {model}").trim().to_string()
    }

    pub fn amount_paid(&self) -> f64 {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// A payment taken against a repair. `verified` is set once the remittance
/// has been checked by an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recorded_by: Option<String>,
    #[serde(default)]
    pub recorded_by_name: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Parse a timestamp the way the database may hold it: RFC 3339 text,
/// a naive `YYYY-MM-DDTHH:MM[:SS]` string (read as UTC), or epoch millis.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|n| n.and_utc())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

/// Payments come either as a list or as an object keyed by push id.
fn lenient_payments<'de, D>(deserializer: D) -> Result<Vec<PaymentRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items: Vec<Value> = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };

    let mut payments = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<PaymentRecord>(item) {
            Ok(p) => payments.push(p),
            Err(e) => tracing::debug!("skipping malformed payment entry: {e}"),
        }
    }
    Ok(payments)
}
