use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::models::repair::RepairRecord;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("cannot read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected snapshot shape: {0}")]
    Shape(&'static str),
}

/// Read a repairs snapshot exported from the realtime database.
pub fn load_snapshot(path: &Path) -> Result<Vec<RepairRecord>, SnapshotError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_snapshot(&raw)?;
    tracing::info!("Loaded {} repair record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Accepts a JSON array of records, an object keyed by record id, or either of
/// those under a top-level `"repairs"` key. Keys fill in missing ids.
/// Entries that are not valid records are skipped with a warning.
pub fn parse_snapshot(raw: &str) -> Result<Vec<RepairRecord>, SnapshotError> {
    let mut root: Value = serde_json::from_str(raw)?;
    if let Some(inner) = root.get_mut("repairs").map(Value::take) {
        root = inner;
    }

    let entries: Vec<(Option<String>, Value)> = match root {
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        Value::Null => Vec::new(),
        _ => return Err(SnapshotError::Shape("expected an array or an object of records")),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match serde_json::from_value::<RepairRecord>(value) {
            Ok(mut record) => {
                if record.id.is_empty() {
                    if let Some(key) = key {
                        record.id = key;
                    }
                }
                records.push(record);
            }
            Err(e) => tracing::warn!(
                "Skipping malformed repair record {}: {}",
                key.as_deref().unwrap_or("<unkeyed>"),
                e
            ),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let records = parse_snapshot(
            r#"[{"id": "a", "customerName": "Ana"}, {"id": "b", "deleted": true}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_name.as_deref(), Some("Ana"));
        assert!(records[1].deleted);
    }

    #[test]
    fn test_parse_keyed_object_under_repairs() {
        let records = parse_snapshot(
            r#"{"repairs": {"-K1": {"brand": "Xiaomi"}, "-K2": {"id": "own-id"}}}"#,
        )
        .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["-K1", "own-id"]);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let records = parse_snapshot(r#"[{"id": "ok"}, 42, {"deleted": "yes"}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "ok");
    }

    #[test]
    fn test_null_snapshot_is_empty() {
        assert!(parse_snapshot("null").unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_snapshot("{not json"), Err(SnapshotError::Json(_))));
        assert!(matches!(parse_snapshot("\"text\""), Err(SnapshotError::Shape(_))));
        assert!(matches!(
            load_snapshot(Path::new("/nonexistent/repairs.json")),
            Err(SnapshotError::Io { .. })
        ));
    }
}
