use std::env;

use chrono::FixedOffset;

use crate::services::{
    activity::DEFAULT_ACTIVITY_LIMIT,
    debug_log::DEFAULT_DEBUG_LOG_CAPACITY,
    render::{RenderOptions, DEFAULT_DATE_FORMAT, DEFAULT_EMPTY_MESSAGE},
};

#[derive(Debug, Clone)]
pub struct Config {
    pub activity_limit: usize,
    /// Shop-local offset from UTC, used for day grouping and "today".
    pub utc_offset_minutes: i32,
    pub date_format: String,
    pub empty_message: String,
    pub debug_log_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            utc_offset_minutes: 0,
            date_format: DEFAULT_DATE_FORMAT.into(),
            empty_message: DEFAULT_EMPTY_MESSAGE.into(),
            debug_log_capacity: DEFAULT_DEBUG_LOG_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            activity_limit: match get("ACTIVITY_LIMIT") {
                Some(v) => v.trim().parse()?,
                None => defaults.activity_limit,
            },
            utc_offset_minutes: match get("SHOP_UTC_OFFSET_MINUTES") {
                Some(v) => v.trim().parse()?,
                None => defaults.utc_offset_minutes,
            },
            date_format: get("ACTIVITY_DATE_FORMAT").unwrap_or(defaults.date_format),
            empty_message: get("ACTIVITY_EMPTY_MESSAGE").unwrap_or(defaults.empty_message),
            debug_log_capacity: match get("DEBUG_LOG_CAPACITY") {
                Some(v) => v.trim().parse()?,
                None => defaults.debug_log_capacity,
            },
        };

        // Reject out-of-range offsets at load time.
        config.offset()?;
        Ok(config)
    }

    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "SHOP_UTC_OFFSET_MINUTES out of range: {}",
                    self.utc_offset_minutes
                )
            })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            date_format: self.date_format.clone(),
            empty_message: self.empty_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.activity_limit, 10);
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.date_format, "%b %-d, %Y");
        assert_eq!(config.debug_log_capacity, 200);
    }

    #[test]
    fn test_values_override_defaults() {
        let config = config_from(&[
            ("ACTIVITY_LIMIT", "25"),
            ("SHOP_UTC_OFFSET_MINUTES", "480"),
            ("ACTIVITY_EMPTY_MESSAGE", "Walang aktibidad"),
            ("DEBUG_LOG_CAPACITY", ""),
        ])
        .unwrap();
        assert_eq!(config.activity_limit, 25);
        assert_eq!(config.offset().unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(config.render_options().empty_message, "Walang aktibidad");
        assert_eq!(config.debug_log_capacity, 200);
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        assert!(config_from(&[("ACTIVITY_LIMIT", "ten")]).is_err());
        assert!(config_from(&[("SHOP_UTC_OFFSET_MINUTES", "100000")]).is_err());
    }
}
