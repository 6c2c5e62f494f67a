//! Key-value application settings, including the chart overlay config.

use serde_json::Value;

use crate::config::{Store, CHART_MA_SETTINGS_KEY};
use crate::connection::Connection;
use crate::error::Result;
use crate::overlay::MaConfig;

/// Query interface for `app.app_settings`.
pub struct SettingsQuery<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Raw stored value of a setting.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn.ensure_stores(&[Store::App])?;

        let value = self.conn.execute_scalar(
            "SELECT value FROM app.app_settings WHERE key = ?",
            &[key.to_string()],
        )?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    /// Insert or replace a setting.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.ensure_stores(&[Store::App])?;

        self.conn.in_transaction(|conn| {
            let updated = conn.execute_write(
                "UPDATE app.app_settings SET value = ? WHERE key = ?",
                &[value.to_string(), key.to_string()],
            )?;
            if updated == 0 {
                conn.execute_write(
                    "INSERT INTO app.app_settings (key, value) VALUES (?, ?)",
                    &[key.to_string(), value.to_string()],
                )?;
            }
            Ok(())
        })
    }

    /// The chart moving-average config, normalized.
    ///
    /// The normalized form is written back when the stored value is missing
    /// or differs from it.
    pub fn chart_ma_config(&self) -> Result<MaConfig> {
        let stored = self.get(CHART_MA_SETTINGS_KEY)?;
        let config = MaConfig::parse(stored.as_deref());
        let canonical = config.to_json_string();

        if stored.as_deref() != Some(canonical.as_str()) {
            tracing::info!(key = CHART_MA_SETTINGS_KEY, "storing normalized chart settings");
            self.set(CHART_MA_SETTINGS_KEY, &canonical)?;
        }
        Ok(config)
    }

    /// Normalize and persist a chart moving-average config.
    pub fn set_chart_ma_config(&self, value: &Value) -> Result<MaConfig> {
        let config = MaConfig::normalize(value);
        self.set(CHART_MA_SETTINGS_KEY, &config.to_json_string())?;
        Ok(config)
    }
}
