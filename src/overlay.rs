//! Typed chart moving-average configuration and the overlays it drives.
//!
//! Stored settings are untrusted JSON. [`MaConfig::normalize`] turns any
//! value into a complete config, field by field, falling back to defaults
//! instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::indicators::{compute_ma, MaType, OverlayPoint, PricePoint};

const FALLBACK_COLOR: &str = "#ffffff";

/// One moving-average line drawn over the price chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaLine {
    pub id: String,
    #[serde(rename = "type")]
    pub ma_type: MaType,
    pub length: usize,
    pub color: String,
    pub visible: bool,
}

impl MaLine {
    pub fn new(id: &str, ma_type: MaType, length: usize, color: &str) -> Self {
        Self {
            id: id.to_string(),
            ma_type,
            length,
            color: color.to_string(),
            visible: true,
        }
    }

    /// Normalize one raw line. Lines without a usable length are dropped.
    fn normalize(raw: &Value) -> Option<MaLine> {
        let length = raw
            .get("length")
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite() && *n >= 1.0)
            .map(|n| n.trunc() as usize)?;

        let color = raw
            .get("color")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(FALLBACK_COLOR)
            .to_string();

        let visible = raw.get("visible").and_then(Value::as_bool).unwrap_or(true);

        let ma_type = raw
            .get("type")
            .and_then(Value::as_str)
            .map(MaType::parse_lenient)
            .unwrap_or_default();

        let id = raw
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}{}", ma_type.as_str(), length));

        Some(MaLine {
            id,
            ma_type,
            length,
            color,
            visible,
        })
    }
}

/// Global overlay switch plus the configured lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaConfig {
    pub ma_enabled: bool,
    pub lines: Vec<MaLine>,
}

impl Default for MaConfig {
    fn default() -> Self {
        Self {
            ma_enabled: true,
            lines: default_lines(),
        }
    }
}

fn default_lines() -> Vec<MaLine> {
    vec![
        MaLine::new("ema20", MaType::Ema, 20, "#f97316"),
        MaLine::new("ema50", MaType::Ema, 50, "#22c55e"),
        MaLine::new("ema200", MaType::Ema, 200, "#60a5fa"),
    ]
}

impl MaConfig {
    /// Normalize an arbitrary JSON value.
    ///
    /// - non-object: the default config
    /// - `ma_enabled` (or legacy `emas_enabled`) when boolean, else `true`
    /// - `lines` when an array, else the default lines; lines without a
    ///   positive length are dropped and an empty result becomes the default
    pub fn normalize(value: &Value) -> MaConfig {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return MaConfig::default(),
        };

        let ma_enabled = obj
            .get("ma_enabled")
            .and_then(Value::as_bool)
            .or_else(|| obj.get("emas_enabled").and_then(Value::as_bool))
            .unwrap_or(true);

        let lines = match obj.get("lines").and_then(Value::as_array) {
            Some(raw) => {
                let parsed: Vec<MaLine> = raw.iter().filter_map(MaLine::normalize).collect();
                if parsed.is_empty() {
                    default_lines()
                } else {
                    parsed
                }
            }
            None => default_lines(),
        };

        MaConfig { ma_enabled, lines }
    }

    /// Parse and normalize a stored JSON string. Absent or unparsable input
    /// yields the default config.
    pub fn parse(stored: Option<&str>) -> MaConfig {
        match stored {
            Some(s) if !s.is_empty() => match serde_json::from_str::<Value>(s) {
                Ok(v) => MaConfig::normalize(&v),
                Err(e) => {
                    tracing::warn!(error = %e, "unparsable chart MA config, using default");
                    MaConfig::default()
                }
            },
            _ => MaConfig::default(),
        }
    }

    /// Canonical JSON encoding, as persisted.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A computed overlay line ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay<T> {
    pub id: String,
    pub color: String,
    pub points: Vec<OverlayPoint<T>>,
}

/// Compute one overlay per visible line; none when overlays are disabled.
pub fn compute_overlays<T: Clone>(points: &[PricePoint<T>], config: &MaConfig) -> Vec<Overlay<T>> {
    if !config.ma_enabled {
        return Vec::new();
    }

    config
        .lines
        .iter()
        .filter(|line| line.visible)
        .map(|line| Overlay {
            id: line.id.clone(),
            color: line.color.clone(),
            points: compute_ma(points, line.length, line.ma_type),
        })
        .collect()
}
