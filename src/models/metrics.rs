use serde::{Deserialize, Serialize};

use crate::sorting::MetricKey;

// ---------------------------------------------------------------------------
// MetricsRow — Latest analytics snapshot for one symbol
// ---------------------------------------------------------------------------

/// Produced by the upstream data pipeline. Every numeric field is nullable:
/// missing history yields `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsRow {
    pub symbol: String,
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub daily_return: Option<f64>,
    #[serde(default)]
    pub return_5d: Option<f64>,
    #[serde(default)]
    pub return_21d: Option<f64>,
    #[serde(default)]
    pub return_63d: Option<f64>,
    #[serde(default)]
    pub return_126d: Option<f64>,
    #[serde(default)]
    pub return_252d: Option<f64>,

    #[serde(default)]
    pub ma10_slope: Option<f64>,
    #[serde(default)]
    pub ma20_slope: Option<f64>,
    #[serde(default)]
    pub ma50_slope: Option<f64>,
    #[serde(default)]
    pub ma200_slope: Option<f64>,

    #[serde(default)]
    pub dist_52w_high: Option<f64>,
    #[serde(default)]
    pub dist_52w_low: Option<f64>,

    // Max drawdowns as positive fractions (0.25 == -25%)
    #[serde(default)]
    pub mdd_1w: Option<f64>,
    #[serde(default)]
    pub mdd_1m: Option<f64>,
    #[serde(default)]
    pub mdd_3m: Option<f64>,
    #[serde(default)]
    pub mdd_6m: Option<f64>,
    #[serde(default)]
    pub mdd_12m: Option<f64>,

    // Absolute Strength percentile ranks (0 = worst, 100 = best)
    #[serde(default)]
    pub as_1w_prank: Option<f64>,
    #[serde(default)]
    pub as_1m_prank: Option<f64>,
    #[serde(default)]
    pub as_3m_prank: Option<f64>,
    #[serde(default)]
    pub as_6m_prank: Option<f64>,
    #[serde(default)]
    pub as_12m_prank: Option<f64>,

    // Sortino-adjusted Absolute Strength percentile ranks
    #[serde(default)]
    pub sortino_as_1w_prank: Option<f64>,
    #[serde(default)]
    pub sortino_as_1m_prank: Option<f64>,
    #[serde(default)]
    pub sortino_as_3m_prank: Option<f64>,
    #[serde(default)]
    pub sortino_as_6m_prank: Option<f64>,
    #[serde(default)]
    pub sortino_as_12m_prank: Option<f64>,
}

impl MetricsRow {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    /// Read one metric by key.
    pub fn value(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::DailyReturn => self.daily_return,
            MetricKey::Return5d => self.return_5d,
            MetricKey::Return21d => self.return_21d,
            MetricKey::Return63d => self.return_63d,
            MetricKey::Return126d => self.return_126d,
            MetricKey::Return252d => self.return_252d,
            MetricKey::Ma10Slope => self.ma10_slope,
            MetricKey::Ma20Slope => self.ma20_slope,
            MetricKey::Ma50Slope => self.ma50_slope,
            MetricKey::Ma200Slope => self.ma200_slope,
            MetricKey::Dist52wHigh => self.dist_52w_high,
            MetricKey::Dist52wLow => self.dist_52w_low,
            MetricKey::Mdd1w => self.mdd_1w,
            MetricKey::Mdd1m => self.mdd_1m,
            MetricKey::Mdd3m => self.mdd_3m,
            MetricKey::Mdd6m => self.mdd_6m,
            MetricKey::Mdd12m => self.mdd_12m,
            MetricKey::As1wPrank => self.as_1w_prank,
            MetricKey::As1mPrank => self.as_1m_prank,
            MetricKey::As3mPrank => self.as_3m_prank,
            MetricKey::As6mPrank => self.as_6m_prank,
            MetricKey::As12mPrank => self.as_12m_prank,
            MetricKey::SortinoAs1wPrank => self.sortino_as_1w_prank,
            MetricKey::SortinoAs1mPrank => self.sortino_as_1m_prank,
            MetricKey::SortinoAs3mPrank => self.sortino_as_3m_prank,
            MetricKey::SortinoAs6mPrank => self.sortino_as_6m_prank,
            MetricKey::SortinoAs12mPrank => self.sortino_as_12m_prank,
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, key: MetricKey, value: Option<f64>) -> Self {
        let slot = match key {
            MetricKey::DailyReturn => &mut self.daily_return,
            MetricKey::Return5d => &mut self.return_5d,
            MetricKey::Return21d => &mut self.return_21d,
            MetricKey::Return63d => &mut self.return_63d,
            MetricKey::Return126d => &mut self.return_126d,
            MetricKey::Return252d => &mut self.return_252d,
            MetricKey::Ma10Slope => &mut self.ma10_slope,
            MetricKey::Ma20Slope => &mut self.ma20_slope,
            MetricKey::Ma50Slope => &mut self.ma50_slope,
            MetricKey::Ma200Slope => &mut self.ma200_slope,
            MetricKey::Dist52wHigh => &mut self.dist_52w_high,
            MetricKey::Dist52wLow => &mut self.dist_52w_low,
            MetricKey::Mdd1w => &mut self.mdd_1w,
            MetricKey::Mdd1m => &mut self.mdd_1m,
            MetricKey::Mdd3m => &mut self.mdd_3m,
            MetricKey::Mdd6m => &mut self.mdd_6m,
            MetricKey::Mdd12m => &mut self.mdd_12m,
            MetricKey::As1wPrank => &mut self.as_1w_prank,
            MetricKey::As1mPrank => &mut self.as_1m_prank,
            MetricKey::As3mPrank => &mut self.as_3m_prank,
            MetricKey::As6mPrank => &mut self.as_6m_prank,
            MetricKey::As12mPrank => &mut self.as_12m_prank,
            MetricKey::SortinoAs1wPrank => &mut self.sortino_as_1w_prank,
            MetricKey::SortinoAs1mPrank => &mut self.sortino_as_1m_prank,
            MetricKey::SortinoAs3mPrank => &mut self.sortino_as_3m_prank,
            MetricKey::SortinoAs6mPrank => &mut self.sortino_as_6m_prank,
            MetricKey::SortinoAs12mPrank => &mut self.sortino_as_12m_prank,
        };
        *slot = value;
        self
    }
}
