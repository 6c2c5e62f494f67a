use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OhlcBar — One daily price bar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    /// `YYYY-MM-DD`
    pub time: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

// ---------------------------------------------------------------------------
// BreadthRow — One day of breadth statistics for a group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadthRow {
    pub date: String,
    pub total: i64,
    pub adv: Option<i64>,
    pub dec: Option<i64>,
    pub new_high52w: Option<i64>,
    pub new_low52w: Option<i64>,
    pub above_ma5: Option<i64>,
    pub above_ma10: Option<i64>,
    pub above_ma20: Option<i64>,
    pub above_ma50: Option<i64>,
    pub above_ma200: Option<i64>,
    pub spike_up: Option<i64>,
    pub spike_down: Option<i64>,
    pub mcclellan: Option<f64>,
}

/// Count columns of a [`BreadthRow`] that can be charted as a share of the
/// group total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreadthMetric {
    Adv,
    Dec,
    NewHigh52w,
    NewLow52w,
    AboveMa5,
    AboveMa10,
    AboveMa20,
    AboveMa50,
    AboveMa200,
    SpikeUp,
    SpikeDown,
}

impl BreadthRow {
    pub fn count(&self, metric: BreadthMetric) -> Option<i64> {
        match metric {
            BreadthMetric::Adv => self.adv,
            BreadthMetric::Dec => self.dec,
            BreadthMetric::NewHigh52w => self.new_high52w,
            BreadthMetric::NewLow52w => self.new_low52w,
            BreadthMetric::AboveMa5 => self.above_ma5,
            BreadthMetric::AboveMa10 => self.above_ma10,
            BreadthMetric::AboveMa20 => self.above_ma20,
            BreadthMetric::AboveMa50 => self.above_ma50,
            BreadthMetric::AboveMa200 => self.above_ma200,
            BreadthMetric::SpikeUp => self.spike_up,
            BreadthMetric::SpikeDown => self.spike_down,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupBreadth — Latest breadth snapshot joined with its group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBreadth {
    pub group_id: i64,
    pub group_name: String,
    /// `list` or `sector`.
    pub group_type: String,
    #[serde(flatten)]
    pub breadth: BreadthRow,
}

// ---------------------------------------------------------------------------
// StockInfo — Ticker reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    pub id: Option<i64>,
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

// ---------------------------------------------------------------------------
// PriceChart / McClellanChart — Chart-ready series
// ---------------------------------------------------------------------------

/// Price bars of one ticker with the configured moving-average overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChart {
    pub ticker: String,
    pub bars: Vec<OhlcBar>,
    pub overlays: Vec<crate::overlay::Overlay<String>>,
}

/// Windowed McClellan oscillator with its summation index and 10-period
/// mean. All four vectors have the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McClellanChart {
    pub group_id: i64,
    /// Points available before windowing.
    pub total_points: usize,
    pub dates: Vec<String>,
    pub mcclellan: Vec<f64>,
    pub summation: Vec<f64>,
    pub ma10: Vec<f64>,
}
