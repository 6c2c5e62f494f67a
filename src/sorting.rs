//! Watchlist ordering: sort keys, the persisted default-sort string, and the
//! comparison-based sort over watchlist items.
//!
//! Everything here is pure. Unknown sort strings fall back to the saved
//! order, and items without metric data sort last in either direction.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use stockwatch::models::{MetricsRow, WatchlistItem};
//! use stockwatch::sorting::{parse_default_sort, sort_items};
//!
//! let items = vec![
//!     WatchlistItem::new(1, "MSFT", None),
//!     WatchlistItem::new(2, "AAPL", None),
//! ];
//! let metrics: HashMap<String, MetricsRow> = HashMap::new();
//!
//! let spec = parse_default_sort(Some("ticker_asc"));
//! let ordered = sort_items(&items, spec.key, spec.direction, &metrics);
//! assert_eq!(ordered[0].ticker, "AAPL");
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{MetricsRow, WatchlistItem};

// ---------------------------------------------------------------------------
// SortDirection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parse the exact tokens `asc` / `desc`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MetricKey
// ---------------------------------------------------------------------------

/// One sortable field of a [`MetricsRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKey {
    DailyReturn,
    Return5d,
    Return21d,
    Return63d,
    Return126d,
    Return252d,
    Ma10Slope,
    Ma20Slope,
    Ma50Slope,
    Ma200Slope,
    Dist52wHigh,
    Dist52wLow,
    Mdd1w,
    Mdd1m,
    Mdd3m,
    Mdd6m,
    Mdd12m,
    As1wPrank,
    As1mPrank,
    As3mPrank,
    As6mPrank,
    As12mPrank,
    SortinoAs1wPrank,
    SortinoAs1mPrank,
    SortinoAs3mPrank,
    SortinoAs6mPrank,
    SortinoAs12mPrank,
}

impl MetricKey {
    /// All metric keys, in display order.
    pub const ALL: [MetricKey; 27] = [
        MetricKey::DailyReturn,
        MetricKey::Return5d,
        MetricKey::Return21d,
        MetricKey::Return63d,
        MetricKey::Return126d,
        MetricKey::Return252d,
        MetricKey::Ma10Slope,
        MetricKey::Ma20Slope,
        MetricKey::Ma50Slope,
        MetricKey::Ma200Slope,
        MetricKey::Dist52wHigh,
        MetricKey::Dist52wLow,
        MetricKey::Mdd1w,
        MetricKey::Mdd1m,
        MetricKey::Mdd3m,
        MetricKey::Mdd6m,
        MetricKey::Mdd12m,
        MetricKey::As1wPrank,
        MetricKey::As1mPrank,
        MetricKey::As3mPrank,
        MetricKey::As6mPrank,
        MetricKey::As12mPrank,
        MetricKey::SortinoAs1wPrank,
        MetricKey::SortinoAs1mPrank,
        MetricKey::SortinoAs3mPrank,
        MetricKey::SortinoAs6mPrank,
        MetricKey::SortinoAs12mPrank,
    ];

    /// Column name in the metrics store, also the persisted sort key.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::DailyReturn => "daily_return",
            MetricKey::Return5d => "return_5d",
            MetricKey::Return21d => "return_21d",
            MetricKey::Return63d => "return_63d",
            MetricKey::Return126d => "return_126d",
            MetricKey::Return252d => "return_252d",
            MetricKey::Ma10Slope => "ma10_slope",
            MetricKey::Ma20Slope => "ma20_slope",
            MetricKey::Ma50Slope => "ma50_slope",
            MetricKey::Ma200Slope => "ma200_slope",
            MetricKey::Dist52wHigh => "dist_52w_high",
            MetricKey::Dist52wLow => "dist_52w_low",
            MetricKey::Mdd1w => "mdd_1w",
            MetricKey::Mdd1m => "mdd_1m",
            MetricKey::Mdd3m => "mdd_3m",
            MetricKey::Mdd6m => "mdd_6m",
            MetricKey::Mdd12m => "mdd_12m",
            MetricKey::As1wPrank => "as_1w_prank",
            MetricKey::As1mPrank => "as_1m_prank",
            MetricKey::As3mPrank => "as_3m_prank",
            MetricKey::As6mPrank => "as_6m_prank",
            MetricKey::As12mPrank => "as_12m_prank",
            MetricKey::SortinoAs1wPrank => "sortino_as_1w_prank",
            MetricKey::SortinoAs1mPrank => "sortino_as_1m_prank",
            MetricKey::SortinoAs3mPrank => "sortino_as_3m_prank",
            MetricKey::SortinoAs6mPrank => "sortino_as_6m_prank",
            MetricKey::SortinoAs12mPrank => "sortino_as_12m_prank",
        }
    }

    /// Human-readable label for sort pickers.
    pub fn label(self) -> &'static str {
        match self {
            MetricKey::DailyReturn => "Daily return",
            MetricKey::Return5d => "5d return",
            MetricKey::Return21d => "21d return",
            MetricKey::Return63d => "63d return",
            MetricKey::Return126d => "126d return",
            MetricKey::Return252d => "252d return",
            MetricKey::Ma10Slope => "MA10 slope",
            MetricKey::Ma20Slope => "MA20 slope",
            MetricKey::Ma50Slope => "MA50 slope",
            MetricKey::Ma200Slope => "MA200 slope",
            MetricKey::Dist52wHigh => "Distance to 52w high",
            MetricKey::Dist52wLow => "Distance to 52w low",
            MetricKey::Mdd1w => "MDD 1w",
            MetricKey::Mdd1m => "MDD 1m",
            MetricKey::Mdd3m => "MDD 3m",
            MetricKey::Mdd6m => "MDD 6m",
            MetricKey::Mdd12m => "MDD 12m",
            MetricKey::As1wPrank => "AS 1w (p-rank)",
            MetricKey::As1mPrank => "AS 1m (p-rank)",
            MetricKey::As3mPrank => "AS 3m (p-rank)",
            MetricKey::As6mPrank => "AS 6m (p-rank)",
            MetricKey::As12mPrank => "AS 12m (p-rank)",
            MetricKey::SortinoAs1wPrank => "Sortino-AS 1w (p-rank)",
            MetricKey::SortinoAs1mPrank => "Sortino-AS 1m (p-rank)",
            MetricKey::SortinoAs3mPrank => "Sortino-AS 3m (p-rank)",
            MetricKey::SortinoAs6mPrank => "Sortino-AS 6m (p-rank)",
            MetricKey::SortinoAs12mPrank => "Sortino-AS 12m (p-rank)",
        }
    }
}

impl FromStr for MetricKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SortKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// The persisted item order; never re-sorted.
    #[default]
    Saved,
    Ticker,
    Metric(MetricKey),
}

impl SortKey {
    /// Every recognized key: `saved`, `ticker`, then the 27 metric keys.
    pub fn all() -> Vec<SortKey> {
        let mut keys = vec![SortKey::Saved, SortKey::Ticker];
        keys.extend(MetricKey::ALL.iter().copied().map(SortKey::Metric));
        keys
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Saved => "saved",
            SortKey::Ticker => "ticker",
            SortKey::Metric(m) => m.as_str(),
        }
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(SortKey::Saved),
            "ticker" => Ok(SortKey::Ticker),
            other => other.parse::<MetricKey>().map(SortKey::Metric),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown sort key: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// SortSpec
// ---------------------------------------------------------------------------

/// A watchlist's ordering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Build a spec. The saved order has no direction, so it is always
    /// stored as `desc`.
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        let direction = if key == SortKey::Saved {
            SortDirection::Desc
        } else {
            direction
        };
        Self { key, direction }
    }

    /// Serialize to the persisted `"<key>_<direction>"` form (`"saved"` alone
    /// for the saved order).
    pub fn encode(&self) -> String {
        match self.key {
            SortKey::Saved => "saved".to_string(),
            key => format!("{}_{}", key.as_str(), self.direction.as_str()),
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decode a persisted default-sort string.
///
/// A trailing `_asc` / `_desc` token is the direction and everything before
/// it is the key; without one the whole string is the key and the direction
/// is `desc`. Absent, empty, or unrecognized values yield the saved order.
pub fn parse_default_sort(value: Option<&str>) -> SortSpec {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return SortSpec::default(),
    };

    let (key_str, direction) = match value.rsplit_once('_') {
        Some((head, tail)) => match SortDirection::parse(tail) {
            Some(direction) => (head, direction),
            None => (value, SortDirection::Desc),
        },
        None => (value, SortDirection::Desc),
    };

    match key_str.parse::<SortKey>() {
        Ok(key) => SortSpec::new(key, direction),
        Err(()) => SortSpec::default(),
    }
}

// ---------------------------------------------------------------------------
// Metric lookup
// ---------------------------------------------------------------------------

/// Resolves a metric value for a ticker. Missing rows and null fields are
/// both `None`.
pub trait MetricLookup {
    fn metric(&self, ticker: &str, key: MetricKey) -> Option<f64>;
}

impl MetricLookup for HashMap<String, MetricsRow> {
    fn metric(&self, ticker: &str, key: MetricKey) -> Option<f64> {
        self.get(ticker).and_then(|row| row.value(key))
    }
}

impl MetricLookup for BTreeMap<String, MetricsRow> {
    fn metric(&self, ticker: &str, key: MetricKey) -> Option<f64> {
        self.get(ticker).and_then(|row| row.value(key))
    }
}

/// Index metrics rows by symbol for use with [`sort_items`].
pub fn metrics_by_symbol<I>(rows: I) -> HashMap<String, MetricsRow>
where
    I: IntoIterator<Item = MetricsRow>,
{
    rows.into_iter().map(|r| (r.symbol.clone(), r)).collect()
}

// ---------------------------------------------------------------------------
// sort_items
// ---------------------------------------------------------------------------

fn compare_tickers(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Order watchlist items for display.
///
/// - `Saved` returns the items unchanged.
/// - `Ticker` compares tickers case-insensitively; `desc` reverses.
/// - A metric key compares metric values; missing or non-finite values sort
///   last in both directions, and equal values fall back to ticker ascending.
///
/// The result is always a permutation of `items`. The sort is stable, so
/// items that still compare equal keep their saved relative order.
pub fn sort_items<L>(
    items: &[WatchlistItem],
    key: SortKey,
    direction: SortDirection,
    metrics: &L,
) -> Vec<WatchlistItem>
where
    L: MetricLookup + ?Sized,
{
    let mut out = items.to_vec();

    match key {
        SortKey::Saved => {}
        SortKey::Ticker => {
            out.sort_by(|a, b| {
                let cmp = compare_tickers(&a.ticker, &b.ticker);
                match direction {
                    SortDirection::Asc => cmp,
                    SortDirection::Desc => cmp.reverse(),
                }
            });
        }
        SortKey::Metric(metric) => {
            let missing = match direction {
                SortDirection::Asc => f64::INFINITY,
                SortDirection::Desc => f64::NEG_INFINITY,
            };
            let resolve = |item: &WatchlistItem| {
                metrics
                    .metric(&item.ticker, metric)
                    .filter(|v| !v.is_nan())
                    .unwrap_or(missing)
            };

            let mut keyed: Vec<(f64, WatchlistItem)> =
                out.into_iter().map(|item| (resolve(&item), item)).collect();
            keyed.sort_by(|(va, a), (vb, b)| {
                // NaN is filtered above; -0.0 and 0.0 compare equal here.
                let primary = match direction {
                    SortDirection::Asc => va.partial_cmp(vb),
                    SortDirection::Desc => vb.partial_cmp(va),
                }
                .unwrap_or(Ordering::Equal);
                primary.then_with(|| compare_tickers(&a.ticker, &b.ticker))
            });
            out = keyed.into_iter().map(|(_, item)| item).collect();
        }
    }

    out
}

/// Convenience wrapper taking a [`SortSpec`].
pub fn sort_by_spec<L>(items: &[WatchlistItem], spec: SortSpec, metrics: &L) -> Vec<WatchlistItem>
where
    L: MetricLookup + ?Sized,
{
    sort_items(items, spec.key, spec.direction, metrics)
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Label used for items without a subcategory.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Items sharing one subcategory label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemGroup {
    pub subcategory: String,
    pub items: Vec<WatchlistItem>,
}

/// Group items by subcategory. Groups appear in order of first occurrence
/// and items keep their input order within each group.
pub fn group_by_subcategory(items: &[WatchlistItem]) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let label = item
            .subcategory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        match index.get(&label) {
            Some(&i) => groups[i].items.push(item.clone()),
            None => {
                index.insert(label.clone(), groups.len());
                groups.push(ItemGroup {
                    subcategory: label,
                    items: vec![item.clone()],
                });
            }
        }
    }

    groups
}
