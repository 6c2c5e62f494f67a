//! Chart overlay math: moving averages over close prices, the cumulative
//! summation index with its trailing 10-period mean, windowing, and breadth
//! ratios.
//!
//! Every function recomputes from scratch over the slice it is given. Inputs
//! are assumed clean (finite values, ordered by time); filtering gaps is the
//! caller's job.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::models::{BreadthMetric, BreadthRow, OhlcBar};

/// Period of the moving average drawn over the summation index.
pub const SUMMATION_MA_PERIOD: usize = 10;

// ---------------------------------------------------------------------------
// Point types
// ---------------------------------------------------------------------------

/// A close price at an opaque, caller-ordered time key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint<T> {
    pub time: T,
    pub close: f64,
}

impl<T> PricePoint<T> {
    pub fn new(time: T, close: f64) -> Self {
        Self { time, close }
    }
}

/// One value of a derived overlay line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPoint<T> {
    pub time: T,
    pub value: f64,
}

/// Moving-average flavour of an overlay line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Ema,
    Sma,
}

impl MaType {
    /// `sma` selects the simple average; anything else is an EMA.
    pub fn parse_lenient(s: &str) -> Self {
        if s == "sma" {
            MaType::Sma
        } else {
            MaType::Ema
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaType::Ema => "ema",
            MaType::Sma => "sma",
        }
    }
}

/// Convert OHLC bars to close points, skipping bars without a finite close.
pub fn close_points(bars: &[OhlcBar]) -> Vec<PricePoint<String>> {
    bars.iter()
        .filter_map(|b| {
            b.close
                .filter(|c| c.is_finite())
                .map(|c| PricePoint::new(b.time.clone(), c))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Moving averages
// ---------------------------------------------------------------------------

/// Exponential moving average with `k = 2 / (length + 1)`.
///
/// Seeded with the first close, so the output has one point per input
/// point. Returns an empty vector when `length` is zero or `points` is empty.
pub fn compute_ema<T: Clone>(points: &[PricePoint<T>], length: usize) -> Vec<OverlayPoint<T>> {
    if length == 0 || points.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (length as f64 + 1.0);
    let mut out = Vec::with_capacity(points.len());
    let mut ema: Option<f64> = None;

    for p in points {
        let next = match ema {
            None => p.close,
            Some(prev) => p.close * k + prev * (1.0 - k),
        };
        ema = Some(next);
        out.push(OverlayPoint {
            time: p.time.clone(),
            value: next,
        });
    }

    out
}

/// Trailing simple moving average over `length` closes.
///
/// No point is emitted until the window is full, so the output has
/// `max(0, n - length + 1)` points. Maintained with a running sum.
pub fn compute_sma<T: Clone>(points: &[PricePoint<T>], length: usize) -> Vec<OverlayPoint<T>> {
    if length == 0 || length > points.len() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(points.len() - length + 1);
    let mut window: VecDeque<f64> = VecDeque::with_capacity(length);
    let mut sum = 0.0;

    for p in points {
        sum += p.close;
        window.push_back(p.close);

        if window.len() > length {
            if let Some(evicted) = window.pop_front() {
                sum -= evicted;
            }
        }

        if window.len() == length {
            out.push(OverlayPoint {
                time: p.time.clone(),
                value: sum / length as f64,
            });
        }
    }

    out
}

/// Dispatch on [`MaType`].
pub fn compute_ma<T: Clone>(
    points: &[PricePoint<T>],
    length: usize,
    ma_type: MaType,
) -> Vec<OverlayPoint<T>> {
    match ma_type {
        MaType::Sma => compute_sma(points, length),
        MaType::Ema => compute_ema(points, length),
    }
}

// ---------------------------------------------------------------------------
// Summation index
// ---------------------------------------------------------------------------

/// Running total of an oscillator series.
pub fn summation_index(oscillator: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    oscillator
        .iter()
        .map(|v| {
            total += v;
            total
        })
        .collect()
}

/// Trailing mean with a growing window: point `i` averages
/// `values[max(0, i + 1 - period) ..= i]`. Same length as the input.
pub fn trailing_mean(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        let count = (i + 1).min(period);
        out.push(sum / count as f64);
    }

    out
}

/// Summation index and its trailing 10-period mean, computed over the full
/// oscillator history.
///
/// The summation is path-dependent, so it must be computed before any
/// windowing; use [`SummationSeries::window`] to slice for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummationSeries {
    pub summation: Vec<f64>,
    pub ma10: Vec<f64>,
}

impl SummationSeries {
    pub fn compute(oscillator: &[f64]) -> Self {
        let summation = summation_index(oscillator);
        let ma10 = trailing_mean(&summation, SUMMATION_MA_PERIOD);
        Self { summation, ma10 }
    }

    pub fn len(&self) -> usize {
        self.summation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summation.is_empty()
    }

    /// The last `n` points of both series (see [`tail_window`] for clamping).
    pub fn window(&self, n: usize) -> SummationSeries {
        SummationSeries {
            summation: tail_window(&self.summation, n).to_vec(),
            ma10: tail_window(&self.ma10, n).to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Windowing and breadth transforms
// ---------------------------------------------------------------------------

/// The last `n` elements of `values`, with `n` clamped to `[1, len]`.
/// Empty input yields an empty slice.
pub fn tail_window<T>(values: &[T], n: usize) -> &[T] {
    if values.is_empty() {
        return values;
    }
    let n = n.clamp(1, values.len());
    &values[values.len() - n..]
}

/// `count / total * 100`, or 0 when the total is not positive.
pub fn percent_of_total(count: i64, total: i64) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// A dated value derived from a breadth row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

/// Share of the group total for one breadth count, per day. Null counts
/// are treated as zero.
pub fn breadth_percent_series(rows: &[BreadthRow], metric: BreadthMetric) -> Vec<DatedValue> {
    rows.iter()
        .map(|r| DatedValue {
            date: r.date.clone(),
            value: percent_of_total(r.count(metric).unwrap_or(0), r.total),
        })
        .collect()
}

/// Advances, declines (negated for plotting below zero) and the net A-D
/// value for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdPoint {
    pub date: String,
    pub adv: i64,
    pub dec: i64,
    pub net: i64,
}

pub fn ad_line(rows: &[BreadthRow]) -> Vec<AdPoint> {
    rows.iter()
        .map(|r| {
            let adv = r.adv.unwrap_or(0);
            let dec = r.dec.unwrap_or(0);
            AdPoint {
                date: r.date.clone(),
                adv,
                dec: -dec,
                net: adv - dec,
            }
        })
        .collect()
}
