//! Indicator engine tests: moving averages, summation index, windowing and
//! breadth transforms.

use stockwatch::indicators::{
    ad_line, breadth_percent_series, close_points, compute_ema, compute_ma, compute_sma,
    percent_of_total, summation_index, tail_window, trailing_mean, MaType, PricePoint,
    SummationSeries,
};
use stockwatch::models::{BreadthMetric, BreadthRow, OhlcBar};

fn points(closes: &[f64]) -> Vec<PricePoint<i64>> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| PricePoint::new(i as i64 + 1, *c))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ---------------------------------------------------------------------------
// EMA
// ---------------------------------------------------------------------------

#[test]
fn ema_is_seeded_with_first_close() {
    let ema = compute_ema(&points(&[10.0, 20.0]), 2);

    assert_eq!(ema.len(), 2);
    assert_eq!(ema[0].time, 1);
    assert_eq!(ema[0].value, 10.0);
    assert_eq!(ema[1].time, 2);
    assert_close(ema[1].value, 20.0 * (2.0 / 3.0) + 10.0 * (1.0 / 3.0));
}

#[test]
fn ema_of_constant_series_is_constant() {
    let ema = compute_ema(&points(&[7.0; 30]), 10);
    assert_eq!(ema.len(), 30);
    for p in &ema {
        assert_close(p.value, 7.0);
    }
}

#[test]
fn ema_with_zero_length_or_no_points_is_empty() {
    assert!(compute_ema(&points(&[1.0, 2.0]), 0).is_empty());
    assert!(compute_ema::<i64>(&[], 20).is_empty());
}

#[test]
fn ema_longer_than_series_still_emits_every_point() {
    let ema = compute_ema(&points(&[1.0, 2.0, 3.0]), 200);
    assert_eq!(ema.len(), 3);
}

// ---------------------------------------------------------------------------
// SMA
// ---------------------------------------------------------------------------

#[test]
fn sma_emits_only_after_warm_up() {
    let sma = compute_sma(&points(&[1.0, 2.0, 3.0]), 2);

    assert_eq!(sma.len(), 2);
    assert_eq!(sma[0].time, 2);
    assert_close(sma[0].value, 1.5);
    assert_eq!(sma[1].time, 3);
    assert_close(sma[1].value, 2.5);
}

#[test]
fn sma_longer_than_series_is_empty() {
    assert!(compute_sma(&points(&[1.0, 2.0, 3.0]), 4).is_empty());
    assert!(compute_sma(&points(&[1.0, 2.0]), 0).is_empty());
}

#[test]
fn huge_lengths_yield_empty_sma_and_full_ema() {
    let pts = points(&[1.0, 2.0, 3.0]);
    assert!(compute_sma(&pts, 1_000_000_000_000).is_empty());
    assert!(compute_sma(&pts, usize::MAX).is_empty());

    let ema = compute_ema(&pts, usize::MAX);
    assert_eq!(ema.len(), 3);
    assert_close(ema[0].value, 1.0);
}

#[test]
fn sma_of_length_one_is_the_series() {
    let sma = compute_sma(&points(&[4.0, 8.0, 6.0]), 1);
    let values: Vec<f64> = sma.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![4.0, 8.0, 6.0]);
}

#[test]
fn compute_ma_dispatches_on_type() {
    let pts = points(&[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(compute_ma(&pts, 3, MaType::Sma), compute_sma(&pts, 3));
    assert_eq!(compute_ma(&pts, 3, MaType::Ema), compute_ema(&pts, 3));
}

#[test]
fn close_points_skip_bars_without_close() {
    let bars = vec![
        OhlcBar {
            time: "2024-01-02".into(),
            open: Some(1.0),
            high: Some(2.0),
            low: Some(0.5),
            close: Some(1.5),
            volume: Some(100.0),
        },
        OhlcBar {
            time: "2024-01-03".into(),
            open: Some(1.5),
            high: None,
            low: None,
            close: None,
            volume: None,
        },
        OhlcBar {
            time: "2024-01-04".into(),
            open: None,
            high: None,
            low: None,
            close: Some(f64::NAN),
            volume: None,
        },
    ];

    let pts = close_points(&bars);
    assert_eq!(pts, vec![PricePoint::new("2024-01-02".to_string(), 1.5)]);
}

// ---------------------------------------------------------------------------
// Summation index
// ---------------------------------------------------------------------------

#[test]
fn summation_is_computed_before_windowing() {
    let series = SummationSeries::compute(&[5.0, -3.0, 2.0]);
    assert_eq!(series.summation, vec![5.0, 2.0, 4.0]);

    let windowed = series.window(2);
    assert_eq!(windowed.summation, vec![2.0, 4.0]);

    // Re-seeding from the window would give a different answer.
    assert_ne!(windowed.summation, summation_index(&[-3.0, 2.0]));
}

#[test]
fn ma10_covers_every_summation_point() {
    let series = SummationSeries::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);

    assert_eq!(series.len(), 5);
    assert_eq!(series.ma10.len(), 5);
    assert_eq!(series.ma10[0], series.summation[0]);
    // summation = 1, 3, 6, 10, 15
    assert_close(series.ma10[4], (1.0 + 3.0 + 6.0 + 10.0 + 15.0) / 5.0);
}

#[test]
fn trailing_mean_uses_growing_then_fixed_window() {
    let values: Vec<f64> = (1..=12).map(|v| v as f64).collect();
    let mean = trailing_mean(&values, 10);

    assert_eq!(mean.len(), 12);
    assert_close(mean[0], 1.0);
    assert_close(mean[1], 1.5);
    assert_close(mean[9], 5.5);
    // values 3..=12
    assert_close(mean[11], 7.5);
}

#[test]
fn empty_oscillator_gives_empty_series() {
    let series = SummationSeries::compute(&[]);
    assert!(series.is_empty());
    assert!(series.window(50).is_empty());
}

// ---------------------------------------------------------------------------
// Windowing
// ---------------------------------------------------------------------------

#[test]
fn tail_window_clamps_to_available_range() {
    let v = [1, 2, 3, 4];
    assert_eq!(tail_window(&v, 2), &[3, 4]);
    assert_eq!(tail_window(&v, 10), &[1, 2, 3, 4]);
    assert_eq!(tail_window(&v, 0), &[4]);
    assert!(tail_window::<i32>(&[], 3).is_empty());
}

// ---------------------------------------------------------------------------
// Breadth transforms
// ---------------------------------------------------------------------------

fn breadth(date: &str, total: i64, adv: Option<i64>, dec: Option<i64>) -> BreadthRow {
    BreadthRow {
        date: date.to_string(),
        total,
        adv,
        dec,
        new_high52w: None,
        new_low52w: None,
        above_ma5: None,
        above_ma10: None,
        above_ma20: None,
        above_ma50: None,
        above_ma200: None,
        spike_up: None,
        spike_down: None,
        mcclellan: None,
    }
}

#[test]
fn percent_of_total_handles_zero_total() {
    assert_close(percent_of_total(25, 200), 12.5);
    assert_eq!(percent_of_total(5, 0), 0.0);
}

#[test]
fn breadth_percent_series_divides_by_total() {
    let rows = vec![
        breadth("2024-06-27", 400, Some(100), Some(300)),
        breadth("2024-06-28", 0, Some(0), Some(0)),
        breadth("2024-06-29", 50, None, None),
    ];

    let series = breadth_percent_series(&rows, BreadthMetric::Adv);
    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![25.0, 0.0, 0.0]);
    assert_eq!(series[0].date, "2024-06-27");
}

#[test]
fn ad_line_negates_declines() {
    let rows = vec![breadth("2024-06-28", 500, Some(300), Some(200))];
    let ad = ad_line(&rows);

    assert_eq!(ad[0].adv, 300);
    assert_eq!(ad[0].dec, -200);
    assert_eq!(ad[0].net, 100);
}
