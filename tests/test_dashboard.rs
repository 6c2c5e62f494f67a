//! Dashboard facade tests: builder, sorted watchlists and chart series.

mod common;

use stockwatch::config::DEFAULT_MCCLELLAN_WINDOW;
use stockwatch::models::NewWatchlist;
use stockwatch::{Dashboard, MetricKey, SortDirection, SortKey, SortSpec, StockwatchError, Store};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn in_memory_dashboard_has_every_store() {
    let dash = Dashboard::builder().in_memory(true).build().unwrap();
    assert_eq!(
        dash.stores(),
        vec!["app", "breadth", "metrics", "stocks", "stocks_lists"]
    );
    assert!(dash.watchlists().list().unwrap().is_empty());
    assert_eq!(
        dash.to_string(),
        "Dashboard(stores=[app, breadth, metrics, stocks, stocks_lists])"
    );
}

#[test]
fn missing_pipeline_stores_are_skipped_unless_strict() {
    let tmp = tempfile::tempdir().unwrap();

    let dash = Dashboard::builder()
        .data_dir(tmp.path())
        .store_path(Store::App, tmp.path().join("app.duckdb"))
        .build()
        .unwrap();
    assert_eq!(dash.stores(), vec!["app"]);
    assert!(matches!(
        dash.metrics().latest_date().unwrap_err(),
        StockwatchError::NotFound(_)
    ));

    let err = Dashboard::builder()
        .data_dir(tmp.path())
        .store_path(Store::App, tmp.path().join("app2.duckdb"))
        .strict(true)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, StockwatchError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// sorted_watchlist
// ---------------------------------------------------------------------------

#[test]
fn sorted_watchlist_uses_stored_default_sort() {
    let dash = common::setup_sample_dashboard();
    let view = dash.sorted_watchlist(1, None).unwrap().unwrap();

    // return_21d_desc: NVDA 0.30, AAPL 0.12, MSFT 0.05, GOOG missing
    let t: Vec<&str> = view.items.iter().map(|i| i.ticker.as_str()).collect();
    assert_eq!(t, vec!["NVDA", "AAPL", "MSFT", "GOOG"]);
    assert_eq!(view.sort_key, "return_21d_desc");
    assert!(view.groups.is_none());
}

#[test]
fn sorted_watchlist_honours_override() {
    let dash = common::setup_sample_dashboard();

    let asc = SortSpec::new(SortKey::Metric(MetricKey::As1mPrank), SortDirection::Asc);
    let view = dash.sorted_watchlist(1, Some(asc)).unwrap().unwrap();
    let t: Vec<&str> = view.items.iter().map(|i| i.ticker.as_str()).collect();
    assert_eq!(t, vec!["MSFT", "GOOG", "AAPL", "NVDA"]);

    let saved = dash
        .sorted_watchlist(1, Some(SortSpec::default()))
        .unwrap()
        .unwrap();
    let t: Vec<&str> = saved.items.iter().map(|i| i.ticker.as_str()).collect();
    assert_eq!(t, vec!["MSFT", "AAPL", "GOOG", "NVDA"]);
}

#[test]
fn grouped_watchlist_includes_groups_in_sorted_order() {
    let dash = common::setup_sample_dashboard();
    let spec = SortSpec::new(SortKey::Ticker, SortDirection::Asc);
    let view = dash.sorted_watchlist(2, Some(spec)).unwrap().unwrap();

    let groups = view.groups.unwrap();
    let labels: Vec<&str> = groups.iter().map(|g| g.subcategory.as_str()).collect();
    assert_eq!(labels, vec!["Majors", "Uncategorized"]);
    let majors: Vec<&str> = groups[0].items.iter().map(|i| i.ticker.as_str()).collect();
    assert_eq!(majors, vec!["CVX", "XOM"]);
}

#[test]
fn metric_sort_without_metrics_store_keeps_every_item() {
    let tmp = tempfile::tempdir().unwrap();
    let dash = Dashboard::builder()
        .data_dir(tmp.path())
        .store_path(Store::App, tmp.path().join("app.duckdb"))
        .build()
        .unwrap();

    let list = dash
        .watchlists()
        .create(&NewWatchlist {
            title: "Offline".into(),
            default_sort: Some("return_21d_desc".into()),
            ..Default::default()
        })
        .unwrap();
    dash.watchlists().add_items(list.id, "nvda msft aapl", None).unwrap();

    let view = dash.sorted_watchlist(list.id, None).unwrap().unwrap();
    let t: Vec<&str> = view.items.iter().map(|i| i.ticker.as_str()).collect();
    assert_eq!(t, vec!["AAPL", "MSFT", "NVDA"]);
    assert_eq!(view.sort_key, "return_21d_desc");
}

#[test]
fn sorted_watchlist_of_unknown_id_is_none() {
    let dash = common::setup_sample_dashboard();
    assert!(dash.sorted_watchlist(404, None).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

#[test]
fn price_chart_applies_stored_overlays() {
    let dash = common::setup_sample_dashboard();
    dash.settings()
        .set_chart_ma_config(&serde_json::json!({
            "lines": [
                { "type": "sma", "length": 2, "color": "#111111" },
                { "type": "ema", "length": 3, "color": "#222222", "visible": false }
            ]
        }))
        .unwrap();

    let chart = dash.price_chart("aapl", 10_000).unwrap();
    assert_eq!(chart.ticker, "AAPL");
    assert_eq!(chart.bars.len(), 6);
    assert_eq!(chart.overlays.len(), 1);

    let sma = &chart.overlays[0];
    assert_eq!(sma.id, "sma2");
    // closes 10, 11, 12, 13, 14 (the bar without a close is skipped)
    let values: Vec<f64> = sma.points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![10.5, 11.5, 12.5, 13.5]);
    assert_eq!(sma.points[0].time, "2024-01-03");
}

#[test]
fn price_chart_rejects_bad_lookback() {
    let dash = common::setup_sample_dashboard();
    assert!(matches!(
        dash.price_chart("AAPL", 0).unwrap_err(),
        StockwatchError::InvalidArgument(_)
    ));
}

#[test]
fn mcclellan_chart_windows_after_summing() {
    let dash = common::setup_sample_dashboard();
    let chart = dash.mcclellan_chart(1, 2).unwrap();

    assert_eq!(chart.total_points, 3);
    assert_eq!(chart.dates, vec!["2024-06-27", "2024-06-28"]);
    assert_eq!(chart.mcclellan, vec![-3.0, 2.0]);
    assert_eq!(chart.summation, vec![2.0, 4.0]);
    assert_eq!(chart.ma10, vec![3.5, 11.0 / 3.0]);
}

#[test]
fn mcclellan_chart_clamps_window() {
    let dash = common::setup_sample_dashboard();

    let full = dash.mcclellan_chart(1, 500).unwrap();
    assert_eq!(full.summation, vec![5.0, 2.0, 4.0]);

    let one = dash.mcclellan_chart(1, 0).unwrap();
    assert_eq!(one.summation, vec![4.0]);

    let default = dash.mcclellan_chart(1, DEFAULT_MCCLELLAN_WINDOW).unwrap();
    assert_eq!(DEFAULT_MCCLELLAN_WINDOW, 200);
    assert_eq!(default.summation, vec![5.0, 2.0, 4.0]);

    let none = dash.mcclellan_chart(3, DEFAULT_MCCLELLAN_WINDOW).unwrap();
    assert_eq!(none.total_points, 0);
    assert!(none.dates.is_empty());
}
