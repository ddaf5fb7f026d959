use chrono::{Duration, FixedOffset, TimeZone};
use dipwatch_cache::mem::{MemBaselineStore, MemSubscriberSet};
use dipwatch_core::market::entity::Candle;
use dipwatch_core::market::window::Window;
use dipwatch_core::watch::port::{BaselineStore, SubscriberStore};
use std::sync::Arc;

fn window(ticker: &str, closes: &[f64]) -> Arc<Window> {
    let tz = FixedOffset::west_opt(4 * 3600).unwrap();
    let base = tz.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap();
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            time: base + Duration::days(i64::try_from(i).unwrap()),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect();
    Arc::new(Window::new(ticker, candles).unwrap())
}

#[test]
fn test_seed_only_first_sight() {
    let store = MemBaselineStore::new();
    let first = window("AAPL", &[100.0, 90.0]);
    let second = window("AAPL", &[100.0, 80.0]);

    assert!(store.seed(first.clone()));
    assert!(!store.seed(second));

    let baseline = store.baseline("AAPL").unwrap();
    assert!(Arc::ptr_eq(&baseline, &first));
}

#[test]
fn test_rearm_replaces_baseline() {
    let store = MemBaselineStore::new();
    store.seed(window("NFLX", &[100.0, 95.0]));
    let newer = window("NFLX", &[100.0, 92.0]);

    store.rearm(newer.clone());

    assert!(Arc::ptr_eq(&store.baseline("NFLX").unwrap(), &newer));
    assert_eq!(store.tickers(), vec!["NFLX".to_string()]);
}

#[test]
fn test_unknown_ticker_has_no_baseline_and_clear_empties() {
    let store = MemBaselineStore::new();
    assert!(store.baseline("ZZZ").is_none());

    store.seed(window("AAA", &[1.0]));
    store.seed(window("BBB", &[1.0]));
    let mut tickers = store.tickers();
    tickers.sort();
    assert_eq!(tickers, vec!["AAA", "BBB"]);

    store.clear();
    assert!(store.tickers().is_empty());
}

#[test]
fn test_subscribe_and_unsubscribe() {
    let subscribers = MemSubscriberSet::new();
    assert!(subscribers.is_empty());

    assert!(subscribers.subscribe(42));
    assert!(!subscribers.subscribe(42));
    assert!(subscribers.subscribe(7));
    assert_eq!(subscribers.len(), 2);

    assert!(subscribers.unsubscribe(42));
    assert!(!subscribers.unsubscribe(42));
    assert_eq!(subscribers.snapshot(), vec![7]);
}

#[tokio::test]
async fn test_concurrent_subscriptions() {
    let subscribers = Arc::new(MemSubscriberSet::new());

    let mut handles = Vec::new();
    for chat in 0..32_i64 {
        let subscribers = subscribers.clone();
        handles.push(tokio::spawn(async move {
            subscribers.subscribe(chat);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut snapshot = subscribers.snapshot();
    snapshot.sort();
    assert_eq!(snapshot, (0..32).collect::<Vec<_>>());
}
