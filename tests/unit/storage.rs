use crate::{row, sample_trades, storage_settings, StubBackend};
use iron_bank::query::AggregateKind;
use iron_bank::{FetchOutcome, SaveOutcome, TradeStorage};
use std::sync::Arc;

#[tokio::test]
async fn test_save_then_fetch_through_one_adapter() {
    let backend = Arc::new(StubBackend {
        sum_rows: vec![row(60_000, "buy", 2.0), row(60_000, "sell", 1.0)],
        count_rows: vec![row(60_000, "side", 3.0)],
        median_rows: vec![row(60_000, "price", 100.4)],
        ..StubBackend::default()
    });
    let storage = TradeStorage::with_backend(storage_settings(), backend.clone());
    assert!(storage.is_connected());

    assert_eq!(
        storage.save(&sample_trades()).await,
        SaveOutcome::Written { points: 3 }
    );

    let ticks = match storage.fetch(0, 120_000, None).await {
        FetchOutcome::Ticks(ticks) => ticks,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let series: Vec<AggregateKind> = ticks.iter().map(|t| t.series).collect();
    assert_eq!(
        series,
        vec![
            AggregateKind::Sum,
            AggregateKind::Sum,
            AggregateKind::Count,
            AggregateKind::Median
        ]
    );
    assert_eq!(ticks[0].buy, Some(2.0));
    assert_eq!(ticks[1].sell, Some(1.0));
    assert_eq!(ticks[2].count, Some(3));
    assert_eq!(ticks[3].price, Some(100.4));

    let queries = backend.queries.lock().unwrap();
    assert!(queries
        .iter()
        .all(|q| q.flux.contains(r#"from(bucket: "test_bucket")"#)));
}

#[tokio::test]
async fn test_failures_never_surface_as_errors() {
    let backend = Arc::new(StubBackend::failing());
    let storage = TradeStorage::with_backend(storage_settings(), backend.clone());

    let saved = storage.save(&sample_trades()).await;
    assert!(!saved.is_persisted());
    assert!(matches!(saved, SaveOutcome::Dropped { points: 3, .. }));

    let fetched = storage.fetch(0, 60_000, Some(1_000)).await;
    assert!(!fetched.is_available());
    assert_eq!(fetched.ticks(), None);

    assert_eq!(backend.write_calls(), 1);
}

#[tokio::test]
async fn test_empty_range_is_not_unavailable() {
    let storage = TradeStorage::with_backend(storage_settings(), Arc::new(StubBackend::default()));

    let outcome = storage.fetch(0, 60_000, None).await;
    assert_eq!(outcome, FetchOutcome::Ticks(Vec::new()));
}

#[tokio::test]
async fn test_saved_points_carry_configured_pair() {
    let backend = Arc::new(StubBackend::default());
    let storage = TradeStorage::with_backend(storage_settings(), backend.clone());

    storage.save(&sample_trades()).await;
    storage.save(&[]).await;

    let writes = backend.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].iter().all(|p| p.pair == "BTCUSD"));
    assert_eq!(writes[0][2].exchange, "bitmex");
}
