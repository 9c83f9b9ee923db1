use etl::error::ErrorKind;
use etl::loader::{LoadSummary, load_aggregates};
use etl::registry::ensure_signals;
use etl::resample::Resampler;
use etl::store::AggregateStore;
use etl::store::memory::MemoryStore;
use etl::test_utils::fault_store::{FaultConfig, FaultInjectingStore, FaultType};
use etl::test_utils::fixtures::{at, test_date, wind_observation};
use etl::types::{AggregateDataPoint, AggregatedTable, RawTable};
use telemetry::init_test_tracing;

fn resampled_morning() -> AggregatedTable {
    let date = test_date();
    let raw = RawTable::new(vec![
        wind_observation(at(date, 6, 0, 0), 10.0, 100.0),
        wind_observation(at(date, 6, 4, 59), 11.0, 105.0),
        wind_observation(at(date, 6, 5, 0), 12.0, 110.0),
        wind_observation(at(date, 6, 9, 59), 13.0, 115.0),
    ])
    .unwrap();

    Resampler::from_config(&Default::default())
        .unwrap()
        .resample(&raw)
        .unwrap()
}

#[tokio::test]
async fn existing_pair_is_skipped_and_kept() {
    init_test_tracing();
    let date = test_date();
    let store = MemoryStore::new();
    let table = resampled_morning();
    let signals = ensure_signals(&store, &["wind_speed", "power"], &["mean", "min", "max", "std"])
        .await
        .unwrap();
    let wind_speed_mean = signals.resolve("wind_speed_mean").unwrap();
    store
        .insert_aggregates(vec![AggregateDataPoint {
            timestamp: at(date, 6, 0, 0),
            signal_id: wind_speed_mean,
            value: -1.0,
        }])
        .await
        .unwrap();

    let summary = load_aggregates(&store, &table, &signals).await.unwrap();

    assert_eq!(
        summary,
        LoadSummary {
            candidates: 8,
            skipped_existing: 1,
            staged: 7,
            written: 7,
        }
    );
    assert_eq!(
        store.get_aggregate(at(date, 6, 0, 0), wind_speed_mean).await,
        Some(-1.0)
    );
}

#[tokio::test]
async fn failed_existence_check_writes_nothing() {
    init_test_tracing();
    let inner = MemoryStore::new();
    let signals = ensure_signals(&inner, &["wind_speed", "power"], &["mean", "min", "max", "std"])
        .await
        .unwrap();
    let store = FaultInjectingStore::wrap(
        inner.clone(),
        FaultConfig {
            aggregate_exists: Some(FaultType::Error(ErrorKind::DestinationConnectionFailed)),
            ..Default::default()
        },
    );

    let err = load_aggregates(&store, &resampled_morning(), &signals)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationConnectionFailed);
    assert_eq!(inner.insert_calls().await, 0);
}
