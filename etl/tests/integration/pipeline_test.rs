use config::shared::PipelineConfig;
use etl::error::ErrorKind;
use etl::pipeline::Pipeline;
use etl::resample::{Aggregations, Resampler};
use etl::source::memory::MemorySource;
use etl::store::memory::MemoryStore;
use etl::test_utils::fault_store::{FaultConfig, FaultInjectingStore, FaultType};
use etl::test_utils::fixtures::{
    TEST_DATE, at, full_day, sparse_morning, test_date, wind_observation,
};
use etl::types::signal_name;
use telemetry::init_test_tracing;

fn create_pipeline<St>(source: MemorySource, store: St) -> Pipeline<MemorySource, St>
where
    St: etl::store::AggregateStore,
{
    Pipeline::new(PipelineConfig::default(), source, store).unwrap()
}

#[tokio::test]
async fn sparse_day_produces_a_single_window() {
    init_test_tracing();
    let date = test_date();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(MemorySource::new(sparse_morning(date)), store.clone());

    let summary = pipeline.run(TEST_DATE).await.unwrap();

    assert_eq!(summary.observations, 144);
    assert_eq!(summary.windows, 1);
    assert_eq!(summary.signals, 8);
    assert_eq!(summary.load.written, 8);

    let aggregates = store.aggregates().await;
    assert_eq!(aggregates.len(), 8);
    assert!(aggregates.iter().all(|point| point.timestamp == at(date, 0, 0, 0)));

    let signals = store.signals().await;
    let value = |name: &str| {
        let signal_id = signals[name];
        aggregates
            .iter()
            .find(|point| point.signal_id == signal_id)
            .map(|point| point.value)
    };
    assert_eq!(value("wind_speed_mean"), Some(14.5));
    assert_eq!(value("wind_speed_min"), Some(10.0));
    assert_eq!(value("wind_speed_max"), Some(19.0));
    assert_eq!(value("power_mean"), Some(122.5));
    let std = value("wind_speed_std").unwrap();
    assert!((std - 3.027_650_354_1).abs() < 1e-9);
}

#[tokio::test]
async fn running_twice_is_idempotent() {
    init_test_tracing();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(MemorySource::new(full_day(test_date())), store.clone());

    let first = pipeline.run(TEST_DATE).await.unwrap();
    let after_first = store.aggregates().await;
    let second = pipeline.run(TEST_DATE).await.unwrap();

    assert_eq!(first.windows, 144);
    assert_eq!(first.load.written, 144 * 8);
    assert_eq!(second.load.written, 0);
    assert_eq!(second.load.skipped_existing, 144 * 8);
    assert_eq!(store.aggregates().await, after_first);
    assert_eq!(store.signals().await.len(), 8);
    assert_eq!(store.insert_calls().await, 1);
}

#[tokio::test]
async fn stored_values_survive_a_changed_source() {
    init_test_tracing();
    let date = test_date();
    let store = MemoryStore::new();
    let original = vec![
        wind_observation(at(date, 10, 0, 0), 10.0, 100.0),
        wind_observation(at(date, 10, 5, 0), 12.0, 110.0),
    ];
    create_pipeline(MemorySource::new(original), store.clone())
        .run(TEST_DATE)
        .await
        .unwrap();
    let before = store.aggregates().await;

    let revised = vec![
        wind_observation(at(date, 10, 0, 0), 50.0, 500.0),
        wind_observation(at(date, 10, 5, 0), 60.0, 600.0),
        wind_observation(at(date, 10, 10, 0), 70.0, 700.0),
    ];
    let summary = create_pipeline(MemorySource::new(revised), store.clone())
        .run(TEST_DATE)
        .await
        .unwrap();

    // Only the new 10:10 window is written, its single point yields no std.
    assert_eq!(summary.load.written, 6);
    let after = store.aggregates().await;
    for point in &before {
        assert!(after.contains(point));
    }
    assert_eq!(after.len(), before.len() + 6);
}

#[tokio::test]
async fn malformed_dates_fail_before_any_io() {
    init_test_tracing();
    let source = MemorySource::new(full_day(test_date()));
    let store = FaultInjectingStore::wrap(
        MemoryStore::new(),
        FaultConfig {
            load_signals: Some(FaultType::Panic),
            create_signal: Some(FaultType::Panic),
            aggregate_exists: Some(FaultType::Panic),
            insert_aggregates: Some(FaultType::Panic),
        },
    );
    let pipeline = create_pipeline(source.clone(), store);

    for input in [
        "2024-1-5",
        "15-01-2024",
        "2024-02-30",
        "2024-01-15T00:00:00",
        "",
        "yesterday",
        "+262142-12-31",
    ] {
        let err = pipeline.run(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPartitionDate, "input {input:?}");
    }

    assert!(source.fetches().await.is_empty());
}

#[tokio::test]
async fn day_without_observations_is_no_data() {
    init_test_tracing();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(MemorySource::new(full_day(test_date())), store.clone());

    let err = pipeline.run("2024-01-16").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceNoData);
    assert_eq!(err.description(), "No data returned from source");
    assert!(store.signals().await.is_empty());
    assert_eq!(store.insert_calls().await, 0);
}

#[tokio::test]
async fn failed_batch_write_is_returned_unchanged() {
    init_test_tracing();
    let store = FaultInjectingStore::wrap(
        MemoryStore::new(),
        FaultConfig {
            insert_aggregates: Some(FaultType::Error(ErrorKind::DestinationConstraintViolation)),
            ..Default::default()
        },
    );
    let pipeline = create_pipeline(MemorySource::new(sparse_morning(test_date())), store.clone());

    let err = pipeline.run(TEST_DATE).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationConstraintViolation);
    assert!(store.get_inner().aggregates().await.is_empty());
    assert_eq!(store.get_inner().signals().await.len(), 8);
}

#[tokio::test]
async fn rerun_after_a_failed_run_completes_the_day() {
    init_test_tracing();
    let source = MemorySource::new(full_day(test_date()));
    let store = MemoryStore::new();
    let faulty = FaultInjectingStore::wrap(
        store.clone(),
        FaultConfig {
            insert_aggregates: Some(FaultType::Error(ErrorKind::DestinationConnectionFailed)),
            ..Default::default()
        },
    );

    let err = create_pipeline(source.clone(), faulty)
        .run(TEST_DATE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationConnectionFailed);

    let summary = create_pipeline(source, store.clone())
        .run(TEST_DATE)
        .await
        .unwrap();

    assert_eq!(summary.load.written, 144 * 8);
    assert_eq!(store.aggregates().await.len(), 144 * 8);
    assert_eq!(store.signals().await.len(), 8);
}

#[tokio::test]
async fn unknown_aggregation_is_rejected_at_construction() {
    let config = PipelineConfig {
        aggregations: vec!["mean".to_string(), "p99".to_string()],
        ..PipelineConfig::default()
    };

    let err = Pipeline::new(config, MemorySource::default(), MemoryStore::new()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}

#[tokio::test]
async fn custom_aggregations_become_signals() {
    init_test_tracing();
    let date = test_date();
    let mut aggregations = Aggregations::standard();
    aggregations.register("range", |values: &[f64]| {
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        Some(max - min)
    });
    let resampler = Resampler::new(
        chrono::TimeDelta::minutes(10),
        vec!["power".to_string()],
        aggregations,
    )
    .unwrap();
    let store = MemoryStore::new();
    let source = MemorySource::new(vec![
        wind_observation(at(date, 0, 0, 0), 1.0, 100.0),
        wind_observation(at(date, 0, 3, 0), 2.0, 140.0),
    ]);
    let pipeline = Pipeline::with_resampler(resampler, source, store.clone());

    let summary = pipeline.run(TEST_DATE).await.unwrap();

    assert_eq!(summary.signals, 5);
    let signals = store.signals().await;
    let range_id = signals[&signal_name("power", "range")];
    assert_eq!(store.get_aggregate(at(date, 0, 0, 0), range_id).await, Some(40.0));
    assert!(!signals.contains_key("wind_speed_mean"));
}
