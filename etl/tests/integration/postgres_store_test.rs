use config::shared::PipelineConfig;
use etl::error::ErrorKind;
use etl::pipeline::Pipeline;
use etl::source::memory::MemorySource;
use etl::store::AggregateStore;
use etl::test_utils::database::spawn_database;
use etl::test_utils::fixtures::{TEST_DATE, at, full_day, test_date};
use etl::types::{AggregateDataPoint, SignalId};
use sqlx::Row;
use telemetry::init_test_tracing;

async fn stored_rows(pool: &sqlx::PgPool) -> i64 {
    sqlx::query("select count(*) from data")
        .fetch_one(pool)
        .await
        .unwrap()
        .get(0)
}

#[tokio::test]
async fn create_signal_twice_returns_the_same_id() {
    init_test_tracing();
    let Some(database) = spawn_database().await else {
        return;
    };
    let store = database.store();

    let first = store.create_signal("power_mean").await.unwrap();
    let again = store.create_signal("power_mean").await.unwrap();
    let other = store.create_signal("power_max").await.unwrap();

    assert_eq!(first, again);
    assert_ne!(first, other);

    let signals = store.load_signals().await.unwrap();
    assert_eq!(signals.len(), 2);
    assert_eq!(signals.get("power_mean"), Some(&first));

    database.cleanup().await;
}

#[tokio::test]
async fn insert_skips_existing_keys_and_counts_new_rows() {
    init_test_tracing();
    let Some(database) = spawn_database().await else {
        return;
    };
    let store = database.store();
    let date = test_date();
    let signal_id = store.create_signal("power_mean").await.unwrap();
    let point = |minute, value| AggregateDataPoint {
        timestamp: at(date, 10, minute, 0),
        signal_id,
        value,
    };

    let written = store.insert_aggregates(vec![point(0, 1.0)]).await.unwrap();
    assert_eq!(written, 1);

    let written = store
        .insert_aggregates(vec![point(0, 2.0), point(10, 3.0)])
        .await
        .unwrap();
    assert_eq!(written, 1);

    let kept: f64 = sqlx::query(r#"select value from data where "timestamp" = $1"#)
        .bind(at(date, 10, 0, 0))
        .fetch_one(&database.pool)
        .await
        .unwrap()
        .get(0);
    assert_eq!(kept, 1.0);
    assert!(
        store
            .aggregate_exists(at(date, 10, 10, 0), signal_id)
            .await
            .unwrap()
    );
    assert!(
        !store
            .aggregate_exists(at(date, 10, 20, 0), signal_id)
            .await
            .unwrap()
    );

    database.cleanup().await;
}

#[tokio::test]
async fn large_batches_span_several_statements() {
    init_test_tracing();
    let Some(database) = spawn_database().await else {
        return;
    };
    let store = database.store();
    let date = test_date();
    let mut signal_ids = Vec::new();
    for name in ["wind_speed_mean", "power_mean"] {
        signal_ids.push(store.create_signal(name).await.unwrap());
    }

    // 1440 minutes for two signals.
    let points: Vec<AggregateDataPoint> = (0..24 * 60)
        .flat_map(|minute| {
            let timestamp = date.start_of_day() + chrono::TimeDelta::minutes(minute);
            signal_ids.iter().map(move |&signal_id| AggregateDataPoint {
                timestamp,
                signal_id,
                value: minute as f64,
            })
        })
        .collect();
    assert_eq!(points.len(), 2_880);

    let written = store.insert_aggregates(points.clone()).await.unwrap();
    assert_eq!(written, 2_880);
    assert_eq!(stored_rows(&database.pool).await, 2_880);

    let written = store.insert_aggregates(points).await.unwrap();
    assert_eq!(written, 0);

    database.cleanup().await;
}

#[tokio::test]
async fn unknown_signal_rolls_back_the_whole_batch() {
    init_test_tracing();
    let Some(database) = spawn_database().await else {
        return;
    };
    let store = database.store();
    let date = test_date();
    let signal_id = store.create_signal("power_mean").await.unwrap();

    // The offending row sits in the second statement, after a full first one.
    let mut points: Vec<AggregateDataPoint> = (0..1_000)
        .map(|second| AggregateDataPoint {
            timestamp: date.start_of_day() + chrono::TimeDelta::seconds(second),
            signal_id,
            value: 1.0,
        })
        .collect();
    points.push(AggregateDataPoint {
        timestamp: at(date, 12, 0, 0),
        signal_id: SignalId(signal_id.0 + 1_000),
        value: 2.0,
    });

    let err = store.insert_aggregates(points).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationConstraintViolation);
    assert_eq!(stored_rows(&database.pool).await, 0);

    database.cleanup().await;
}

#[tokio::test]
async fn rerunning_a_day_writes_nothing_new() {
    init_test_tracing();
    let Some(database) = spawn_database().await else {
        return;
    };
    let source = MemorySource::new(full_day(test_date()));
    let pipeline = Pipeline::new(PipelineConfig::default(), source, database.store()).unwrap();

    let first = pipeline.run(TEST_DATE).await.unwrap();
    let second = pipeline.run(TEST_DATE).await.unwrap();

    assert!(first.load.written > 0);
    assert_eq!(second.load.written, 0);
    assert_eq!(second.load.skipped_existing, first.load.candidates);
    assert_eq!(
        stored_rows(&database.pool).await,
        i64::try_from(first.load.written).unwrap()
    );

    database.cleanup().await;
}
