use config::shared::PipelineConfig;
use etl::error::ErrorKind;
use etl::failpoints::{LOADER__BEFORE_BATCH_WRITE, PIPELINE_RUN__BEFORE_LOAD};
use etl::pipeline::Pipeline;
use etl::source::memory::MemorySource;
use etl::store::memory::MemoryStore;
use etl::test_utils::failpoints::FailpointScenario;
use etl::test_utils::fixtures::{TEST_DATE, full_day, test_date};
use telemetry::init_test_tracing;

fn create_pipeline(store: MemoryStore) -> Pipeline<MemorySource, MemoryStore> {
    let source = MemorySource::new(full_day(test_date()));

    Pipeline::new(PipelineConfig::default(), source, store).unwrap()
}

#[tokio::test]
async fn failure_before_load_keeps_registered_signals() {
    init_test_tracing();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(store.clone());

    let scenario = FailpointScenario::returning(&[PIPELINE_RUN__BEFORE_LOAD]);
    let err = pipeline.run(TEST_DATE).await.unwrap_err();
    drop(scenario);

    assert_eq!(err.kind(), ErrorKind::WithFailpoint);
    assert_eq!(store.signals().await.len(), 8);
    assert!(store.aggregates().await.is_empty());

    let summary = pipeline.run(TEST_DATE).await.unwrap();

    assert_eq!(summary.load.written, 144 * 8);
}

#[tokio::test]
async fn failure_before_batch_write_leaves_no_partial_day() {
    init_test_tracing();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(store.clone());

    let scenario = FailpointScenario::returning(&[LOADER__BEFORE_BATCH_WRITE]);
    let err = pipeline.run(TEST_DATE).await.unwrap_err();
    drop(scenario);

    assert_eq!(err.kind(), ErrorKind::WithFailpoint);
    assert_eq!(store.insert_calls().await, 0);

    let summary = pipeline.run(TEST_DATE).await.unwrap();

    assert_eq!(summary.load.skipped_existing, 0);
    assert_eq!(store.aggregates().await.len(), 144 * 8);
}

#[tokio::test]
async fn disabled_failpoints_do_not_interfere() {
    init_test_tracing();
    let store = MemoryStore::new();
    let pipeline = create_pipeline(store.clone());

    let scenario = FailpointScenario::setup(&[
        (PIPELINE_RUN__BEFORE_LOAD, "off"),
        (LOADER__BEFORE_BATCH_WRITE, "off"),
    ]);
    let summary = pipeline.run(TEST_DATE).await.unwrap();
    drop(scenario);

    assert_eq!(summary.windows, 144);
}
