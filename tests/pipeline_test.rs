//! End-to-end pipeline tests: bootstrap, publish, observe, shut down.

use buildline_core::config::BuildlineConfig;
use buildline_core::constants::drop_reasons;
use buildline_core::processing::{BuildFailure, BuildResult, ErrorParser, ParsedError};
use buildline_core::{BuildPipeline, PublishError, QueueHealth};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}

#[derive(Debug)]
struct StyleError(String);

impl ParsedError for StyleError {
    fn format_error(&self) -> String {
        format!("styles.css: {}", self.0)
    }
}

struct StyleParser {
    calls: AtomicUsize,
}

impl ErrorParser for StyleParser {
    fn parse(&self, failure: &BuildFailure) -> Vec<Arc<dyn ParsedError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![Arc::new(StyleError(failure.message.clone()))]
    }
}

#[tokio::test]
async fn test_cache_and_results_flow_through_the_pipeline() {
    let pipeline: BuildPipeline<String> =
        BuildPipeline::bootstrap(BuildlineConfig::for_test()).unwrap();
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    pipeline.processor().add_callback(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let publisher = pipeline.publisher();
    for component in ["header", "header", "footer"] {
        let result = match pipeline.cache().get(component) {
            Some(_) => BuildResult::cached(component, Duration::from_millis(1)),
            None => {
                pipeline.cache().set(component, format!("compiled {component}"));
                BuildResult::success(component, Duration::from_millis(20))
            }
        };
        publisher.publish(result).unwrap();
    }

    wait_until(|| delivered.load(Ordering::SeqCst) == 3).await;
    pipeline.shutdown().await;

    let metrics = pipeline.metrics();
    assert_eq!(metrics.snapshot().total_builds, 3);
    assert!((metrics.cache_hit_rate() - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(metrics.success_rate(), 100.0);
    assert!(metrics.queue_health_status().health.is_healthy());
}

#[tokio::test(flavor = "current_thread")]
async fn test_full_result_queue_records_drops() {
    let mut config = BuildlineConfig::for_test();
    config.processor.result_channel_capacity = 2;
    let pipeline: BuildPipeline<String> = BuildPipeline::bootstrap(config).unwrap();
    let publisher = pipeline.publisher();

    // The processing task cannot run until this test yields
    assert!(publisher
        .publish(BuildResult::success("a", Duration::ZERO))
        .is_ok());
    assert!(publisher
        .publish(BuildResult::success("b", Duration::ZERO))
        .is_ok());
    let dropped = publisher.publish(BuildResult::success("c", Duration::ZERO));
    assert_eq!(
        dropped,
        Err(PublishError::QueueFull {
            component: "c".to_string()
        })
    );

    let status = pipeline.metrics().queue_health_status();
    assert_eq!(status.dropped_results, 1);
    assert_eq!(status.drop_reasons.get(drop_reasons::RESULT_QUEUE_FULL), Some(&1));
    assert!(matches!(status.health, QueueHealth::Critical { .. }));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_error_parser_is_applied_to_unparsed_failures() {
    let parser = Arc::new(StyleParser {
        calls: AtomicUsize::new(0),
    });
    let error_parser: Arc<dyn ErrorParser> = parser.clone();
    let pipeline: BuildPipeline<String> =
        BuildPipeline::bootstrap_with_error_parser(BuildlineConfig::for_test(), Some(error_parser))
            .unwrap();

    pipeline
        .publisher()
        .publish(BuildResult::failure(
            "theme",
            Duration::from_millis(5),
            BuildFailure::new("unknown property `colr`"),
        ))
        .unwrap();

    wait_until(|| pipeline.metrics().snapshot().failed_builds == 1).await;
    pipeline.shutdown().await;

    assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unrecognized_items_count_as_invalid() {
    let pipeline: BuildPipeline<String> =
        BuildPipeline::bootstrap(BuildlineConfig::for_test()).unwrap();
    pipeline
        .publisher()
        .publish_unrecognized("truncated executor frame")
        .unwrap();

    wait_until(|| pipeline.metrics().snapshot().invalid_results == 1).await;
    pipeline.shutdown().await;
    assert_eq!(pipeline.metrics().snapshot().total_builds, 0);
}

#[tokio::test]
async fn test_scheduler_drops_are_tracked_alongside_results() {
    let pipeline: BuildPipeline<String> =
        BuildPipeline::bootstrap(BuildlineConfig::for_test()).unwrap();

    pipeline
        .metrics()
        .record_dropped_task("gallery", drop_reasons::TASK_QUEUE_FULL);

    let status = pipeline.metrics().queue_health_status();
    assert_eq!(status.dropped_tasks, 1);
    assert_eq!(status.total_dropped(), 1);
    assert_eq!(status.drop_reasons.get(drop_reasons::TASK_QUEUE_FULL), Some(&1));

    pipeline.shutdown().await;
}
