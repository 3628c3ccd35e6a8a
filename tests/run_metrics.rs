mod support;

use std::collections::HashSet;

use homing::application::publish::RunReport;
use metrics_util::debugging::DebuggingRecorder;
use support::{Harness, NOW, document, paragraph};

#[tokio::test]
async fn run_records_release_and_failure_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let harness = Harness::new();
    harness
        .source
        .add(document("doc-1", "Hello", &["blog"]), vec![paragraph("p1", "Hello")])
        .await;
    harness
        .source
        .add(
            document("tweet-1", "Long", &["tweet"]),
            vec![paragraph("p2", &"x".repeat(300))],
        )
        .await;

    let report = harness.live().trigger_at(NOW).await.expect("run");
    assert!(matches!(report, RunReport::Completed(_)));

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "homing_documents_released_total",
        "homing_documents_failed_total",
        "homing_run_duration_ms",
    ] {
        assert!(names.contains(expected), "missing metric {expected}: {names:?}");
    }
}
