use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "homing_documents_released_total",
            Unit::Count,
            "Total number of documents transitioned to released."
        );
        describe_counter!(
            "homing_documents_failed_total",
            Unit::Count,
            "Total number of documents that collected error annotations in a run."
        );
        describe_counter!(
            "homing_adapter_failures_total",
            Unit::Count,
            "Total number of adapter lifecycle failures, labelled by adapter."
        );
        describe_counter!(
            "homing_runs_skipped_total",
            Unit::Count,
            "Total number of run triggers ignored because a run was in flight."
        );
        describe_counter!(
            "homing_media_append_failures_total",
            Unit::Count,
            "Total number of rejected media APPEND calls."
        );
        describe_histogram!(
            "homing_run_duration_ms",
            Unit::Milliseconds,
            "Publish run latency in milliseconds."
        );
    });
}
