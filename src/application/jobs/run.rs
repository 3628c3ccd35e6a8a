//! Cron job that triggers a publish run.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::Schedule;

use crate::application::error::PublishError;
use crate::application::publish::{Publisher, RunReport};
use crate::infra::error::InfraError;

/// Marker struct for the cron-triggered publish run.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct PublishRunJob;

impl From<chrono::DateTime<chrono::Utc>> for PublishRunJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct PublishRunContext {
    pub publisher: Arc<Publisher>,
}

/// Run once per tick. Busy and failed runs are logged; the worker keeps ticking.
pub async fn process_publish_run_job(
    _job: PublishRunJob,
    ctx: Data<PublishRunContext>,
) -> Result<(), Error> {
    match ctx.publisher.trigger().await {
        Ok(RunReport::Completed(summary)) => {
            tracing::info!(
                target = "application::jobs::run",
                documents = summary.documents,
                released = summary.released,
                failed = summary.failed,
                "scheduled run finished"
            );
        }
        Ok(RunReport::AlreadyRunning) => {
            tracing::debug!(target = "application::jobs::run", "scheduled run skipped");
        }
        Err(err) => log_run_error(&err),
    }
    Ok(())
}

fn log_run_error(err: &PublishError) {
    tracing::warn!(target = "application::jobs::run", error = %err, "scheduled run failed");
}

/// Parse the configured cron expression (seconds field included).
pub fn publish_run_schedule(expression: &str) -> Result<Schedule, InfraError> {
    Schedule::from_str(expression).map_err(|err| {
        InfraError::configuration(format!("invalid cron expression `{expression}`: {err}"))
    })
}
