//! Runs every ready document through its selected adapters.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::adapter::{Adapter, DocumentRun, PropertyWriter, Stage};
use super::guard::RunGuard;
use super::lifecycle::{self, AdapterOutcome, PublishMode};
use crate::application::error::PublishError;
use crate::application::render::{RenderContext, RunMedia, build_tree};
use crate::application::sources::{ContentSource, MediaMirror};
use crate::domain::documents::{DocumentStatus, FAILED_CATEGORY};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write artifacts here instead of publishing.
    pub dry_run: Option<PathBuf>,
    /// Transition fully published documents to released.
    pub mark_released: bool,
}

impl RunOptions {
    fn mode(&self) -> PublishMode {
        match &self.dry_run {
            Some(directory) => PublishMode::DryRun(directory.clone()),
            None => PublishMode::Live,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub documents: usize,
    pub released: usize,
    pub failed: usize,
    pub skipped_adapters: usize,
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Completed(RunSummary),
    /// Another run held the guard; nothing was processed.
    AlreadyRunning,
}

#[derive(Debug, Clone, Default)]
pub struct RunStatus {
    pub last_ran: Option<OffsetDateTime>,
    pub last_summary: Option<RunSummary>,
    pub last_error: Option<String>,
}

pub struct Publisher {
    source: Arc<dyn ContentSource>,
    mirror: Arc<dyn MediaMirror>,
    adapters: Vec<Arc<dyn Adapter>>,
    options: RunOptions,
    guard: RunGuard,
    status: RwLock<RunStatus>,
}

impl Publisher {
    pub fn new(
        source: Arc<dyn ContentSource>,
        mirror: Arc<dyn MediaMirror>,
        adapters: Vec<Arc<dyn Adapter>>,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            mirror,
            adapters,
            options,
            guard: RunGuard::new(),
            status: RwLock::new(RunStatus::default()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    pub async fn status(&self) -> RunStatus {
        self.status.read().await.clone()
    }

    pub fn adapter_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|adapter| adapter.name()).collect()
    }

    pub async fn trigger(&self) -> Result<RunReport, PublishError> {
        self.trigger_at(OffsetDateTime::now_utc()).await
    }

    /// Run once at `now`, unless a run is already in flight.
    pub async fn trigger_at(&self, now: OffsetDateTime) -> Result<RunReport, PublishError> {
        let Some(_permit) = self.guard.try_acquire() else {
            counter!("homing_runs_skipped_total").increment(1);
            info!(
                target = "application::publish::orchestrator",
                "run already in progress; ignoring trigger"
            );
            return Ok(RunReport::AlreadyRunning);
        };

        let started = Instant::now();
        let result = self.run(now).await;
        histogram!("homing_run_duration_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        let mut status = self.status.write().await;
        status.last_ran = Some(now);
        match &result {
            Ok(summary) => {
                status.last_summary = Some(summary.clone());
                status.last_error = None;
            }
            Err(err) => status.last_error = Some(err.to_string()),
        }
        drop(status);

        result.map(RunReport::Completed)
    }

    async fn run(&self, now: OffsetDateTime) -> Result<RunSummary, PublishError> {
        let mut documents = self.source.query_ready().await?;
        let media = Arc::new(RunMedia::new(Arc::clone(&self.mirror)));
        let mode = self.options.mode();
        let mut summary = RunSummary::default();

        info!(
            target = "application::publish::orchestrator",
            documents = documents.len(),
            dry_run = self.options.dry_run.is_some(),
            "publish run started"
        );

        for index in 0..documents.len() {
            let document = documents[index].clone();
            summary.documents += 1;

            let selected: Vec<&Arc<dyn Adapter>> = self
                .adapters
                .iter()
                .filter(|adapter| adapter.applies_to(&document))
                .collect();

            if document.has_category(FAILED_CATEGORY) {
                summary.skipped_adapters += selected.len();
                info!(
                    target = "application::publish::orchestrator",
                    document_id = %document.id,
                    "document is marked failed; skipping"
                );
                continue;
            }
            if selected.is_empty() {
                continue;
            }

            let tree = build_tree(self.source.as_ref(), &document.id).await?;
            let dry_run = self.options.dry_run.is_some();
            let mut ctx = RenderContext::new(Arc::clone(&media)).dry_run(dry_run);
            let mut errors: Vec<PublishError> = Vec::new();
            let mut all_succeeded = true;

            let document_id = document.id.clone();
            let properties = PropertyWriter::new(self.source.as_ref(), &document_id);
            let mut run =
                DocumentRun::new(document, &tree, &documents, properties, now).dry_run(dry_run);

            for adapter in selected {
                match lifecycle::execute(adapter.as_ref(), &mut run, &mut ctx, &mode).await {
                    Ok(AdapterOutcome::NotReady) => {
                        all_succeeded = false;
                        summary.skipped_adapters += 1;
                    }
                    Ok(outcome) => {
                        all_succeeded &= outcome.is_success();
                    }
                    Err(err) => {
                        all_succeeded = false;
                        counter!("homing_adapter_failures_total", "adapter" => adapter.name())
                            .increment(1);
                        warn!(
                            target = "application::publish::orchestrator",
                            adapter = adapter.name(),
                            document_id = %run.document.id,
                            stage = %Stage::Failed,
                            error = %err,
                            "adapter failed"
                        );
                        errors.push(err);
                    }
                }
                errors.extend(ctx.take_failures().into_iter().map(PublishError::Validation));
            }

            let assigned_date = run.document.publish_date;
            drop(run);
            documents[index].publish_date = assigned_date;

            for err in &errors {
                let annotation = err.annotation();
                if let Err(source_err) = self
                    .source
                    .append_error_annotation(&document_id, &annotation)
                    .await
                {
                    warn!(
                        target = "application::publish::orchestrator",
                        document_id = %document_id,
                        error = %source_err,
                        "failed to annotate document"
                    );
                }
                summary.annotations.push(annotation);
            }

            if !errors.is_empty() {
                summary.failed += 1;
                counter!("homing_documents_failed_total").increment(1);
            }

            let releasable = all_succeeded && errors.is_empty();
            if releasable && self.options.dry_run.is_none() && self.options.mark_released {
                self.source
                    .update_status(&document_id, DocumentStatus::Released)
                    .await?;
                summary.released += 1;
                counter!("homing_documents_released_total").increment(1);
                info!(
                    target = "application::publish::orchestrator",
                    document_id = %document_id,
                    "document released"
                );
            }
        }

        info!(
            target = "application::publish::orchestrator",
            documents = summary.documents,
            released = summary.released,
            failed = summary.failed,
            mirrored_media = media.cached(),
            "publish run finished"
        );
        Ok(summary)
    }
}
