//! PREFLIGHT → RENDER → {DRY_RUN | PUBLISH} → DONE, with FAILED reachable from every stage.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::adapter::{Adapter, AdapterError, DocumentRun, Stage};
use crate::application::error::PublishError;
use crate::application::render::{Artifact, RenderContext, RenderError};

/// Where artifacts go at the end of a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishMode {
    Live,
    /// Write artifacts under this directory instead of calling the targets.
    DryRun(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOutcome {
    /// Preflight said "not yet".
    NotReady,
    /// Render produced nothing to publish.
    Rejected,
    Published,
    DryRun,
}

impl AdapterOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, AdapterOutcome::Published | AdapterOutcome::DryRun)
    }
}

fn failure(adapter: &dyn Adapter, stage: Stage, source: AdapterError) -> PublishError {
    match source {
        AdapterError::Render(RenderError::Media(source)) => PublishError::MediaUploadFailure {
            adapter: adapter.name(),
            source,
        },
        source => PublishError::AdapterFailure {
            adapter: adapter.name(),
            stage,
            source,
        },
    }
}

/// Drive one adapter through its lifecycle for the current document.
pub async fn execute(
    adapter: &dyn Adapter,
    run: &mut DocumentRun<'_>,
    ctx: &mut RenderContext,
    mode: &PublishMode,
) -> Result<AdapterOutcome, PublishError> {
    let name = adapter.name();

    let ready = adapter
        .preflight(run)
        .await
        .map_err(|err| failure(adapter, Stage::Preflight, err))?;
    if !ready {
        debug!(
            target = "application::publish::lifecycle",
            adapter = name,
            document_id = %run.document.id,
            "preflight declined"
        );
        return Ok(AdapterOutcome::NotReady);
    }

    let artifact = adapter
        .render(run, ctx)
        .await
        .map_err(|err| failure(adapter, Stage::Render, err))?;
    let Some(artifact) = artifact else {
        return Ok(AdapterOutcome::Rejected);
    };

    let outcome = match mode {
        PublishMode::Live => {
            adapter
                .publish(run, &artifact)
                .await
                .map_err(|err| failure(adapter, Stage::Publish, err))?;
            AdapterOutcome::Published
        }
        PublishMode::DryRun(directory) => {
            let path = write_dry_run(directory, adapter, run, &artifact)
                .await
                .map_err(|err| failure(adapter, Stage::DryRun, err))?;
            info!(
                target = "application::publish::lifecycle",
                adapter = name,
                path = %path.display(),
                "dry run written"
            );
            AdapterOutcome::DryRun
        }
    };

    debug!(
        target = "application::publish::lifecycle",
        adapter = name,
        document_id = %run.document.id,
        stage = %Stage::Done,
        "adapter finished"
    );
    Ok(outcome)
}

/// `<directory>/<adapter>/<slug>.<extension>`
pub fn dry_run_path(directory: &Path, adapter: &str, slug: &str, extension: &str) -> PathBuf {
    directory.join(adapter).join(format!("{slug}.{extension}"))
}

async fn write_dry_run(
    directory: &Path,
    adapter: &dyn Adapter,
    run: &DocumentRun<'_>,
    artifact: &Artifact,
) -> Result<PathBuf, AdapterError> {
    let path = dry_run_path(directory, adapter.name(), &run.slug()?, adapter.extension());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, artifact.to_text()).await?;
    Ok(path)
}
