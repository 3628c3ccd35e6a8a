use std::{process, sync::Arc};

use apalis::prelude::{Monitor, WorkerBuilder, WorkerFactoryFn};
use apalis_cron::CronStream;
use homing::{
    application::{
        error::AppError,
        jobs::{PublishRunContext, process_publish_run_job, publish_run_schedule},
        media_upload::ChunkedUploader,
        publish::{
            Adapter, AttachmentUploader, BlogAdapter, ForumAdapter, MarkdownAdapter, Publisher,
            RunOptions, RunReport, SocialAdapter,
        },
        render::{SEGMENT_LIMIT, SocialRenderer},
        sources::ObjectStore,
    },
    config,
    infra::{
        error::InfraError,
        github::{GithubBlogTarget, GithubRepository},
        http::{self, HttpState},
        media::StoreMirror,
        notion::{NotionConfig, NotionSource},
        social::SocialClient,
        storage::FsObjectStore,
        telemetry,
    },
};
use reqwest::Client;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let publisher = Arc::new(build_publisher(&settings)?);

    match cli_args.command.unwrap_or_default() {
        config::Command::Serve(_) => run_serve(&settings, publisher).await,
        config::Command::Run(_) => run_once(publisher).await,
    }
}

fn build_publisher(settings: &config::Settings) -> Result<Publisher, AppError> {
    let client = Client::builder()
        .user_agent(concat!("homing/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| AppError::from(InfraError::http(err.to_string())))?;

    let store: Arc<dyn ObjectStore> = Arc::new(
        FsObjectStore::new(
            settings.media.storage_dir.clone(),
            settings.media.public_base_url.clone(),
        )
        .map_err(|err| AppError::from(InfraError::from(err)))?,
    );

    let source = Arc::new(NotionSource::new(
        client.clone(),
        NotionConfig {
            api_base: settings.notion.api_base.clone(),
            token: settings.notion.token.clone(),
            version: settings.notion.version.clone(),
            database_id: settings.notion.database_id.clone(),
            schema: settings.notion.schema.clone(),
        },
    ));

    let mirror = Arc::new(StoreMirror::new(
        client.clone(),
        store.clone(),
        settings.media.source_host_marker.clone(),
        settings.media.mirror_dir.clone(),
    ));

    let blog_target = Arc::new(GithubBlogTarget::new(
        client.clone(),
        settings.blog.endpoint.clone(),
        settings.blog.token.clone(),
        GithubRepository {
            owner: settings.blog.owner.clone(),
            name: settings.blog.repo.clone(),
            branch: settings.blog.branch.clone(),
        },
    ));

    let social = &settings.social;
    let uploader = Arc::new(ChunkedUploader::new(
        client.clone(),
        social.upload_endpoint.clone(),
        social.bearer_token.clone(),
        social.chunk_size.get(),
    ));
    let social_target = Arc::new(SocialClient::new(
        client,
        social.api_base.clone(),
        social.bearer_token.clone(),
    ));
    let renderer = SocialRenderer::new(uploader, SEGMENT_LIMIT, social.media_per_post.get());

    let attachments = || AttachmentUploader::new(store.clone(), settings.attachments.directory.clone());

    let adapters: Vec<Arc<dyn Adapter>> = vec![
        Arc::new(BlogAdapter::new(blog_target, settings.blog.path_prefix.clone())),
        Arc::new(SocialAdapter::new(renderer, social_target, social.spread)),
        Arc::new(ForumAdapter::new(attachments())),
        Arc::new(MarkdownAdapter::new(attachments())),
    ];

    let options = RunOptions {
        dry_run: settings.run.dry_run_dir.clone(),
        mark_released: settings.run.mark_released,
    };

    info!(
        target = "homing::bootstrap",
        adapters = adapters.len(),
        dry_run = settings.run.is_dry_run(),
        mark_released = options.mark_released,
        "publisher configured"
    );

    Ok(Publisher::new(source, mirror, adapters, options))
}

async fn run_once(publisher: Arc<Publisher>) -> Result<(), AppError> {
    match publisher.trigger().await? {
        RunReport::Completed(summary) => {
            info!(
                target = "homing::run",
                documents = summary.documents,
                released = summary.released,
                failed = summary.failed,
                skipped_adapters = summary.skipped_adapters,
                "run finished"
            );
            for annotation in &summary.annotations {
                info!(target = "homing::run", annotation = %annotation, "document annotated");
            }
        }
        RunReport::AlreadyRunning => {
            info!(target = "homing::run", "another run is in progress");
        }
    }
    Ok(())
}

async fn run_serve(settings: &config::Settings, publisher: Arc<Publisher>) -> Result<(), AppError> {
    let monitor_handle = spawn_job_monitor(&settings.schedule, publisher.clone())?;

    let result = serve_http(settings, HttpState { publisher }).await;

    monitor_handle.abort();
    let _ = monitor_handle.await;

    result
}

fn spawn_job_monitor(
    schedule: &config::ScheduleSettings,
    publisher: Arc<Publisher>,
) -> Result<tokio::task::JoinHandle<()>, AppError> {
    let schedule = publish_run_schedule(&schedule.cron)?;

    let publish_run_worker = WorkerBuilder::new("publish-run-worker")
        .data(PublishRunContext { publisher })
        .backend(CronStream::new(schedule))
        .build_fn(process_publish_run_job);

    let monitor = Monitor::new().register(publish_run_worker);

    Ok(tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    }))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "homing::serve",
        addr = %settings.server.addr,
        schedule = %settings.schedule.cron,
        "status surface listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "homing::serve", "shutdown requested");
}
