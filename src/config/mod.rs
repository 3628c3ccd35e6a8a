//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::media_upload::DEFAULT_CHUNK_SIZE;
use crate::infra::notion::NotionSchema;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "homing";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1/";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_MEDIA_PUBLIC_BASE: &str = "http://127.0.0.1:8080/media/";
const DEFAULT_MEDIA_STORAGE_DIR: &str = "media";
const DEFAULT_MEDIA_MIRROR_DIR: &str = "mirror";
const DEFAULT_SOURCE_HOST_MARKER: &str = "amazonaws.com";
const DEFAULT_ATTACHMENTS_DIR: &str = "attachments";
const DEFAULT_BLOG_ENDPOINT: &str = "https://api.github.com/graphql";
const DEFAULT_BLOG_BRANCH: &str = "main";
const DEFAULT_BLOG_PATH_PREFIX: &str = "content/blog";
const DEFAULT_SOCIAL_API_BASE: &str = "https://api.twitter.com/";
const DEFAULT_SOCIAL_UPLOAD_ENDPOINT: &str = "https://upload.twitter.com/1.1/media/upload.json";
const DEFAULT_MEDIA_PER_POST: usize = 4;
const DEFAULT_SPREAD_DAYS: i64 = 1;
const DEFAULT_SCHEDULE: &str = "0 0 * * * *";

/// Command-line arguments for the homing binary.
#[derive(Debug, Parser)]
#[command(name = "homing", version, about = "Publishes CMS documents to their destinations")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "HOMING_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the status surface and fire runs on the cron schedule.
    Serve(ServeArgs),
    /// Perform a single publish run and exit.
    Run(RunArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Serve(ServeArgs::default())
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RunOverrides {
    /// Write artifacts into this directory instead of publishing them.
    #[arg(long = "dry-run", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub dry_run_dir: Option<PathBuf>,

    /// Whether fully published documents are marked as released.
    #[arg(
        long = "mark-released",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub mark_released: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub run: RunOverrides,

    /// Override the status listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the status listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the cron expression (seconds field included).
    #[arg(long = "schedule", value_name = "CRON")]
    pub schedule: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub run: RunOverrides,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub notion: NotionSettings,
    pub media: MediaSettings,
    pub attachments: AttachmentSettings,
    pub blog: BlogSettings,
    pub social: SocialSettings,
    pub schedule: ScheduleSettings,
    pub run: RunSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub api_base: Url,
    pub version: String,
    pub schema: NotionSchema,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub public_base_url: Url,
    pub storage_dir: PathBuf,
    pub mirror_dir: String,
    pub source_host_marker: String,
}

#[derive(Debug, Clone)]
pub struct AttachmentSettings {
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub token: String,
    pub endpoint: Url,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path_prefix: String,
}

#[derive(Debug, Clone)]
pub struct SocialSettings {
    pub bearer_token: String,
    pub api_base: Url,
    pub upload_endpoint: Url,
    pub chunk_size: NonZeroUsize,
    pub media_per_post: NonZeroUsize,
    pub spread: time::Duration,
}

#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub cron: String,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub dry_run_dir: Option<PathBuf>,
    pub mark_released: bool,
}

impl RunSettings {
    pub fn is_dry_run(&self) -> bool {
        self.dry_run_dir.is_some()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("HOMING").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(args),
        Some(Command::Run(args)) => raw.apply_run_args(args),
        None => raw.apply_serve_overrides(&ServeArgs::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    notion: RawNotionSettings,
    media: RawMediaSettings,
    attachments: RawAttachmentSettings,
    blog: RawBlogSettings,
    social: RawSocialSettings,
    schedule: RawScheduleSettings,
    run: RawRunSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, args: &ServeArgs) {
        if let Some(host) = args.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = args.server_port {
            self.server.port = Some(port);
        }
        if let Some(cron) = args.schedule.as_ref() {
            self.schedule.cron = Some(cron.clone());
        }
        self.apply_logging_overrides(&args.logging);
        self.apply_run_overrides(&args.run);
    }

    fn apply_run_args(&mut self, args: &RunArgs) {
        self.apply_logging_overrides(&args.logging);
        self.apply_run_overrides(&args.run);
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_run_overrides(&mut self, overrides: &RunOverrides) {
        if let Some(directory) = overrides.dry_run_dir.as_ref() {
            self.run.dry_run = Some(true);
            self.blog.dry_run_dir = Some(directory.clone());
        }
        if let Some(mark) = overrides.mark_released {
            self.run.mark_released = Some(mark);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            notion,
            media,
            attachments,
            blog,
            social,
            schedule,
            run,
        } = raw;

        let run = build_run_settings(run, blog.dry_run_dir.clone())?;
        let live = !run.is_dry_run();

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            notion: build_notion_settings(notion)?,
            media: build_media_settings(media)?,
            attachments: build_attachment_settings(attachments)?,
            blog: build_blog_settings(blog, live)?,
            social: build_social_settings(social, live)?,
            schedule: build_schedule_settings(schedule)?,
            run,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_notion_settings(notion: RawNotionSettings) -> Result<NotionSettings, LoadError> {
    let token = required(notion.token, "notion.token")?;
    let database_id = required(notion.database_id, "notion.database_id")?;
    let api_base = parse_base_url(
        notion.api_base.as_deref().unwrap_or(DEFAULT_NOTION_API_BASE),
        "notion.api_base",
    )?;
    let version = notion
        .version
        .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

    let mut schema = NotionSchema::default();
    let properties = notion.properties;
    override_name(&mut schema.title, properties.title);
    override_name(&mut schema.subtitle, properties.subtitle);
    override_name(&mut schema.categories, properties.categories);
    override_name(&mut schema.tags, properties.tags);
    override_name(&mut schema.publish_date, properties.publish_date);
    override_name(&mut schema.status, properties.status);
    override_name(&mut schema.files, properties.files);
    override_name(&mut schema.errors, properties.errors);
    override_name(&mut schema.ready_value, properties.ready_value);
    override_name(&mut schema.released_value, properties.released_value);
    override_name(&mut schema.failed_value, properties.failed_value);

    Ok(NotionSettings {
        token,
        database_id,
        api_base,
        version,
        schema,
    })
}

fn build_media_settings(media: RawMediaSettings) -> Result<MediaSettings, LoadError> {
    let public_base_url = parse_base_url(
        media
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_MEDIA_PUBLIC_BASE),
        "media.public_base_url",
    )?;

    let storage_dir = media
        .storage_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_STORAGE_DIR));
    if storage_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "media.storage_dir",
            "path must not be empty",
        ));
    }

    let source_host_marker = media
        .source_host_marker
        .unwrap_or_else(|| DEFAULT_SOURCE_HOST_MARKER.to_string());
    if source_host_marker.trim().is_empty() {
        return Err(LoadError::invalid(
            "media.source_host_marker",
            "must not be empty",
        ));
    }

    Ok(MediaSettings {
        public_base_url,
        storage_dir,
        mirror_dir: media
            .mirror_dir
            .unwrap_or_else(|| DEFAULT_MEDIA_MIRROR_DIR.to_string()),
        source_host_marker,
    })
}

fn build_attachment_settings(
    attachments: RawAttachmentSettings,
) -> Result<AttachmentSettings, LoadError> {
    Ok(AttachmentSettings {
        directory: attachments
            .directory
            .unwrap_or_else(|| DEFAULT_ATTACHMENTS_DIR.to_string()),
    })
}

fn build_blog_settings(blog: RawBlogSettings, live: bool) -> Result<BlogSettings, LoadError> {
    let token = if live {
        required(blog.token, "blog.token")?
    } else {
        blog.token.unwrap_or_default()
    };
    let owner = required(blog.owner, "blog.owner")?;
    let repo = required(blog.repo, "blog.repo")?;
    let endpoint = parse_url(
        blog.endpoint.as_deref().unwrap_or(DEFAULT_BLOG_ENDPOINT),
        "blog.endpoint",
    )?;

    let path_prefix = blog
        .path_prefix
        .unwrap_or_else(|| DEFAULT_BLOG_PATH_PREFIX.to_string())
        .trim_matches('/')
        .to_string();
    if path_prefix.is_empty() {
        return Err(LoadError::invalid("blog.path_prefix", "must not be empty"));
    }

    Ok(BlogSettings {
        token,
        endpoint,
        owner,
        repo,
        branch: blog
            .branch
            .unwrap_or_else(|| DEFAULT_BLOG_BRANCH.to_string()),
        path_prefix,
    })
}

fn build_social_settings(
    social: RawSocialSettings,
    live: bool,
) -> Result<SocialSettings, LoadError> {
    let bearer_token = if live {
        required(social.bearer_token, "social.bearer_token")?
    } else {
        social.bearer_token.unwrap_or_default()
    };
    let api_base = parse_base_url(
        social.api_base.as_deref().unwrap_or(DEFAULT_SOCIAL_API_BASE),
        "social.api_base",
    )?;
    let upload_endpoint = parse_url(
        social
            .upload_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SOCIAL_UPLOAD_ENDPOINT),
        "social.upload_endpoint",
    )?;

    let chunk_size = non_zero_usize(
        social.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE as u64),
        "social.chunk_size",
    )?;
    let media_per_post = non_zero_usize(
        social.media_per_post.unwrap_or(DEFAULT_MEDIA_PER_POST as u64),
        "social.media_per_post",
    )?;

    let spread_days = social.spread_days.unwrap_or(DEFAULT_SPREAD_DAYS);
    if spread_days < 0 {
        return Err(LoadError::invalid(
            "social.spread_days",
            "must not be negative",
        ));
    }

    Ok(SocialSettings {
        bearer_token,
        api_base,
        upload_endpoint,
        chunk_size,
        media_per_post,
        spread: time::Duration::days(spread_days),
    })
}

fn build_schedule_settings(schedule: RawScheduleSettings) -> Result<ScheduleSettings, LoadError> {
    let cron = schedule
        .cron
        .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
    if cron.trim().is_empty() {
        return Err(LoadError::invalid("schedule.cron", "must not be empty"));
    }
    Ok(ScheduleSettings { cron })
}

fn build_run_settings(
    run: RawRunSettings,
    dry_run_dir: Option<PathBuf>,
) -> Result<RunSettings, LoadError> {
    let dry_run_dir = if run.dry_run.unwrap_or(false) {
        let directory = dry_run_dir.ok_or_else(|| {
            LoadError::invalid("blog.dry_run_dir", "required when run.dry_run is enabled")
        })?;
        if directory.as_os_str().is_empty() {
            return Err(LoadError::invalid(
                "blog.dry_run_dir",
                "path must not be empty",
            ));
        }
        Some(directory)
    } else {
        None
    };

    Ok(RunSettings {
        dry_run_dir,
        mark_released: run.mark_released.unwrap_or(true),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionSettings {
    token: Option<String>,
    database_id: Option<String>,
    api_base: Option<String>,
    version: Option<String>,
    properties: RawNotionProperties,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionProperties {
    title: Option<String>,
    subtitle: Option<String>,
    categories: Option<String>,
    tags: Option<String>,
    publish_date: Option<String>,
    status: Option<String>,
    files: Option<String>,
    errors: Option<String>,
    ready_value: Option<String>,
    released_value: Option<String>,
    failed_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMediaSettings {
    public_base_url: Option<String>,
    storage_dir: Option<PathBuf>,
    mirror_dir: Option<String>,
    source_host_marker: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAttachmentSettings {
    directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBlogSettings {
    token: Option<String>,
    endpoint: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    path_prefix: Option<String>,
    dry_run_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSocialSettings {
    bearer_token: Option<String>,
    api_base: Option<String>,
    upload_endpoint: Option<String>,
    chunk_size: Option<u64>,
    media_per_post: Option<u64>,
    spread_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawScheduleSettings {
    cron: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRunSettings {
    dry_run: Option<bool>,
    mark_released: Option<bool>,
}

fn required(value: Option<String>, key: &'static str) -> Result<String, LoadError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LoadError::invalid(key, "must be set"))
}

fn override_name(slot: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        *slot = value;
    }
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    Url::parse(value).map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))
}

/// Base URLs are joined against, so they always end with a slash.
fn parse_base_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    if value.ends_with('/') {
        parse_url(value, key)
    } else {
        parse_url(&format!("{value}/"), key)
    }
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_raw() -> RawSettings {
        let mut raw = RawSettings::default();
        raw.notion.token = Some("secret_notion".to_string());
        raw.notion.database_id = Some("db".to_string());
        raw.blog.token = Some("ghp_token".to_string());
        raw.blog.owner = Some("studio".to_string());
        raw.blog.repo = Some("site".to_string());
        raw.social.bearer_token = Some("bearer".to_string());
        raw
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let settings = Settings::from_raw(minimal_raw()).expect("valid settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.social.chunk_size.get(), DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.social.media_per_post.get(), 4);
        assert_eq!(settings.social.spread, time::Duration::days(1));
        assert_eq!(settings.blog.path_prefix, "content/blog");
        assert_eq!(settings.notion.schema, NotionSchema::default());
        assert!(settings.run.mark_released);
        assert!(!settings.run.is_dry_run());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = minimal_raw();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let args = ServeArgs {
            server_port: Some(4321),
            logging: LoggingOverrides {
                log_level: Some("debug".to_string()),
                log_json: Some(true),
            },
            ..Default::default()
        };

        raw.apply_serve_overrides(&args);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn missing_notion_token_is_rejected() {
        let mut raw = minimal_raw();
        raw.notion.token = Some("   ".to_string());

        let err = Settings::from_raw(raw).expect_err("token required");
        assert!(matches!(err, LoadError::Invalid { key: "notion.token", .. }));
    }

    #[test]
    fn dry_run_relaxes_publish_credentials() {
        let mut raw = minimal_raw();
        raw.blog.token = None;
        raw.social.bearer_token = None;
        raw.apply_run_args(&RunArgs {
            run: RunOverrides {
                dry_run_dir: Some(PathBuf::from("/tmp/homing-dry")),
                mark_released: None,
            },
            ..Default::default()
        });

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.run.dry_run_dir.as_deref(),
            Some(std::path::Path::new("/tmp/homing-dry"))
        );
    }

    #[test]
    fn dry_run_flag_requires_directory() {
        let mut raw = minimal_raw();
        raw.run.dry_run = Some(true);

        let err = Settings::from_raw(raw).expect_err("directory required");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "blog.dry_run_dir",
                ..
            }
        ));
    }

    #[test]
    fn zero_media_per_post_is_rejected() {
        let mut raw = minimal_raw();
        raw.social.media_per_post = Some(0);

        let err = Settings::from_raw(raw).expect_err("must be positive");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "social.media_per_post",
                ..
            }
        ));
    }

    #[test]
    fn schema_names_can_be_overridden() {
        let mut raw = minimal_raw();
        raw.notion.properties.status = Some("State".to_string());
        raw.notion.properties.ready_value = Some("Ready".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.notion.schema.status, "State");
        assert_eq!(settings.notion.schema.ready_value, "Ready");
        assert_eq!(settings.notion.schema.title, "Name");
    }

    #[test]
    fn base_urls_gain_trailing_slash() {
        let mut raw = minimal_raw();
        raw.notion.api_base = Some("http://127.0.0.1:9000/v1".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.notion.api_base.as_str(), "http://127.0.0.1:9000/v1/");
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["homing"]);
        let command = args.command.unwrap_or_default();
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_run_arguments() {
        let args = CliArgs::parse_from([
            "homing",
            "run",
            "--dry-run",
            "/tmp/out",
            "--mark-released",
            "false",
        ]);

        match args.command.expect("run command") {
            Command::Run(run) => {
                assert_eq!(
                    run.run.dry_run_dir.as_deref(),
                    Some(std::path::Path::new("/tmp/out"))
                );
                assert_eq!(run.run.mark_released, Some(false));
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
