//! Chunked INIT/APPEND/FINALIZE media upload for the social destination.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Default APPEND payload size.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum MediaUploadError {
    #[error("failed to fetch media `{url}`: {reason}")]
    Fetch { url: String, reason: String },
    #[error("media INIT failed: {0}")]
    Init(String),
    #[error("media APPEND of segment {segment} failed with status {status}")]
    Append { segment: usize, status: u16 },
    #[error("media FINALIZE failed: {0}")]
    Finalize(String),
}

/// Uploads the asset behind `url` to the social network and returns its media id.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, url: &str) -> Result<String, MediaUploadError>;
}

/// Number of APPEND calls for an asset of `size` bytes: `max(round(size / chunk), 1)`.
///
/// Rounding (not ceiling) can undercount; [`ChunkedUploader`] logs when the
/// tail of an asset is left out.
pub fn chunk_count(size: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 1;
    }
    let ratio = size as f64 / chunk_size as f64;
    (ratio.round() as usize).max(1)
}

fn media_category(media_type: &str) -> &'static str {
    if media_type == "image/gif" {
        "tweet_gif"
    } else if media_type.starts_with("video/") {
        "tweet_video"
    } else {
        "tweet_image"
    }
}

#[derive(Debug, Deserialize)]
struct InitResponse {
    media_id_string: String,
}

#[derive(Clone)]
pub struct ChunkedUploader {
    client: Client,
    endpoint: Url,
    bearer_token: String,
    chunk_size: usize,
}

impl ChunkedUploader {
    pub fn new(client: Client, endpoint: Url, bearer_token: String, chunk_size: usize) -> Self {
        Self {
            client,
            endpoint,
            bearer_token,
            chunk_size,
        }
    }

    async fn fetch(&self, url: &str) -> Result<(Bytes, String), MediaUploadError> {
        let fetch_error = |reason: String| MediaUploadError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("status {}", response.status())));
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(url)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });
        let body = response
            .bytes()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        Ok((body, media_type))
    }

    async fn command(&self, form: &[(&str, String)]) -> reqwest::Result<reqwest::Response> {
        self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.bearer_token)
            .form(form)
            .send()
            .await
    }

    async fn init(&self, total: usize, media_type: &str) -> Result<String, MediaUploadError> {
        let response = self
            .command(&[
                ("command", "INIT".to_string()),
                ("total_bytes", total.to_string()),
                ("media_type", media_type.to_string()),
                ("media_category", media_category(media_type).to_string()),
            ])
            .await
            .map_err(|err| MediaUploadError::Init(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaUploadError::Init(format!("status {}", response.status())));
        }

        let body: InitResponse = response
            .json()
            .await
            .map_err(|err| MediaUploadError::Init(err.to_string()))?;
        Ok(body.media_id_string)
    }

    async fn append(&self, media_id: &str, segment: usize, chunk: &[u8]) -> Result<(), MediaUploadError> {
        let response = self
            .command(&[
                ("command", "APPEND".to_string()),
                ("media_id", media_id.to_string()),
                ("segment_index", segment.to_string()),
                ("media_data", STANDARD.encode(chunk)),
            ])
            .await;

        match response {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(MediaUploadError::Append {
                segment,
                status: response.status().as_u16(),
            }),
            Err(err) => Err(MediaUploadError::Append {
                segment,
                status: err.status().map(|status| status.as_u16()).unwrap_or_default(),
            }),
        }
    }

    async fn finalize(&self, media_id: &str) -> Result<(), MediaUploadError> {
        let response = self
            .command(&[
                ("command", "FINALIZE".to_string()),
                ("media_id", media_id.to_string()),
            ])
            .await
            .map_err(|err| MediaUploadError::Finalize(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaUploadError::Finalize(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for ChunkedUploader {
    async fn upload(&self, url: &str) -> Result<String, MediaUploadError> {
        let (body, media_type) = self.fetch(url).await?;
        let total = body.len();
        let chunk_size = self.chunk_size.max(1);
        let chunks = chunk_count(total, chunk_size);

        if chunks.saturating_mul(chunk_size) < total {
            warn!(
                target = "application::media_upload",
                url,
                total,
                chunks,
                chunk_size,
                "chunk count does not cover the asset; trailing bytes are not sent"
            );
        }

        let media_id = self.init(total, &media_type).await?;

        for segment in 0..chunks {
            let start = (segment * chunk_size).min(total);
            let end = ((segment + 1) * chunk_size).min(total);
            if let Err(err) = self.append(&media_id, segment, &body[start..end]).await {
                counter!("homing_media_append_failures_total").increment(1);
                warn!(
                    target = "application::media_upload",
                    media_id = %media_id,
                    error = %err,
                    "media chunk rejected; continuing"
                );
            }
        }

        self.finalize(&media_id).await?;

        debug!(
            target = "application::media_upload",
            media_id = %media_id,
            total,
            chunks,
            media_type = %media_type,
            "media uploaded"
        );
        Ok(media_id)
    }
}
