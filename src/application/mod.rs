//! Application services: rendering, uploads, adapters and the publish run.

pub mod error;
pub mod jobs;
pub mod media_upload;
pub mod publish;
pub mod render;
pub mod sources;
