//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod github;
pub mod http;
pub mod media;
pub mod notion;
pub mod social;
pub mod storage;
pub mod telemetry;
