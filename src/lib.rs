//! Publishes block-structured CMS documents to a blog, a forum, a markdown
//! attachment and a social thread.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
