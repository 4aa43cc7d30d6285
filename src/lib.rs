//! Mirror of headless-CMS content into a document-store cache.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
