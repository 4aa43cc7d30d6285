//! Application services: the content cache, the sync job and the read path.

pub mod cache;
pub mod content;
pub mod error;
pub mod progress;
pub mod repos;
pub mod sync;
