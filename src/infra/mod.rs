//! Infrastructure adapters and runtime bootstrap.

pub mod cms;
pub mod db;
pub mod error;
pub mod memory;
pub mod telemetry;
