//! Retrieval layer of a hybrid memory store: bounded relation maps over a
//! triplet graph and batched nearest-neighbor document search.

pub mod config;
pub mod error;
pub mod memory;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
