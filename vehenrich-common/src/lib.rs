//! # vehenrich common library
//!
//! Shared code for the vehenrich crates:
//! - Error types
//! - Bootstrap configuration loading (TOML + compiled defaults)
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
