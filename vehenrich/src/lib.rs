//! vehenrich library interface
//!
//! Deduplicates vehicle crash records by make/model/year and enriches each
//! unique vehicle with electric, hybrid and automatic-braking attributes
//! from a chat completion API. The enriched CSV is its own checkpoint, so
//! an interrupted run resumes where it stopped.

pub mod config;
pub mod models;
pub mod services;
pub mod workflow;

pub use vehenrich_common::{Error, Result};
