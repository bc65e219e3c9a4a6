//! Test Helper Utilities
//!
//! Shared utilities for testing vehenrich

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::LogCapture;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use vehenrich::services::{ClassifierError, VehicleClassifier};

pub const SOURCE_HEADER: &str = "Veh_Make_ID,Veh_Mod_ID,Veh_Mod_Year,n_crashes";

/// Reply a [`FakeClassifier`] gives for a prompt
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    Fail,
}

/// Scripted classifier that records every prompt it receives
pub struct FakeClassifier {
    replies: HashMap<String, FakeReply>,
    default_reply: FakeReply,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeClassifier {
    /// Answer every prompt with `{"IsElectric": false, "IsHybrid": false, "HasAutomaticBrakingSystem": false}`
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            default_reply: FakeReply::Text(attributes_json(false, false, false)),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(mut self, prompt: impl Into<String>, reply: FakeReply) -> Self {
        self.replies.insert(prompt.into(), reply);
        self
    }

    pub fn with_default_reply(mut self, reply: FakeReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Simulated service latency per call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VehicleClassifier for FakeClassifier {
    async fn classify(&self, prompt: &str) -> Result<String, ClassifierError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .replies
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            FakeReply::Text(text) => Ok(text),
            FakeReply::Fail => Err(ClassifierError::NetworkError("connection refused".to_string())),
        }
    }
}

/// Service reply JSON for the three attributes
pub fn attributes_json(is_electric: bool, is_hybrid: bool, has_braking: bool) -> String {
    format!(
        r#"{{"IsElectric": {}, "IsHybrid": {}, "HasAutomaticBrakingSystem": {}}}"#,
        is_electric, is_hybrid, has_braking
    )
}

/// Write a source CSV with the standard header and the given data lines
pub fn write_source(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = format!("{}\n", SOURCE_HEADER);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Data lines of a CSV file (header excluded)
pub fn data_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(String::from)
        .collect()
}
