//! Vehicle classification boundary
//!
//! The pipeline sees the external service only as
//! `classify(prompt) -> raw reply text`. Turning the reply into attributes
//! happens here too, so a reply that is not the expected JSON can be told
//! apart from a failed call.

use crate::models::{CompositeKey, VehicleAttributes};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Fixed instruction sent with every classification request
pub const SYSTEM_PROMPT: &str = "You are a vehicle information assistant. Based on the vehicle's make, model, and model year, your task is to determine whether it is:

1. Electric (True/False)
2. Hybrid (True/False)
3. Has an Automatic Braking System (AEB)/ Emergency braking system (EBS) or not (True/False)

Return your answer in the format:
{
  \"IsElectric\": true/false,
  \"IsHybrid\": true/false,
  \"HasAutomaticBrakingSystem\": true/false
}";

/// Classification service failures
///
/// Every variant is a service error: the row is recorded with `Error`
/// attributes and not retried.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

/// External text classifier
#[async_trait]
pub trait VehicleClassifier: Send + Sync {
    /// Send one user prompt (alongside [`SYSTEM_PROMPT`]) and return the reply text
    async fn classify(&self, prompt: &str) -> Result<String, ClassifierError>;
}

/// User message for one vehicle: `Make: <make>, Model: <model>, Year: <year>`
pub fn build_prompt(key: &CompositeKey) -> String {
    format!(
        "Make: {}, Model: {}, Year: {}",
        key.make(),
        key.model(),
        key.model_year()
    )
}

#[derive(Debug, Deserialize)]
struct AttributeReply {
    #[serde(rename = "IsElectric")]
    is_electric: bool,
    #[serde(rename = "IsHybrid")]
    is_hybrid: bool,
    #[serde(rename = "HasAutomaticBrakingSystem")]
    has_automatic_braking: bool,
}

/// Parse a reply into attributes
///
/// Returns `None` unless the reply carries a JSON object with all three
/// boolean fields. The object may be wrapped in a code fence, surrounded by
/// prose or nested inside another object: every `{` in the reply is tried
/// as the start of an attribute object, and the first complete one wins.
pub fn parse_attributes(raw: &str) -> Option<VehicleAttributes> {
    let reply = raw.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&raw[start..])
            .into_iter::<AttributeReply>()
            .next()?
            .ok()
    })?;

    Some(VehicleAttributes::from_flags(
        reply.is_electric,
        reply.is_hybrid,
        reply.has_automatic_braking,
    ))
}
