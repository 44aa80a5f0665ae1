//! Inference boundary contract
//!
//! The inference service takes a multipart form with a single image field and
//! answers with a [`FloorPlanResult`]. Transport lives in the front-ends; the
//! status and decoding policy lives here so both behave identically.

use thiserror::Error;

use crate::result::{FloorPlanResult, ResultError};

/// Multipart field carrying the uploaded plan
pub const IMAGE_FIELD: &str = "image";

/// Message shown to the user for any inference failure
pub const FAILURE_MESSAGE: &str = "Conversion failed!";

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Inference service returned HTTP {0}")]
    Status(u16),
    #[error("Invalid inference response: {0}")]
    Decode(#[from] ResultError),
    #[error("No file selected")]
    NothingToSubmit,
}

impl InferenceError {
    /// Every failure is reported to the user the same way
    pub fn user_message(&self) -> &'static str {
        FAILURE_MESSAGE
    }
}

/// Where plans are submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceEndpoint {
    pub url: String,
}

impl InferenceEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Normalize a base address into the POST target (the service root)
    pub fn from_base(base: &str) -> Self {
        let base = base.trim();
        let url = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };
        if url.ends_with('/') {
            Self { url }
        } else {
            Self {
                url: format!("{}/", url),
            }
        }
    }
}

impl Default for InferenceEndpoint {
    fn default() -> Self {
        Self::from_base(crate::config::DEFAULT_INFERENCE_URL)
    }
}

/// Turn an HTTP status and body into a result. Any non-2xx status is a failure.
pub fn decode_response(status: u16, body: &[u8]) -> Result<FloorPlanResult, InferenceError> {
    if !(200..300).contains(&status) {
        return Err(InferenceError::Status(status));
    }
    Ok(FloorPlanResult::from_slice(body)?)
}
