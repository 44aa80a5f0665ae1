//! Inference client for the desktop viewer
//!
//! Requests run on a tokio runtime owned by the client; their outcomes land on
//! [`PendingInference`] and are applied by the shared conversion systems.

use anyhow::{Context, Result};
use bevy::prelude::*;
use planform_core::inference::IMAGE_FIELD;
use planform_core::{FloorPlanResult, InferenceConfig, InferenceEndpoint, InferenceError, UploadFile};
use planform_scene::{
    process_inference_results, ConversionPlugin, ConversionRequest, ConversionState, PendingInference,
};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;

pub struct InferencePlugin;

impl Plugin for InferencePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ConversionPlugin)
            .add_systems(Update, start_conversion.before(process_inference_results));
    }
}

/// HTTP client for the inference service
#[derive(Resource, Clone)]
pub struct InferenceClient {
    pub endpoint: InferenceEndpoint,
    http: reqwest::Client,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .context("Failed to start inference runtime")?;

        Ok(Self {
            endpoint: config.endpoint(),
            http,
            runtime: Arc::new(runtime),
        })
    }

    /// Submit one file; the outcome is queued on `pending`
    pub fn submit(&self, file: UploadFile, pending: &PendingInference) {
        let pending = pending.clone();
        let http = self.http.clone();
        let url = self.endpoint.url.clone();
        tracing::info!(file = %file.name, size = file.size(), url = %url, "Submitting floor plan");

        self.runtime.spawn(async move {
            pending.push(post_plan(&http, &url, file).await);
        });
    }
}

async fn post_plan(
    http: &reqwest::Client,
    url: &str,
    file: UploadFile,
) -> Result<FloorPlanResult, InferenceError> {
    let transport = |e: reqwest::Error| InferenceError::Transport(e.to_string());

    let mut part = Part::bytes(file.bytes).file_name(file.name);
    if let Some(mime) = &file.mime_type {
        part = part.mime_str(mime).map_err(transport)?;
    }
    let form = Form::new().part(IMAGE_FIELD, part);

    let response = http.post(url).multipart(form).send().await.map_err(transport)?;
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(transport)?;
    planform_core::decode_response(status, &body)
}

fn start_conversion(
    mut requests: MessageReader<ConversionRequest>,
    mut state: ResMut<ConversionState>,
    client: Res<InferenceClient>,
    pending: Res<PendingInference>,
) {
    // Several requests in one frame still submit once
    if requests.read().count() == 0 {
        return;
    }
    if let Some(file) = state.begin() {
        client.submit(file, &pending);
    }
}
