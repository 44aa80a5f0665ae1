//! Inference client for the browser

use bevy::prelude::*;
use planform_core::{Config, InferenceEndpoint, UploadFile};
use planform_scene::{
    process_inference_results, ConversionFailed, ConversionPlugin, ConversionRequest, ConversionState,
    PendingInference,
};

#[cfg(target_arch = "wasm32")]
use planform_core::{FloorPlanResult, InferenceError};

pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(InferenceClient::from_browser())
            .add_plugins(ConversionPlugin)
            .add_systems(
                Update,
                (
                    start_conversion.before(process_inference_results),
                    report_failures.after(process_inference_results),
                ),
            );
    }
}

/// Resource storing the inference service address
#[derive(Resource, Debug, Clone)]
pub struct InferenceClient {
    pub endpoint: InferenceEndpoint,
}

impl Default for InferenceClient {
    fn default() -> Self {
        Self {
            endpoint: Config::default().inference.endpoint(),
        }
    }
}

impl InferenceClient {
    /// Use the `?api=` query parameter when present, otherwise the default
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> Self {
        let search = web_sys::window().and_then(|w| w.location().search().ok());
        if let Some(api) = search.and_then(|s| parse_query_param(&s, "api")) {
            tracing::info!("Using inference service from URL parameter: {}", api);
            return Self {
                endpoint: InferenceEndpoint::from_base(&api),
            };
        }
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_browser() -> Self {
        Self::default()
    }

    /// Submit one file; the outcome is queued on `pending`
    pub fn submit(&self, file: UploadFile, pending: &PendingInference) {
        let pending = pending.clone();
        let url = self.endpoint.url.clone();
        tracing::info!(file = %file.name, size = file.size(), url = %url, "Submitting floor plan");

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                pending.push(post_plan(&url, &file).await);
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = url;
            pending.push(Err(planform_core::InferenceError::Transport(
                "Inference is only available in the browser build".to_string(),
            )));
        }
    }
}

/// Parse a query parameter from a search string
fn parse_query_param(search: &str, param: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == param)
        .map(|(_, value)| value.replace("%3A", ":").replace("%2F", "/"))
        .filter(|value| !value.is_empty())
}

#[cfg(target_arch = "wasm32")]
async fn post_plan(url: &str, file: &UploadFile) -> Result<FloorPlanResult, InferenceError> {
    let form = form_data(file)?;
    let request = gloo_net::http::Request::post(url)
        .body(form)
        .map_err(|e| InferenceError::Transport(e.to_string()))?;
    let response = request
        .send()
        .await
        .map_err(|e| InferenceError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .binary()
        .await
        .map_err(|e| InferenceError::Transport(e.to_string()))?;
    planform_core::decode_response(status, &body)
}

#[cfg(target_arch = "wasm32")]
fn form_data(file: &UploadFile) -> Result<web_sys::FormData, InferenceError> {
    let to_error = |e: wasm_bindgen::JsValue| InferenceError::Transport(format!("{:?}", e));

    let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
    let parts = js_sys::Array::new();
    parts.push(&bytes.buffer());

    let options = web_sys::BlobPropertyBag::new();
    if let Some(mime) = &file.mime_type {
        options.set_type(mime);
    }
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(to_error)?;

    let form = web_sys::FormData::new().map_err(to_error)?;
    form.append_with_blob_and_filename(planform_core::inference::IMAGE_FIELD, &blob, &file.name)
        .map_err(to_error)?;
    Ok(form)
}

fn start_conversion(
    mut requests: MessageReader<ConversionRequest>,
    mut state: ResMut<ConversionState>,
    client: Res<InferenceClient>,
    pending: Res<PendingInference>,
) {
    // Several clicks in one frame still submit once
    if requests.read().count() == 0 {
        return;
    }
    if let Some(file) = state.begin() {
        client.submit(file, &pending);
    }
}

fn report_failures(mut failures: MessageReader<ConversionFailed>) {
    for ConversionFailed(message) in failures.read() {
        alert(message);
    }
}

fn alert(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            window.alert_with_message(message).ok();
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planform_core::inference::FAILURE_MESSAGE;
    use planform_core::{UploadFilter, UploadSelection};
    use planform_scene::FloorPlanData;

    #[test]
    fn test_parse_query_param() {
        assert_eq!(
            parse_query_param("?api=http%3A%2F%2F10.0.0.5%3A5000", "api").as_deref(),
            Some("http://10.0.0.5:5000")
        );
        assert_eq!(parse_query_param("?x=1&api=host:5000", "api").as_deref(), Some("host:5000"));
        assert_eq!(parse_query_param("?api=", "api"), None);
        assert_eq!(parse_query_param("", "api"), None);
    }

    #[test]
    fn test_native_build_reports_failure() {
        let mut app = App::new();
        app.init_resource::<FloorPlanData>().add_plugins(NetworkPlugin);
        let file = UploadFile::new("plan.png", Some("image/png".to_string()), vec![1; 64]);
        app.world_mut().resource_mut::<ConversionState>().selection =
            UploadSelection::from_files(vec![file], &UploadFilter::floor_plans());

        app.world_mut().write_message(ConversionRequest);
        app.update();

        let state = app.world().resource::<ConversionState>();
        assert!(!state.in_flight);
        assert_eq!(state.failure.as_deref(), Some(FAILURE_MESSAGE));
        assert!(app.world().resource::<FloorPlanData>().get().is_none());
    }
}
