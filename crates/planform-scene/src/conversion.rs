//! Conversion progress shared by the front-ends
//!
//! A front-end submits the first selected file to the inference service and
//! pushes the outcome onto [`PendingInference`] from whatever task the request
//! ran on. [`process_inference_results`] applies outcomes on the next frame: a
//! success replaces the published result, a failure keeps the previous model
//! on screen and is reported through [`ConversionFailed`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use planform_core::{FloorPlanResult, InferenceError, UploadFile, UploadSelection};

use crate::host::FloorPlanData;

pub type InferenceOutcome = Result<FloorPlanResult, InferenceError>;

/// Upload and conversion progress shown by the front-end
#[derive(Resource, Debug, Default)]
pub struct ConversionState {
    /// Files from the last pick or drop
    pub selection: UploadSelection,
    /// A request is on its way to the inference service
    pub in_flight: bool,
    /// Message of the last failed conversion
    pub failure: Option<String>,
}

impl ConversionState {
    /// Mark a conversion as started and hand back the file to submit
    ///
    /// Returns `None` while a request is in flight or when nothing is selected.
    pub fn begin(&mut self) -> Option<UploadFile> {
        if self.in_flight {
            tracing::warn!("A conversion is already running");
            return None;
        }
        let Some(file) = self.selection.first().cloned() else {
            tracing::warn!("{}", InferenceError::NothingToSubmit);
            return None;
        };
        self.in_flight = true;
        self.failure = None;
        Some(file)
    }

    /// Apply one outcome; returns the user-facing message on failure
    pub fn finish(&mut self, data: &mut FloorPlanData, outcome: InferenceOutcome) -> Option<&'static str> {
        self.in_flight = false;
        match outcome {
            Ok(result) => {
                let summary = result.summary();
                tracing::info!(
                    walls = summary.walls,
                    doors = summary.doors,
                    windows = summary.windows,
                    skipped = summary.skipped,
                    "Conversion completed"
                );
                data.set(result);
                None
            }
            Err(e) => {
                // The previous model stays on screen
                tracing::error!("Conversion failed: {}", e);
                let message = e.user_message();
                self.failure = Some(message.to_string());
                Some(message)
            }
        }
    }
}

/// Outcomes delivered by the async request
#[derive(Resource, Default, Clone)]
pub struct PendingInference(Arc<Mutex<VecDeque<InferenceOutcome>>>);

impl PendingInference {
    pub fn push(&self, outcome: InferenceOutcome) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(outcome);
        }
    }

    pub fn drain(&self) -> Vec<InferenceOutcome> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Written for each accepted selection and by the convert button
#[derive(Message, Debug, Clone, Copy)]
pub struct ConversionRequest;

/// A conversion failed; carries the user-facing message
#[derive(Message, Debug, Clone)]
pub struct ConversionFailed(pub &'static str);

pub struct ConversionPlugin;

impl Plugin for ConversionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConversionState>()
            .init_resource::<PendingInference>()
            .add_message::<ConversionRequest>()
            .add_message::<ConversionFailed>()
            .add_systems(Update, process_inference_results);
    }
}

/// Apply every queued outcome
pub fn process_inference_results(
    pending: Res<PendingInference>,
    mut state: ResMut<ConversionState>,
    mut data: ResMut<FloorPlanData>,
    mut failures: MessageWriter<ConversionFailed>,
) {
    for outcome in pending.drain() {
        if let Some(message) = state.finish(&mut data, outcome) {
            failures.write(ConversionFailed(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planform_core::inference::FAILURE_MESSAGE;
    use planform_core::UploadFilter;

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<FloorPlanData>().add_plugins(ConversionPlugin);
        app
    }

    fn selection() -> UploadSelection {
        let file = UploadFile::new("plan.png", Some("image/png".to_string()), vec![1; 64]);
        UploadSelection::from_files(vec![file], &UploadFilter::floor_plans())
    }

    fn previous() -> FloorPlanResult {
        FloorPlanResult {
            width: 10.0,
            height: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_begin_requires_selection() {
        let mut state = ConversionState::default();
        assert!(state.begin().is_none());
        assert!(!state.in_flight);
    }

    #[test]
    fn test_begin_refuses_while_in_flight() {
        let mut state = ConversionState {
            selection: selection(),
            failure: Some(FAILURE_MESSAGE.to_string()),
            ..Default::default()
        };
        let file = state.begin().unwrap();
        assert_eq!(file.name, "plan.png");
        assert!(state.in_flight);
        assert!(state.failure.is_none());

        assert!(state.begin().is_none());
    }

    #[test]
    fn test_success_replaces_model() {
        let mut app = test_app();
        let result = FloorPlanResult {
            width: 200.0,
            height: 100.0,
            average_door: 1.0,
            ..Default::default()
        };
        app.world_mut().resource_mut::<ConversionState>().in_flight = true;
        app.world().resource::<PendingInference>().push(Ok(result.clone()));
        app.update();

        assert_eq!(app.world().resource::<FloorPlanData>().get(), Some(&result));
        let state = app.world().resource::<ConversionState>();
        assert!(!state.in_flight);
        assert!(state.failure.is_none());
        assert!(app.world().resource::<Messages<ConversionFailed>>().is_empty());
    }

    #[test]
    fn test_failure_keeps_previous_model() {
        let mut app = test_app();
        app.world_mut().resource_mut::<FloorPlanData>().set(previous());
        app.world_mut().resource_mut::<ConversionState>().in_flight = true;

        app.world().resource::<PendingInference>().push(Err(InferenceError::Status(500)));
        app.update();

        let state = app.world().resource::<ConversionState>();
        assert!(!state.in_flight);
        assert_eq!(state.failure.as_deref(), Some(FAILURE_MESSAGE));
        assert_eq!(app.world().resource::<FloorPlanData>().get(), Some(&previous()));
        assert_eq!(app.world().resource::<Messages<ConversionFailed>>().len(), 1);
    }

    #[test]
    fn test_outcomes_apply_in_arrival_order() {
        let mut app = test_app();
        let pending = app.world().resource::<PendingInference>().clone();
        pending.push(Ok(previous()));
        pending.push(Err(InferenceError::Status(502)));
        app.update();

        // The failure leaves the model from the first outcome in place
        assert_eq!(app.world().resource::<FloorPlanData>().get(), Some(&previous()));
        assert!(app.world().resource::<ConversionState>().failure.is_some());
    }
}
