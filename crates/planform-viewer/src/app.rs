//! Main Bevy application setup

use anyhow::Result;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use planform_core::{Config, FloorPlanResult};
use planform_scene::{FloorPlanData, SceneSettings, ViewerHostPlugin};
use std::path::PathBuf;

use crate::inference::{InferenceClient, InferencePlugin};
use crate::presentation::{Presentation, PresentationPlugin};
use crate::ui::UiPlugin;
use crate::upload::{UploadPlugin, UploadQueue};

/// Everything the command line resolved before the window opens
pub struct Launch {
    pub config: Config,
    pub initial_result: Option<FloorPlanResult>,
    pub initial_image: Option<PathBuf>,
}

/// Viewer settings that only the native front-end uses
#[derive(Resource, Debug, Clone)]
pub struct NativeSettings {
    /// Height of the embedded preview in logical pixels
    pub embedded_height: f32,
}

/// Run the Bevy application
pub fn run(launch: Launch) -> Result<()> {
    let Launch {
        config,
        initial_result,
        initial_image,
    } = launch;

    let presentation = if config.viewer.start_fullscreen {
        Presentation::Fullscreen
    } else {
        Presentation::Embedded
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Planform - Floor plans in 3D".to_string(),
            resolution: (1280, 800).into(),
            mode: presentation.window_mode(),
            ..default()
        }),
        ..default()
    }))
    // These must be added BEFORE EguiPlugin so it can detect PickingPlugin
    .add_plugins(DefaultPickingPlugins)
    .add_plugins(EguiPlugin::default())
    .insert_resource(SceneSettings {
        geometry: config.geometry.clone(),
    })
    .insert_resource(NativeSettings {
        embedded_height: config.viewer.embedded_height,
    })
    .add_plugins(ViewerHostPlugin)
    .add_plugins(PresentationPlugin { initial: presentation })
    .add_plugins(UploadPlugin)
    .insert_resource(InferenceClient::new(&config.inference)?)
    .add_plugins(InferencePlugin)
    .add_plugins(UiPlugin);

    if let Some(result) = initial_result {
        app.world_mut().resource_mut::<FloorPlanData>().set(result);
    }
    if let Some(path) = initial_image {
        app.world_mut().resource_mut::<UploadQueue>().push(vec![path]);
    }

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("Viewer exited with code {}", code),
    }
}
