//! Main Bevy application setup

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use planform_core::Config;
use planform_scene::{SceneSettings, ViewerHostPlugin};

use crate::network::NetworkPlugin;
use crate::routes::RoutePlugin;
use crate::ui::UiPlugin;
use crate::uploader::UploaderPlugin;

/// Responsive layout derived from the window size
#[derive(Resource, Debug, Clone)]
pub struct UiLayout {
    pub is_narrow: bool,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            is_narrow: false,
            screen_width: 1280.0,
            screen_height: 720.0,
        }
    }
}

impl UiLayout {
    pub fn update_from_window(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
        // Stack the panels on small or portrait screens
        self.is_narrow = width < 800.0 || (height > width * 1.2);
    }

    pub fn side_panel_width(&self) -> f32 {
        if self.is_narrow {
            self.screen_width
        } else {
            (self.screen_width * 0.36).clamp(320.0, 460.0)
        }
    }

    pub fn ui_scale(&self) -> f32 {
        if self.is_narrow {
            1.15
        } else {
            1.0
        }
    }
}

/// Run the Bevy application
pub fn run() {
    let config = Config::default();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Planform - Floor plans in 3D".to_string(),
                canvas: Some("#planform-canvas".to_string()),
                fit_canvas_to_parent: true,
                prevent_default_event_handling: false,
                ..default()
            }),
            ..default()
        }))
        // These must be added BEFORE EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(SceneSettings {
            geometry: config.geometry,
        })
        .init_resource::<UiLayout>()
        .add_plugins(ViewerHostPlugin)
        .add_plugins(RoutePlugin)
        .add_plugins(UploaderPlugin)
        .add_plugins(NetworkPlugin)
        .add_plugins(UiPlugin)
        .run();
}
