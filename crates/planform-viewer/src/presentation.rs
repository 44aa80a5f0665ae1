//! Embedded and full-window presentation
//!
//! The embedded presentation shows the model next to the control panel and
//! offers the fullscreen control. The fullscreen presentation switches the
//! window to borderless fullscreen and gives the whole window to the model.
//! Either way, switching only remounts the viewer host; the published result
//! is left alone.

use bevy::prelude::*;
use bevy::window::{MonitorSelection, PrimaryWindow, WindowMode};
use planform_scene::{HostOptions, HostViewport, PresentationRequest, ViewerHost, ViewerSet};

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presentation {
    #[default]
    Embedded,
    Fullscreen,
}

impl Presentation {
    pub fn for_request(request: PresentationRequest) -> Self {
        match request {
            PresentationRequest::Fullscreen => Self::Fullscreen,
            PresentationRequest::Embedded => Self::Embedded,
        }
    }

    pub fn window_mode(&self) -> WindowMode {
        match self {
            Self::Embedded => WindowMode::Windowed,
            Self::Fullscreen => WindowMode::BorderlessFullscreen(MonitorSelection::Current),
        }
    }

    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            show_fullscreen_control: *self == Self::Embedded,
        }
    }
}

pub struct PresentationPlugin {
    pub initial: Presentation,
}

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.initial)
            .add_systems(Startup, mount_initial_presentation)
            .add_systems(
                Update,
                (exit_fullscreen_on_escape, handle_presentation_requests, remount_on_change)
                    .chain()
                    .before(ViewerSet::Lifecycle),
            );
    }
}

fn mount_initial_presentation(
    presentation: Res<Presentation>,
    mut host: ResMut<ViewerHost>,
    mut viewport: ResMut<HostViewport>,
) {
    apply_presentation(*presentation, &mut host, &mut viewport);
}

fn apply_presentation(presentation: Presentation, host: &mut ViewerHost, viewport: &mut HostViewport) {
    host.unmount();
    if presentation == Presentation::Fullscreen {
        *viewport = HostViewport::whole_window();
    }
    host.mount(presentation.host_options());
}

fn exit_fullscreen_on_escape(
    keys: Res<ButtonInput<KeyCode>>,
    presentation: Res<Presentation>,
    mut requests: MessageWriter<PresentationRequest>,
) {
    if *presentation == Presentation::Fullscreen && keys.just_pressed(KeyCode::Escape) {
        requests.write(PresentationRequest::Embedded);
    }
}

fn handle_presentation_requests(
    mut requests: MessageReader<PresentationRequest>,
    mut presentation: ResMut<Presentation>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    for request in requests.read() {
        let next = Presentation::for_request(*request);
        if *presentation == next {
            continue;
        }
        tracing::info!(?next, "Presentation change requested");
        *presentation = next;
        if let Ok(mut window) = windows.single_mut() {
            window.mode = next.window_mode();
        }
    }
}

fn remount_on_change(
    presentation: Res<Presentation>,
    mut host: ResMut<ViewerHost>,
    mut viewport: ResMut<HostViewport>,
) {
    if presentation.is_changed() && !presentation.is_added() {
        tracing::debug!(presentation = ?*presentation, "Remounting viewer");
        apply_presentation(*presentation, &mut host, &mut viewport);
    }
}
