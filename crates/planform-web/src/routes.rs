//! Hash routes and presentation switching
//!
//! `#/` shows the landing page with the embedded preview, `#/model-fullscreen`
//! shows only the model. Both read the same published result; switching route
//! only remounts the viewer host with the route's options.

use bevy::prelude::*;
use planform_scene::{HostOptions, HostViewport, PresentationRequest, ViewerHost};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    ModelFullscreen,
}

impl Route {
    pub fn from_hash(hash: &str) -> Self {
        let path = hash.trim_start_matches('#').trim_end_matches('/');
        match path {
            "/model-fullscreen" | "model-fullscreen" => Self::ModelFullscreen,
            _ => Self::Home,
        }
    }

    pub fn hash(&self) -> &'static str {
        match self {
            Self::Home => "#/",
            Self::ModelFullscreen => "#/model-fullscreen",
        }
    }

    pub fn for_request(request: PresentationRequest) -> Self {
        match request {
            PresentationRequest::Fullscreen => Self::ModelFullscreen,
            PresentationRequest::Embedded => Self::Home,
        }
    }

    /// Viewer host options for this route
    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            show_fullscreen_control: *self == Self::Home,
        }
    }
}

/// Route currently displayed
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentRoute(pub Route);

/// Routes reported by the browser's hashchange listener
#[derive(Resource, Default)]
pub struct PendingRoute(pub Arc<Mutex<Option<Route>>>);

pub struct RoutePlugin;

impl Plugin for RoutePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(CurrentRoute(initial_route()))
            .init_resource::<PendingRoute>()
            .add_systems(Startup, (listen_for_hash_changes, mount_initial_route))
            .add_systems(
                Update,
                (handle_presentation_requests, apply_pending_route, remount_on_route_change)
                    .chain()
                    .before(planform_scene::ViewerSet::Lifecycle),
            );
    }
}

fn initial_route() -> Route {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(hash) = web_sys::window().and_then(|w| w.location().hash().ok()) {
            return Route::from_hash(&hash);
        }
    }
    Route::Home
}

fn mount_initial_route(route: Res<CurrentRoute>, mut host: ResMut<ViewerHost>, mut viewport: ResMut<HostViewport>) {
    apply_route(route.0, &mut host, &mut viewport);
}

fn apply_route(route: Route, host: &mut ViewerHost, viewport: &mut HostViewport) {
    host.unmount();
    if route == Route::ModelFullscreen {
        *viewport = HostViewport::whole_window();
    }
    host.mount(route.host_options());
}

fn handle_presentation_requests(
    mut requests: MessageReader<PresentationRequest>,
    mut current: ResMut<CurrentRoute>,
) {
    for request in requests.read() {
        let route = Route::for_request(*request);
        tracing::info!(?route, "Presentation change requested");
        navigate(route);
        if current.0 != route {
            current.0 = route;
        }
    }
}

fn apply_pending_route(pending: Res<PendingRoute>, mut current: ResMut<CurrentRoute>) {
    let route = pending.0.lock().ok().and_then(|mut slot| slot.take());
    if let Some(route) = route {
        if current.0 != route {
            current.0 = route;
        }
    }
}

fn remount_on_route_change(
    route: Res<CurrentRoute>,
    mut host: ResMut<ViewerHost>,
    mut viewport: ResMut<HostViewport>,
) {
    if route.is_changed() && !route.is_added() {
        tracing::debug!(route = ?route.0, "Remounting viewer for route");
        apply_route(route.0, &mut host, &mut viewport);
    }
}

/// Update the location hash so browser history follows the route
fn navigate(route: Route) {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_hash(route.hash()) {
                tracing::error!("Failed to update location hash: {:?}", e);
            }
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = route;
    }
}

fn listen_for_hash_changes(pending: Res<PendingRoute>) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::prelude::*;
        use wasm_bindgen::JsCast;

        let Some(window) = web_sys::window() else {
            return;
        };
        let pending = pending.0.clone();
        let location = window.location();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let route = Route::from_hash(&location.hash().unwrap_or_default());
            if let Ok(mut slot) = pending.lock() {
                *slot = Some(route);
            }
        }) as Box<dyn FnMut(_)>);

        if let Err(e) = window.add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref()) {
            tracing::error!("Failed to listen for hash changes: {:?}", e);
        }
        closure.forget();
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = pending;
    }
}
