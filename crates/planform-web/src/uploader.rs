//! Floor plan uploader
//!
//! Files arrive from a hidden file input or from a drop onto the canvas. The
//! browser callbacks read them asynchronously and queue the finished list; a
//! Bevy system turns it into the current [`UploadSelection`].

use bevy::prelude::*;
use planform_core::{UploadFile, UploadFilter, UploadSelection};
use planform_scene::ConversionState;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct UploaderPlugin;

impl Plugin for UploaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingUploads>()
            .init_resource::<DropHover>()
            .insert_resource(Uploader {
                filter: UploadFilter::floor_plans(),
            })
            .add_systems(Startup, listen_for_drops)
            .add_systems(Update, process_uploads);
    }
}

/// File lists read by browser callbacks, in arrival order
#[derive(Resource, Default, Clone)]
pub struct PendingUploads(pub Arc<Mutex<VecDeque<Vec<UploadFile>>>>);

/// Set while files are dragged over the canvas
#[derive(Resource, Default, Clone)]
pub struct DropHover(pub Arc<AtomicBool>);

impl DropHover {
    pub fn is_hovering(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Uploader {
    pub filter: UploadFilter,
}

impl Uploader {
    /// Open the browser's file dialog
    pub fn browse(&self, pending: &PendingUploads) {
        #[cfg(target_arch = "wasm32")]
        js_interop::open_file_dialog(&self.filter.to_accept_string(), pending.0.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = pending;
            tracing::warn!("File dialog is only available in the browser build");
        }
    }
}

fn process_uploads(
    pending: Res<PendingUploads>,
    uploader: Res<Uploader>,
    mut state: ResMut<ConversionState>,
) {
    let lists: Vec<Vec<UploadFile>> = match pending.0.lock() {
        Ok(mut queue) => queue.drain(..).collect(),
        Err(_) => return,
    };

    for files in lists {
        let selection = UploadSelection::from_files(files, &uploader.filter);
        tracing::info!(files = selection.len(), "Selected floor plan files");
        state.selection.replace(selection);
    }
}

fn listen_for_drops(pending: Res<PendingUploads>, hover: Res<DropHover>) {
    #[cfg(target_arch = "wasm32")]
    js_interop::listen_for_drops(pending.0.clone(), hover.0.clone());

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (pending, hover);
    }
}

// ============================================================================
// JavaScript Interop (WASM only)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{DragEvent, FileList, HtmlInputElement};

    type Queue = Arc<Mutex<VecDeque<Vec<UploadFile>>>>;

    /// Read every file of a list, in order, then queue the list
    fn read_files(files: FileList, queue: Queue) {
        let files: Vec<web_sys::File> = (0..files.length()).filter_map(|i| files.get(i)).collect();
        if files.is_empty() {
            return;
        }

        wasm_bindgen_futures::spawn_local(async move {
            let mut uploads = Vec::with_capacity(files.len());
            for file in files {
                match JsFuture::from(file.array_buffer()).await {
                    Ok(buffer) => {
                        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
                        let mime = file.type_();
                        uploads.push(UploadFile::new(
                            file.name(),
                            (!mime.is_empty()).then_some(mime),
                            bytes,
                        ));
                    }
                    Err(e) => {
                        tracing::error!("Failed to read {}: {:?}", file.name(), e);
                    }
                }
            }
            if let Ok(mut queue) = queue.lock() {
                queue.push_back(uploads);
            }
        });
    }

    /// Open a file dialog using a hidden HTML input element
    pub fn open_file_dialog(accept: &str, queue: Queue) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            tracing::error!("open_file_dialog: no document object");
            return;
        };

        let input: HtmlInputElement = match document
            .create_element("input")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            Some(input) => input,
            None => {
                tracing::error!("open_file_dialog: failed to create input element");
                return;
            }
        };

        input.set_type("file");
        input.set_accept(accept);
        input.style().set_property("display", "none").ok();

        let Some(body) = document.body() else {
            tracing::error!("open_file_dialog: no document body");
            return;
        };
        if let Err(e) = body.append_child(&input) {
            tracing::error!("open_file_dialog: failed to append input to body: {:?}", e);
            return;
        }

        let input_clone = input.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            if let Some(files) = input_clone.files() {
                read_files(files, queue.clone());
            }
            // Remove the input element
            if let Some(parent) = input_clone.parent_node() {
                parent.remove_child(&input_clone).ok();
            }
        }) as Box<dyn FnMut(_)>);

        input.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();

        input.click();
    }

    /// Accept files dropped onto the canvas
    pub fn listen_for_drops(queue: Queue, hover: Arc<AtomicBool>) {
        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.query_selector("#planform-canvas").ok().flatten())
        else {
            tracing::error!("listen_for_drops: canvas not found");
            return;
        };

        let hover_over = hover.clone();
        let on_drag_over = Closure::wrap(Box::new(move |event: DragEvent| {
            event.prevent_default();
            hover_over.store(true, Ordering::Relaxed);
        }) as Box<dyn FnMut(_)>);

        let hover_leave = hover.clone();
        let on_drag_leave = Closure::wrap(Box::new(move |_event: DragEvent| {
            hover_leave.store(false, Ordering::Relaxed);
        }) as Box<dyn FnMut(_)>);

        let on_drop = Closure::wrap(Box::new(move |event: DragEvent| {
            event.prevent_default();
            hover.store(false, Ordering::Relaxed);
            if let Some(files) = event.data_transfer().and_then(|t| t.files()) {
                read_files(files, queue.clone());
            }
        }) as Box<dyn FnMut(_)>);

        for (name, closure) in [
            ("dragover", &on_drag_over),
            ("dragleave", &on_drag_leave),
            ("drop", &on_drop),
        ] {
            if let Err(e) = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                tracing::error!("listen_for_drops: failed to add {} listener: {:?}", name, e);
            }
        }

        on_drag_over.forget();
        on_drag_leave.forget();
        on_drop.forget();
    }
}
