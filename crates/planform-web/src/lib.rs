//! Planform Web - browser front-end
//!
//! Landing page with the floor plan uploader and an embedded 3D preview, plus
//! a full-viewport route showing only the model.

mod app;
mod network;
mod routes;
mod ui;
mod uploader;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );

    app::run();
}
