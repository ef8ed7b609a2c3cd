//! Hackviewer WASM Web Runtime
//!
//! Mounts the hero model viewer into a host element: loads a textured glTF
//! model, fits it into view, spins it, lets the visitor drag it around, and
//! renders through WebGPU. Everything except the browser glue in `app`
//! builds and tests natively.

#[cfg(target_arch = "wasm32")]
mod app;
pub mod builder;
pub mod config;
pub mod input;
pub mod loader;
pub mod render_loop;
pub mod resize;
pub mod rig;
pub mod scene;
pub mod session;
pub mod surface;
pub mod transform;

pub use builder::{normalize, Normalized, SceneGraph, SlotKind};
pub use config::{ConfigError, ViewerConfig};
pub use loader::{LoadError, LoadOutcome, LoadedModel};
pub use session::ViewerSession;
pub use surface::RenderSurface;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Entry point — called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
    log::info!("Hackviewer runtime initialized");
}

/// Mount the viewer into the element with id `host_id`.
///
/// `config_json` overrides any [`ViewerConfig`] fields. `on_loaded` fires once
/// loading ends, so the page can hide its overlay without polling. Rejects
/// only when the host element or a GPU adapter cannot be obtained.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn mount_viewer(
    host_id: String,
    config_json: Option<String>,
    on_loaded: Option<js_sys::Function>,
) -> Result<app::ViewerHandle, JsValue> {
    let config = match config_json {
        Some(json) => ViewerConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => ViewerConfig::default(),
    };
    app::mount(&host_id, config, on_loaded).await
}
