pub mod animation;
pub mod color;
pub mod component;
pub mod controller;
pub mod effects;
pub mod error;
pub mod export;
pub mod fill;
#[cfg(not(target_arch = "wasm32"))]
pub mod frame_loop;
pub mod geometry;
pub mod random;
pub mod render;
pub mod scene;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
pub mod state;

#[cfg(feature = "wasm")]
mod wasm;

use std::path::Path;

use error::Result;

pub use component::derive_tag_name;
pub use controller::ShapeController;
pub use export::ExportFormat;
pub use state::ShapeState;

/// Load a preset, or the defaults when `path` is `None`.
pub fn load_preset(path: Option<&Path>) -> Result<ShapeState> {
    match path {
        Some(p) => ShapeState::load(p),
        None => Ok(ShapeState::default()),
    }
}

/// Render the resting shape of `state` in `format`.
pub fn render_preset(state: &ShapeState, format: ExportFormat, width: u32, height: u32) -> Result<Vec<u8>> {
    let vertices = controller::vertices_for(state);
    export::export_bytes(state, &vertices, format, width, height)
}

/// Render `state` as SVG and wrap it in a custom element module.
pub fn preset_component(state: &ShapeState, tag_name: &str, size: u32) -> Result<String> {
    let vertices = controller::vertices_for(state);
    let svg = export::render_svg(state, &vertices, size, size)?;
    component::wrap_web_component(&svg, tag_name)
}
