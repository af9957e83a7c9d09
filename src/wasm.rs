//! WASM bindings for the blob engine.
//!
//! Exposes preset rendering and vertex generation to JavaScript via
//! wasm-bindgen. Build with: `wasm-pack build --target web --features wasm`

use wasm_bindgen::prelude::*;

use crate::controller::vertices_for;
use crate::geometry::generate_vertices;
use crate::state::ShapeState;

fn js_err(e: crate::error::BlobError) -> JsError {
    JsError::new(&e.to_string())
}

/// Render a JSON preset to an SVG document at `width` x `height`.
///
/// Missing preset fields take their defaults; invalid values throw.
#[wasm_bindgen]
pub fn render_svg_from_preset(json: &str, width: u32, height: u32) -> Result<String, JsError> {
    let state = ShapeState::from_json(json).map_err(js_err)?;
    crate::export::render_svg(&state, &vertices_for(&state), width, height).map_err(js_err)
}

/// Wrap a JSON preset in a custom element module named `tag_name`.
#[wasm_bindgen]
pub fn component_from_preset(json: &str, tag_name: &str, size: u32) -> Result<String, JsError> {
    let state = ShapeState::from_json(json).map_err(js_err)?;
    let svg = crate::export::render_svg(&state, &vertices_for(&state), size, size).map_err(js_err)?;
    crate::component::wrap_web_component(&svg, tag_name).map_err(js_err)
}

/// Vertices as a flat `[x0, y0, x1, y1, ...]` array.
#[wasm_bindgen]
pub fn generate_vertices_flat(
    num_points: usize,
    radius: f64,
    roughness: f64,
    center_x: f64,
    center_y: f64,
    seed: f64,
) -> Vec<f64> {
    generate_vertices(num_points, radius, roughness, center_x, center_y, seed)
        .into_iter()
        .flat_map(|p| [p.x, p.y])
        .collect()
}

/// The default preset as JSON.
#[wasm_bindgen]
pub fn default_preset() -> Result<String, JsError> {
    ShapeState::default().to_json().map_err(js_err)
}
