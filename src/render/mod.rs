//! Scene backends.
//!
//! - `raster`: tiny-skia pixmaps (live frames, PNG/JPEG/WebP export)
//! - `svg`: standalone SVG documents (vector export, embedding)

pub mod raster;
pub mod svg;

pub use raster::RasterRenderer;
