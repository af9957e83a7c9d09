//! Static export: raster and SVG output at any resolution, batch export and
//! frame sequences.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tiny_skia::Pixmap;
use tracing::{debug, warn};

use crate::color::Color;
use crate::controller::ShapeController;
use crate::error::{BlobError, Result};
use crate::geometry::Point;
use crate::render::{svg, RasterRenderer};
use crate::scene::Scene;
use crate::state::ShapeState;

pub const JPEG_QUALITY: u8 = 92;

/// Upper bound on the length of a PNG frame sequence.
pub const MAX_FRAME_COUNT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Webp,
        ExportFormat::Svg,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    pub fn is_raster(self) -> bool {
        !matches!(self, ExportFormat::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Webp => "webp",
            ExportFormat::Svg => "svg",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::Webp),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(BlobError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Draw `vertices` statically: grain frame 0, no undulation.
pub fn render_to_pixmap(
    state: &ShapeState,
    vertices: &[Point],
    width: u32,
    height: u32,
) -> Result<Pixmap> {
    let scene = Scene::compose(state, vertices, width, height, 0)?;
    RasterRenderer::new()?.render(&scene)
}

/// The SVG counterpart of [`render_to_pixmap`].
pub fn render_svg(state: &ShapeState, vertices: &[Point], width: u32, height: u32) -> Result<String> {
    let scene = Scene::compose(state, vertices, width, height, 0)?;
    Ok(svg::render(&scene))
}

/// Straight (non-premultiplied) RGBA bytes.
pub fn to_rgba8(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Opaque RGB bytes composited over `matte`.
fn flatten_rgb8(pixmap: &Pixmap, matte: Color) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for px in pixmap.pixels() {
        // premultiplied: src + matte * (1 - a)
        let inv = 255 - px.alpha() as u32;
        for (src, bg) in [(px.red(), matte.r), (px.green(), matte.g), (px.blue(), matte.b)] {
            out.push((src as u32 + (bg as u32 * inv + 127) / 255).min(255) as u8);
        }
    }
    out
}

/// Encode a rendered pixmap. JPEG has no alpha, so it is flattened over
/// `background` (white when transparent).
pub fn encode_pixmap(pixmap: &Pixmap, format: ExportFormat, background: Option<Color>) -> Result<Vec<u8>> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut buf = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut buf).write_image(&to_rgba8(pixmap), w, h, ExtendedColorType::Rgba8)?
        }
        ExportFormat::Jpeg => {
            let rgb = flatten_rgb8(pixmap, background.unwrap_or(Color::WHITE));
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).write_image(
                &rgb,
                w,
                h,
                ExtendedColorType::Rgb8,
            )?
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut buf).write_image(
            &to_rgba8(pixmap),
            w,
            h,
            ExtendedColorType::Rgba8,
        )?,
        ExportFormat::Svg => {
            return Err(BlobError::UnsupportedFormat(
                "svg is not a raster format".to_string(),
            ))
        }
    }
    Ok(buf)
}

/// Render and encode in one step.
pub fn export_bytes(
    state: &ShapeState,
    vertices: &[Point],
    format: ExportFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    debug!(%format, width, height, "export");
    match format {
        ExportFormat::Svg => Ok(render_svg(state, vertices, width, height)?.into_bytes()),
        raster => {
            let pixmap = render_to_pixmap(state, vertices, width, height)?;
            encode_pixmap(&pixmap, raster, state.background())
        }
    }
}

/// Reported after each format of a batch.
#[derive(Debug)]
pub struct ExportProgress<'a> {
    /// Formats finished so far, this one included.
    pub completed: usize,
    pub total: usize,
    pub format: ExportFormat,
    pub path: &'a Path,
    pub error: Option<&'a BlobError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(ExportFormat, BlobError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export `formats` one after another into `outdir/<stem>.<ext>`.
///
/// A failing format is logged and recorded; the remaining formats still run.
/// Only a missing, uncreatable `outdir` aborts the batch.
pub fn export_batch(
    state: &ShapeState,
    vertices: &[Point],
    formats: &[ExportFormat],
    size: (u32, u32),
    outdir: &Path,
    stem: &str,
    mut progress: impl FnMut(&ExportProgress),
) -> Result<BatchReport> {
    std::fs::create_dir_all(outdir).map_err(|e| BlobError::io(outdir, e))?;

    let mut report = BatchReport::default();
    for (i, &format) in formats.iter().enumerate() {
        let path = outdir.join(format!("{stem}.{}", format.extension()));
        let result = export_bytes(state, vertices, format, size.0, size.1)
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| BlobError::io(&path, e)));

        let error = result.err();
        progress(&ExportProgress {
            completed: i + 1,
            total: formats.len(),
            format,
            path: &path,
            error: error.as_ref(),
        });
        match error {
            None => report.written.push(path),
            Some(e) => {
                warn!(%format, "export failed: {e}");
                report.failed.push((format, e));
            }
        }
    }
    Ok(report)
}

/// Render `duration` seconds of the live compositor as numbered PNG files.
pub fn export_frames(
    controller: &mut ShapeController,
    fps: f64,
    duration: f64,
    size: (u32, u32),
    outdir: &Path,
) -> Result<Vec<PathBuf>> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(BlobError::invalid("fps", format!("must be positive, got {fps}")));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(BlobError::invalid(
            "duration",
            format!("must be non-negative, got {duration}"),
        ));
    }
    let frames = (duration * fps).ceil().max(1.0);
    if frames > MAX_FRAME_COUNT as f64 {
        return Err(BlobError::invalid(
            "fps",
            format!("{fps} fps for {duration} s exceeds {MAX_FRAME_COUNT} frames"),
        ));
    }
    std::fs::create_dir_all(outdir).map_err(|e| BlobError::io(outdir, e))?;

    let count = frames as usize;
    let background = controller.state().background();
    let mut paths = Vec::new();
    for i in 0..count {
        let now = i as f64 / fps;
        let pixmap = controller.render_frame(now, size.0, size.1)?;
        let path = outdir.join(format!("frame_{i:04}.png"));
        let bytes = encode_pixmap(&pixmap, ExportFormat::Png, background)?;
        std::fs::write(&path, bytes).map_err(|e| BlobError::io(&path, e))?;
        paths.push(path);
    }
    debug!(frames = count, "frame sequence written");
    Ok(paths)
}

/// Compare two RGBA buffers. Returns the percentage of pixels whose channels
/// all differ by at most `channel_threshold`.
pub fn compare_pixels(actual: &[u8], reference: &[u8], channel_threshold: u8) -> f64 {
    if actual.len() != reference.len() || actual.is_empty() {
        return 0.0;
    }
    let total = actual.len() / 4;
    let matching = actual
        .chunks_exact(4)
        .zip(reference.chunks_exact(4))
        .filter(|(a, b)| a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= channel_threshold))
        .count();
    matching as f64 / total as f64 * 100.0
}
