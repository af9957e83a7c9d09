//! Backend-agnostic description of one rendered frame.
//!
//! Both the raster and the SVG backends draw from a [`Scene`], so a new fill
//! mode or effect only has to be described here once.

use crate::color::Color;
use crate::effects::BlendMode;
use crate::error::{BlobError, Result};
use crate::fill::{diagonal_span, GradientStop, Paint};
use crate::geometry::{BoundingBox, FitTransform, Point, ShapePath};
use crate::state::ShapeState;

/// Canvas size at which shadow offsets and pattern scales are authored.
pub const REFERENCE_SIZE: f64 = 600.0;

/// Free space left around the shape, as a fraction of each canvas side.
pub const SHAPE_PADDING: f64 = 0.15;

/// Light falls from the top-left corner.
const LIGHTING_ANGLE: f64 = 45.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowLayer {
    /// Blur radius in pixels; the Gaussian sigma is half of it.
    pub blur: f64,
    pub dx: f64,
    pub dy: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub paint: Paint,
    pub blend_mode: BlendMode,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrainLayer {
    /// Index into the grain texture pool.
    pub frame: usize,
    pub blend_mode: BlendMode,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Option<Color>,
    /// Outline in canvas coordinates. Empty when there is nothing to draw.
    pub outline: ShapePath,
    /// Canvas-space bounds of the fitted vertices.
    pub bounds: BoundingBox,
    pub fill: Paint,
    pub shadow: Option<ShadowLayer>,
    pub lighting: Option<OverlayLayer>,
    pub grain: Option<GrainLayer>,
}

impl Scene {
    /// Lay out `vertices` on a `width` x `height` canvas with `state`'s paint
    /// stack. `grain_frame` selects the grain texture.
    pub fn compose(
        state: &ShapeState,
        vertices: &[Point],
        width: u32,
        height: u32,
        grain_frame: usize,
    ) -> Result<Scene> {
        if width == 0 || height == 0 {
            return Err(BlobError::render(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        let (w, h) = (width as f64, height as f64);
        let resolution = w.min(h) / REFERENCE_SIZE;

        let Some(raw_bounds) = BoundingBox::of(vertices) else {
            return Ok(Scene::background_only(state, width, height));
        };
        let fit = FitTransform::new(&raw_bounds, w, h, SHAPE_PADDING);
        let bounds = raw_bounds.transformed(&fit);
        let outline = ShapePath::smooth(vertices).transformed(&fit);

        let shadow = state.shadow.is_visible().then(|| ShadowLayer {
            blur: state.shadow.blur * resolution,
            dx: state.shadow.offset_x * resolution,
            dy: state.shadow.offset_y * resolution,
            color: state.shadow.color,
        });

        let lighting = (state.lighting.opacity > 0.0).then(|| {
            let (start, end) = diagonal_span(&bounds, LIGHTING_ANGLE);
            OverlayLayer {
                paint: Paint::LinearGradient {
                    start,
                    end,
                    stops: vec![
                        GradientStop::new(0.0, Color::WHITE),
                        GradientStop::new(1.0, Color::BLACK),
                    ],
                },
                blend_mode: state.lighting.blend_mode,
                opacity: state.lighting.opacity,
            }
        });

        let grain = (state.grain.opacity > 0.0).then(|| GrainLayer {
            frame: grain_frame,
            blend_mode: state.grain.blend_mode,
            opacity: state.grain.opacity,
        });

        Ok(Scene {
            width,
            height,
            background: state.background(),
            outline,
            bounds,
            fill: state.fill().resolve(&bounds, resolution),
            shadow,
            lighting,
            grain,
        })
    }

    fn background_only(state: &ShapeState, width: u32, height: u32) -> Scene {
        Scene {
            width,
            height,
            background: state.background(),
            outline: ShapePath::default(),
            bounds: BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            },
            fill: Paint::Solid(Color::TRANSPARENT),
            shadow: None,
            lighting: None,
            grain: None,
        }
    }

    pub fn has_shape(&self) -> bool {
        !self.outline.is_empty()
    }
}
