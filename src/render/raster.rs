//! tiny-skia backend: draws a [`Scene`] into a premultiplied RGBA pixmap.

use tiny_skia::{
    FillRule, FilterQuality, LinearGradient, Paint as SkPaint, Path, PathBuilder, Pixmap,
    PixmapPaint, RadialGradient, Rect, Shader, SpreadMode, Transform,
};

use crate::color::Color;
use crate::effects::{grain_pool, BlendMode, GRAIN_FRAMES};
use crate::error::{BlobError, Result};
use crate::fill::{GradientStop, Paint, PatternTile, TileMark};
use crate::geometry::{PathSegment, ShapePath};
use crate::scene::Scene;

/// Raster compositor. Holds the pre-rendered grain textures and the last
/// pattern tile so repeated frames reuse them.
pub struct RasterRenderer {
    grain: Vec<Pixmap>,
    tile_cache: Option<(PatternTile, Pixmap)>,
}

impl RasterRenderer {
    pub fn new() -> Result<Self> {
        let grain = grain_pool()
            .iter()
            .map(|tex| {
                let mut pm = Pixmap::new(tex.size, tex.size)
                    .ok_or_else(|| BlobError::render("grain texture allocation failed"))?;
                for (px, &v) in pm.data_mut().chunks_exact_mut(4).zip(&tex.luma) {
                    px.copy_from_slice(&[v, v, v, 255]);
                }
                Ok(pm)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            grain,
            tile_cache: None,
        })
    }

    /// Draw `scene`: background, shadow, fill, lighting, grain.
    pub fn render(&mut self, scene: &Scene) -> Result<Pixmap> {
        let mut canvas = Pixmap::new(scene.width, scene.height).ok_or_else(|| {
            BlobError::render(format!(
                "cannot allocate {}x{} pixmap",
                scene.width, scene.height
            ))
        })?;

        if let Some(bg) = scene.background {
            canvas.fill(sk_color(bg));
        }

        let Some(path) = build_path(&scene.outline) else {
            return Ok(canvas);
        };

        if let Some(shadow) = &scene.shadow {
            let mut layer = Pixmap::new(scene.width, scene.height)
                .ok_or_else(|| BlobError::render("shadow layer allocation failed"))?;
            let mut paint = SkPaint::default();
            paint.set_color(sk_color(shadow.color));
            paint.anti_alias = true;
            layer.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::from_translate(shadow.dx as f32, shadow.dy as f32),
                None,
            );
            if shadow.blur > 0.0 {
                gaussian_blur(&mut layer, shadow.blur / 2.0);
            }
            canvas.draw_pixmap(
                0,
                0,
                layer.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        if let Paint::Pattern(tile) = &scene.fill {
            self.ensure_tile(tile)?;
        }
        let tile = self.tile_cache.as_ref().map(|(_, pm)| pm);

        let mut paint = SkPaint::default();
        paint.anti_alias = true;
        paint.shader = shader_for(&scene.fill, tile, 1.0);
        canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

        if let Some(light) = &scene.lighting {
            let mut paint = SkPaint::default();
            paint.anti_alias = true;
            paint.blend_mode = sk_blend(light.blend_mode);
            paint.shader = shader_for(&light.paint, None, light.opacity);
            canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        if let Some(grain) = &scene.grain {
            let texture = &self.grain[grain.frame % GRAIN_FRAMES];
            let mut paint = SkPaint::default();
            paint.anti_alias = true;
            paint.blend_mode = sk_blend(grain.blend_mode);
            paint.shader = tiny_skia::Pattern::new(
                texture.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                grain.opacity as f32,
                Transform::identity(),
            );
            canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        Ok(canvas)
    }

    fn ensure_tile(&mut self, tile: &PatternTile) -> Result<()> {
        if matches!(&self.tile_cache, Some((cached, _)) if cached == tile) {
            return Ok(());
        }
        tracing::debug!(size = tile.size, marks = tile.marks.len(), "rebuilding pattern tile");
        let pixmap = render_tile(tile)?;
        self.tile_cache = Some((tile.clone(), pixmap));
        Ok(())
    }
}

fn render_tile(tile: &PatternTile) -> Result<Pixmap> {
    let side = tile.size.round().max(1.0) as u32;
    let mut pm = Pixmap::new(side, side)
        .ok_or_else(|| BlobError::render("pattern tile allocation failed"))?;
    pm.fill(sk_color(tile.background));

    for mark in &tile.marks {
        let mut paint = SkPaint::default();
        paint.anti_alias = true;
        match *mark {
            TileMark::Circle { cx, cy, r, color } => {
                paint.set_color(sk_color(color));
                if let Some(circle) = PathBuilder::from_circle(cx as f32, cy as f32, r as f32) {
                    pm.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            TileMark::Rect { x, y, w, h, color } => {
                paint.set_color(sk_color(color));
                if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
                    pm.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
        }
    }
    Ok(pm)
}

/// Convert an outline to a tiny-skia path. `None` when empty.
pub fn build_path(outline: &ShapePath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for seg in &outline.segments {
        match *seg {
            PathSegment::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathSegment::QuadTo { ctrl, to } => {
                pb.quad_to(ctrl.x as f32, ctrl.y as f32, to.x as f32, to.y as f32)
            }
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

fn shader_for<'a>(paint: &Paint, tile: Option<&'a Pixmap>, opacity: f64) -> Shader<'a> {
    match paint {
        Paint::Solid(c) => Shader::SolidColor(sk_color(c.with_alpha_scaled(opacity))),
        Paint::LinearGradient { start, end, stops } => LinearGradient::new(
            tiny_skia::Point::from_xy(start.x as f32, start.y as f32),
            tiny_skia::Point::from_xy(end.x as f32, end.y as f32),
            sk_stops(stops, opacity),
            SpreadMode::Pad,
            Transform::identity(),
        )
        .unwrap_or_else(|| first_stop(stops, opacity)),
        Paint::RadialGradient {
            center,
            radius,
            stops,
        } => {
            let c = tiny_skia::Point::from_xy(center.x as f32, center.y as f32);
            RadialGradient::new(
                c,
                c,
                *radius as f32,
                sk_stops(stops, opacity),
                SpreadMode::Pad,
                Transform::identity(),
            )
            .unwrap_or_else(|| first_stop(stops, opacity))
        }
        Paint::Pattern(tile_desc) => match tile {
            Some(pm) => tiny_skia::Pattern::new(
                pm.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                opacity as f32,
                Transform::identity(),
            ),
            None => Shader::SolidColor(sk_color(tile_desc.background.with_alpha_scaled(opacity))),
        },
    }
}

fn sk_stops(stops: &[GradientStop], opacity: f64) -> Vec<tiny_skia::GradientStop> {
    stops
        .iter()
        .map(|s| tiny_skia::GradientStop::new(s.offset as f32, sk_color(s.color.with_alpha_scaled(opacity))))
        .collect()
}

fn first_stop<'a>(stops: &[GradientStop], opacity: f64) -> Shader<'a> {
    let c = stops.first().map(|s| s.color).unwrap_or(Color::TRANSPARENT);
    Shader::SolidColor(sk_color(c.with_alpha_scaled(opacity)))
}

pub(crate) fn sk_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub(crate) fn sk_blend(mode: BlendMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as Sk;
    match mode {
        BlendMode::Normal => Sk::SourceOver,
        BlendMode::Multiply => Sk::Multiply,
        BlendMode::Screen => Sk::Screen,
        BlendMode::Overlay => Sk::Overlay,
        BlendMode::Darken => Sk::Darken,
        BlendMode::Lighten => Sk::Lighten,
        BlendMode::ColorDodge => Sk::ColorDodge,
        BlendMode::ColorBurn => Sk::ColorBurn,
        BlendMode::HardLight => Sk::HardLight,
        BlendMode::SoftLight => Sk::SoftLight,
        BlendMode::Difference => Sk::Difference,
        BlendMode::Exclusion => Sk::Exclusion,
        BlendMode::Hue => Sk::Hue,
        BlendMode::Saturation => Sk::Saturation,
        BlendMode::Color => Sk::Color,
        BlendMode::Luminosity => Sk::Luminosity,
    }
}

/// Approximate a Gaussian blur with three box passes per axis.
fn gaussian_blur(pixmap: &mut Pixmap, sigma: f64) {
    let (w, h) = (pixmap.width() as usize, pixmap.height() as usize);
    if sigma < 0.5 || w == 0 || h == 0 {
        return;
    }
    let radii = box_radii(sigma, 3);
    let data = pixmap.data_mut();
    let mut scratch = data.to_vec();

    for r in radii {
        for y in 0..h {
            box_blur_line(data, &mut scratch, y * w * 4, 4, w, r);
        }
        for x in 0..w {
            box_blur_line(&scratch, data, x * 4, w * 4, h, r);
        }
    }
}

/// Box radii whose successive application approximates a Gaussian of `sigma`.
fn box_radii(sigma: f64, passes: usize) -> Vec<usize> {
    let n = passes as f64;
    let ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f64;
    let m = ((12.0 * sigma * sigma - n * wlf * wlf - 4.0 * n * wlf - 3.0 * n) / (-4.0 * wlf - 4.0)).round();
    (0..passes)
        .map(|i| {
            let width = if (i as f64) < m { wl } else { wu };
            ((width - 1) / 2) as usize
        })
        .collect()
}

/// Running-sum box blur of one row or column. Pixels outside the line count
/// as transparent.
fn box_blur_line(src: &[u8], dst: &mut [u8], start: usize, stride: usize, len: usize, r: usize) {
    let div = (2 * r + 1) as u32;
    let at = |i: usize| start + i * stride;
    let mut sum = [0u32; 4];
    for i in 0..=r.min(len - 1) {
        for (c, s) in sum.iter_mut().enumerate() {
            *s += src[at(i) + c] as u32;
        }
    }
    for i in 0..len {
        for (c, s) in sum.iter().enumerate() {
            dst[at(i) + c] = ((s + div / 2) / div) as u8;
        }
        let add = i + r + 1;
        if add < len {
            for (c, s) in sum.iter_mut().enumerate() {
                *s += src[at(add) + c] as u32;
            }
        }
        if i >= r {
            for (c, s) in sum.iter_mut().enumerate() {
                *s -= src[at(i - r) + c] as u32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::{FillKind, Pattern, PatternKind};
    use crate::geometry::generate_vertices;
    use crate::state::ShapeState;

    fn scene(state: &ShapeState, size: u32) -> Scene {
        let verts = generate_vertices(8, 100.0, 0.3, 150.0, 150.0, 2.0);
        Scene::compose(state, &verts, size, size, 0).unwrap()
    }

    fn pixel(pm: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pm.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    #[test]
    fn background_and_center_are_painted() {
        let mut state = ShapeState {
            fill_mode: FillKind::Solid,
            shape_color: Color::rgb(255, 0, 0),
            ..ShapeState::default()
        };
        state.lighting.opacity = 0.0;
        state.grain.opacity = 0.0;
        let pm = RasterRenderer::new().unwrap().render(&scene(&state, 200)).unwrap();
        assert_eq!(pixel(&pm, 1, 1), [255, 255, 255, 255]);
        assert_eq!(pixel(&pm, 100, 100), [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_background_leaves_corners_clear() {
        let mut state = ShapeState {
            transparent_background: true,
            ..ShapeState::default()
        };
        state.shadow.color = Color::TRANSPARENT;
        let pm = RasterRenderer::new().unwrap().render(&scene(&state, 120)).unwrap();
        assert_eq!(pixel(&pm, 0, 0)[3], 0);
        assert_eq!(pixel(&pm, 60, 60)[3], 255);
    }

    #[test]
    fn shadow_darkens_below_shape() {
        let mut state = ShapeState {
            fill_mode: FillKind::Solid,
            ..ShapeState::default()
        };
        state.shadow.color = Color::BLACK;
        state.shadow.offset_y = 60.0;
        state.shadow.blur = 0.0;
        // regular octagon: the outline bottoms out well above the vertex bounds
        let verts = generate_vertices(8, 100.0, 0.0, 150.0, 150.0, 0.0);
        let s = Scene::compose(&state, &verts, 300, 300, 0).unwrap();
        let below = (s.bounds.max_y + 5.0) as u32;
        let pm = RasterRenderer::new().unwrap().render(&s).unwrap();
        assert_eq!(pixel(&pm, 150, below), [0, 0, 0, 255]);
    }

    #[test]
    fn pattern_tile_is_cached() {
        let state = ShapeState {
            fill_mode: FillKind::Pattern,
            pattern: Pattern {
                kind: PatternKind::Grid,
                ..Pattern::default()
            },
            ..ShapeState::default()
        };
        let mut r = RasterRenderer::new().unwrap();
        let s = scene(&state, 100);
        r.render(&s).unwrap();
        let first = r.tile_cache.as_ref().map(|(t, _)| t.clone());
        r.render(&s).unwrap();
        assert_eq!(r.tile_cache.as_ref().map(|(t, _)| t.clone()), first);
        assert!(first.is_some());
    }

    #[test]
    fn box_radii_grow_with_sigma() {
        let small = box_radii(1.0, 3);
        let large = box_radii(10.0, 3);
        assert_eq!(small.len(), 3);
        assert!(large.iter().sum::<usize>() > small.iter().sum::<usize>());
    }

    #[test]
    fn blur_spreads_a_single_pixel() {
        let mut pm = Pixmap::new(9, 9).unwrap();
        pm.data_mut()[(4 * 9 + 4) * 4..(4 * 9 + 4) * 4 + 4].copy_from_slice(&[255, 255, 255, 255]);
        gaussian_blur(&mut pm, 1.5);
        let center = pm.pixel(4, 4).unwrap().alpha();
        let near = pm.pixel(5, 4).unwrap().alpha();
        assert!(center < 255);
        assert!(near > 0);
        assert_eq!(pm.pixel(0, 8).unwrap().alpha(), 0);
    }

    #[test]
    fn every_blend_mode_renders() {
        let mut r = RasterRenderer::new().unwrap();
        for mode in BlendMode::ALL {
            let mut state = ShapeState::default();
            state.lighting.blend_mode = mode;
            state.grain.blend_mode = mode;
            r.render(&scene(&state, 64)).unwrap();
        }
    }
}
