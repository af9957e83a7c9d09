//! SVG backend: serializes a [`Scene`] as a self-contained SVG document.
//!
//! Grain is expressed as an `feTurbulence` filter rather than the raster
//! texture pool; everything else maps one-to-one onto the raster layers.

use crate::color::Color;
use crate::fill::{GradientStop, Paint, PatternTile, TileMark};
use crate::geometry::fmt_num;
use crate::scene::Scene;

/// Element id prefix used when none is given.
pub const DEFAULT_ID_PREFIX: &str = "blob";

/// Render `scene` with the default id prefix.
pub fn render(scene: &Scene) -> String {
    render_with_prefix(scene, DEFAULT_ID_PREFIX)
}

/// Render `scene`, prefixing every element id so several documents can be
/// inlined into one page.
pub fn render_with_prefix(scene: &Scene, prefix: &str) -> String {
    let (w, h) = (scene.width, scene.height);
    let mut defs = String::new();
    let mut body = String::new();

    if let Some(bg) = scene.background {
        body.push_str(&format!(
            "  <rect width=\"{w}\" height=\"{h}\" {}/>\n",
            fill_attrs(bg)
        ));
    }

    if scene.has_shape() {
        let d = scene.outline.to_svg_data();

        let fill_id = format!("{prefix}-fill");
        let fill_ref = paint_def(&mut defs, &fill_id, &scene.fill, 1.0);

        let mut filter_attr = String::new();
        if let Some(shadow) = &scene.shadow {
            let shadow_id = format!("{prefix}-shadow");
            defs.push_str(&format!(
                "    <filter id=\"{shadow_id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">\n      <feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{}\"/>\n    </filter>\n",
                fmt_num(shadow.dx),
                fmt_num(shadow.dy),
                fmt_num(shadow.blur / 2.0),
                shadow.color.to_hex_rgb(),
                fmt_num(shadow.color.alpha_f32() as f64),
            ));
            filter_attr = format!(" filter=\"url(#{shadow_id})\"");
        }
        body.push_str(&format!(
            "  <path d=\"{d}\" fill=\"{fill_ref}\"{filter_attr}/>\n"
        ));

        if let Some(light) = &scene.lighting {
            let light_id = format!("{prefix}-lighting");
            let light_ref = paint_def(&mut defs, &light_id, &light.paint, 1.0);
            body.push_str(&format!(
                "  <path d=\"{d}\" fill=\"{light_ref}\" opacity=\"{}\" style=\"mix-blend-mode: {}\"/>\n",
                fmt_num(light.opacity),
                light.blend_mode.css_name(),
            ));
        }

        if let Some(grain) = &scene.grain {
            let clip_id = format!("{prefix}-clip");
            let grain_id = format!("{prefix}-grain");
            defs.push_str(&format!(
                "    <clipPath id=\"{clip_id}\">\n      <path d=\"{d}\"/>\n    </clipPath>\n"
            ));
            defs.push_str(&format!(
                "    <filter id=\"{grain_id}\" x=\"0\" y=\"0\" width=\"100%\" height=\"100%\">\n      <feTurbulence type=\"fractalNoise\" baseFrequency=\"0.8\" numOctaves=\"3\" seed=\"{}\" stitchTiles=\"stitch\"/>\n      <feColorMatrix type=\"saturate\" values=\"0\"/>\n    </filter>\n",
                grain.frame
            ));
            let b = &scene.bounds;
            body.push_str(&format!(
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" filter=\"url(#{grain_id})\" clip-path=\"url(#{clip_id})\" opacity=\"{}\" style=\"mix-blend-mode: {}\"/>\n",
                fmt_num(b.min_x),
                fmt_num(b.min_y),
                fmt_num(b.width()),
                fmt_num(b.height()),
                fmt_num(grain.opacity),
                grain.blend_mode.css_name(),
            ));
        }
    }

    let mut svg = String::with_capacity(defs.len() + body.len() + 256);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    ));
    if !defs.is_empty() {
        svg.push_str("  <defs>\n");
        svg.push_str(&defs);
        svg.push_str("  </defs>\n");
    }
    svg.push_str(&body);
    svg.push_str("</svg>\n");
    svg
}

/// Emit whatever `<defs>` entry `paint` needs and return the `fill` value.
fn paint_def(defs: &mut String, id: &str, paint: &Paint, opacity: f64) -> String {
    match paint {
        Paint::Solid(c) => return c.with_alpha_scaled(opacity).to_css(),
        Paint::LinearGradient { start, end, stops } => {
            defs.push_str(&format!(
                "    <linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">\n",
                fmt_num(start.x),
                fmt_num(start.y),
                fmt_num(end.x),
                fmt_num(end.y),
            ));
            push_stops(defs, stops, opacity);
            defs.push_str("    </linearGradient>\n");
        }
        Paint::RadialGradient {
            center,
            radius,
            stops,
        } => {
            defs.push_str(&format!(
                "    <radialGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" cx=\"{}\" cy=\"{}\" r=\"{}\">\n",
                fmt_num(center.x),
                fmt_num(center.y),
                fmt_num(*radius),
            ));
            push_stops(defs, stops, opacity);
            defs.push_str("    </radialGradient>\n");
        }
        Paint::Pattern(tile) => push_pattern(defs, id, tile),
    }
    format!("url(#{id})")
}

fn push_stops(defs: &mut String, stops: &[GradientStop], opacity: f64) {
    for s in stops {
        let c = s.color.with_alpha_scaled(opacity);
        defs.push_str(&format!(
            "      <stop offset=\"{}%\" stop-color=\"{}\" stop-opacity=\"{}\"/>\n",
            fmt_num(s.offset * 100.0),
            c.to_hex_rgb(),
            fmt_num(c.alpha_f32() as f64),
        ));
    }
}

fn push_pattern(defs: &mut String, id: &str, tile: &PatternTile) {
    let size = fmt_num(tile.size);
    defs.push_str(&format!(
        "    <pattern id=\"{id}\" patternUnits=\"userSpaceOnUse\" x=\"0\" y=\"0\" width=\"{size}\" height=\"{size}\">\n"
    ));
    defs.push_str(&format!(
        "      <rect width=\"{size}\" height=\"{size}\" {}/>\n",
        fill_attrs(tile.background)
    ));
    for mark in &tile.marks {
        match *mark {
            TileMark::Circle { cx, cy, r, color } => defs.push_str(&format!(
                "      <circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>\n",
                fmt_num(cx),
                fmt_num(cy),
                fmt_num(r),
                fill_attrs(color)
            )),
            TileMark::Rect { x, y, w, h, color } => defs.push_str(&format!(
                "      <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>\n",
                fmt_num(x),
                fmt_num(y),
                fmt_num(w),
                fmt_num(h),
                fill_attrs(color)
            )),
        }
    }
    defs.push_str("    </pattern>\n");
}

/// `fill` (+ `fill-opacity` when translucent) attributes for a flat color.
fn fill_attrs(c: Color) -> String {
    if c.is_opaque() {
        format!("fill=\"{}\"", c.to_hex_rgb())
    } else {
        format!(
            "fill=\"{}\" fill-opacity=\"{}\"",
            c.to_hex_rgb(),
            fmt_num(c.alpha_f32() as f64)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::BlendMode;
    use crate::fill::{FillKind, GradientKind, Pattern, PatternKind};
    use crate::geometry::generate_vertices;
    use crate::state::ShapeState;

    fn svg_for(state: &ShapeState) -> String {
        let verts = generate_vertices(8, 100.0, 0.4, 150.0, 150.0, 9.0);
        render(&Scene::compose(state, &verts, 400, 300, 3).unwrap())
    }

    #[test]
    fn document_has_full_layer_stack() {
        let svg = svg_for(&ShapeState::default());
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"400\" height=\"300\""));
        assert!(svg.contains("<linearGradient id=\"blob-fill\""));
        assert!(svg.contains("<feDropShadow"));
        assert!(svg.contains("<linearGradient id=\"blob-lighting\""));
        assert!(svg.contains("mix-blend-mode: overlay"));
        assert!(svg.contains("<feTurbulence"));
        assert!(svg.contains("seed=\"3\""));
        assert!(svg.contains("clip-path=\"url(#blob-clip)\""));
        assert!(svg.contains("<rect width=\"400\" height=\"300\" fill=\"#ffffff\"/>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn radial_and_pattern_fills() {
        let mut state = ShapeState::default();
        state.gradient.kind = GradientKind::Radial;
        assert!(svg_for(&state).contains("<radialGradient id=\"blob-fill\""));

        state.fill_mode = FillKind::Pattern;
        state.pattern = Pattern {
            kind: PatternKind::Dots,
            ..Pattern::default()
        };
        let svg = svg_for(&state);
        assert!(svg.contains("<pattern id=\"blob-fill\" patternUnits=\"userSpaceOnUse\""));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn solid_fill_is_inline() {
        let state = ShapeState {
            fill_mode: FillKind::Solid,
            shape_color: Color::rgb(1, 2, 3),
            ..ShapeState::default()
        };
        let svg = svg_for(&state);
        assert!(svg.contains("fill=\"#010203\""));
        assert!(!svg.contains("id=\"blob-fill\""));
    }

    #[test]
    fn disabled_effects_are_absent() {
        let mut state = ShapeState {
            transparent_background: true,
            ..ShapeState::default()
        };
        state.lighting.opacity = 0.0;
        state.grain.opacity = 0.0;
        state.shadow.color = Color::TRANSPARENT;
        let svg = svg_for(&state);
        assert!(!svg.contains("feTurbulence"));
        assert!(!svg.contains("feDropShadow"));
        assert!(!svg.contains("blob-lighting"));
        assert!(!svg.contains("<rect width=\"400\""));
    }

    #[test]
    fn prefix_scopes_ids() {
        let mut state = ShapeState::default();
        state.grain.blend_mode = BlendMode::HardLight;
        let verts = generate_vertices(5, 100.0, 0.2, 0.0, 0.0, 1.0);
        let scene = Scene::compose(&state, &verts, 100, 100, 0).unwrap();
        let svg = render_with_prefix(&scene, "hero");
        assert!(svg.contains("id=\"hero-fill\""));
        assert!(svg.contains("url(#hero-grain)"));
        assert!(svg.contains("mix-blend-mode: hard-light"));
        assert!(!svg.contains("blob-"));
    }
}
