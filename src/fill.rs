//! Fill styles: the solid / gradient / pattern strategies, their resolution
//! into backend-agnostic [`Paint`], and the gradient undo history.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::{BoundingBox, Point};
use crate::random::seeded_random;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillKind {
    Solid,
    #[default]
    Gradient,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    /// Rendered as a linear gradient along `angle`.
    Conic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    pub kind: GradientKind,
    pub colors: [Color; 2],
    /// Direction in degrees, 0 = left to right, clockwise.
    pub angle: f64,
    /// Percent; 100 leaves the stop colors untouched.
    pub saturation: f64,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            kind: GradientKind::Linear,
            colors: [Color::rgb(0xff, 0x6b, 0x6b), Color::rgb(0x4e, 0xcd, 0xc4)],
            angle: 45.0,
            saturation: 100.0,
        }
    }
}

impl Gradient {
    /// A fresh two-stop gradient keeping `self`'s kind and saturation.
    pub fn randomized(&self, rng: &mut StdRng) -> Gradient {
        let h1 = rng.random_range(0.0..360.0);
        let h2 = h1 + rng.random_range(40.0..160.0);
        let c1 = Color::from_hsl(h1, rng.random_range(0.65..0.9), rng.random_range(0.5..0.65));
        let c2 = Color::from_hsl(h2, rng.random_range(0.65..0.9), rng.random_range(0.5..0.65));
        Gradient {
            kind: self.kind,
            colors: [c1, c2],
            angle: rng.random_range(0..360) as f64,
            saturation: self.saturation,
        }
    }

    /// Stop colors after the saturation adjustment.
    pub fn stops(&self) -> Vec<GradientStop> {
        vec![
            GradientStop::new(0.0, self.colors[0].saturate(self.saturation)),
            GradientStop::new(1.0, self.colors[1].saturate(self.saturation)),
        ]
    }

    /// Resolve against the (canvas-space) bounds of the shape.
    pub fn resolve(&self, bounds: &BoundingBox) -> Paint {
        match self.kind {
            GradientKind::Linear | GradientKind::Conic => {
                let (start, end) = diagonal_span(bounds, self.angle);
                Paint::LinearGradient {
                    start,
                    end,
                    stops: self.stops(),
                }
            }
            GradientKind::Radial => Paint::RadialGradient {
                center: bounds.center(),
                radius: (bounds.width().max(bounds.height()) / 2.0).max(f64::EPSILON),
                stops: self.stops(),
            },
        }
    }
}

/// Endpoints of a linear gradient at `angle_deg` through the center of
/// `bounds`, spanning the full diagonal so every rotation covers the box.
pub fn diagonal_span(bounds: &BoundingBox, angle_deg: f64) -> (Point, Point) {
    let c = bounds.center();
    let half = (bounds.diagonal() / 2.0).max(f64::EPSILON);
    let a = angle_deg.to_radians();
    let (dx, dy) = (a.cos() * half, a.sin() * half);
    (Point::new(c.x - dx, c.y - dy), Point::new(c.x + dx, c.y + dy))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    #[default]
    Dots,
    Lines,
    Grid,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pattern {
    pub kind: PatternKind,
    /// Tile half-size in pixels at the reference resolution.
    pub scale: f64,
    pub color1: Color,
    pub color2: Color,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            kind: PatternKind::Dots,
            scale: 10.0,
            color1: Color::rgb(0x6c, 0x5c, 0xe7),
            color2: Color::rgb(0xfd, 0xcb, 0x6e),
        }
    }
}

impl Pattern {
    /// Build the repeating tile, `2 * scale * resolution` pixels square.
    pub fn tile(&self, resolution: f64) -> PatternTile {
        let size = (2.0 * self.scale * resolution).round().max(2.0);
        let half = size / 2.0;
        let stroke = (size / 8.0).max(1.0);
        let mut marks = Vec::new();

        match self.kind {
            PatternKind::Dots => marks.push(TileMark::Circle {
                cx: half,
                cy: half,
                r: size * 0.2,
                color: self.color2,
            }),
            PatternKind::Lines => marks.push(TileMark::Rect {
                x: 0.0,
                y: half - stroke / 2.0,
                w: size,
                h: stroke,
                color: self.color2,
            }),
            PatternKind::Grid => {
                marks.push(TileMark::Rect {
                    x: 0.0,
                    y: 0.0,
                    w: size,
                    h: stroke,
                    color: self.color2,
                });
                marks.push(TileMark::Rect {
                    x: 0.0,
                    y: 0.0,
                    w: stroke,
                    h: size,
                    color: self.color2,
                });
            }
            PatternKind::Noise => {
                let cells = (size / 2.0).round().clamp(1.0, 16.0) as usize;
                let cell = size / cells as f64;
                for iy in 0..cells {
                    for ix in 0..cells {
                        let n = seeded_random(ix as f64 * 12.9898 + iy as f64 * 78.233 + self.scale);
                        if n > 0.5 {
                            marks.push(TileMark::Rect {
                                x: ix as f64 * cell,
                                y: iy as f64 * cell,
                                w: cell,
                                h: cell,
                                color: self.color2,
                            });
                        }
                    }
                }
            }
        }

        PatternTile {
            size,
            background: self.color1,
            marks,
        }
    }
}

/// One repeating pattern cell, drawn identically by every backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTile {
    pub size: f64,
    pub background: Color,
    pub marks: Vec<TileMark>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileMark {
    Circle { cx: f64, cy: f64, r: f64, color: Color },
    Rect { x: f64, y: f64, w: f64, h: f64, color: Color },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f64, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Resolved paint source, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    RadialGradient {
        center: Point,
        radius: f64,
        stops: Vec<GradientStop>,
    },
    Pattern(PatternTile),
}

/// Active fill strategy, borrowed out of the shape state for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillMode {
    Solid(Color),
    Gradient(Gradient),
    Pattern(Pattern),
}

impl FillMode {
    /// Build the paint for a shape whose fitted bounds are `bounds`.
    pub fn resolve(&self, bounds: &BoundingBox, resolution: f64) -> Paint {
        match self {
            FillMode::Solid(c) => Paint::Solid(*c),
            FillMode::Gradient(g) => g.resolve(bounds),
            FillMode::Pattern(p) => Paint::Pattern(p.tile(resolution)),
        }
    }
}

/// Linear undo stack of randomized gradients.
#[derive(Debug, Clone, Default)]
pub struct GradientHistory {
    entries: Vec<Gradient>,
    index: usize,
}

impl GradientHistory {
    /// Record a move from `previous` to `next`. Anything after the current
    /// index is discarded. `previous` is stored too when it differs from the
    /// current entry, so edits made between randomizations can be restored.
    pub fn record(&mut self, previous: Gradient, next: Gradient) {
        self.entries.truncate(self.index + 1);
        if self.entries.last() != Some(&previous) {
            self.entries.push(previous);
        }
        self.entries.push(next);
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry. `None` at the oldest entry.
    pub fn back(&mut self) -> Option<Gradient> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).copied()
    }

    /// Step forward again after [`back`](Self::back).
    pub fn forward(&mut self) -> Option<Gradient> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).copied()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::rng_from_seed;

    fn square() -> BoundingBox {
        BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 100.0,
            max_y: 100.0,
        }
    }

    #[test]
    fn linear_gradient_spans_diagonal() {
        let g = Gradient {
            angle: 0.0,
            ..Gradient::default()
        };
        match g.resolve(&square()) {
            Paint::LinearGradient { start, end, stops } => {
                let half = 100.0 * std::f64::consts::SQRT_2 / 2.0;
                assert!((start.x - (50.0 - half)).abs() < 1e-9);
                assert!((end.x - (50.0 + half)).abs() < 1e-9);
                assert!((start.y - 50.0).abs() < 1e-9);
                assert_eq!(stops.len(), 2);
            }
            other => panic!("expected linear gradient, got {other:?}"),
        }
    }

    #[test]
    fn conic_falls_back_to_linear() {
        let g = Gradient {
            kind: GradientKind::Conic,
            ..Gradient::default()
        };
        let linear = Gradient {
            kind: GradientKind::Linear,
            ..g
        };
        assert_eq!(g.resolve(&square()), linear.resolve(&square()));
    }

    #[test]
    fn radial_uses_half_larger_side() {
        let b = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 200.0,
            max_y: 50.0,
        };
        let g = Gradient {
            kind: GradientKind::Radial,
            ..Gradient::default()
        };
        match g.resolve(&b) {
            Paint::RadialGradient { center, radius, .. } => {
                assert_eq!(center, Point::new(100.0, 25.0));
                assert_eq!(radius, 100.0);
            }
            other => panic!("expected radial gradient, got {other:?}"),
        }
    }

    #[test]
    fn saturation_applies_to_stops() {
        let g = Gradient {
            saturation: 0.0,
            ..Gradient::default()
        };
        for stop in g.stops() {
            assert_eq!(stop.color.r, stop.color.g);
            assert_eq!(stop.color.g, stop.color.b);
        }
    }

    #[test]
    fn randomized_keeps_kind_and_two_stops() {
        let g = Gradient {
            kind: GradientKind::Radial,
            saturation: 80.0,
            ..Gradient::default()
        };
        let mut rng = rng_from_seed(5.0);
        let r = g.randomized(&mut rng);
        assert_eq!(r.kind, GradientKind::Radial);
        assert_eq!(r.saturation, 80.0);
        assert_ne!(r.colors, g.colors);
        assert!((0.0..360.0).contains(&r.angle));
    }

    #[test]
    fn pattern_tiles_are_deterministic() {
        for kind in [
            PatternKind::Dots,
            PatternKind::Lines,
            PatternKind::Grid,
            PatternKind::Noise,
        ] {
            let p = Pattern {
                kind,
                ..Pattern::default()
            };
            let a = p.tile(1.0);
            assert_eq!(a, p.tile(1.0));
            assert_eq!(a.size, 20.0);
            assert_eq!(a.background, p.color1);
        }
    }

    #[test]
    fn pattern_tile_scales_with_resolution() {
        let p = Pattern::default();
        assert_eq!(p.tile(2.0).size, 40.0);
        let tiny = Pattern {
            scale: 0.1,
            ..p
        };
        assert_eq!(tiny.tile(1.0).size, 2.0);
    }

    #[test]
    fn history_back_at_start_is_noop() {
        let mut h = GradientHistory::default();
        assert!(h.back().is_none());
        assert!(!h.can_go_back());
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn randomize_then_back_restores_previous() {
        let mut rng = rng_from_seed(11.0);
        let original = Gradient::default();
        let next = original.randomized(&mut rng);
        let mut h = GradientHistory::default();
        h.record(original, next);
        assert_eq!(h.index(), 1);
        assert_eq!(h.back(), Some(original));
        assert!(h.back().is_none());
        assert_eq!(h.forward(), Some(next));
        assert!(h.forward().is_none());
    }

    #[test]
    fn recording_after_back_truncates_forward_entries() {
        let mut rng = rng_from_seed(3.0);
        let g0 = Gradient::default();
        let g1 = g0.randomized(&mut rng);
        let g2 = g1.randomized(&mut rng);
        let g3 = g1.randomized(&mut rng);

        let mut h = GradientHistory::default();
        h.record(g0, g1);
        h.record(g1, g2);
        assert_eq!(h.len(), 3);
        assert_eq!(h.back(), Some(g1));
        h.record(g1, g3);
        assert_eq!(h.len(), 3);
        assert!(h.forward().is_none());
        assert_eq!(h.back(), Some(g1));
    }

    #[test]
    fn edited_gradient_is_kept_before_next_entry() {
        let mut rng = rng_from_seed(5.0);
        let g0 = Gradient::default();
        let g1 = g0.randomized(&mut rng);
        let edited = Gradient { angle: 12.5, ..g1 };
        let g2 = edited.randomized(&mut rng);

        let mut h = GradientHistory::default();
        h.record(g0, g1);
        h.record(edited, g2);
        assert_eq!(h.len(), 4);
        assert_eq!(h.back(), Some(edited));
        assert_eq!(h.back(), Some(g1));
        assert_eq!(h.back(), Some(g0));
        assert!(h.back().is_none());
    }
}
