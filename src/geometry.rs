//! Shape geometry: seeded vertex generation, smooth outlines, bounding boxes
//! and the fit transform that centers a shape on a canvas.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::random::seeded_random;

/// Smallest radius the generator will use. Keeps every vertex finite and
/// distinct from the center even for degenerate input.
pub const MIN_RADIUS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Generate `num_points` vertices around `(center_x, center_y)`.
///
/// Vertex `i` sits at base angle `i * 2π / n`. Its radius is scaled into
/// `[radius * (1 - roughness), radius * (1 + roughness)]` and its angle is
/// nudged by up to `±angle_step * roughness / 2`, both drawn from
/// [`seeded_random`] so the result depends only on the arguments.
pub fn generate_vertices(
    num_points: usize,
    radius: f64,
    roughness: f64,
    center_x: f64,
    center_y: f64,
    seed: f64,
) -> Vec<Point> {
    if num_points == 0 {
        return Vec::new();
    }

    let radius = if radius.is_finite() && radius > MIN_RADIUS {
        radius
    } else {
        MIN_RADIUS
    };
    let roughness = if roughness.is_finite() {
        roughness.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let seed = if seed.is_finite() { seed } else { 0.0 };
    let center_x = if center_x.is_finite() { center_x } else { 0.0 };
    let center_y = if center_y.is_finite() { center_y } else { 0.0 };

    let angle_step = (PI * 2.0) / num_points as f64;

    (0..num_points)
        .map(|i| {
            let fi = i as f64;
            let radius_factor = 1.0 - roughness + 2.0 * roughness * seeded_random(fi * 4.56 + seed);
            let r = (radius * radius_factor).max(MIN_RADIUS);
            let angle_offset = (seeded_random(fi * 7.89 + seed) - 0.5) * angle_step * roughness;
            let angle = fi * angle_step + angle_offset;
            Point::new(center_x + angle.cos() * r, center_y + angle.sin() * r)
        })
        .collect()
}

/// Axis-aligned bounds of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Exact min/max over `points`. `None` for an empty slice.
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points[1..].iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    pub fn transformed(&self, t: &FitTransform) -> BoundingBox {
        let a = t.apply(Point::new(self.min_x, self.min_y));
        let b = t.apply(Point::new(self.max_x, self.max_y));
        BoundingBox {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    QuadTo { ctrl: Point, to: Point },
    Close,
}

/// Backend-agnostic closed outline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapePath {
    pub segments: Vec<PathSegment>,
}

impl ShapePath {
    /// Rounded outline through `vertices`.
    ///
    /// Starts at the midpoint of the last and first vertex, then for each
    /// vertex draws a quadratic curve controlled by that vertex, ending at
    /// the midpoint with its successor. Fewer than two vertices yield an
    /// empty path.
    pub fn smooth(vertices: &[Point]) -> ShapePath {
        let n = vertices.len();
        if n < 2 {
            return ShapePath::default();
        }

        let mut segments = Vec::with_capacity(n + 2);
        segments.push(PathSegment::MoveTo(vertices[n - 1].midpoint(vertices[0])));
        for i in 0..n {
            let ctrl = vertices[i];
            let next = vertices[(i + 1) % n];
            segments.push(PathSegment::QuadTo {
                ctrl,
                to: ctrl.midpoint(next),
            });
        }
        segments.push(PathSegment::Close);
        ShapePath { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn transformed(&self, t: &FitTransform) -> ShapePath {
        let segments = self
            .segments
            .iter()
            .map(|s| match *s {
                PathSegment::MoveTo(p) => PathSegment::MoveTo(t.apply(p)),
                PathSegment::QuadTo { ctrl, to } => PathSegment::QuadTo {
                    ctrl: t.apply(ctrl),
                    to: t.apply(to),
                },
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        ShapePath { segments }
    }

    /// SVG path data (`d` attribute).
    pub fn to_svg_data(&self) -> String {
        let mut d = String::new();
        for seg in &self.segments {
            if !d.is_empty() {
                d.push(' ');
            }
            match seg {
                PathSegment::MoveTo(p) => d.push_str(&format!("M {} {}", fmt_num(p.x), fmt_num(p.y))),
                PathSegment::QuadTo { ctrl, to } => d.push_str(&format!(
                    "Q {} {} {} {}",
                    fmt_num(ctrl.x),
                    fmt_num(ctrl.y),
                    fmt_num(to.x),
                    fmt_num(to.y)
                )),
                PathSegment::Close => d.push('Z'),
            }
        }
        d
    }
}

/// Number formatting for SVG output: two decimals, trailing zeros dropped.
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// Uniform scale + translation mapping shape space onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub dx: f64,
    pub dy: f64,
}

impl FitTransform {
    pub const IDENTITY: FitTransform = FitTransform {
        scale: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Center `bbox` on a `width` x `height` canvas, leaving `padding`
    /// (a fraction of each canvas side) free on every edge.
    pub fn new(bbox: &BoundingBox, width: f64, height: f64, padding: f64) -> FitTransform {
        let padding = padding.clamp(0.0, 0.49);
        let avail_w = width * (1.0 - 2.0 * padding);
        let avail_h = height * (1.0 - 2.0 * padding);

        let sx = (bbox.width() > f64::EPSILON).then(|| avail_w / bbox.width());
        let sy = (bbox.height() > f64::EPSILON).then(|| avail_h / bbox.height());
        let scale = match (sx, sy) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 1.0,
        };

        let c = bbox.center();
        FitTransform {
            scale,
            dx: width / 2.0 - c.x * scale,
            dy: height / 2.0 - c.y * scale,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.dx, p.y * self.scale + self.dy)
    }
}
