//! Shape transitions: elastic easing, vertex interpolation, undulation and
//! the `Idle -> Animating -> Idle` state machine.

use std::f64::consts::PI;

use crate::geometry::Point;

/// Length of one shape transition at speed 1, in seconds.
pub const ANIMATION_DURATION: f64 = 1.0;

/// Undulation displacement as a fraction of the base radius.
pub const UNDULATION_AMPLITUDE: f64 = 0.04;

/// Elastic ease-out: overshoots the target and settles at 1.
pub fn ease_out_elastic(t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c4 = (2.0 * PI) / 3.0;
    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
}

/// Interpolate vertex-wise from `from` to `to`.
///
/// The result always has `to.len()` points. When `from` is shorter (the
/// point count grew), the missing start positions repeat its last vertex.
pub fn interpolate_vertices(from: &[Point], to: &[Point], t: f64) -> Vec<Point> {
    if t == 0.0 && from.len() == to.len() {
        return from.to_vec();
    }
    if t == 1.0 {
        return to.to_vec();
    }
    to.iter()
        .enumerate()
        .map(|(i, &target)| {
            let start = from.get(i).or(from.last()).copied().unwrap_or(target);
            start.lerp(target, t)
        })
        .collect()
}

/// Continuous wobble for vertex `index` at wall-clock `time_secs`.
pub fn undulation_offset(index: usize, time_secs: f64, speed: f64, amplitude: f64) -> Point {
    let phase = time_secs * speed * 2.0;
    let i = index as f64;
    Point::new(
        (phase + i * 0.8).sin() * amplitude,
        (phase * 0.8 + i * 1.1).cos() * amplitude,
    )
}

/// Apply [`undulation_offset`] to every vertex.
pub fn undulate(vertices: &[Point], time_secs: f64, speed: f64, amplitude: f64) -> Vec<Point> {
    vertices
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let o = undulation_offset(i, time_secs, speed, amplitude);
            Point::new(p.x + o.x, p.y + o.y)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    /// `started_at` is taken from the first frame after the trigger.
    Animating { started_at: Option<f64> },
}

/// Owns the three vertex snapshots that drive a transition.
#[derive(Debug, Clone)]
pub struct Animator {
    current: Vec<Point>,
    target: Vec<Point>,
    last_rendered: Vec<Point>,
    phase: Phase,
}

impl Animator {
    /// Start idle, resting on `initial`.
    pub fn new(initial: Vec<Point>) -> Self {
        Self {
            current: initial.clone(),
            last_rendered: initial.clone(),
            target: initial,
            phase: Phase::Idle,
        }
    }

    /// Begin a transition toward `next`. The previous target becomes the
    /// new starting shape.
    pub fn trigger(&mut self, next: Vec<Point>) {
        self.current = std::mem::replace(&mut self.target, next);
        self.phase = Phase::Animating { started_at: None };
    }

    /// Raw (un-eased) progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: f64, speed: f64) -> f64 {
        match self.phase {
            Phase::Idle => 1.0,
            Phase::Animating { started_at: None } => 0.0,
            Phase::Animating {
                started_at: Some(start),
            } => {
                let duration = ANIMATION_DURATION / speed.max(f64::EPSILON);
                ((now - start) / duration).clamp(0.0, 1.0)
            }
        }
    }

    /// Advance to `now` and return the interpolated shape (no undulation).
    pub fn advance(&mut self, now: f64, speed: f64) -> &[Point] {
        if let Phase::Animating { started_at: None } = self.phase {
            self.phase = Phase::Animating {
                started_at: Some(now),
            };
        }

        let progress = self.progress(now, speed);
        self.last_rendered = interpolate_vertices(&self.current, &self.target, ease_out_elastic(progress));
        if progress >= 1.0 {
            self.phase = Phase::Idle;
        }
        &self.last_rendered
    }

    /// Advance and add undulation when `undulation` carries an amplitude.
    pub fn frame(&mut self, now: f64, speed: f64, undulation: Option<f64>) -> Vec<Point> {
        let base = self.advance(now, speed);
        match undulation {
            Some(amplitude) => undulate(base, now, speed, amplitude),
            None => base.to_vec(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Animating { .. })
    }

    pub fn current(&self) -> &[Point] {
        &self.current
    }

    pub fn target(&self) -> &[Point] {
        &self.target
    }

    pub fn last_rendered(&self) -> &[Point] {
        &self.last_rendered
    }
}
