//! `ShapeController`: the single owner of a shape's parameters, its vertex
//! snapshots and its gradient history. Every user action goes through here.

use rand::rngs::StdRng;
use tiny_skia::Pixmap;
use tracing::debug;

use crate::animation::{Animator, UNDULATION_AMPLITUDE};
use crate::effects::grain_frame;
use crate::error::Result;
use crate::fill::GradientHistory;
use crate::geometry::{generate_vertices, Point};
use crate::random::{fresh_seed, rng_from_seed};
use crate::render::{svg, RasterRenderer};
use crate::scene::Scene;
use crate::state::ShapeState;

/// Radius shapes are generated at before being fitted to a canvas.
pub const BASE_RADIUS: f64 = 100.0;

/// Center shapes are generated around.
pub const BASE_CENTER: Point = Point::new(150.0, 150.0);

/// Vertices for `state` in generation space.
pub fn vertices_for(state: &ShapeState) -> Vec<Point> {
    generate_vertices(
        state.num_points as usize,
        BASE_RADIUS,
        state.roughness,
        BASE_CENTER.x,
        BASE_CENTER.y,
        state.random_seed,
    )
}

pub struct ShapeController {
    state: ShapeState,
    animator: Animator,
    history: GradientHistory,
    rng: StdRng,
    renderer: RasterRenderer,
}

impl ShapeController {
    /// Build a controller resting (idle) on the shape `state` describes.
    pub fn new(state: ShapeState) -> Result<Self> {
        state.validate()?;
        Ok(Self {
            animator: Animator::new(vertices_for(&state)),
            rng: rng_from_seed(state.random_seed),
            history: GradientHistory::default(),
            renderer: RasterRenderer::new()?,
            state,
        })
    }

    pub fn state(&self) -> &ShapeState {
        &self.state
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn history(&self) -> &GradientHistory {
        &self.history
    }

    /// The shape the animation is heading toward (or resting on).
    pub fn static_vertices(&self) -> &[Point] {
        self.animator.target()
    }

    /// Mutate the parameters. Out-of-range values are clamped; a change to
    /// point count, roughness or seed starts a transition.
    pub fn update(&mut self, f: impl FnOnce(&mut ShapeState)) {
        let before = self.state.geometry_key();
        f(&mut self.state);
        self.state = self.state.clone().clamped();
        if self.state.geometry_key() != before {
            self.trigger_shape_generation();
        }
    }

    /// Replace every parameter at once, e.g. after a preset reload.
    pub fn apply_state(&mut self, state: ShapeState) -> Result<()> {
        state.validate()?;
        let regenerate = state.geometry_key() != self.state.geometry_key();
        self.state = state;
        if regenerate {
            self.trigger_shape_generation();
        }
        Ok(())
    }

    /// Pick a fresh seed and animate to the new shape. Returns the seed.
    pub fn generate(&mut self) -> f64 {
        let seed = fresh_seed(&mut self.rng);
        self.state.random_seed = seed;
        self.trigger_shape_generation();
        seed
    }

    /// Start a transition from the current target to the shape the state
    /// describes now.
    pub fn trigger_shape_generation(&mut self) {
        let next = vertices_for(&self.state);
        debug!(
            points = next.len(),
            seed = self.state.random_seed,
            "shape regeneration"
        );
        self.animator.trigger(next);
    }

    /// Replace both gradient colors, keeping kind and saturation.
    pub fn randomize_gradient(&mut self) {
        let previous = self.state.gradient;
        let next = previous.randomized(&mut self.rng);
        self.history.record(previous, next);
        self.state.gradient = next;
        debug!(history = self.history.len(), "gradient randomized");
    }

    /// Gradients carry exactly two stops, so this re-randomizes them.
    pub fn add_color_stop(&mut self) {
        self.randomize_gradient();
    }

    /// Restore the previous gradient. `false` when already at the oldest.
    pub fn gradient_back(&mut self) -> bool {
        match self.history.back() {
            Some(g) => {
                self.state.gradient = g;
                true
            }
            None => false,
        }
    }

    pub fn gradient_forward(&mut self) -> bool {
        match self.history.forward() {
            Some(g) => {
                self.state.gradient = g;
                true
            }
            None => false,
        }
    }

    /// Vertices to draw at `now` (seconds), undulation included.
    pub fn frame(&mut self, now: f64) -> Vec<Point> {
        let undulation = self
            .state
            .undulation_enabled
            .then_some(UNDULATION_AMPLITUDE * BASE_RADIUS);
        self.animator
            .frame(now, self.state.animation_speed, undulation)
    }

    pub fn frame_scene(&mut self, now: f64, width: u32, height: u32) -> Result<Scene> {
        let vertices = self.frame(now);
        Scene::compose(&self.state, &vertices, width, height, grain_frame(now))
    }

    /// Live compositor: draw the frame at `now` into a pixmap.
    pub fn render_frame(&mut self, now: f64, width: u32, height: u32) -> Result<Pixmap> {
        let scene = self.frame_scene(now, width, height)?;
        self.renderer.render(&scene)
    }

    pub fn frame_svg(&mut self, now: f64, width: u32, height: u32) -> Result<String> {
        let scene = self.frame_scene(now, width, height)?;
        Ok(svg::render(&scene))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Phase;

    fn controller() -> ShapeController {
        ShapeController::new(ShapeState::default()).unwrap()
    }

    #[test]
    fn starts_idle_on_state_shape() {
        let c = controller();
        assert_eq!(c.animator().phase(), Phase::Idle);
        assert_eq!(c.static_vertices(), &vertices_for(c.state())[..]);
        assert_eq!(c.static_vertices().len(), 8);
    }

    #[test]
    fn rejects_invalid_state() {
        let state = ShapeState {
            num_points: 2,
            ..ShapeState::default()
        };
        assert!(ShapeController::new(state).is_err());
    }

    #[test]
    fn gradient_back_at_start_is_noop() {
        let mut c = controller();
        let g = c.state().gradient;
        assert!(!c.gradient_back());
        assert_eq!(c.state().gradient, g);
    }

    #[test]
    fn randomize_then_back_restores() {
        let mut c = controller();
        let original = c.state().gradient;
        c.randomize_gradient();
        let first = c.state().gradient;
        assert_ne!(first, original);
        c.add_color_stop();
        assert!(c.gradient_back());
        assert_eq!(c.state().gradient, first);
        assert!(c.gradient_back());
        assert_eq!(c.state().gradient, original);
        assert!(!c.gradient_back());
        assert!(c.gradient_forward());
        assert_eq!(c.state().gradient, first);
    }

    #[test]
    fn back_restores_manual_gradient_edit() {
        let mut c = controller();
        c.randomize_gradient();
        let randomized = c.state().gradient;
        c.update(|s| s.gradient.angle = 12.5);
        let edited = c.state().gradient;
        assert_ne!(edited, randomized);

        c.randomize_gradient();
        assert!(c.gradient_back());
        assert_eq!(c.state().gradient, edited);
        assert!(c.gradient_back());
        assert_eq!(c.state().gradient, randomized);
    }

    #[test]
    fn back_restores_gradient_from_applied_preset() {
        let mut c = controller();
        c.randomize_gradient();
        let mut preset = c.state().clone();
        preset.gradient.kind = crate::fill::GradientKind::Radial;
        let loaded = preset.gradient;
        c.apply_state(preset).unwrap();

        c.randomize_gradient();
        assert!(c.gradient_back());
        assert_eq!(c.state().gradient, loaded);
    }

    #[test]
    fn geometry_change_triggers_transition() {
        let mut c = controller();
        c.update(|s| s.lighting.opacity = 0.5);
        assert_eq!(c.animator().phase(), Phase::Idle);

        c.update(|s| s.num_points = 12);
        assert!(c.animator().is_animating());
        assert_eq!(c.static_vertices().len(), 12);
    }

    #[test]
    fn update_clamps() {
        let mut c = controller();
        c.update(|s| {
            s.num_points = 500;
            s.animation_speed = 0.0;
        });
        assert_eq!(c.state().num_points, 50);
        assert_eq!(c.state().animation_speed, 0.1);
    }

    #[test]
    fn generate_changes_seed_and_animates() {
        let mut c = controller();
        let seed = c.generate();
        assert_eq!(c.state().random_seed, seed);
        assert!((0.0..=1000.0).contains(&seed));
        assert!(c.animator().is_animating());

        c.frame(0.0);
        let settled = c.frame(5.0);
        assert_eq!(c.animator().phase(), Phase::Idle);
        assert_ne!(settled, c.static_vertices().to_vec());
    }

    #[test]
    fn frame_without_undulation_settles_on_target() {
        let mut c = controller();
        c.update(|s| s.undulation_enabled = false);
        c.generate();
        c.frame(1.0);
        let out = c.frame(3.0);
        assert_eq!(out, c.static_vertices());
    }

    #[test]
    fn apply_state_keeps_shape_when_geometry_unchanged() {
        let mut c = controller();
        let mut next = c.state().clone();
        next.background = crate::color::Color::BLACK;
        c.apply_state(next).unwrap();
        assert_eq!(c.animator().phase(), Phase::Idle);

        let mut bad = c.state().clone();
        bad.roughness = 4.0;
        assert!(c.apply_state(bad).is_err());
        assert_eq!(c.state().roughness, 0.3);
    }

    #[test]
    fn renders_frames() {
        let mut c = controller();
        let pm = c.render_frame(0.4, 120, 90).unwrap();
        assert_eq!((pm.width(), pm.height()), (120, 90));
        let svg = c.frame_svg(0.4, 120, 90).unwrap();
        assert!(svg.contains("<path"));
    }
}
