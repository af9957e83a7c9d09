//! A static export must look exactly like the live compositor once the
//! transition has settled, given the same grain frame and no undulation.

use blob_forge::export::{compare_pixels, render_svg, render_to_pixmap, to_rgba8};
use blob_forge::fill::{FillKind, GradientKind, PatternKind};
use blob_forge::{ShapeController, ShapeState};

/// 2.0 s: transition finished and the grain cycle is back at frame 0.
const SETTLED: f64 = 2.0;

fn settled_controller(state: ShapeState) -> ShapeController {
    let mut controller = ShapeController::new(state).unwrap();
    controller.generate();
    controller.frame(0.0);
    controller
}

fn assert_live_matches_export(state: ShapeState, size: (u32, u32)) {
    let mut controller = settled_controller(ShapeState {
        undulation_enabled: false,
        ..state
    });
    let live = controller.render_frame(SETTLED, size.0, size.1).unwrap();
    assert!(!controller.animator().is_animating());

    let exported = render_to_pixmap(controller.state(), controller.static_vertices(), size.0, size.1).unwrap();
    assert_eq!(
        compare_pixels(&to_rgba8(&live), &to_rgba8(&exported), 0),
        100.0
    );

    let live_svg = controller.frame_svg(SETTLED, size.0, size.1).unwrap();
    let exported_svg = render_svg(controller.state(), controller.static_vertices(), size.0, size.1).unwrap();
    assert_eq!(live_svg, exported_svg);
}

#[test]
fn gradient_fill_matches() {
    assert_live_matches_export(ShapeState::default(), (300, 300));
}

#[test]
fn radial_fill_matches_at_non_square_size() {
    let mut state = ShapeState::default();
    state.gradient.kind = GradientKind::Radial;
    assert_live_matches_export(state, (480, 270));
}

#[test]
fn pattern_fill_matches() {
    let mut state = ShapeState {
        fill_mode: FillKind::Pattern,
        ..ShapeState::default()
    };
    state.pattern.kind = PatternKind::Grid;
    assert_live_matches_export(state, (256, 256));
}

#[test]
fn solid_transparent_matches() {
    let state = ShapeState {
        fill_mode: FillKind::Solid,
        transparent_background: true,
        ..ShapeState::default()
    };
    assert_live_matches_export(state, (200, 200));
}

#[test]
fn undulation_breaks_equality_mid_cycle() {
    let mut controller = settled_controller(ShapeState::default());
    let live = controller.render_frame(SETTLED, 200, 200).unwrap();
    let exported = render_to_pixmap(controller.state(), controller.static_vertices(), 200, 200).unwrap();
    assert!(compare_pixels(&to_rgba8(&live), &to_rgba8(&exported), 0) < 100.0);
}

#[test]
fn export_scales_to_any_resolution() {
    let controller = settled_controller(ShapeState::default());
    for (w, h) in [(64, 64), (1000, 400), (333, 777)] {
        let pm = render_to_pixmap(controller.state(), controller.static_vertices(), w, h).unwrap();
        assert_eq!((pm.width(), pm.height()), (w, h));
    }
}
