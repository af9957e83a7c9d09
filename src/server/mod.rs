use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use notify::{Event, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_livereload::LiveReloadLayer;
use tracing::{debug, warn};

use crate::controller::ShapeController;
use crate::export::{export_bytes, ExportFormat};
use crate::fill::Gradient;
use crate::frame_loop::FrameLoop;
use crate::geometry::Point;
use crate::state::ShapeState;

mod page;

/// Preview canvas size.
const PREVIEW_SIZE: (u32, u32) = (600, 600);
const PREVIEW_FPS: f64 = 30.0;
const DEFAULT_EXPORT_SIZE: u32 = 1200;
const MAX_EXPORT_SIZE: u32 = 8192;

struct DevState {
    preset_path: PathBuf,
    tag_name: String,
    controller: Arc<Mutex<ShapeController>>,
    frames: watch::Receiver<Arc<str>>,
}

type Shared = Arc<DevState>;

/// Start the preview server for a preset file, re-applying the preset and
/// live-reloading connected pages whenever it changes on disk.
pub async fn run_dev_server(path: PathBuf, port: u16) -> anyhow::Result<()> {
    let state = ShapeState::load(&path)?;
    let controller = Arc::new(Mutex::new(ShapeController::new(state)?));
    let frame_loop = FrameLoop::start(controller.clone(), PREVIEW_SIZE, PREVIEW_FPS);

    let shared = Arc::new(DevState {
        preset_path: path.clone(),
        tag_name: crate::component::derive_tag_name(&path),
        controller: controller.clone(),
        frames: frame_loop.frames(),
    });

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    // File watcher
    let watch_path = path.clone();
    let watched_controller = controller.clone();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        let Ok(event) = res else { return };
        if !event.kind.is_modify() || !event.paths.iter().any(|p| same_file(p, &watch_path)) {
            return;
        }
        match reload_preset(&watch_path, &watched_controller) {
            Ok(()) => {
                eprintln!("  reloaded {}", watch_path.display());
                reloader.reload();
            }
            Err(e) => warn!("preset reload failed: {e}"),
        }
    })?;
    let watch_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let app = Router::new()
        .route("/", get(serve_preview))
        .route("/frame.svg", get(serve_frame))
        .route("/state.json", get(serve_state))
        .route("/generate", post(serve_generate))
        .route("/gradient/randomize", post(serve_gradient_randomize))
        .route("/gradient/back", post(serve_gradient_back))
        .route("/gradient/stop", post(serve_gradient_stop))
        .route("/export/{format}", get(serve_export))
        .layer(livereload)
        .with_state(shared);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    eprintln!("blob preview server");
    eprintln!("  preset:  {}", path.display());
    eprintln!("  preview: http://localhost:{port}/");
    eprintln!("  frame:   http://localhost:{port}/frame.svg");
    eprintln!("  watching for changes...");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    // Keep watcher alive
    drop(watcher);
    frame_loop.stop().await;
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b || a.file_name().is_some_and(|n| Some(n) == b.file_name())
}

fn reload_preset(path: &Path, controller: &Mutex<ShapeController>) -> anyhow::Result<()> {
    let state = ShapeState::load(path)?;
    let mut controller = controller
        .lock()
        .map_err(|e| anyhow::anyhow!("lock error: {e}"))?;
    controller.apply_state(state)?;
    Ok(())
}

/// Run `f` against the locked controller, or answer 500.
fn with_controller<T>(
    shared: &DevState,
    f: impl FnOnce(&mut ShapeController) -> T,
) -> Result<T, (StatusCode, String)> {
    let mut controller = shared
        .controller
        .lock()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("lock error: {e}")))?;
    Ok(f(&mut controller))
}

// ── Route handlers ────────────────────────────────────────────────────

async fn serve_preview(State(shared): State<Shared>) -> Html<String> {
    Html(page::build_preview_page(
        &shared.tag_name,
        &shared.preset_path,
        PREVIEW_SIZE,
    ))
}

/// Latest frame published by the animation loop.
async fn serve_frame(State(shared): State<Shared>) -> impl IntoResponse {
    let frame = shared.frames.borrow().clone();
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        frame.to_string(),
    )
}

async fn serve_state(State(shared): State<Shared>) -> Response {
    match with_controller(&shared, |c| c.state().to_json()) {
        Ok(Ok(json)) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Ok(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    seed: f64,
    points: usize,
}

async fn serve_generate(State(shared): State<Shared>) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    with_controller(&shared, |c| {
        let seed = c.generate();
        debug!(seed, "generate requested");
        Json(GenerateResponse {
            seed,
            points: c.static_vertices().len(),
        })
    })
}

#[derive(Serialize)]
struct GradientResponse {
    changed: bool,
    gradient: Gradient,
    history_index: usize,
    can_go_back: bool,
}

fn gradient_response(c: &ShapeController, changed: bool) -> Json<GradientResponse> {
    Json(GradientResponse {
        changed,
        gradient: c.state().gradient,
        history_index: c.history().index(),
        can_go_back: c.history().can_go_back(),
    })
}

async fn serve_gradient_randomize(
    State(shared): State<Shared>,
) -> Result<Json<GradientResponse>, (StatusCode, String)> {
    with_controller(&shared, |c| {
        c.randomize_gradient();
        gradient_response(c, true)
    })
}

async fn serve_gradient_back(
    State(shared): State<Shared>,
) -> Result<Json<GradientResponse>, (StatusCode, String)> {
    with_controller(&shared, |c| {
        let changed = c.gradient_back();
        gradient_response(c, changed)
    })
}

async fn serve_gradient_stop(
    State(shared): State<Shared>,
) -> Result<Json<GradientResponse>, (StatusCode, String)> {
    with_controller(&shared, |c| {
        c.add_color_stop();
        gradient_response(c, true)
    })
}

#[derive(Deserialize)]
struct ExportQuery {
    size: Option<u32>,
}

/// Copy out what a static export needs so the render runs without the lock.
fn export_snapshot(shared: &DevState) -> Result<(ShapeState, Vec<Point>), (StatusCode, String)> {
    with_controller(shared, |c| (c.state().clone(), c.static_vertices().to_vec()))
}

/// Static export of the resting shape as a download.
async fn serve_export(
    State(shared): State<Shared>,
    UrlPath(format): UrlPath<String>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let format: ExportFormat = match format.parse() {
        Ok(f) => f,
        Err(e) => return (StatusCode::NOT_FOUND, format!("{e}")).into_response(),
    };
    let size = query.size.unwrap_or(DEFAULT_EXPORT_SIZE).clamp(1, MAX_EXPORT_SIZE);

    let (state, vertices) = match export_snapshot(&shared) {
        Ok(snapshot) => snapshot,
        Err(e) => return e.into_response(),
    };
    let rendered =
        tokio::task::spawn_blocking(move || export_bytes(&state, &vertices, format, size, size)).await;
    let bytes = match rendered {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        Err(e) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("export task failed: {e}")).into_response()
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        shared.tag_name,
        format.extension()
    );
    (
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn shared() -> (Shared, FrameLoop) {
        let controller = Arc::new(Mutex::new(
            ShapeController::new(ShapeState::default()).unwrap(),
        ));
        let frame_loop = FrameLoop::start(controller.clone(), (100, 100), 30.0);
        let shared = Arc::new(DevState {
            preset_path: PathBuf::from("presets/default.json"),
            tag_name: "blob-default".to_string(),
            controller,
            frames: frame_loop.frames(),
        });
        (shared, frame_loop)
    }

    #[tokio::test]
    async fn gradient_routes_walk_history() {
        let (shared, frame_loop) = shared();
        let original = shared.controller.lock().unwrap().state().gradient;

        let Json(back) = serve_gradient_back(State(shared.clone())).await.unwrap();
        assert!(!back.changed);
        assert_eq!(back.gradient, original);

        let Json(r) = serve_gradient_randomize(State(shared.clone())).await.unwrap();
        assert!(r.changed && r.can_go_back);
        let Json(back) = serve_gradient_back(State(shared.clone())).await.unwrap();
        assert!(back.changed);
        assert_eq!(back.gradient, original);
        frame_loop.stop().await;
    }

    #[tokio::test]
    async fn export_route_sets_headers() {
        let (shared, frame_loop) = shared();
        let resp = serve_export(
            State(shared.clone()),
            UrlPath("png".to_string()),
            Query(ExportQuery { size: Some(64) }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"blob-default.png\""
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..4], b"\x89PNG");

        let missing = serve_export(
            State(shared),
            UrlPath("gif".to_string()),
            Query(ExportQuery { size: None }),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        frame_loop.stop().await;
    }

    #[tokio::test]
    async fn export_renders_snapshot_taken_before_render() {
        let (shared, frame_loop) = shared();
        let (state, vertices) = export_snapshot(&shared).unwrap();
        assert!(shared.controller.try_lock().is_ok());

        let expected = export_bytes(&state, &vertices, ExportFormat::Svg, 80, 80).unwrap();
        let resp = serve_export(
            State(shared.clone()),
            UrlPath("svg".to_string()),
            Query(ExportQuery { size: Some(80) }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &expected[..]);
        frame_loop.stop().await;
    }

    #[tokio::test]
    async fn generate_and_state_routes() {
        let (shared, frame_loop) = shared();
        let Json(g) = serve_generate(State(shared.clone())).await.unwrap();
        assert_eq!(g.points, 8);
        let resp = serve_state(State(shared.clone())).await;
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let state = ShapeState::from_json(std::str::from_utf8(&body).unwrap()).unwrap();
        assert_eq!(state.random_seed, g.seed);
        frame_loop.stop().await;
    }

    #[test]
    fn reload_applies_preset_from_disk() {
        let dir = std::env::temp_dir().join(format!("blob-forge-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shape.json");
        let state = ShapeState {
            num_points: 5,
            ..ShapeState::default()
        };
        state.save(&path).unwrap();

        let controller = Mutex::new(ShapeController::new(ShapeState::default()).unwrap());
        reload_preset(&path, &controller).unwrap();
        let c = controller.lock().unwrap();
        assert_eq!(c.state().num_points, 5);
        assert!(c.animator().is_animating());
        drop(c);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
