//! The live animation loop as an explicit, cancellable task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::controller::ShapeController;
use crate::error::Result;

const MIN_FPS: f64 = 1.0;
const MAX_FPS: f64 = 120.0;

/// Handle to a running frame loop. Each tick renders the controller's next
/// frame as SVG and publishes it; receivers always see the latest frame.
///
/// Dropping the handle aborts the task. Use [`stop`](Self::stop) to shut
/// down and wait for it.
pub struct FrameLoop {
    frames: watch::Receiver<Arc<str>>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FrameLoop {
    /// Spawn the loop on the current tokio runtime.
    pub fn start(controller: Arc<Mutex<ShapeController>>, size: (u32, u32), fps: f64) -> FrameLoop {
        let fps = if fps.is_finite() {
            fps.clamp(MIN_FPS, MAX_FPS)
        } else {
            MIN_FPS
        };
        let (width, height) = size;
        let started = Instant::now();

        let first = render(&controller, 0.0, width, height)
            .and_then(|frame| frame.ok())
            .unwrap_or_default();
        let (tx, rx) = watch::channel::<Arc<str>>(Arc::from(first));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        debug!(fps, width, height, "frame loop started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let now = started.elapsed().as_secs_f64();
                        if !publish(&tx, &controller, now, width, height) {
                            break;
                        }
                    }
                }
            }
            debug!("frame loop stopped");
        });

        FrameLoop {
            frames: rx,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// A receiver for published frames.
    pub fn frames(&self) -> watch::Receiver<Arc<str>> {
        self.frames.clone()
    }

    /// The most recently published frame.
    pub fn latest(&self) -> Arc<str> {
        self.frames.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Render one frame and send it. A failed render keeps the previous frame.
/// `false` stops the loop.
fn publish(
    tx: &watch::Sender<Arc<str>>,
    controller: &Mutex<ShapeController>,
    now: f64,
    width: u32,
    height: u32,
) -> bool {
    match render(controller, now, width, height) {
        None => false,
        Some(Ok(svg)) => tx.send(Arc::from(svg)).is_ok(),
        Some(Err(e)) => {
            warn!("frame render failed: {e}");
            !tx.is_closed()
        }
    }
}

/// `None` when the controller lock is poisoned.
fn render(controller: &Mutex<ShapeController>, now: f64, width: u32, height: u32) -> Option<Result<String>> {
    match controller.lock() {
        Ok(mut c) => Some(c.frame_svg(now, width, height)),
        Err(_) => {
            warn!("controller lock poisoned, stopping frame loop");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ShapeState;

    fn shared() -> Arc<Mutex<ShapeController>> {
        Arc::new(Mutex::new(ShapeController::new(ShapeState::default()).unwrap()))
    }

    #[tokio::test]
    async fn publishes_frames_until_stopped() {
        let controller = shared();
        let frame_loop = FrameLoop::start(controller.clone(), (160, 120), 60.0);
        assert!(frame_loop.latest().starts_with("<svg"));

        let mut rx = frame_loop.frames();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("no frame within timeout")
            .unwrap();
        assert!(rx.borrow().contains("width=\"160\""));
        assert!(frame_loop.is_running());

        frame_loop.stop().await;
        // the controller is usable again once the loop is gone
        assert!(controller.lock().unwrap().frame_svg(0.0, 10, 10).is_ok());
    }

    #[test]
    fn failed_render_keeps_previous_frame() {
        let controller = shared();
        let (tx, rx) = watch::channel::<Arc<str>>(Arc::from("<svg>previous</svg>"));
        assert!(publish(&tx, &controller, 0.1, 0, 0));
        assert_eq!(&**rx.borrow(), "<svg>previous</svg>");
        assert!(!rx.has_changed().unwrap());

        assert!(publish(&tx, &controller, 0.1, 40, 40));
        assert!(rx.borrow().starts_with("<svg"));
        assert!(rx.borrow().contains("width=\"40\""));
    }

    #[tokio::test]
    async fn drop_aborts_task() {
        let controller = shared();
        let frame_loop = FrameLoop::start(controller.clone(), (32, 32), 30.0);
        drop(frame_loop);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(Arc::strong_count(&controller), 1);
    }

    #[tokio::test]
    async fn generate_shows_up_in_frames() {
        let controller = shared();
        let frame_loop = FrameLoop::start(controller.clone(), (64, 64), 120.0);
        let before = frame_loop.latest();
        controller.lock().unwrap().generate();
        let mut rx = frame_loop.frames();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                rx.changed().await.unwrap();
                if *rx.borrow() != before {
                    break;
                }
            }
        })
        .await
        .unwrap();
        frame_loop.stop().await;
    }
}
