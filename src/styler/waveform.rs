//! Waveform view: a per-frame redraw of a jittered line while playing and a
//! flat line while paused. The jitter is a visual proxy for activity, not an
//! analysis of the signal.

use super::audio_types::PlaybackState;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

pub const STROKE_COLOR: &str = "#818cf8";
pub const LINE_WIDTH: f64 = 2.0;
pub const MAX_JITTER: f64 = 20.0;
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// A canvas-like drawing target.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self, color: &str, line_width: f64);
}

impl<S: Surface> Surface for Arc<Mutex<S>> {
    fn width(&self) -> u32 {
        self.lock().unwrap_or_else(|e| e.into_inner()).width()
    }
    fn height(&self) -> u32 {
        self.lock().unwrap_or_else(|e| e.into_inner()).height()
    }
    fn clear(&mut self) {
        self.lock().unwrap_or_else(|e| e.into_inner()).clear()
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).move_to(x, y)
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.lock().unwrap_or_else(|e| e.into_inner()).line_to(x, y)
    }
    fn stroke(&mut self, color: &str, line_width: f64) {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .stroke(color, line_width)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathOp {
    Clear,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Stroke { color: String, line_width: f64 },
}

/// In-memory surface holding the ops of the most recent frame.
#[derive(Debug, Clone)]
pub struct PathSurface {
    width: u32,
    height: u32,
    ops: Vec<PathOp>,
}

impl PathSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    /// Vertices of the stroked path.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PathOp::MoveTo(x, y) | PathOp::LineTo(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for PathSurface {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(PathOp::Clear);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(PathOp::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(PathOp::LineTo(x, y));
    }
    fn stroke(&mut self, color: &str, line_width: f64) {
        self.ops.push(PathOp::Stroke {
            color: color.to_string(),
            line_width,
        });
    }
}

/// Paints one frame. `t_ms` is the frame timestamp.
pub fn draw_frame<S, R>(surface: &mut S, state: &PlaybackState, t_ms: f64, rng: &mut R)
where
    S: Surface + ?Sized,
    R: Rng,
{
    let width = surface.width();
    let center_y = surface.height() as f64 / 2.0;

    surface.clear();
    surface.move_to(0.0, center_y);

    if state.is_playing {
        for i in 0..width {
            let x = i as f64;
            let amplitude = rng.gen::<f64>() * MAX_JITTER;
            surface.line_to(x, center_y + (x * 0.1 + t_ms * 0.1).sin() * amplitude);
        }
    } else {
        surface.line_to(width as f64, center_y);
    }

    surface.stroke(STROKE_COLOR, LINE_WIDTH);
}

/// Source of display frames. Each call requests exactly one frame.
#[async_trait]
pub trait FrameClock: Send {
    /// Resolves with the frame timestamp in milliseconds, or `None` once the
    /// host stops producing frames.
    async fn next_frame(&mut self) -> Option<f64>;
}

/// Sleeps until the next refresh tick. Re-armed on every call, so a slow
/// frame skips ticks instead of queueing them.
pub struct RefreshClock {
    origin: Instant,
    period: Duration,
    next: Instant,
}

impl RefreshClock {
    pub fn new(refresh_hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64);
        let origin = Instant::now();
        Self {
            origin,
            period,
            next: origin + period,
        }
    }
}

impl Default for RefreshClock {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ)
    }
}

#[async_trait]
impl FrameClock for RefreshClock {
    async fn next_frame(&mut self) -> Option<f64> {
        tokio::time::sleep_until(self.next).await;
        let now = Instant::now();
        self.next = if now >= self.next + self.period {
            now + self.period
        } else {
            self.next + self.period
        };
        Some(now.duration_since(self.origin).as_secs_f64() * 1000.0)
    }
}

/// A running redraw loop bound to one surface and one playback state.
///
/// Dropping or disposing the handle cancels the loop; no frame is drawn
/// afterwards.
pub struct RenderLoop {
    task: Option<JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl RenderLoop {
    /// Starts the loop on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn<S, C>(surface: S, clock: C, state: watch::Receiver<PlaybackState>) -> Self
    where
        S: Surface + Send + 'static,
        C: FrameClock + 'static,
    {
        Self::spawn_with_rng(surface, clock, state, StdRng::from_entropy())
    }

    /// [`RenderLoop::spawn`] with a caller-provided jitter source. Same
    /// runtime requirement.
    pub fn spawn_with_rng<S, C>(
        mut surface: S,
        mut clock: C,
        mut state: watch::Receiver<PlaybackState>,
        mut rng: StdRng,
    ) -> Self
    where
        S: Surface + Send + 'static,
        C: FrameClock + 'static,
    {
        let frames = Arc::new(AtomicU64::new(0));
        let counter = frames.clone();

        let task = tokio::spawn(async move {
            while let Some(t_ms) = clock.next_frame().await {
                if state.has_changed().is_err() {
                    debug!("playback state closed, stopping waveform");
                    break;
                }
                let current = *state.borrow_and_update();
                draw_frame(&mut surface, &current, t_ms, &mut rng);
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });

        Self {
            task: Some(task),
            frames,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Cancel the loop and wait until its task is gone.
    pub async fn dispose(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
