// src/platform/clock.rs
//! Frame timing and the once-a-second FPS readout.

use log::info;
use std::time::{Duration, Instant};

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Timing for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTiming {
    /// Seconds since the clock started.
    pub time: f64,
    /// Seconds since the previous tick.
    pub delta: f32,
    /// New window title, present roughly once per second.
    pub title: Option<String>,
}

/// Tracks absolute and delta time across frames and averages FPS over
/// one-second windows.
#[derive(Debug)]
pub struct FrameClock {
    name: String,
    start: Option<Instant>,
    previous: Instant,
    refresh_start: Instant,
    frames_since_refresh: u32,
    last_fps: f64,
}

impl FrameClock {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            name: name.into(),
            start: None,
            previous: now,
            refresh_start: now,
            frames_since_refresh: 0,
            last_fps: 0.0,
        }
    }

    pub fn tick(&mut self) -> FrameTiming {
        self.tick_at(Instant::now())
    }

    /// Same as [`FrameClock::tick`] with an explicit current time.
    pub fn tick_at(&mut self, now: Instant) -> FrameTiming {
        let start = match self.start {
            Some(start) => start,
            None => {
                // First tick starts every interval at zero.
                self.start = Some(now);
                self.previous = now;
                self.refresh_start = now;
                now
            }
        };

        let time = now.saturating_duration_since(start).as_secs_f64();
        let delta = now.saturating_duration_since(self.previous).as_secs_f32();
        self.previous = now;
        self.frames_since_refresh += 1;

        let window = now.saturating_duration_since(self.refresh_start);
        let title = if window >= REFRESH_INTERVAL {
            let fps = self.frames_since_refresh as f64 / window.as_secs_f64();
            self.last_fps = fps;
            self.refresh_start = now;
            self.frames_since_refresh = 0;
            info!("FrameClock: {:.2} fps", fps);
            Some(format_title(fps, &self.name))
        } else {
            None
        };

        FrameTiming { time, delta, title }
    }

    /// FPS over the last completed one-second window (0 before the first).
    pub fn last_fps(&self) -> f64 {
        self.last_fps
    }
}

/// `"[60.0 fps  16.667 ms] name"`
pub fn format_title(fps: f64, name: &str) -> String {
    let ms = if fps > 0.0 { 1000.0 / fps } else { 0.0 };
    format!("[{:.1} fps  {:.3} ms] {}", fps, ms, name)
}
