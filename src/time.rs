//! Monotonic clock for the frame loop.
//!
//! Everything time-dependent in the simulation (scheduler, pointer activity,
//! pulse expiry) works in milliseconds since start as `f64`. [`Clock`] is the
//! single source of those timestamps and also keeps a running FPS figure for
//! the periodic stats log.
//!
//! # Example
//!
//! ```
//! use starfield::time::Clock;
//!
//! let mut clock = Clock::new();
//! let now = clock.tick();
//! assert!(now >= 0.0);
//! assert_eq!(clock.frame(), 1);
//! ```

use std::time::{Duration, Instant};

/// Millisecond clock with frame counting.
#[derive(Debug)]
pub struct Clock {
    /// When the clock was created.
    start: Instant,
    /// Timestamp returned by the last `tick`.
    now_ms: f64,
    /// Total ticks since start.
    frame_count: u64,
    /// FPS over the last completed window.
    fps: f32,
    /// Frame count at the start of the current FPS window.
    fps_frame_count: u64,
    /// Start of the current FPS window.
    fps_window_start: Instant,
    /// Length of an FPS window.
    fps_interval: Duration,
}

impl Clock {
    pub fn new() -> Self {
        Self::with_fps_interval(Duration::from_millis(500))
    }

    /// Create a clock that recomputes FPS every `interval`.
    pub fn with_fps_interval(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            now_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_window_start: now,
            fps_interval: interval,
        }
    }

    /// Milliseconds since the clock was created, without counting a frame.
    #[inline]
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Count a frame and return its timestamp in milliseconds.
    pub fn tick(&mut self) -> f64 {
        let instant = Instant::now();
        self.now_ms = instant.duration_since(self.start).as_secs_f64() * 1000.0;
        self.frame_count += 1;

        let window = instant.duration_since(self.fps_window_start);
        if window >= self.fps_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / window.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_window_start = instant;
        }

        self.now_ms
    }

    /// Timestamp of the last `tick`.
    #[inline]
    pub fn last_tick(&self) -> f64 {
        self.now_ms
    }

    /// Ticks since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
