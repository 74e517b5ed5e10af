//! Pointer tracking.
//!
//! [`PointerState`] is a small mailbox: input handlers write into it as events
//! arrive, and the frame callback reads it once per fixed step to decide the
//! [`ForceMode`]. Nothing else touches it, so no synchronization is needed.
//!
//! Timestamps are milliseconds on the same clock the scheduler uses.

use glam::Vec2;

use crate::viewport::Viewport;

/// Direction of the pointer force for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Stars are pulled toward the pointer.
    Attract,
    /// Stars are pushed away from the pointer.
    Repel,
    /// No pointer force.
    Idle,
}

impl ForceMode {
    /// Signed multiplier applied to the force magnitude.
    #[inline]
    pub fn direction(self) -> f32 {
        match self {
            ForceMode::Attract => 1.0,
            ForceMode::Repel => -1.0,
            ForceMode::Idle => 0.0,
        }
    }
}

/// Last known pointer position, activity and pulse state.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerState {
    position: Vec2,
    last_move: Option<f64>,
    pulse_active: bool,
    pulse_end: f64,
    inactivity_window_ms: f64,
    pulse_duration_ms: f64,
}

impl PointerState {
    /// A pointer resting at the viewport center with no recent activity.
    pub fn new(viewport: Viewport, inactivity_window_ms: f64, pulse_duration_ms: f64) -> Self {
        Self {
            position: viewport.center(),
            last_move: None,
            pulse_active: false,
            pulse_end: 0.0,
            inactivity_window_ms,
            pulse_duration_ms,
        }
    }

    /// Record a move to `(x, y)` at `now`.
    ///
    /// Moves that land on the current position are ignored, so a stationary
    /// pointer that keeps reporting its location does not keep attracting.
    pub fn moved(&mut self, x: f32, y: f32, now: f64) {
        let position = Vec2::new(x, y);
        if position != self.position {
            self.position = position;
            self.last_move = Some(now);
        }
    }

    /// The pointer left the surface: recenter and stop attracting.
    pub fn left(&mut self, viewport: Viewport) {
        self.position = viewport.center();
        self.last_move = None;
    }

    /// Arm the repulsion pulse for the configured duration from `now`.
    pub fn pressed(&mut self, now: f64) {
        self.pulse_active = true;
        self.pulse_end = now + self.pulse_duration_ms;
    }

    /// Force mode for a step taken at `now`.
    ///
    /// An expired pulse is cleared here. The pulse takes priority over
    /// attraction while it lasts.
    pub fn mode(&mut self, now: f64) -> ForceMode {
        if self.pulse_active && now > self.pulse_end {
            self.pulse_active = false;
        }

        if self.pulse_active {
            ForceMode::Repel
        } else if self.recently_moved(now) {
            ForceMode::Attract
        } else {
            ForceMode::Idle
        }
    }

    fn recently_moved(&self, now: f64) -> bool {
        self.last_move
            .map(|t| now - t < self.inactivity_window_ms)
            .unwrap_or(false)
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn last_move(&self) -> Option<f64> {
        self.last_move
    }

    #[inline]
    pub fn is_pulse_active(&self) -> bool {
        self.pulse_active
    }

    #[inline]
    pub fn pulse_end(&self) -> f64 {
        self.pulse_end
    }
}
