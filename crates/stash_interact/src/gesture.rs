//! Press-and-hold gesture timer
//!
//! A press released before the tap threshold is a tap. Holding until the hold
//! duration completes the gesture; the release that follows is ignored. A
//! release in between does nothing.

/// Result of advancing a gesture by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureTick {
    /// Not pressed, already completed, or still inside the tap window
    Idle,
    /// Past the tap window; 0..1 toward completion
    Progress(f32),
    /// Reached the hold duration this frame
    Completed,
}

/// Result of releasing the button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureRelease {
    /// Released inside the tap window
    Tap,
    /// Released after the tap window but before completion
    Cancelled,
    /// Not pressed, or the hold already completed
    Ignored,
}

/// Timer for a single press/hold/release gesture
#[derive(Debug, Clone)]
pub struct HoldGesture {
    tap_threshold: f32,
    hold_duration: f32,
    elapsed: f32,
    active: bool,
    completed: bool,
}

impl HoldGesture {
    /// Create a gesture timer
    pub fn new(tap_threshold: f32, hold_duration: f32) -> Self {
        Self {
            tap_threshold,
            hold_duration: hold_duration.max(tap_threshold),
            elapsed: 0.0,
            active: false,
            completed: false,
        }
    }

    /// Start (or restart) the gesture
    pub fn press(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
        self.completed = false;
    }

    /// Advance the timer
    pub fn tick(&mut self, dt: f32) -> GestureTick {
        if !self.active || self.completed {
            return GestureTick::Idle;
        }

        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.hold_duration {
            self.completed = true;
            GestureTick::Completed
        } else if self.elapsed >= self.tap_threshold {
            GestureTick::Progress(self.progress())
        } else {
            GestureTick::Idle
        }
    }

    /// End the gesture
    pub fn release(&mut self) -> GestureRelease {
        let outcome = if !self.active || self.completed {
            GestureRelease::Ignored
        } else if self.elapsed < self.tap_threshold {
            GestureRelease::Tap
        } else {
            GestureRelease::Cancelled
        };
        self.reset();
        outcome
    }

    /// Abort without producing a tap
    pub fn cancel(&mut self) -> bool {
        let was_pending = self.is_pending();
        self.reset();
        was_pending
    }

    /// Button is down and the hold has not completed
    pub fn is_pending(&self) -> bool {
        self.active && !self.completed
    }

    /// Seconds since press
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Progress from the end of the tap window to completion, clamped to 0..1
    pub fn progress(&self) -> f32 {
        let span = self.hold_duration - self.tap_threshold;
        if span <= 0.0 {
            return if self.elapsed >= self.hold_duration { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.tap_threshold) / span).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.elapsed = 0.0;
        self.active = false;
        self.completed = false;
    }
}
