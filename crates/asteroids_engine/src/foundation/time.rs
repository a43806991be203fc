//! Time management utilities

use std::time::{Duration, Instant};

/// Frame clock driven by explicit time steps
///
/// The simulation advances in whole frames; `total_time` is monotonically
/// increasing and is what cooldowns and particle lifetimes compare against.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Timer {
    /// Create a new timer at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame of `delta_time` seconds
    ///
    /// Negative steps are clamped to zero so total time never runs backwards.
    pub fn advance(&mut self, delta_time: f32) {
        self.delta_time = delta_time.max(0.0);
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average simulated FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring wall-clock time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::start_new()
    }
}

impl Stopwatch {
    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Restart the stopwatch from zero
    pub fn restart(&mut self) {
        self.start_time = Instant::now();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }
}
