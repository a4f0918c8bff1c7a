//! Time management for the frame loop.

use std::time::{Duration, Instant};

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Time when the engine started.
    start_time: Instant,
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update timing at the start of a new frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_frame;
        self.last_frame = now;
        self.elapsed = now - self.start_time;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds. Drives phase-based shape
    /// animation (pulse, bob) which must survive pauses in frame rate.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (averaged over last frame).
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

/// Once-per-second FPS reporter for the log.
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: u32,
    /// Accumulated in f64; summing sixty f32 frame times loses enough
    /// precision to slip the one-second boundary.
    window: f64,
    last_fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame. Returns `Some(fps)` once a full second has elapsed.
    pub fn tick(&mut self, dt: f32) -> Option<u32> {
        self.frames += 1;
        self.window += f64::from(dt);
        if self.window >= 1.0 {
            self.last_fps = self.frames;
            self.frames = 0;
            self.window -= 1.0;
            Some(self.last_fps)
        } else {
            None
        }
    }

    /// Most recently completed one-second frame count.
    pub fn last_fps(&self) -> u32 {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut c = FpsCounter::new();
        for _ in 0..59 {
            assert_eq!(c.tick(1.0 / 60.0), None);
        }
        // 60th frame crosses the 1s window
        assert_eq!(c.tick(1.0 / 60.0), Some(60));
        assert_eq!(c.last_fps(), 60);
    }

    #[test]
    fn fps_counter_cadence_does_not_drift() {
        let mut c = FpsCounter::new();
        let mut reports = 0;
        for _ in 0..600 {
            if c.tick(1.0 / 60.0).is_some() {
                reports += 1;
            }
        }
        assert_eq!(reports, 10);
    }

    #[test]
    fn time_accumulates_frames() {
        let mut t = Time::new();
        t.update();
        t.update();
        assert_eq!(t.frame_count(), 2);
        assert!(t.elapsed_seconds() >= 0.0);
    }
}
