//! # Frame Timing and FPS History
//!
//! Tracks per-frame delta time for behaviours and keeps a fixed-size ring
//! buffer of instantaneous frame rates for the UI plot.
//!
//! ## Usage
//!
//! ```rust
//! use lighting_demo::performance::{FpsHistory, FrameTiming};
//!
//! let mut timing = FrameTiming::new(0.0);
//! let mut history = FpsHistory::new();
//!
//! // In the main loop
//! let dt = timing.begin_frame(0.016);
//! history.push(dt);
//! // ... update and render ...
//! timing.end_frame();
//!
//! let stats = history.stats();
//! assert!(stats.max >= stats.min);
//! ```

/// Number of frame rate samples kept for the plot and statistics
pub const FPS_HISTORY_LEN: usize = 128;

/// Largest delta time handed to behaviours, in seconds
pub const MAX_DELTA_TIME: f32 = 1.0;

/// Frame clock measured in seconds since application start
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    pub last_frame: f64,
    pub current_frame: f64,
    pub delta_time: f32,
}

impl FrameTiming {
    pub fn new(start: f64) -> Self {
        Self {
            last_frame: start,
            current_frame: start,
            delta_time: 0.0,
        }
    }

    /// Starts a frame at `now` and returns the clamped delta time
    pub fn begin_frame(&mut self, now: f64) -> f32 {
        self.current_frame = now;
        let delta = (self.current_frame - self.last_frame) as f32;
        self.delta_time = delta.clamp(0.0, MAX_DELTA_TIME);
        self.delta_time
    }

    pub fn end_frame(&mut self) {
        self.last_frame = self.current_frame;
    }
}

/// Summary of the FPS ring buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsStats {
    pub min: f32,
    pub max: f32,
    pub avg: f32,
}

/// Ring buffer of frame rates, one slot per frame
///
/// Slots start at zero and statistics always cover the whole buffer, so the
/// minimum stays at zero until the buffer has wrapped once.
#[derive(Debug, Clone)]
pub struct FpsHistory {
    samples: [f32; FPS_HISTORY_LEN],
    cursor: usize,
}

impl FpsHistory {
    pub fn new() -> Self {
        Self {
            samples: [0.0; FPS_HISTORY_LEN],
            cursor: 0,
        }
    }

    /// Records `1 / delta_time` at the cursor and advances it
    pub fn push(&mut self, delta_time: f32) {
        let fps = if delta_time > 0.0 {
            1.0 / delta_time
        } else {
            0.0
        };
        self.samples[self.cursor] = fps;
        self.cursor = (self.cursor + 1) % FPS_HISTORY_LEN;
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stats(&self) -> FpsStats {
        let mut min = f32::MAX;
        let mut max = 0.0f32;
        let mut sum = 0.0f32;
        for &sample in &self.samples {
            min = min.min(sample);
            max = max.max(sample);
            sum += sample;
        }
        FpsStats {
            min,
            max,
            avg: sum / FPS_HISTORY_LEN as f32,
        }
    }

    /// Draws the frame rate plot and summary line
    pub fn render_ui(&self, ui: &imgui::Ui) {
        let stats = self.stats();
        ui.plot_lines("FPS", &self.samples).build();
        ui.text(format!(
            "MIN: {:.6} MAX: {:.6} AVG: {:.6}",
            stats.min, stats.max, stats.avg
        ));
    }
}

impl Default for FpsHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_delta_time_is_clamped() {
        let mut timing = FrameTiming::new(0.0);
        assert_relative_eq!(timing.begin_frame(5.0), 1.0);
        timing.end_frame();
        assert_relative_eq!(timing.begin_frame(5.25), 0.25);
    }

    #[test]
    fn test_last_frame_only_moves_on_end_frame() {
        let mut timing = FrameTiming::new(1.0);
        timing.begin_frame(1.5);
        assert_eq!(timing.last_frame, 1.0);
        timing.end_frame();
        assert_eq!(timing.last_frame, 1.5);
    }

    #[test]
    fn test_history_wraps_after_128_frames() {
        let mut history = FpsHistory::new();
        for _ in 0..FPS_HISTORY_LEN {
            history.push(0.5);
        }
        assert_eq!(history.cursor(), 0);
        history.push(0.25);
        assert_eq!(history.cursor(), 1);
        assert_relative_eq!(history.samples()[0], 4.0);
        assert_relative_eq!(history.samples()[1], 2.0);
    }

    #[test]
    fn test_stats_cover_whole_buffer() {
        let mut history = FpsHistory::new();
        history.push(0.5); // 2 fps
        history.push(0.25); // 4 fps
        let stats = history.stats();
        assert_eq!(stats.min, 0.0);
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.avg, 6.0 / FPS_HISTORY_LEN as f32);
    }
}
