//! Progress reporting for long-running stages.

use tracing::debug;

/// Receives progress updates from long-running operations.
pub trait Progress {
    /// `ratio` is in [0, 1].
    fn set_progress(&mut self, text: String, ratio: f32);
}

/// Discards all progress updates.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_progress(&mut self, _text: String, _ratio: f32) {}
}

/// Logs progress as `debug` events, at most once per 10% step.
#[derive(Debug, Default)]
pub struct LogProgress {
    last_step: Option<u32>,
    logged: usize,
}

impl LogProgress {
    pub fn new() -> LogProgress {
        LogProgress::default()
    }

    /// Number of updates that were logged.
    pub fn logged(&self) -> usize {
        self.logged
    }
}

impl Progress for LogProgress {
    fn set_progress(&mut self, text: String, ratio: f32) {
        let step = (ratio.max(0.0).min(1.0) * 10.0) as u32;
        // A drop back to a lower step is a new stage starting.
        if self.last_step.map_or(true, |last| step != last) {
            debug!(progress = ratio, "{}", text);
            self.last_step = Some(step);
            self.logged += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_progress_throttles() {
        let mut p = LogProgress::new();
        for i in 1..=100 {
            p.set_progress(format!("row {}", i), i as f32 / 100.0);
        }
        // Steps 0 through 10.
        assert_eq!(p.logged(), 11);

        // A second stage starts over.
        p.set_progress("next".into(), 0.0);
        assert_eq!(p.logged(), 12);
    }
}
