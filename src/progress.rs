//! Progress reporting for long-running pipeline stages
//!
//! Stages work through triangles in fixed-size batches and report between
//! batches. Reporting is informational only: it never changes results or
//! their order, and there is no cancellation.

use std::fmt;

/// Number of triangles processed between progress reports
pub const BATCH_SIZE: usize = 2048;

/// Pipeline stage being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Per-triangle color derivation
    Sampling,
    /// Simplification and subdivision
    Fitting,
    /// Palette construction and nearest-color assignment
    Quantizing,
    /// Per-color grouping and vertex deduplication
    Segmenting,
    /// 3MF document generation
    Serializing,
    /// Package re-parse and checks
    Validating,
}

impl Stage {
    /// Lowercase stage name
    pub fn name(self) -> &'static str {
        match self {
            Stage::Sampling => "sampling",
            Stage::Fitting => "fitting",
            Stage::Quantizing => "quantizing",
            Stage::Segmenting => "segmenting",
            Stage::Serializing => "serializing",
            Stage::Validating => "validating",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress information passed to callbacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Stage being reported
    pub stage: Stage,
    /// Completed items in this stage
    pub current: usize,
    /// Total items in this stage
    pub total: usize,
}

impl Progress {
    /// Create a progress report
    pub fn new(stage: Stage, current: usize, total: usize) -> Self {
        Self {
            stage,
            current,
            total,
        }
    }

    /// Progress as a fraction (0.0 to 1.0)
    #[inline]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            (self.current.min(self.total) as f32) / (self.total as f32)
        }
    }
}

/// Sink for progress reports
///
/// Wraps an optional host callback so stages can report unconditionally.
pub struct ProgressSink<'a> {
    callback: Option<&'a mut dyn FnMut(&Progress)>,
}

impl<'a> ProgressSink<'a> {
    /// Sink forwarding to `callback`
    pub fn new(callback: &'a mut dyn FnMut(&Progress)) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Sink that drops every report
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Report progress for a stage
    pub fn report(&mut self, stage: Stage, current: usize, total: usize) {
        if let Some(callback) = self.callback.as_mut() {
            callback(&Progress::new(stage, current, total));
        }
    }

    /// Report after `done` items if a batch boundary was crossed
    #[inline]
    pub fn batch(&mut self, stage: Stage, done: usize, total: usize) {
        if done % BATCH_SIZE == 0 || done == total {
            self.report(stage, done, total);
        }
    }
}

impl Default for ProgressSink<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for ProgressSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        assert_eq!(Progress::new(Stage::Sampling, 5, 10).fraction(), 0.5);
        assert_eq!(Progress::new(Stage::Sampling, 0, 0).fraction(), 1.0);
        assert_eq!(Progress::new(Stage::Sampling, 20, 10).fraction(), 1.0);
    }

    #[test]
    fn test_batch_reports_on_boundaries_and_completion() {
        let mut seen = Vec::new();
        let mut callback = |p: &Progress| seen.push(p.current);
        let mut sink = ProgressSink::new(&mut callback);

        let total = BATCH_SIZE * 2 + 5;
        for done in 1..=total {
            sink.batch(Stage::Quantizing, done, total);
        }
        drop(sink);

        assert_eq!(seen, vec![BATCH_SIZE, BATCH_SIZE * 2, total]);
    }

    #[test]
    fn test_none_sink_is_silent() {
        let mut sink = ProgressSink::none();
        sink.report(Stage::Validating, 1, 1);
    }
}
