//! Progress reporting for batch runs. The pipeline emits done/total after each
//! record; the presentation layer consumes the events through a sink.

use std::sync::Arc;

/// One progress update: how many records are done and the total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

impl ProgressEvent {
    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Sink for progress events. Called once per finished record.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress sink for comparison runs; receives the model id with each event.
pub type ModelProgressSink = Arc<dyn Fn(&str, ProgressEvent) + Send + Sync>;
