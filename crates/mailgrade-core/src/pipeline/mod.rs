mod batch;
mod compare;

pub use batch::BatchPipeline;
pub use compare::{CompareOptions, ComparisonPipeline, ComparisonReport, ModelFailure};

use crate::report::progress::ProgressSink;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a batch run does when the judge output cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeFailurePolicy {
    /// Stop the run and return the results gathered so far.
    #[default]
    Abort,
    /// Record a zero rating for the failing axis and keep going.
    ScoreZero,
}

/// Cooperative stop signal shared between the caller and a running pipeline.
/// Checked before each record, so the in-flight record always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct RunOptions {
    pub progress: Option<ProgressSink>,
    pub cancel: Option<CancelFlag>,
}

impl RunOptions {
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}
