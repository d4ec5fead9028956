//! Email editing with an LLM worker model, scored by an LLM judge.
//!
//! The crate is the evaluation core: prompt rendering, model calls, judge
//! parsing, batch runs and model comparisons. Rendering and persistence belong
//! to the caller (see `mailgrade-cli`).

pub mod client;
pub mod config;
pub mod dataset;
pub mod edit;
pub mod errors;
pub mod judge;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod report;

pub use client::ModelClient;
pub use errors::{BatchRunError, EvalError, ServiceError};
pub use model::{EditResult, EditTask, Instruction, Rating, Record};
pub use pipeline::{
    BatchPipeline, CancelFlag, CompareOptions, ComparisonPipeline, ComparisonReport,
    JudgeFailurePolicy, RunOptions,
};
pub use prompts::PromptCatalog;
pub use report::AggregateReport;
