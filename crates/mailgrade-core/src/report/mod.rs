pub mod console;
pub mod progress;

use crate::model::EditResult;
use serde::{Deserialize, Serialize};

/// Scores for one run: averages over every result plus the results themselves
/// in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub model: String,
    pub average_faithfulness: f64,
    pub average_completeness: f64,
    pub results: Vec<EditResult>,
}

/// Averages for a single instruction tag within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionSummary {
    pub instruction: String,
    pub count: usize,
    pub average_faithfulness: f64,
    pub average_completeness: f64,
}

impl AggregateReport {
    pub fn from_results(model: impl Into<String>, results: Vec<EditResult>) -> Self {
        let average_faithfulness = mean(results.iter().map(|r| r.faithfulness.rating));
        let average_completeness = mean(results.iter().map(|r| r.completeness.rating));
        Self {
            model: model.into(),
            average_faithfulness,
            average_completeness,
            results,
        }
    }

    /// Per-instruction averages, in the order each tag first appears.
    pub fn per_instruction(&self) -> Vec<InstructionSummary> {
        let mut tags: Vec<&str> = Vec::new();
        for r in &self.results {
            if !tags.contains(&r.instruction.as_str()) {
                tags.push(&r.instruction);
            }
        }
        tags.into_iter()
            .map(|tag| {
                let matching = || self.results.iter().filter(move |r| r.instruction == tag);
                InstructionSummary {
                    instruction: tag.to_string(),
                    count: matching().count(),
                    average_faithfulness: mean(matching().map(|r| r.faithfulness.rating)),
                    average_completeness: mean(matching().map(|r| r.completeness.rating)),
                }
            })
            .collect()
    }

    /// Ratings defaulted to zero because the judge output was unparseable.
    pub fn defaulted_ratings(&self) -> u32 {
        self.results.iter().map(|r| r.judge_fallbacks).sum()
    }
}

/// Arithmetic mean; 0.0 for an empty sequence.
pub fn mean(values: impl Iterator<Item = u8>) -> f64 {
    let (sum, count) = values.fold((0u64, 0u64), |(s, c), v| (s + u64::from(v), c + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
