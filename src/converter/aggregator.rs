//! # Result Aggregation Module
//!
//! Conta gli esiti dei task. Il contatore ha un solo proprietario: il task
//! coordinatore che riceve gli esiti dal canale dei worker, quindi non serve
//! nessun lock.

use crate::converter::task::ConversionOutcome;
use serde::Serialize;

/// Final tally of a batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.successful + self.skipped + self.failed
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Converted: {} | Skipped: {} | Failed: {}",
            self.total(),
            self.successful,
            self.skipped,
            self.failed
        )
    }
}

/// Serialized consumer of conversion outcomes
#[derive(Debug, Default)]
pub struct ResultAggregator {
    summary: RunSummary,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates exactly one counter
    pub fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome {
            ConversionOutcome::Converted { .. } => self.summary.successful += 1,
            ConversionOutcome::Skipped { .. } => self.summary.skipped += 1,
            ConversionOutcome::Failed { .. } => self.summary.failed += 1,
        }
    }

    pub fn finalize(self) -> RunSummary {
        self.summary
    }
}
