//! # Progress Tracking Module
//!
//! Callback di completamento del batch: per ogni esito scrive il log,
//! avanza la progress bar ed emette l'evento JSON se richiesto.
//! Viene chiamato solo dal coordinatore dello scheduler, un esito alla volta.

use crate::converter::aggregator::RunSummary;
use crate::converter::task::ConversionOutcome;
use crate::json_output::JsonMessage;
use crate::progress::ProgressManager;
use tracing::{debug, error};

/// Tracker unificato di log, progress bar ed eventi JSON
pub struct ProgressTracker {
    progress: ProgressManager,
    json_output: bool,
}

impl ProgressTracker {
    /// Crea un nuovo tracker (barra nascosta in modalità JSON)
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress = if json_output {
            ProgressManager::hidden(total_files as u64)
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self { progress, json_output }
    }

    /// Gestisce il completamento di un file
    pub fn handle_outcome(&self, outcome: &ConversionOutcome) {
        let message = match outcome {
            ConversionOutcome::Converted {
                source_name,
                destination_name,
            } => {
                debug!("Converted: {} -> {}", source_name, destination_name);
                format!("[OK] {}", source_name)
            }
            ConversionOutcome::Skipped { source_name, reason } => {
                debug!("Skipped ({}): {}", reason, source_name);
                format!("[SKIP] {}", source_name)
            }
            ConversionOutcome::Failed {
                source_name,
                error_message,
            } => {
                error!("Error converting {}: {}", source_name, error_message);
                format!("[ERROR] {}", source_name)
            }
        };

        if self.json_output {
            JsonMessage::file_complete(outcome).emit();
        }

        self.progress.update(&message);
    }

    /// Finalizza la progress bar
    pub fn finish(&self, summary: &RunSummary) {
        self.progress.finish(&summary.format_summary());
    }

    /// Lascia la barra com'è dopo una cancellazione
    pub fn abandon(&self, summary: &RunSummary) {
        self.progress.abandon(&format!("Cancelled | {}", summary.format_summary()));
    }
}

#[cfg(test)]
impl ProgressTracker {
    /// Tracker senza output
    fn silent(total_files: usize) -> Self {
        Self {
            progress: ProgressManager::hidden(total_files as u64),
            json_output: false,
        }
    }

    /// Numero di esiti gestiti
    fn completed(&self) -> u64 {
        self.progress.position()
    }
}
