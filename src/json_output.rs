//! # JSON Output Module
//!
//! Output strutturato in JSON (una riga per evento su stdout) per l'uso
//! programmatico del convertitore con `--json`.
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_complete`: Esito di un file
//! - `complete`: Fine del batch con i conteggi
//! - `cancelled`: Batch interrotto dall'utente, conteggi parziali
//! - `error`: Errore fatale

use crate::config::Config;
use crate::converter::{ConversionOutcome, RunSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio del batch
    Start {
        input_dir: PathBuf,
        output_dir: PathBuf,
        total_files: usize,
        config: JsonConfig,
    },

    /// Esito di un singolo file
    FileComplete {
        source: String,
        status: String,
        destination: Option<String>,
        reason: Option<String>,
        error: Option<String>,
    },

    /// Batch completato
    Complete {
        successful: usize,
        skipped: usize,
        failed: usize,
        duration_seconds: f64,
    },

    /// Batch interrotto
    Cancelled {
        successful: usize,
        skipped: usize,
        failed: usize,
        duration_seconds: f64,
    },

    /// Errore fatale
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonConfig {
    pub quality: u8,
    pub threads: usize,
    pub optimize: bool,
    pub overwrite: bool,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            threads: config.threads,
            optimize: config.optimize,
            overwrite: config.overwrite,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, output_dir: PathBuf, total_files: usize, config: &Config) -> Self {
        Self::Start {
            input_dir,
            output_dir,
            total_files,
            config: JsonConfig::from(config),
        }
    }

    pub fn file_complete(outcome: &ConversionOutcome) -> Self {
        let (destination, reason, error) = match outcome {
            ConversionOutcome::Converted { destination_name, .. } => (Some(destination_name.clone()), None, None),
            ConversionOutcome::Skipped { reason, .. } => (None, Some(reason.to_string()), None),
            ConversionOutcome::Failed { error_message, .. } => (None, None, Some(error_message.clone())),
        };

        Self::FileComplete {
            source: outcome.source_name().to_string(),
            status: outcome.status().to_string(),
            destination,
            reason,
            error,
        }
    }

    pub fn complete(summary: &RunSummary, duration_seconds: f64) -> Self {
        Self::Complete {
            successful: summary.successful,
            skipped: summary.skipped,
            failed: summary.failed,
            duration_seconds,
        }
    }

    pub fn cancelled(summary: &RunSummary, duration_seconds: f64) -> Self {
        Self::Cancelled {
            successful: summary.successful,
            skipped: summary.skipped,
            failed: summary.failed,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
