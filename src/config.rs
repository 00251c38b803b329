//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del convertitore.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di conversione
//! - Fornisce valori di default coerenti con la CLI
//! - Valida i parametri prima dell'avvio del batch
//!
//! ## Parametri di configurazione:
//! - `input_dir`: Directory con i file CR3 (default: `cr3_images`)
//! - `output_dir`: Directory per i PNG (default: `png_images`)
//! - `quality`: Hint di qualità 1-100 per l'ottimizzatore PNG (default: 95)
//! - `threads`: Numero di worker paralleli (default: 4)
//! - `optimize`: Ottimizzazione lossless del PNG (default: true)
//! - `overwrite`: Sovrascrive i PNG esistenti (default: false)
//! - `verbose`: Logging a livello DEBUG (default: false)
//! - `json_output`: Eventi JSON su stdout (default: false)
//! - `log_file`: File di log persistente (default: `converter.log`)
//!
//! ## Validazione:
//! - `quality` deve essere 1-100
//! - `threads` deve essere > 0 (nessun fallback "illimitato")
//! - `output_dir`, se esiste, deve essere una directory

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of parallel workers
pub const DEFAULT_THREADS: usize = 4;

/// Default PNG quality hint
pub const DEFAULT_QUALITY: u8 = 95;

/// Configuration for a batch conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing the RAW files
    pub input_dir: PathBuf,
    /// Directory receiving the PNG files
    pub output_dir: PathBuf,
    /// Quality hint (1-100), only affects optimizer effort
    pub quality: u8,
    /// Number of parallel workers
    pub threads: usize,
    /// Re-save the PNG with lossless optimization
    pub optimize: bool,
    /// Convert even when the PNG already exists
    pub overwrite: bool,
    /// Debug logging
    pub verbose: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Persistent log file (None = stderr only)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("cr3_images"),
            output_dir: PathBuf::from("png_images"),
            quality: DEFAULT_QUALITY,
            threads: DEFAULT_THREADS,
            optimize: true,
            overwrite: false,
            verbose: false,
            json_output: false,
            log_file: Some(PathBuf::from("converter.log")),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.quality == 0 || self.quality > 100 {
            return Err(ConvertError::Validation(format!(
                "Quality must be between 1 and 100 (got {})",
                self.quality
            )));
        }

        if self.threads == 0 {
            return Err(ConvertError::Validation(
                "Number of threads must be greater than 0".to_string(),
            ));
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConvertError::OutputNotADirectory(self.output_dir.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        config.quality = 101;
        assert!(config.validate().is_err());

        config.quality = 95;
        config.threads = 0;
        assert!(matches!(config.validate(), Err(ConvertError::Validation(_))));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.input_dir, PathBuf::from("cr3_images"));
        assert_eq!(config.output_dir, PathBuf::from("png_images"));
        assert_eq!(config.quality, 95);
        assert_eq!(config.threads, 4);
        assert!(config.optimize);
        assert!(!config.overwrite);
        assert!(!config.verbose);
        assert_eq!(config.log_file, Some(PathBuf::from("converter.log")));
    }

    #[test]
    fn test_output_path_must_not_be_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        std::fs::write(&file_path, b"x").unwrap();

        let config = Config {
            output_dir: file_path,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConvertError::OutputNotADirectory(_))));
    }
}
