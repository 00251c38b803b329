//! # Conversion Task Module
//!
//! Unità di lavoro per un singolo file: decide se convertire o saltare e
//! delega la conversione al codec. Qualsiasi errore del codec diventa un
//! `ConversionOutcome::Failed`, così un file corrotto non interrompe il batch.
//!
//! Il controllo "destinazione esiste" non è atomico rispetto alla scrittura:
//! due worker sulla stessa destinazione non sono coordinati (vince l'ultimo).

use crate::codec::RawCodec;
use crate::config::Config;
use crate::converter::path_resolver::PathResolver;
use crate::file_manager::FileManager;
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Richiesta immutabile di conversione di un file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub quality: u8,
    pub optimize: bool,
    pub overwrite: bool,
}

impl ConversionRequest {
    /// Crea la richiesta per un RAW, derivando la destinazione
    pub fn new(source_path: PathBuf, output_dir: &Path, config: &Config) -> Result<Self> {
        let destination_path = PathResolver::destination_path(&source_path, output_dir)?;
        Ok(Self {
            source_path,
            destination_path,
            quality: config.quality,
            optimize: config.optimize,
            overwrite: config.overwrite,
        })
    }

    pub fn source_name(&self) -> String {
        FileManager::display_name(&self.source_path)
    }

    pub fn destination_name(&self) -> String {
        FileManager::display_name(&self.destination_path)
    }
}

/// Motivo per cui un file non è stato convertito
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Il PNG esiste già e `overwrite` è disattivo
    DestinationExists,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DestinationExists => write!(f, "exists"),
        }
    }
}

/// Esito di un singolo task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted {
        source_name: String,
        destination_name: String,
    },
    Skipped {
        source_name: String,
        reason: SkipReason,
    },
    Failed {
        source_name: String,
        error_message: String,
    },
}

impl ConversionOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Converted { source_name, .. }
            | Self::Skipped { source_name, .. }
            | Self::Failed { source_name, .. } => source_name,
        }
    }

    /// Short status tag used in logs and JSON events
    pub fn status(&self) -> &'static str {
        match self {
            Self::Converted { .. } => "converted",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Worker per la conversione di singoli file
pub struct ConversionTask<C: ?Sized> {
    codec: Arc<C>,
}

impl<C: RawCodec + ?Sized> ConversionTask<C> {
    pub fn new(codec: Arc<C>) -> Self {
        Self { codec }
    }

    /// Converte un file, oppure lo salta se il PNG esiste già
    pub async fn run(&self, request: ConversionRequest) -> ConversionOutcome {
        let source_name = request.source_name();

        if !request.overwrite && request.destination_path.exists() {
            debug!(
                "Skipping {}, output already exists: {}",
                source_name,
                request.destination_path.display()
            );
            return ConversionOutcome::Skipped {
                source_name,
                reason: SkipReason::DestinationExists,
            };
        }

        let result = self
            .codec
            .decode_and_encode(
                &request.source_path,
                &request.destination_path,
                request.quality,
                request.optimize,
            )
            .await;

        match result {
            Ok(()) => ConversionOutcome::Converted {
                source_name,
                destination_name: request.destination_name(),
            },
            Err(e) => ConversionOutcome::Failed {
                source_name,
                error_message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::MockCodec;
    use tempfile::TempDir;

    fn request(dir: &TempDir, name: &str, overwrite: bool) -> ConversionRequest {
        let source = dir.path().join(name);
        std::fs::write(&source, b"raw").unwrap();
        let config = Config {
            overwrite,
            ..Default::default()
        };
        ConversionRequest::new(source, dir.path(), &config).unwrap()
    }

    #[test]
    fn test_request_derives_destination() {
        let temp_dir = TempDir::new().unwrap();
        let req = request(&temp_dir, "IMG_1.CR3", false);
        assert_eq!(req.destination_path, temp_dir.path().join("IMG_1.png"));
        assert_eq!(req.quality, 95);
        assert!(req.optimize);
        assert!(!req.overwrite);
    }

    #[tokio::test]
    async fn test_converts_when_destination_missing() {
        let temp_dir = TempDir::new().unwrap();
        let codec = Arc::new(MockCodec::new());
        let task = ConversionTask::new(Arc::clone(&codec));

        let outcome = task.run(request(&temp_dir, "IMG_1.CR3", false)).await;

        assert_eq!(
            outcome,
            ConversionOutcome::Converted {
                source_name: "IMG_1.CR3".to_string(),
                destination_name: "IMG_1.png".to_string(),
            }
        );
        assert_eq!(codec.call_count(), 1);
        assert!(temp_dir.path().join("IMG_1.png").exists());
    }

    #[tokio::test]
    async fn test_skips_existing_destination_without_calling_codec() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("IMG_1.png"), b"old").unwrap();
        let codec = Arc::new(MockCodec::new());
        let task = ConversionTask::new(Arc::clone(&codec));

        let outcome = task.run(request(&temp_dir, "IMG_1.CR3", false)).await;

        assert_eq!(
            outcome,
            ConversionOutcome::Skipped {
                source_name: "IMG_1.CR3".to_string(),
                reason: SkipReason::DestinationExists,
            }
        );
        assert_eq!(codec.call_count(), 0);
    }

    #[tokio::test]
    async fn test_overwrite_reprocesses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("IMG_1.png"), b"old").unwrap();
        let codec = Arc::new(MockCodec::new());
        let task = ConversionTask::new(Arc::clone(&codec));

        let outcome = task.run(request(&temp_dir, "IMG_1.CR3", true)).await;

        assert_eq!(outcome.status(), "converted");
        assert_eq!(codec.call_count(), 1);
    }

    #[tokio::test]
    async fn test_codec_error_becomes_failed_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let codec = Arc::new(MockCodec::new().failing_on("bad.CR3"));
        let task = ConversionTask::new(codec);

        let outcome = task.run(request(&temp_dir, "bad.CR3", false)).await;

        match outcome {
            ConversionOutcome::Failed { source_name, error_message } => {
                assert_eq!(source_name, "bad.CR3");
                assert!(error_message.contains("corrupt RAW data"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::DestinationExists.to_string(), "exists");
    }
}
