//! # Batch Converter Main Orchestrator
//!
//! Orchestratore principale che delega responsabilità ai moduli
//! specializzati.
//!
//! ## Flusso di esecuzione:
//! 1. **Inizializzazione**: valida config, verifica directory input, crea output
//! 2. **File discovery**: trova i CR3 nella directory di input
//! 3. **Dependency check**: verifica che il codec sia utilizzabile
//! 4. **Parallel processing**: un task per file sul worker pool
//! 5. **Progress tracking**: log + progress bar per ogni esito
//! 6. **Result**: `RunStatus` con i conteggi, stampati dal chiamante

use crate::codec::RawCodec;
use crate::config::Config;
use crate::converter::{
    progress_tracker::ProgressTracker,
    scheduler::{RunStatus, Scheduler},
    task::ConversionRequest,
    RunSummary,
};
use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::json_output::JsonMessage;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Orchestratore del batch CR3 → PNG
pub struct BatchConverter<C: ?Sized> {
    config: Config,
    codec: Arc<C>,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl<C: RawCodec + ?Sized + 'static> BatchConverter<C> {
    /// Crea nuova istanza: valida la config e prepara le directory
    pub fn new(config: Config, codec: Arc<C>) -> Result<Self, ConvertError> {
        config.validate()?;
        let (input_dir, output_dir) = FileManager::prepare_directories(&config.input_dir, &config.output_dir)?;

        Ok(Self {
            config,
            codec,
            input_dir,
            output_dir,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Esegue il batch. Con `stop_receiver` il batch può essere interrotto.
    pub async fn run(&self, stop_receiver: Option<broadcast::Receiver<()>>) -> Result<RunStatus> {
        let start_time = Instant::now();

        let files = FileManager::find_raw_files(&self.input_dir)?;
        if files.is_empty() {
            warn!("No CR3 files found in {}", self.input_dir.display());
            let summary = RunSummary::default();
            if self.config.json_output {
                JsonMessage::complete(&summary, start_time.elapsed().as_secs_f64()).emit();
            }
            return Ok(RunStatus::Completed(summary));
        }

        info!("Found {} CR3 file(s) to process", files.len());
        self.log_configuration();

        self.codec.validate().await.map_err(ConvertError::from)?;

        let requests = files
            .into_iter()
            .map(|source| ConversionRequest::new(source, &self.output_dir, &self.config))
            .collect::<Result<Vec<_>>>()?;

        if self.config.json_output {
            JsonMessage::start(
                self.input_dir.clone(),
                self.output_dir.clone(),
                requests.len(),
                &self.config,
            )
            .emit();
        }

        let tracker = ProgressTracker::new(requests.len(), self.config.json_output);
        let mut scheduler = Scheduler::new(Arc::clone(&self.codec), self.config.threads)?;
        if let Some(stop_receiver) = stop_receiver {
            scheduler = scheduler.with_cancellation(stop_receiver);
        }

        let status = scheduler
            .run(requests, |outcome| tracker.handle_outcome(outcome))
            .await;

        let duration = start_time.elapsed().as_secs_f64();
        match status {
            RunStatus::Completed(ref summary) => {
                tracker.finish(summary);
                if self.config.json_output {
                    JsonMessage::complete(summary, duration).emit();
                }
            }
            RunStatus::Cancelled(ref summary) => {
                tracker.abandon(summary);
                if self.config.json_output {
                    JsonMessage::cancelled(summary, duration).emit();
                }
            }
        }

        info!("Batch finished in {:.2}s", duration);
        Ok(status)
    }

    /// Logga configurazione (solo se non JSON mode)
    fn log_configuration(&self) {
        if self.config.json_output {
            return;
        }

        info!("Codec: {}", self.codec.name());
        info!("Workers: {}", self.config.threads);
        if self.config.optimize {
            info!("PNG optimization: enabled (quality hint: {})", self.config.quality);
        } else {
            info!("PNG optimization: disabled");
        }
        if self.config.overwrite {
            info!("Overwrite mode: Will overwrite existing output files");
        } else {
            info!("Skip mode: Will skip files where output already exists");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::MockCodec;
    use tempfile::TempDir;

    fn config_for(input: &Path, output: &Path) -> Config {
        Config {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            json_output: true,
            log_file: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_converts_every_raw_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("cr3_images");
        let output = temp_dir.path().join("png_images");
        std::fs::create_dir(&input).unwrap();
        for name in ["a.CR3", "b.cr3", "notes.txt"] {
            std::fs::write(input.join(name), b"raw").unwrap();
        }

        let codec = Arc::new(MockCodec::new());
        let converter = BatchConverter::new(config_for(&input, &output), Arc::clone(&codec)).unwrap();
        let status = converter.run(None).await.unwrap();

        assert_eq!(
            status,
            RunStatus::Completed(RunSummary {
                successful: 2,
                skipped: 0,
                failed: 0,
            })
        );
        assert!(output.join("a.png").exists());
        assert!(output.join("b.png").exists());

        // Second pass finds every PNG in place
        let again = converter.run(None).await.unwrap();
        assert_eq!(again.summary().skipped, 2);
        assert_eq!(codec.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_directory_completes_with_zero_counts() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        std::fs::create_dir(&input).unwrap();

        let codec = Arc::new(MockCodec::new());
        let converter = BatchConverter::new(config_for(&input, &temp_dir.path().join("out")), Arc::clone(&codec)).unwrap();

        let status = converter.run(None).await.unwrap();
        assert_eq!(status, RunStatus::Completed(RunSummary::default()));
        assert_eq!(codec.call_count(), 0);
    }

    #[test]
    fn test_missing_input_directory_is_a_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir.path().join("missing"), &temp_dir.path().join("out"));

        let result = BatchConverter::new(config, Arc::new(MockCodec::new()));
        assert!(matches!(result, Err(ConvertError::InputNotFound(_))));
    }

    #[test]
    fn test_zero_threads_is_rejected_before_running() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            threads: 0,
            ..config_for(temp_dir.path(), &temp_dir.path().join("out"))
        };

        let result = BatchConverter::new(config, Arc::new(MockCodec::new()));
        assert!(matches!(result, Err(ConvertError::Validation(_))));
    }

    #[tokio::test]
    async fn test_works_through_a_trait_object() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("bad.CR3"), b"raw").unwrap();

        let codec: Arc<dyn RawCodec> = Arc::new(MockCodec::new().failing_on("bad.CR3"));
        let converter = BatchConverter::new(config_for(&input, &temp_dir.path().join("out")), codec).unwrap();

        let status = converter.run(None).await.unwrap();
        assert_eq!(status.summary().failed, 1);
    }
}
