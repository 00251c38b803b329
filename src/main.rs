//! # CR3 to PNG Converter - Main Entry Point
//!
//! Punto di ingresso dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging (stderr + `converter.log`)
//! - Gestione di Ctrl-C: stop del dispatch, attesa dei task in volo;
//!   un secondo Ctrl-C termina subito il processo
//! - Stampa del riepilogo e scelta dell'exit code
//!
//! ## Exit code:
//! - `0`: batch completato, anche se alcuni file sono falliti
//! - `1`: directory di input invalida, errore inatteso o interruzione utente
//!
//! ## Esempio di utilizzo:
//! ```bash
//! cr3-to-png -i ./cr3_images -o ./png_images --threads 8 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use cr3_to_png::{
    json_output::JsonMessage, logging, BatchConverter, Config, ConvertError, RawProcessor, RunStatus, RunSummary,
};

#[derive(Parser)]
#[command(name = "cr3-to-png")]
#[command(about = "Convert Canon RAW (CR3) files to PNG format")]
struct Args {
    /// Input directory containing CR3 files
    #[arg(short, long, default_value = "cr3_images")]
    input: PathBuf,

    /// Output directory for PNG files
    #[arg(short, long, default_value = "png_images")]
    output: PathBuf,

    /// Output quality (1-100), tunes PNG optimization effort
    #[arg(short, long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Number of threads to use for parallel processing
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Disable PNG optimization (faster but larger files)
    #[arg(long)]
    no_optimize: bool,

    /// Overwrite existing output files
    #[arg(long)]
    overwrite: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log file (appended on every run)
    #[arg(long, default_value = "converter.log")]
    log_file: PathBuf,

    /// Output progress and status as JSON lines on stdout
    #[arg(long)]
    json: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input_dir: args.input,
            output_dir: args.output,
            quality: args.quality,
            threads: args.threads,
            optimize: !args.no_optimize,
            overwrite: args.overwrite,
            verbose: args.verbose,
            json_output: args.json,
            log_file: Some(args.log_file),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from(Args::parse());
    let json_output = config.json_output;

    if !json_output {
        print_banner();
    }

    let subscriber = match logging::build_subscriber(config.verbose, config.log_file.as_deref()) {
        Ok(subscriber) => subscriber,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(status) => report(status, json_output),
        Err(e) => {
            match e.downcast_ref::<ConvertError>() {
                Some(config_error) => error!("{}", config_error),
                None => error!("An unexpected error occurred: {:?}", e),
            }
            if json_output {
                JsonMessage::error(e.to_string(), Some(format!("{:#}", e))).emit();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<RunStatus> {
    let converter = BatchConverter::new(config, Arc::new(RawProcessor::new()))?;
    info!("Input directory: {}", converter.input_dir().display());
    info!("Output directory: {}", converter.output_dir().display());

    let (stop_sender, stop_receiver) = broadcast::channel(1);
    let interrupts = futures::stream::unfold((), |()| async {
        tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
    });
    tokio::spawn(async move {
        if forward_interrupts(Box::pin(interrupts), stop_sender).await {
            warn!("Second interrupt received, exiting without waiting for running conversions");
            std::process::exit(1);
        }
    });

    converter.run(Some(stop_receiver)).await
}

/// Turns the first interrupt into a stop request.
///
/// Returns `true` when a second interrupt arrives while the batch drains.
async fn forward_interrupts<S>(mut interrupts: S, stop_sender: broadcast::Sender<()>) -> bool
where
    S: Stream<Item = ()> + Unpin,
{
    if interrupts.next().await.is_none() {
        return false;
    }

    info!("Interrupt received, finishing in-flight conversions (Ctrl-C again to abort)...");
    let _ = stop_sender.send(());

    interrupts.next().await.is_some()
}

/// Failed files do not fail the run; a cancellation does
fn exit_code_for(status: &RunStatus) -> u8 {
    match status {
        RunStatus::Completed(_) => 0,
        RunStatus::Cancelled(_) => 1,
    }
}

fn report(status: RunStatus, json_output: bool) -> ExitCode {
    let code = ExitCode::from(exit_code_for(&status));
    match status {
        RunStatus::Completed(summary) => {
            if !json_output && summary.total() > 0 {
                print_summary(&summary);
            }
            if summary.failed > 0 {
                warn!("Some files failed to convert. Check the log for details.");
            }
            info!("Conversion complete!");
            code
        }
        RunStatus::Cancelled(summary) => {
            // Partial counts go to the log only, no summary on stdout
            info!("Conversion cancelled by user.");
            info!("Before cancellation: {}", summary.format_summary());
            code
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!("\nConversion Summary:");
    println!("  - Successful: {}", summary.successful);
    println!("  - Skipped: {}", summary.skipped);
    println!("  - Failed: {}", summary.failed);
}

fn print_banner() {
    println!(
        r"
  ____  ____  _____   _          ____  _   _  ____
 / ___||  _ \|___ /  | |_ ___   |  _ \| \ | |/ ___|
| |    | |_) | |_ \  | __/ _ \  | |_) |  \| | |  _
| |___ |  _ < ___) | | || (_) | |  __/| |\  | |_| |
 \____||_| \_\____/   \__\___/  |_|   |_| \_|\____|
"
    );
    println!("CR3 to PNG Converter v{}\n", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = Config::from(Args::try_parse_from(["cr3-to-png"]).unwrap());

        assert_eq!(config.input_dir, PathBuf::from("cr3_images"));
        assert_eq!(config.output_dir, PathBuf::from("png_images"));
        assert_eq!(config.quality, 95);
        assert_eq!(config.threads, 4);
        assert!(config.optimize);
        assert!(!config.overwrite);
        assert!(!config.verbose);
        assert!(!config.json_output);
        assert_eq!(config.log_file, Some(PathBuf::from("converter.log")));
    }

    #[test]
    fn test_cli_flags_map_onto_config() {
        let args = Args::try_parse_from([
            "cr3-to-png", "-i", "raw", "-o", "out", "-q", "80", "-t", "8", "--no-optimize", "--overwrite", "-v",
        ])
        .unwrap();
        let config = Config::from(args);

        assert_eq!(config.input_dir, PathBuf::from("raw"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.quality, 80);
        assert_eq!(config.threads, 8);
        assert!(!config.optimize);
        assert!(config.overwrite);
        assert!(config.verbose);
    }

    #[test]
    fn test_cli_rejects_out_of_range_quality() {
        assert!(Args::try_parse_from(["cr3-to-png", "-q", "0"]).is_err());
        assert!(Args::try_parse_from(["cr3-to-png", "-q", "101"]).is_err());
        assert!(Args::try_parse_from(["cr3-to-png", "-q", "1"]).is_ok());
        assert!(Args::try_parse_from(["cr3-to-png", "-q", "100"]).is_ok());
    }

    #[test]
    fn test_zero_threads_parse_but_fail_validation() {
        let config = Config::from(Args::try_parse_from(["cr3-to-png", "-t", "0"]).unwrap());
        assert!(config.validate().is_err());
        assert!(Args::try_parse_from(["cr3-to-png", "-t", "-1"]).is_err());
    }

    #[test]
    fn test_completed_run_with_failures_exits_zero() {
        let status = RunStatus::Completed(RunSummary {
            successful: 3,
            skipped: 1,
            failed: 2,
        });
        assert_eq!(exit_code_for(&status), 0);
        assert_eq!(exit_code_for(&RunStatus::Completed(RunSummary::default())), 0);
    }

    #[test]
    fn test_cancelled_run_exits_one() {
        let status = RunStatus::Cancelled(RunSummary {
            successful: 1,
            skipped: 0,
            failed: 0,
        });
        assert_eq!(exit_code_for(&status), 1);
    }

    #[tokio::test]
    async fn test_first_interrupt_requests_stop() {
        let (stop_sender, mut stop_receiver) = broadcast::channel(1);

        let aborted = forward_interrupts(futures::stream::iter([()]), stop_sender).await;

        assert!(!aborted);
        assert!(stop_receiver.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_second_interrupt_aborts() {
        let (stop_sender, mut stop_receiver) = broadcast::channel(1);

        let aborted = forward_interrupts(futures::stream::iter([(), ()]), stop_sender).await;

        assert!(aborted);
        assert!(stop_receiver.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_no_interrupt_sends_nothing() {
        let (stop_sender, mut stop_receiver) = broadcast::channel(1);

        let aborted = forward_interrupts(futures::stream::empty(), stop_sender).await;

        assert!(!aborted);
        assert!(stop_receiver.try_recv().is_err());
    }
}
