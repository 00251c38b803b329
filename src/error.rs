//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `ConvertError`: errori fatali prima dell'avvio (directory input mancante,
//!   configurazione invalida, nessun decoder RAW disponibile)
//! - `CodecError`: errori di un singolo file durante decode/encode/optimize.
//!   Non escono mai dal task: diventano un `ConversionOutcome::Failed`.
//!
//! ## Esempio:
//! ```rust,ignore
//! if !input_dir.is_dir() {
//!     return Err(ConvertError::InputNotADirectory(input_dir));
//! }
//! ```

use std::path::PathBuf;

/// Fatal errors raised before any conversion task runs
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Input directory does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {}", .0.display())]
    InputNotADirectory(PathBuf),

    #[error("Output path is not a directory: {}", .0.display())]
    OutputNotADirectory(PathBuf),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors of a single RAW → PNG conversion
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("RAW decode failed: {0}")]
    Decode(String),

    #[error("PNG optimization failed: {0}")]
    Optimize(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<CodecError> for ConvertError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::MissingDependency(tool) => ConvertError::MissingDependency(tool),
            CodecError::Io(e) => ConvertError::Io(e),
            other => ConvertError::Validation(other.to_string()),
        }
    }
}
