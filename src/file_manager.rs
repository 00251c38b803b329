//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery dei RAW.
//!
//! ## Responsabilità:
//! - Discovery non ricorsiva dei file CR3 nella directory di input
//! - Riconoscimento estensione case-insensitive (solo estensione, non il nome)
//! - Validazione directory input e creazione directory output (`mkdir -p`)
//! - Formattazione human-readable delle dimensioni
//!
//! ## Esempio:
//! ```rust,ignore
//! let (input_dir, output_dir) = FileManager::prepare_directories(&input, &output)?;
//! let files = FileManager::find_raw_files(&input_dir)?;
//! ```

use crate::error::ConvertError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of Canon RAW files, compared ignoring ASCII case
pub const RAW_EXTENSION: &str = "cr3";

/// Extension of converted files
pub const PNG_EXTENSION: &str = "png";

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Validate the input directory and create the output directory.
    ///
    /// Returns both paths in absolute form.
    pub fn prepare_directories(input_dir: &Path, output_dir: &Path) -> Result<(PathBuf, PathBuf), ConvertError> {
        if !input_dir.exists() {
            return Err(ConvertError::InputNotFound(input_dir.to_path_buf()));
        }
        if !input_dir.is_dir() {
            return Err(ConvertError::InputNotADirectory(input_dir.to_path_buf()));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ConvertError::OutputNotADirectory(output_dir.to_path_buf()));
        }
        std::fs::create_dir_all(output_dir)?;

        Ok((input_dir.canonicalize()?, output_dir.canonicalize()?))
    }

    /// Find all RAW files directly inside a directory (no recursion)
    pub fn find_raw_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && Self::is_raw(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Check if a file is a Canon RAW file
    pub fn is_raw(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(RAW_EXTENSION))
            .unwrap_or(false)
    }

    /// Name of the file for logs and outcomes
    pub fn display_name(path: &Path) -> String {
        path.file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
