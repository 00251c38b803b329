//! # Path Resolution Module
//!
//! Calcola il path PNG di destinazione: stesso stem del RAW, estensione
//! `.png`, nella directory di output. Nessuna struttura di sottocartelle.

use crate::file_manager::PNG_EXTENSION;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Calcola il path di destinazione per un file RAW
    pub fn destination_path(source: &Path, output_dir: &Path) -> Result<PathBuf> {
        let file_stem = source
            .file_stem()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", source.display()))?;

        let mut file_name = file_stem.to_os_string();
        file_name.push(".");
        file_name.push(PNG_EXTENSION);

        Ok(output_dir.join(file_name))
    }
}
