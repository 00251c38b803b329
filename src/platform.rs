//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform dei tool esterni
//! usati dal codec (decoder RAW e ottimizzatori PNG).
//!
//! ## Strategia di risoluzione:
//! 1. Directory indicata da `RAW2PNG_TOOLS_DIR` (tool bundled)
//! 2. `PATH` di sistema
//!
//! Il controllo delle dipendenze e la conversione usano la stessa
//! risoluzione: un tool è disponibile solo se `get_tool_path` lo trova.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "RAW2PNG_TOOLS_DIR";

/// RAW decoders in order of preference
pub const RAW_DECODERS: &[&str] = &["darktable-cli", "rawtherapee-cli", "magick"];

/// PNG optimizers in order of preference
pub const PNG_OPTIMIZERS: &[&str] = &["oxipng", "optipng", "pngcrush"];

/// Platform-specific command manager with tool resolution
#[derive(Debug, Clone)]
pub struct PlatformCommands {
    commands: HashMap<&'static str, String>,
    search_dirs: Vec<PathBuf>,
}

impl PlatformCommands {
    /// Bundled tools dir from `RAW2PNG_TOOLS_DIR`, then `PATH`
    pub fn from_env() -> Self {
        let tools_dir = env::var_os(TOOLS_DIR_ENV)
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        debug!("Bundled tools directory: {:?}", tools_dir);

        Self::with_tools_dir(tools_dir)
    }

    /// Explicit bundled tools dir, then `PATH`
    pub fn with_tools_dir(tools_dir: Option<PathBuf>) -> Self {
        let path_dirs = env::var_os("PATH")
            .map(|path_var| env::split_paths(&path_var).collect::<Vec<_>>())
            .unwrap_or_default();

        Self::with_search_dirs(tools_dir.into_iter().chain(path_dirs).collect())
    }

    /// Looks tools up only in `search_dirs`, in order
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        let commands = RAW_DECODERS
            .iter()
            .chain(PNG_OPTIMIZERS)
            .map(|tool| (*tool, format!("{}{}", tool, extension)))
            .collect();

        Self { commands, search_dirs }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&'a self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).map(String::as_str).unwrap_or(base_name)
    }

    /// Resolve a tool to an executable path
    pub fn get_tool_path(&self, base_name: &str) -> Option<PathBuf> {
        let command_name = self.get_command(base_name);

        let found = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(command_name))
            .find(|candidate| Self::is_executable(candidate));

        if let Some(ref path) = found {
            debug!("Resolved tool: {} -> {:?}", base_name, path);
        }
        found
    }

    #[cfg(unix)]
    fn is_executable(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_executable(path: &Path) -> bool {
        path.is_file()
    }

    /// Check if a command is available on the system or bundled
    pub fn is_command_available(&self, base_name: &str) -> bool {
        self.get_tool_path(base_name).is_some()
    }

    /// Names of the available tools among `candidates`
    pub fn available_tools(&self, candidates: &[&'static str]) -> Vec<&'static str> {
        candidates
            .iter()
            .copied()
            .filter(|tool| self.is_command_available(tool))
            .collect()
    }
}

impl Default for PlatformCommands {
    fn default() -> Self {
        Self::from_env()
    }
}
