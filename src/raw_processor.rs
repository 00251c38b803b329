//! # RAW Processing Module
//!
//! Questo modulo implementa il codec di produzione: converte un CR3 in PNG
//! orchestrando tool esterni, senza decodifica RAW in-process.
//!
//! ## Pipeline di conversione
//!
//! 1. **Work dir**: directory temporanea nascosta dentro la directory di output
//! 2. **Decode**: primo decoder RAW disponibile (demosaic di default del tool)
//! 3. **Optimize** (opzionale): ottimizzazione PNG lossless
//! 4. **Rename**: il PNG finale viene spostato sulla destinazione
//!
//! Se un passo fallisce la work dir viene rimossa: sulla destinazione non
//! resta mai un PNG parziale.
//!
//! ## Strategia Tool Selection
//!
//! ### Decode (Priorità decrescente):
//! 1. **darktable-cli**: libreria in-memory e config dir privata per ogni run,
//!    così più worker possono girare in parallelo
//! 2. **rawtherapee-cli**: output PNG (`-n`) con profilo di default
//! 3. **magick**: ImageMagick con delegate RAW (libraw)
//!
//! ### PNG (Priorità decrescente):
//! 1. **oxipng**: livello `-o 0..6` derivato dalla qualità
//! 2. **optipng**: livello `-o0..7` derivato dalla qualità
//! 3. **pngcrush**: `-brute` per qualità ≥ 90
//! 4. **Fallback**: re-encode in-process con il crate `image`
//!
//! ## Qualità
//!
//! Il PNG è lossless: `quality` non altera i pixel, regola solo lo sforzo
//! dell'ottimizzatore (più alta = più lento, file più piccolo).

use crate::codec::RawCodec;
use crate::error::CodecError;
use crate::file_manager::FileManager;
use crate::platform::{PlatformCommands, PNG_OPTIMIZERS, RAW_DECODERS};
use async_trait::async_trait;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

type ArgsBuilder = fn(&Path, &Path, u8) -> Vec<OsString>;

/// Outcome of walking a tool chain
enum ToolRun {
    Succeeded(&'static str),
    NoneAvailable,
}

/// Production codec backed by external RAW decoders and PNG optimizers.
#[derive(Debug, Clone)]
pub struct RawProcessor {
    platform: Arc<PlatformCommands>,
}

impl Default for RawProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RawProcessor {
    /// Resolves tools from `RAW2PNG_TOOLS_DIR` and `PATH`
    pub fn new() -> Self {
        Self::with_platform(Arc::new(PlatformCommands::from_env()))
    }

    pub fn with_platform(platform: Arc<PlatformCommands>) -> Self {
        Self { platform }
    }

    /// Decodes a RAW file into a PNG using the first decoder that succeeds.
    async fn decode_raw(&self, input: &Path, output: &Path) -> Result<&'static str, CodecError> {
        let tools: &[(&'static str, ArgsBuilder)] = &[
            ("darktable-cli", |input, output, _quality| {
                let work_dir = output.parent().unwrap_or(Path::new("."));
                vec![
                    input.into(),
                    output.into(),
                    "--core".into(),
                    "--configdir".into(),
                    work_dir.join("darktable").into(),
                    "--library".into(),
                    ":memory:".into(),
                ]
            }),
            ("rawtherapee-cli", |input, output, _quality| {
                vec![
                    "-o".into(),
                    output.into(),
                    "-n".into(),
                    "-Y".into(),
                    "-c".into(),
                    input.into(),
                ]
            }),
            ("magick", |input, output, _quality| vec![input.into(), output.into()]),
        ];

        match self.try_tools(input, output, 0, tools, "RAW decode", CodecError::Decode).await? {
            ToolRun::Succeeded(tool) => Ok(tool),
            ToolRun::NoneAvailable => Err(CodecError::MissingDependency(format!(
                "no RAW decoder available, install one of: {}",
                RAW_DECODERS.join(", ")
            ))),
        }
    }

    /// Re-saves a PNG losslessly, falling back to the built-in encoder.
    async fn optimize_png(&self, input: &Path, output: &Path, quality: u8) -> Result<&'static str, CodecError> {
        let tools: &[(&'static str, ArgsBuilder)] = &[
            ("oxipng", |input, output, quality| {
                vec![
                    "-o".into(),
                    optimization_level(quality, 6).to_string().into(),
                    "--strip".into(),
                    "safe".into(),
                    "--out".into(),
                    output.into(),
                    input.into(),
                ]
            }),
            ("optipng", |input, output, quality| {
                vec![
                    format!("-o{}", optimization_level(quality, 7)).into(),
                    "-quiet".into(),
                    "-out".into(),
                    output.into(),
                    input.into(),
                ]
            }),
            ("pngcrush", |input, output, quality| {
                let mut args: Vec<OsString> = vec!["-q".into(), "-reduce".into()];
                if quality >= 90 {
                    args.push("-brute".into());
                }
                args.push(input.into());
                args.push(output.into());
                args
            }),
        ];

        match self.try_tools(input, output, quality, tools, "PNG optimization", CodecError::Optimize).await? {
            ToolRun::Succeeded(tool) => Ok(tool),
            ToolRun::NoneAvailable => {
                debug!("No PNG optimizer installed, re-encoding {} in-process", input.display());
                reencode_png(input, output, quality).await?;
                Ok("image")
            }
        }
    }

    /// Tries each available tool in order until one produces `output`.
    async fn try_tools(
        &self,
        input: &Path,
        output: &Path,
        quality: u8,
        tools: &[(&'static str, ArgsBuilder)],
        stage: &str,
        to_error: fn(String) -> CodecError,
    ) -> Result<ToolRun, CodecError> {
        let mut last_failure = None;

        for (tool_name, args_builder) in tools {
            let Some(tool_path) = self.platform.get_tool_path(tool_name) else {
                continue;
            };

            let args = args_builder(input, output, quality);
            debug!("{} with {:?} {:?}", stage, tool_path, args);

            // Leftovers of a failed tool must not pass for this tool's output
            match tokio::fs::remove_file(output).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }

            let start_time = std::time::Instant::now();
            let mut command = Command::new(&tool_path);
            command.args(&args).stdin(Stdio::null());
            // Keep tools out of the terminal's process group: Ctrl-C must not
            // kill conversions that are already running.
            #[cfg(unix)]
            command.process_group(0);

            let result = match command.output().await {
                Ok(result) => result,
                Err(e) => {
                    let message = format!("{} could not be started: {}", tool_name, e);
                    warn!("{} failed, trying next tool: {}", stage, message);
                    last_failure = Some(message);
                    continue;
                }
            };
            let elapsed = start_time.elapsed();

            if result.status.success() && output.is_file() {
                debug!("{} succeeded with {} in {:?}", stage, tool_name, elapsed);
                return Ok(ToolRun::Succeeded(*tool_name));
            }

            let message = tool_failure_message(tool_name, result.status, &result.stderr);
            warn!("{} failed with {} after {:?}, trying next tool: {}", stage, tool_name, elapsed, message);
            last_failure = Some(message);
        }

        match last_failure {
            Some(message) => Err(to_error(format!("{} of {} failed: {}", stage, input.display(), message))),
            None => Ok(ToolRun::NoneAvailable),
        }
    }
}

#[async_trait]
impl RawCodec for RawProcessor {
    fn name(&self) -> &str {
        "external-tools"
    }

    async fn decode_and_encode(
        &self,
        source: &Path,
        destination: &Path,
        quality: u8,
        optimize: bool,
    ) -> Result<(), CodecError> {
        if !source.is_file() {
            return Err(CodecError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source file not found: {}", source.display()),
            )));
        }

        let output_dir = destination
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let work_dir = tempfile::Builder::new()
            .prefix(".cr3-to-png-")
            .tempdir_in(output_dir)?;

        let stem = source.file_stem().unwrap_or_default().to_string_lossy();
        let decoded: PathBuf = work_dir.path().join(format!("{}.png", stem));
        let decoder = self.decode_raw(source, &decoded).await?;
        debug!("Decoded {} with {}", FileManager::display_name(source), decoder);

        let final_png = if optimize {
            let optimized = work_dir.path().join(format!("{}.optimized.png", stem));
            let optimizer = self.optimize_png(&decoded, &optimized, quality).await?;
            debug!("Optimized {} with {}", FileManager::display_name(source), optimizer);
            optimized
        } else {
            decoded
        };

        tokio::fs::rename(&final_png, destination).await?;

        if let Ok(metadata) = tokio::fs::metadata(destination).await {
            debug!(
                "Wrote {} ({})",
                destination.display(),
                FileManager::format_size(metadata.len())
            );
        }

        Ok(())
    }

    async fn validate(&self) -> Result<(), CodecError> {
        info!("🔧 Checking RAW conversion tool dependencies...");

        let decoders = self.platform.available_tools(RAW_DECODERS);
        if decoders.is_empty() {
            return Err(CodecError::MissingDependency(format!(
                "no RAW decoder available, install one of: {}",
                RAW_DECODERS.join(", ")
            )));
        }
        info!("✅ RAW decoders: {}", decoders.join(", "));

        let optimizers = self.platform.available_tools(PNG_OPTIMIZERS);
        if optimizers.is_empty() {
            warn!(
                "⚠️ No PNG optimizer found ({}), the built-in encoder will be used",
                PNG_OPTIMIZERS.join("/")
            );
        } else {
            info!("✅ PNG optimizers: {}", optimizers.join(", "));
        }

        Ok(())
    }
}

/// Maps a 1-100 quality hint onto an optimizer level `0..=max_level`.
pub fn optimization_level(quality: u8, max_level: u8) -> u8 {
    let quality = u32::from(quality.clamp(1, 100));
    ((quality - 1) * u32::from(max_level) / 99) as u8
}

/// Compression effort of the built-in PNG encoder for a quality hint.
pub fn compression_for_quality(quality: u8) -> CompressionType {
    match quality {
        90..=u8::MAX => CompressionType::Best,
        50..=89 => CompressionType::Default,
        _ => CompressionType::Fast,
    }
}

/// Re-encodes a PNG with the `image` crate (lossless).
pub async fn reencode_png(input: &Path, output: &Path, quality: u8) -> Result<(), CodecError> {
    let input = input.to_path_buf();
    let output = output.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), CodecError> {
        let img = image::open(&input)?;
        let writer = std::io::BufWriter::new(std::fs::File::create(&output)?);
        let encoder = PngEncoder::new_with_quality(
            writer,
            compression_for_quality(quality),
            FilterType::Adaptive,
        );
        encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
        Ok(())
    })
    .await?
}

fn tool_failure_message(tool_name: &str, status: std::process::ExitStatus, stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    match stderr.lines().map(str::trim).filter(|line| !line.is_empty()).last() {
        Some(line) => format!("{} exited with {}: {}", tool_name, status, line),
        None => format!("{} exited with {}", tool_name, status),
    }
}
