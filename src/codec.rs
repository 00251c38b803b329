//! # Codec Capability
//!
//! Interfaccia verso la capacità esterna di decode RAW + encode PNG.
//! Il batch non sa come un RAW viene demosaicizzato: chiama solo
//! `decode_and_encode` e interpreta il risultato.

use crate::error::CodecError;
use async_trait::async_trait;
use std::path::Path;

/// A codec that turns one RAW file into one PNG file.
#[async_trait]
pub trait RawCodec: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Decodes `source` with the default post-processing and writes a PNG to
    /// `destination`. With `optimize` the PNG is re-saved losslessly; `quality`
    /// only tunes the optimizer's effort.
    async fn decode_and_encode(
        &self,
        source: &Path,
        destination: &Path,
        quality: u8,
        optimize: bool,
    ) -> Result<(), CodecError>;

    /// Checks that the codec is usable before the batch starts.
    async fn validate(&self) -> Result<(), CodecError> {
        Ok(())
    }
}
