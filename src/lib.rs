//! # CR3 to PNG Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione e validazione parametri
//! - `error`: Tipi di errore (fatali e per singolo file)
//! - `logging`: Costruzione del subscriber `tracing`
//! - `file_manager`: Discovery dei CR3 e preparazione directory
//! - `codec`: Interfaccia `RawCodec` verso la conversione RAW → PNG
//! - `raw_processor`: Codec di produzione basato su tool esterni
//! - `platform`: Risoluzione dei tool esterni
//! - `converter`: Pipeline batch (task, scheduler, aggregazione)
//! - `progress`: Progress bar
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use cr3_to_png::{BatchConverter, Config, RawProcessor};
//!
//! let converter = BatchConverter::new(Config::default(), Arc::new(RawProcessor::new()))?;
//! let status = converter.run(None).await?;
//! println!("{}", status.summary().format_summary());
//! ```

pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod logging;
pub mod platform;
pub mod progress;
pub mod raw_processor;

pub use codec::RawCodec;
pub use config::Config;
pub use converter::{BatchConverter, ConversionOutcome, RunStatus, RunSummary};
pub use error::{CodecError, ConvertError};
pub use raw_processor::RawProcessor;
