//! # Converter Module
//!
//! Pipeline di conversione batch, separata in sottomoduli:
//! - `batch_converter`: Orchestratore principale
//! - `task`: Conversione (o skip) di un singolo file
//! - `scheduler`: Worker pool a concorrenza limitata
//! - `aggregator`: Conteggio seriale degli esiti
//! - `progress_tracker`: Progress bar, log ed eventi JSON per ogni esito
//! - `path_resolver`: Calcolo del path PNG di destinazione

pub mod aggregator;
pub mod batch_converter;
pub mod path_resolver;
pub mod progress_tracker;
pub mod scheduler;
pub mod task;

pub use aggregator::{ResultAggregator, RunSummary};
pub use batch_converter::BatchConverter;
pub use path_resolver::PathResolver;
pub use progress_tracker::ProgressTracker;
pub use scheduler::{RunStatus, Scheduler};
pub use task::{ConversionOutcome, ConversionRequest, ConversionTask, SkipReason};
