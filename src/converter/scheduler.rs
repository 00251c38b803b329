//! # Scheduler Module
//!
//! Worker pool a concorrenza limitata.
//!
//! ## Gestione concorrenza:
//! - Un semaforo con `concurrency` permessi limita i task in volo
//! - Ogni task gira sul runtime multi-thread di tokio e invia il proprio
//!   esito su un canale mpsc
//! - Il coordinatore è l'unico consumatore del canale: aggiorna il
//!   `ResultAggregator` e chiama il callback di completamento, un esito alla
//!   volta e nell'ordine di completamento
//!
//! ## Cancellazione:
//! - Il segnale di stop (`broadcast::Receiver<()>`) viene controllato prima di
//!   ogni dispatch
//! - Dopo lo stop nessun nuovo task parte; quelli in volo terminano
//!   normalmente (nessun kill forzato) e il run restituisce
//!   `RunStatus::Cancelled` con i conteggi parziali

use crate::codec::RawCodec;
use crate::converter::aggregator::{ResultAggregator, RunSummary};
use crate::converter::task::{ConversionOutcome, ConversionRequest, ConversionTask};
use crate::error::ConvertError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// How a batch run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every request produced an outcome
    Completed(RunSummary),
    /// Stopped by the user; counts cover only the tasks that ran
    Cancelled(RunSummary),
}

impl RunStatus {
    pub fn summary(&self) -> RunSummary {
        match self {
            RunStatus::Completed(summary) | RunStatus::Cancelled(summary) => *summary,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunStatus::Cancelled(_))
    }
}

enum StopSignal {
    Stop,
    Closed,
}

/// Bounded-concurrency executor for conversion tasks
pub struct Scheduler<C: ?Sized> {
    task: Arc<ConversionTask<C>>,
    concurrency: usize,
    stop_receiver: Option<broadcast::Receiver<()>>,
}

impl<C: RawCodec + ?Sized + 'static> Scheduler<C> {
    /// Crea uno scheduler con `concurrency` worker (deve essere ≥ 1)
    pub fn new(codec: Arc<C>, concurrency: usize) -> Result<Self, ConvertError> {
        if concurrency == 0 {
            return Err(ConvertError::Validation(
                "Number of threads must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            task: Arc::new(ConversionTask::new(codec)),
            concurrency,
            stop_receiver: None,
        })
    }

    /// Abilita la cancellazione tramite canale broadcast
    pub fn with_cancellation(mut self, stop_receiver: broadcast::Receiver<()>) -> Self {
        self.stop_receiver = Some(stop_receiver);
        self
    }

    /// Esegue tutte le richieste e attende la fine dei task avviati.
    ///
    /// `on_complete` viene chiamato una volta per ogni esito, sul task
    /// coordinatore.
    pub async fn run<F>(self, requests: Vec<ConversionRequest>, mut on_complete: F) -> RunStatus
    where
        F: FnMut(&ConversionOutcome),
    {
        let Scheduler {
            task,
            concurrency,
            stop_receiver: mut stop,
        } = self;

        let mut aggregator = ResultAggregator::new();
        if requests.is_empty() {
            return RunStatus::Completed(aggregator.finalize());
        }

        debug!("Scheduling {} conversions on {} workers", requests.len(), concurrency);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let mut pending = requests.into_iter();
        let mut next_request = pending.next();
        let mut in_flight = 0usize;
        let mut stop_armed = stop.is_some();
        let mut cancelled = false;

        loop {
            let dispatching = next_request.is_some() && !cancelled;
            if !dispatching && in_flight == 0 {
                break;
            }

            tokio::select! {
                biased;

                signal = wait_for_stop(&mut stop), if stop_armed && !cancelled => match signal {
                    StopSignal::Stop => {
                        info!("Stop requested, waiting for {} in-flight conversion(s)", in_flight);
                        cancelled = true;
                    }
                    StopSignal::Closed => stop_armed = false,
                },

                Some(outcome) = outcome_rx.recv(), if in_flight > 0 => {
                    in_flight -= 1;
                    aggregator.record(&outcome);
                    on_complete(&outcome);
                }

                Ok(permit) = Arc::clone(&semaphore).acquire_owned(), if dispatching => {
                    if let Some(request) = next_request.take() {
                        spawn_task(&task, request, permit, outcome_tx.clone());
                        in_flight += 1;
                        next_request = pending.next();
                    }
                }

                else => break,
            }
        }

        let summary = aggregator.finalize();
        if cancelled {
            RunStatus::Cancelled(summary)
        } else {
            RunStatus::Completed(summary)
        }
    }
}

fn spawn_task<C: RawCodec + ?Sized + 'static>(
    task: &Arc<ConversionTask<C>>,
    request: ConversionRequest,
    permit: OwnedSemaphorePermit,
    outcome_tx: mpsc::UnboundedSender<ConversionOutcome>,
) {
    let task = Arc::clone(task);

    tokio::spawn(async move {
        let source_name = request.source_name();
        debug!("Starting conversion of {}", source_name);

        let outcome = match AssertUnwindSafe(task.run(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => ConversionOutcome::Failed {
                source_name,
                error_message: format!("conversion panicked: {}", panic_message(payload.as_ref())),
            },
        };

        // The coordinator only stops listening once nothing is in flight
        let _ = outcome_tx.send(outcome);
        drop(permit);
    });
}

async fn wait_for_stop(receiver: &mut Option<broadcast::Receiver<()>>) -> StopSignal {
    match receiver {
        Some(receiver) => match receiver.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => StopSignal::Stop,
            Err(RecvError::Closed) => StopSignal::Closed,
        },
        None => std::future::pending().await,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
