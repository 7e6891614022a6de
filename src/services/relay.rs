//! Result relay between the external search engine and the presentation layer.
//!
//! All producers write to one shared queue. Each `launchSearch` bumps the
//! [`SearchGeneration`]; batches carry the generation of the search that produced
//! them, and the relay drops anything older than the current generation. That
//! keeps the single-producer invariant without coordinating the producers:
//! a superseded search can keep writing, but nothing it writes reaches the UI.

use crate::metrics::SessionMetrics;
use crate::presentation::{PresentationEvent, Presenter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// One ordered group of matched entry identifiers, tagged with its search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBatch {
    pub generation: u64,
    pub entries: Vec<String>,
}

/// Monotonic id of the most recently launched search
#[derive(Debug, Clone, Default)]
pub struct SearchGeneration(Arc<AtomicU64>);

impl SearchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Start a new generation and return its id
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Result relay has shut down")]
pub struct RelayClosed;

/// Write handle a search engine uses to publish batches for one search
#[derive(Debug, Clone)]
pub struct BatchSink {
    generation: u64,
    current: SearchGeneration,
    batch_tx: mpsc::UnboundedSender<ResultBatch>,
}

impl BatchSink {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer search has started; engines should stop producing
    pub fn is_current(&self) -> bool {
        self.current.current() == self.generation
    }

    pub fn send(&self, entries: Vec<String>) -> Result<(), RelayClosed> {
        self.batch_tx
            .send(ResultBatch {
                generation: self.generation,
                entries,
            })
            .map_err(|_| RelayClosed)
    }
}

/// The external matching/indexing collaborator.
///
/// `start_search` must not block for the duration of the search: spawn the work
/// and publish batches through `sink` as they become available.
#[cfg_attr(test, mockall::automock)]
pub trait SearchEngine: Send + Sync {
    fn start_search(&self, query: &str, sink: BatchSink);
}

/// Engine used when no matcher is attached; produces nothing
#[derive(Debug, Default)]
pub struct NoopSearchEngine;

impl SearchEngine for NoopSearchEngine {
    fn start_search(&self, query: &str, _sink: BatchSink) {
        tracing::warn!("No search engine attached - ignoring query of {} chars", query.len());
    }
}

/// Producer side of the shared results queue
#[derive(Debug, Clone)]
pub struct ResultQueue {
    generation: SearchGeneration,
    batch_tx: mpsc::UnboundedSender<ResultBatch>,
}

impl ResultQueue {
    /// Create the queue and the receiver the relay worker consumes
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ResultBatch>) {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        (
            Self {
                generation: SearchGeneration::new(),
                batch_tx,
            },
            batch_rx,
        )
    }

    pub fn generation(&self) -> &SearchGeneration {
        &self.generation
    }

    /// Supersede any in-flight search and hand out a sink for the next one
    pub fn begin_search(&self) -> BatchSink {
        let generation = self.generation.advance();
        BatchSink {
            generation,
            current: self.generation.clone(),
            batch_tx: self.batch_tx.clone(),
        }
    }
}

/// Forwards result batches to the presenter in receipt order
pub struct ResultRelay {
    presenter: Arc<dyn Presenter>,
    generation: SearchGeneration,
    metrics: Arc<SessionMetrics>,
}

impl ResultRelay {
    pub fn new(
        presenter: Arc<dyn Presenter>,
        generation: SearchGeneration,
        metrics: Arc<SessionMetrics>,
    ) -> Self {
        Self {
            presenter,
            generation,
            metrics,
        }
    }

    /// Forward one batch; returns false when it was stale and dropped
    pub fn forward(&self, batch: ResultBatch) -> bool {
        if batch.generation < self.generation.current() {
            tracing::debug!(
                "Dropping stale batch from search {} ({} entries)",
                batch.generation,
                batch.entries.len()
            );
            self.metrics.record_stale_batch();
            return false;
        }

        self.presenter
            .emit(PresentationEvent::SearchResult(batch.entries));
        self.metrics.record_batch_relayed();
        true
    }

    /// Drain `batch_rx` until the channel closes or shutdown is signalled
    pub async fn run(
        self,
        mut batch_rx: mpsc::UnboundedReceiver<ResultBatch>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        tracing::debug!("Result relay started");

        loop {
            tokio::select! {
                biased;

                _ = super::shutdown_requested(&mut shutdown_rx) => {
                    tracing::debug!("Result relay received shutdown signal");
                    break;
                }
                batch = batch_rx.recv() => {
                    match batch {
                        Some(batch) => {
                            self.forward(batch);
                        }
                        None => {
                            tracing::debug!("Result queue closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!("Result relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{ChannelPresenter, PresenterCommand};

    fn relay_with_presenter() -> (
        ResultRelay,
        ResultQueue,
        mpsc::UnboundedReceiver<PresenterCommand>,
    ) {
        let (presenter, command_rx) = ChannelPresenter::new();
        let (queue, _batch_rx) = ResultQueue::new();
        let relay = ResultRelay::new(
            Arc::new(presenter),
            queue.generation().clone(),
            Arc::new(SessionMetrics::new()),
        );
        (relay, queue, command_rx)
    }

    #[test]
    fn test_generation_advances() {
        let generation = SearchGeneration::new();
        assert_eq!(generation.current(), 0);
        assert_eq!(generation.advance(), 1);
        assert_eq!(generation.advance(), 2);
        assert_eq!(generation.current(), 2);
    }

    #[test]
    fn test_sink_goes_stale_after_new_search() {
        let (queue, _rx) = ResultQueue::new();
        let first = queue.begin_search();
        assert!(first.is_current());

        let second = queue.begin_search();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn test_forward_current_batch() {
        let (relay, queue, mut command_rx) = relay_with_presenter();
        let sink = queue.begin_search();

        assert!(relay.forward(ResultBatch {
            generation: sink.generation(),
            entries: vec!["a".into()],
        }));
        assert_eq!(
            command_rx.try_recv().unwrap(),
            PresenterCommand::Event {
                event: PresentationEvent::SearchResult(vec!["a".into()])
            }
        );
    }

    #[test]
    fn test_forward_drops_stale_batch() {
        let (relay, queue, mut command_rx) = relay_with_presenter();
        let old = queue.begin_search();
        queue.begin_search();

        assert!(!relay.forward(ResultBatch {
            generation: old.generation(),
            entries: vec!["late".into()],
        }));
        assert!(command_rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_relay_dropped() {
        let (queue, rx) = ResultQueue::new();
        let sink = queue.begin_search();
        drop(rx);
        assert_eq!(sink.send(vec![]), Err(RelayClosed));
    }
}
