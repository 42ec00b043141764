mod blocks;
mod controller;
mod detail;
mod grid;
mod metrics;
mod provider;

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::utils::error::ProviderError;

pub use blocks::{records_from_block, Record};
pub use controller::{Controller, FetchStatus, FetchTicket};
pub use detail::render_record;
pub use grid::{Column, GridRow, GridView, SortOrder};
pub use metrics::MetricsCollector;
pub use provider::{DataProvider, Web3Provider};

/// A finished provider call, delivered back to the thread that owns the
/// [`Controller`].
#[derive(Debug)]
pub enum FetchOutcome {
    DefaultKey(Result<u64, ProviderError>),
    Children {
        ticket: FetchTicket,
        started: Instant,
        result: Result<Vec<Record>, ProviderError>,
    },
}

/// Runs provider calls on the tokio runtime and feeds their results into the
/// controller. All state changes happen in [`Browser::poll_outcomes`] or
/// [`Browser::next_outcome`], on the caller's thread.
pub struct Browser {
    controller: Controller,
    provider: Arc<dyn DataProvider>,
    metrics: MetricsCollector,
    outcomes_tx: UnboundedSender<FetchOutcome>,
    outcomes_rx: UnboundedReceiver<FetchOutcome>,
    last_updated: Option<DateTime<Local>>,
}

impl Browser {
    pub fn new(provider: Arc<dyn DataProvider>, metrics: MetricsCollector) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        Self {
            controller: Controller::new(),
            provider,
            metrics,
            outcomes_tx,
            outcomes_rx,
            last_updated: None,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// Session start. Uses `start_block` when given, otherwise asks the
    /// provider for the latest block (once).
    pub fn mount(&mut self, start_block: Option<u64>) {
        if start_block.is_some() {
            self.set_key(start_block);
        }
        if self.controller.on_mount() {
            info!(
                event = "default_block_requested",
                message = "No block chosen, looking up the latest one"
            );
            self.spawn_default_key();
        }
    }

    pub fn set_key(&mut self, key: Option<u64>) {
        if let Some(ticket) = self.controller.set_key(key) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn set_key_input(&mut self, input: &str) {
        if let Some(ticket) = self.controller.set_key_input(input) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(ticket) = self.controller.refresh() {
            self.spawn_fetch(ticket);
        }
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        self.controller.select_index(index)
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    pub fn select_record(&mut self, record: &Record) -> bool {
        self.controller.select_record(record)
    }

    /// Applies every outcome that has already arrived without waiting.
    /// Returns how many changed the controller.
    pub fn poll_outcomes(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.outcomes_rx.try_recv() {
                Ok(outcome) => {
                    if self.apply(outcome) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Waits for the next outcome and applies it. Returns false for a stale one.
    pub async fn next_outcome(&mut self) -> bool {
        match self.outcomes_rx.recv().await {
            Some(outcome) => self.apply(outcome),
            None => false,
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome {
            FetchOutcome::DefaultKey(result) => {
                if let Err(e) = &result {
                    self.metrics.record_failure(e);
                }
                if let Some(ticket) = self.controller.resolve_default_key(result) {
                    self.spawn_fetch(ticket);
                }
                true
            }
            FetchOutcome::Children {
                ticket,
                started,
                result,
            } => {
                let summary = result.as_ref().map(Vec::len).map_err(Clone::clone);
                if !self.controller.complete_fetch(ticket, result) {
                    self.metrics.record_stale();
                    return false;
                }
                match summary {
                    Ok(count) => {
                        self.metrics.record_block(ticket.key, count, started);
                        self.last_updated = Some(Local::now());
                    }
                    Err(e) => self.metrics.record_failure(&e),
                }
                true
            }
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        debug!(
            event = "fetch_spawned",
            message = "Requesting block transactions",
            block_number = ticket.key,
            ticket = ticket.id
        );
        self.metrics.record_fetch_started();

        let provider = Arc::clone(&self.provider);
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = provider.children_for_key(ticket.key).await;
            // Receiver gone means the session ended.
            let _ = outcomes.send(FetchOutcome::Children {
                ticket,
                started,
                result,
            });
        });
    }

    fn spawn_default_key(&self) {
        let provider = Arc::clone(&self.provider);
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = provider.current_key().await;
            let _ = outcomes.send(FetchOutcome::DefaultKey(result));
        });
    }
}
