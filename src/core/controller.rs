//! Block browser state: the block number being viewed, its transactions and
//! the selected transaction.
//!
//! The controller performs no I/O. It hands out [`FetchTicket`]s when a fetch
//! is needed and accepts completions tagged with them; completions for any
//! ticket other than the pending one are discarded.

use tracing::{debug, info, warn};

use crate::core::blocks::Record;
use crate::utils::error::ProviderError;

/// Tag attached to an in-flight transaction fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub key: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading { key: u64 },
    Loaded { key: u64, count: usize },
    Failed { key: Option<u64>, error: ProviderError },
}

#[derive(Debug)]
pub struct Controller {
    key: Option<u64>,
    records: Vec<Record>,
    selected: Option<usize>,
    status: FetchStatus,
    pending: Option<FetchTicket>,
    next_ticket: u64,
    mounted: bool,
    user_keyed: bool,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            key: None,
            records: Vec::new(),
            selected: None,
            status: FetchStatus::Idle,
            pending: None,
            next_ticket: 0,
            mounted: false,
            user_keyed: false,
        }
    }

    pub fn key(&self) -> Option<u64> {
        self.key
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Record> {
        self.selected.and_then(|idx| self.records.get(idx))
    }

    /// Parses user input into a block number. Anything that is not a
    /// non-negative integer (decimal or `0x` hex) becomes `None`.
    pub fn parse_key(input: &str) -> Option<u64> {
        let input = input.trim();
        match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => input.parse().ok(),
        }
    }

    pub fn set_key_input(&mut self, input: &str) -> Option<FetchTicket> {
        self.set_key(Self::parse_key(input))
    }

    /// Updates the key and returns the fetch to issue, if any.
    ///
    /// Re-entering the key that is already loading or loaded does nothing; a
    /// key whose last fetch failed is fetched again.
    pub fn set_key(&mut self, key: Option<u64>) -> Option<FetchTicket> {
        self.user_keyed = true;
        self.apply_key(key)
    }

    fn apply_key(&mut self, key: Option<u64>) -> Option<FetchTicket> {
        let Some(new_key) = key else {
            debug!(event = "key_cleared", message = "Block number cleared");
            self.key = None;
            self.pending = None;
            self.replace_records(Vec::new());
            self.status = FetchStatus::Idle;
            return None;
        };

        if self.key == Some(new_key) {
            match self.status {
                FetchStatus::Loading { key } | FetchStatus::Loaded { key, .. } if key == new_key => {
                    return None;
                }
                _ => {}
            }
        }

        self.key = Some(new_key);
        Some(self.issue(new_key))
    }

    /// Re-fetches the current key, even if it is already loaded.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.key.map(|key| self.issue(key))
    }

    /// True exactly once per session, when nothing has been requested yet and
    /// the latest block number should be looked up.
    pub fn on_mount(&mut self) -> bool {
        if self.mounted {
            return false;
        }
        self.mounted = true;
        self.key.is_none()
    }

    /// Applies the latest block number unless the user entered anything
    /// meanwhile, valid or not.
    pub fn resolve_default_key(
        &mut self,
        result: Result<u64, ProviderError>,
    ) -> Option<FetchTicket> {
        if self.key.is_some() || self.user_keyed {
            debug!(
                event = "default_key_ignored",
                message = "Block number already chosen, ignoring latest block"
            );
            return None;
        }
        match result {
            Ok(key) => self.apply_key(Some(key)),
            Err(error) => {
                warn!(
                    event = "default_key_error",
                    message = "Could not determine latest block",
                    error = %error
                );
                self.status = FetchStatus::Failed { key: None, error };
                None
            }
        }
    }

    /// Applies a finished fetch. Returns false when the result was stale.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Record>, ProviderError>,
    ) -> bool {
        if self.pending != Some(ticket) {
            debug!(
                event = "stale_fetch_discarded",
                message = "Discarding result for a superseded request",
                block_number = ticket.key,
                ticket = ticket.id
            );
            return false;
        }
        self.pending = None;

        match result {
            Ok(records) => {
                info!(
                    event = "transactions_loaded",
                    message = "Replaced transaction list",
                    block_number = ticket.key,
                    tx_count = records.len()
                );
                self.status = FetchStatus::Loaded {
                    key: ticket.key,
                    count: records.len(),
                };
                self.replace_records(records);
            }
            Err(error) => {
                warn!(
                    event = "transactions_error",
                    message = "Fetch failed, clearing transaction list",
                    block_number = ticket.key,
                    error = %error
                );
                self.status = FetchStatus::Failed {
                    key: Some(ticket.key),
                    error,
                };
                self.replace_records(Vec::new());
            }
        }
        true
    }

    /// Selects the record at `index` of the current list; out of range is a no-op.
    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.records.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Drops the selection, e.g. when the view shows none of the records.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Selects `record` if it belongs to the current list.
    pub fn select_record(&mut self, record: &Record) -> bool {
        match self.records.iter().position(|r| r == record) {
            Some(idx) => self.select_index(idx),
            None => false,
        }
    }

    fn issue(&mut self, key: u64) -> FetchTicket {
        self.next_ticket += 1;
        let ticket = FetchTicket {
            id: self.next_ticket,
            key,
        };
        self.pending = Some(ticket);
        self.status = FetchStatus::Loading { key };
        ticket
    }

    // A manual selection survives only if the same transaction is in the new
    // list; otherwise the first record is selected.
    fn replace_records(&mut self, records: Vec<Record>) {
        let previous_hash = self.selected().map(|r| r.hash);
        self.records = records;
        self.selected = previous_hash
            .and_then(|hash| self.records.iter().position(|r| r.hash == hash))
            .or(if self.records.is_empty() { None } else { Some(0) });
    }
}
