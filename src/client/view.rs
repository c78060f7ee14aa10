//! Rendering layer for fetched records.
//!
//! A `RecordView` starts one fetch when it is mounted and owns the slot the
//! records land in. Until the fetch resolves the slot is empty; on failure
//! it stays empty and the error goes to the log, never to the rendered output.

use crate::client::{DataClient, FetchHandle};
use crate::config::OutputFormat;
use crate::error::ClientResult;
use crate::format::{format_as_json, format_as_table};
use crate::models::Record;
use futures_util::FutureExt;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// Fetch issued, no outcome yet
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug)]
pub struct RecordView {
    records: Vec<Record>,
    status: ViewStatus,
    pending: Option<FetchHandle>,
}

impl RecordView {
    /// Mount the view, issuing its single fetch. Returns immediately.
    pub fn mount(client: &DataClient) -> Self {
        Self::with_handle(client.fetch_all())
    }

    /// Mount the view around a fetch that was already started.
    pub fn with_handle(handle: FetchHandle) -> Self {
        Self {
            records: Vec::new(),
            status: ViewStatus::Loading,
            pending: Some(handle),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    /// Wait for the fetch and apply its outcome. No-op once settled.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            let outcome = handle.await;
            self.apply(outcome);
        }
    }

    /// Apply the outcome if the fetch has already finished, without waiting.
    ///
    /// Returns true when the view is settled.
    pub fn try_settle(&mut self) -> bool {
        let Some(handle) = self.pending.as_mut() else {
            return true;
        };
        match handle.now_or_never() {
            Some(outcome) => {
                self.pending = None;
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Store a fetch outcome in the slot.
    pub fn apply(&mut self, outcome: ClientResult<Vec<Record>>) {
        match outcome {
            Ok(records) => {
                info!(rows = records.len(), "Records loaded");
                self.records = records;
                self.status = ViewStatus::Loaded;
            }
            Err(e) => {
                error!(error = %e, "Failed to load records");
                self.records.clear();
                self.status = ViewStatus::Failed;
            }
        }
    }

    /// Render the current slot. An unresolved or failed fetch renders as empty.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => format_as_table(&self.records),
            OutputFormat::Json => format_as_json(&self.records),
        }
    }
}
