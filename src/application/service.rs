use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::domain::{normalize, summarize, Entry, LedgerContents, LedgerSummary, Summary};
use crate::storage::{LedgerConfig, LedgerStore};

use super::{AppError, CategoryReport};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, prompt, reports).
pub struct LedgerService {
    store: LedgerStore,
}

impl LedgerService {
    /// Create a new ledger service with the given store.
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Open the ledger described by `config`. Nothing is touched on disk.
    pub fn open(config: LedgerConfig) -> Self {
        Self::new(LedgerStore::new(config))
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.store.path()
    }

    /// Create the ledger file (with its header) if it doesn't exist yet.
    pub fn init(&self) -> Result<(), AppError> {
        Ok(self.store.ensure_ready()?)
    }

    // ========================
    // Write path
    // ========================

    /// Validate raw input and append it to the ledger.
    /// Invalid input is rejected before the ledger is opened.
    pub fn record_expense(
        &self,
        raw_date: &str,
        raw_amount: &str,
        raw_category: &str,
        raw_note: &str,
    ) -> Result<Entry, AppError> {
        let entry = normalize(raw_date, raw_amount, raw_category, raw_note)?;
        self.store.append(&entry)?;
        Ok(entry)
    }

    // ========================
    // Read path
    // ========================

    /// All entries in ledger order, or `Missing` if the ledger was never created.
    pub fn entries(&self) -> Result<LedgerContents, AppError> {
        Ok(self.store.read_all()?)
    }

    pub fn summary(&self) -> Result<Summary, AppError> {
        Ok(summarize(self.store.read_all()?))
    }

    /// Category spending breakdown alongside the summary it was built from.
    /// `None` when there is no ledger yet.
    pub fn spending_report(&self) -> Result<Option<(LedgerSummary, CategoryReport)>, AppError> {
        Ok(match self.summary()? {
            Summary::NothingToSummarize => None,
            Summary::Ready(summary) => {
                let report = CategoryReport::from_summary(&summary);
                Some((summary, report))
            }
        })
    }

    pub fn last_updated(&self) -> Result<Option<DateTime<Local>>, AppError> {
        Ok(self.store.last_modified()?)
    }
}
