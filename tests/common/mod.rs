// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use spendlog::application::LedgerService;
use spendlog::domain::{Entry, LedgerContents};
use spendlog::storage::{LedgerConfig, LedgerStore};
use tempfile::TempDir;

/// Helper to create a test service backed by a ledger in a temporary directory.
/// Nothing is written until the first call that needs the file.
pub fn test_service() -> (LedgerService, TempDir) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let service = LedgerService::open(ledger_config(&temp_dir));
    (service, temp_dir)
}

/// Helper to create a bare store in a temporary directory.
pub fn test_store() -> (LedgerStore, TempDir) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let store = LedgerStore::new(ledger_config(&temp_dir));
    (store, temp_dir)
}

pub fn ledger_config(temp_dir: &TempDir) -> LedgerConfig {
    LedgerConfig::in_dir(temp_dir.path().join("data"))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Unwrap ledger contents that are expected to exist.
pub fn expect_entries(contents: LedgerContents) -> Vec<Entry> {
    match contents {
        LedgerContents::Entries(entries) => entries,
        LedgerContents::Missing => panic!("expected an initialized ledger"),
    }
}

/// Test fixture: a small month of spending
pub struct SampleExpenses;

impl SampleExpenses {
    pub const ROWS: [(&'static str, &'static str, &'static str, &'static str); 5] = [
        ("2025-12-01", "100", "food", "groceries"),
        ("2025-12-03", "50.50", "food", ""),
        ("2025-12-03", "20", "transit", "metro card"),
        ("2025/12/05", "15.255", "coffee", ""),
        ("2025-12-07", "0", "gift", "free sample"),
    ];

    pub fn record_all(service: &LedgerService) -> Result<Vec<Entry>> {
        Self::ROWS
            .iter()
            .map(|(date, amount, category, note)| {
                Ok(service.record_expense(date, amount, category, note)?)
            })
            .collect()
    }
}
