use std::collections::HashMap;

use super::{Cents, Entry};

/// Per-category spending, keyed by the exact (case-sensitive) category label.
pub type CategoryTotals = HashMap<String, Cents>;

/// What was found when reading the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerContents {
    /// No ledger file exists yet.
    Missing,
    /// The ledger exists; the entries are in append order and may be empty.
    Entries(Vec<Entry>),
}

impl LedgerContents {
    pub fn is_missing(&self) -> bool {
        matches!(self, LedgerContents::Missing)
    }

    pub fn entries(&self) -> Option<&[Entry]> {
        match self {
            LedgerContents::Missing => None,
            LedgerContents::Entries(entries) => Some(entries),
        }
    }
}

/// Result of folding the ledger for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The ledger does not exist, so there is nothing to report on.
    NothingToSummarize,
    Ready(LedgerSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Entries in ledger order, unmodified.
    pub entries: Vec<Entry>,
    pub totals: CategoryTotals,
}

impl LedgerSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every category total.
    pub fn grand_total(&self) -> Cents {
        self.totals
            .values()
            .fold(0, |total: Cents, amount| total.saturating_add(*amount))
    }

    /// The last `n` entries in ledger order.
    pub fn recent(&self, n: usize) -> &[Entry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

/// Sum amounts per category in a single pass. Repeated categories accumulate;
/// categories with no entries do not appear.
///
/// Entry amounts are capped at [`MAX_AMOUNT_CENTS`](super::MAX_AMOUNT_CENTS),
/// so sums stay exact for any realistic ledger; past `i64::MAX` they saturate
/// instead of wrapping.
pub fn compute_category_totals(entries: &[Entry]) -> CategoryTotals {
    let mut totals: CategoryTotals = HashMap::new();

    for entry in entries {
        let total = totals.entry(entry.category.clone()).or_insert(0);
        *total = total.saturating_add(entry.amount_cents);
    }

    totals
}

/// Build the display list and category totals from the ledger contents.
pub fn summarize(contents: LedgerContents) -> Summary {
    match contents {
        LedgerContents::Missing => Summary::NothingToSummarize,
        LedgerContents::Entries(entries) => {
            let totals = compute_category_totals(&entries);
            Summary::Ready(LedgerSummary { entries, totals })
        }
    }
}
