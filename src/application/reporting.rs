use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, LedgerSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub categories: Vec<CategorySummary>,
    pub total: Cents,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: usize,
    pub percentage: f64,
}

impl CategoryReport {
    /// Build the per-category breakdown, largest spend first.
    pub fn from_summary(summary: &LedgerSummary) -> Self {
        let total = summary.grand_total();

        let mut categories: Vec<CategorySummary> = summary
            .totals
            .iter()
            .map(|(category, &category_total)| CategorySummary {
                category: category.clone(),
                total: category_total,
                count: summary
                    .entries
                    .iter()
                    .filter(|entry| &entry.category == category)
                    .count(),
                percentage: if total > 0 {
                    (category_total as f64 / total as f64) * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));

        // Ledger order is append order, so the span needs min/max
        let from_date = summary.entries.iter().map(|entry| entry.date).min();
        let to_date = summary.entries.iter().map(|entry| entry.date).max();

        Self {
            from_date,
            to_date,
            categories,
            total,
            entry_count: summary.entries.len(),
        }
    }
}
