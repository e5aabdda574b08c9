//! Transaction operations: filtered listing, CRUD and aggregates.

use chrono::{DateTime, Utc};

use crate::{EngineError, ResultEngine, Transaction, TransactionKind};

mod list;
mod stats;
mod write;

/// Hard cap on page sizes and the recency limit. Requests outside the range
/// are rejected, never clamped.
pub const MAX_PAGE_SIZE: u64 = 200;
/// Upper bound of the recency window, in days.
pub const MAX_RECENT_DAYS: u32 = 365;

/// Filters for listing transactions.
///
/// Every field is an independent optional conjunct; absent fields impose no
/// constraint. Date and amount bounds are inclusive on both ends.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category_id: Option<i32>,
    pub kind: Option<TransactionKind>,
    pub min_amount_minor: Option<i64>,
    pub max_amount_minor: Option<i64>,
}

/// Offset pagination window. `limit` must be 1..=[`MAX_PAGE_SIZE`].
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

/// Totals over a filtered, unsliced transaction set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub income_minor: i64,
    pub expense_minor: i64,
    pub count: u64,
}

impl LedgerSummary {
    pub fn net_minor(&self) -> i64 {
        self.income_minor - self.expense_minor
    }
}

/// One page of transactions plus the pagination/summary data computed over
/// the whole filtered set.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total: u64,
    pub summary: LedgerSummary,
}

/// Aggregate statistics over a date range, pagination-independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerStats {
    pub income_minor: i64,
    pub expense_minor: i64,
    pub count: u64,
    /// Cent-rounded mean over income and expense amounts combined; zero when
    /// the range is empty.
    pub average_minor: i64,
}

impl LedgerStats {
    pub fn net_minor(&self) -> i64 {
        self.income_minor - self.expense_minor
    }
}

/// Per-category sum/count. Produced by an inner join, so uncategorized
/// transactions never show up here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryRollup {
    pub name: String,
    pub icon: String,
    pub kind: TransactionKind,
    pub total_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub kind: TransactionKind,
    pub category_id: Option<i32>,
}

/// Partial transaction update.
///
/// Plain `None` leaves a field unchanged. For the two clearable fields the
/// outer `Option` distinguishes "absent" from "set to null":
/// `Some(None)` clears the description / detaches the category.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub amount_minor: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Option<i32>>,
}

fn validate_filter(filter: &TransactionFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: start_date must be <= end_date".to_string(),
        ));
    }
    if let (Some(min), Some(max)) = (filter.min_amount_minor, filter.max_amount_minor)
        && min > max
    {
        return Err(EngineError::Validation(
            "invalid range: min_amount must be <= max_amount".to_string(),
        ));
    }
    Ok(())
}

fn validate_page(page: Page) -> ResultEngine<()> {
    if page.limit == 0 || page.limit > MAX_PAGE_SIZE {
        return Err(EngineError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

fn validate_amount_minor(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::Validation(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}
