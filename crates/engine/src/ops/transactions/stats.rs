use chrono::{DateTime, Utc};
use sea_orm::{
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Alias,
};

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, categories, transactions};

use super::super::{Engine, with_tx};
use super::list::{ApplyTxFilters, kind_totals};
use super::{
    CategoryRollup, LedgerStats, MAX_PAGE_SIZE, MAX_RECENT_DAYS, TransactionFilter,
    validate_filter,
};

#[derive(Debug, FromQueryResult)]
struct RollupRow {
    name: String,
    icon: String,
    kind: String,
    total_minor: i64,
    count: i64,
}

/// Mean in cents, rounded half up. Totals here are never negative.
fn mean_minor(total_minor: i64, count: u64) -> i64 {
    if count == 0 {
        return 0;
    }
    let count = count as i64;
    (total_minor + count / 2) / count
}

impl Engine {
    /// Aggregate statistics over an optional date range, independent of any
    /// pagination.
    pub async fn transaction_stats(
        &self,
        user_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<LedgerStats> {
        let filter = TransactionFilter {
            from,
            to,
            ..Default::default()
        };
        validate_filter(&filter)?;

        with_tx!(self, |db_tx| {
            let scoped = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .apply_tx_filters(&filter);
            let summary = kind_totals(scoped, &db_tx).await?;

            Ok(LedgerStats {
                income_minor: summary.income_minor,
                expense_minor: summary.expense_minor,
                count: summary.count,
                average_minor: mean_minor(
                    summary.income_minor + summary.expense_minor,
                    summary.count,
                ),
            })
        })
    }

    /// Per-category sums and counts over an optional date range.
    ///
    /// Inner join: transactions without a category are not reported. Groups
    /// come back name-ordered.
    pub async fn spending_by_category(
        &self,
        user_id: i32,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<CategoryRollup>> {
        let filter = TransactionFilter {
            from,
            to,
            ..Default::default()
        };
        validate_filter(&filter)?;

        with_tx!(self, |db_tx| {
            let rows = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .apply_tx_filters(&filter)
                .join(JoinType::InnerJoin, transactions::Relation::Category.def())
                .select_only()
                .column_as(categories::Column::Name, "name")
                .column_as(categories::Column::Icon, "icon")
                .column(transactions::Column::Kind)
                .column_as(
                    transactions::Column::AmountMinor
                        .sum()
                        .cast_as(Alias::new("BIGINT")),
                    "total_minor",
                )
                .column_as(transactions::Column::Id.count(), "count")
                .group_by(categories::Column::Name)
                .group_by(categories::Column::Icon)
                .group_by(transactions::Column::Kind)
                .order_by_asc(categories::Column::Name)
                .into_model::<RollupRow>()
                .all(&db_tx)
                .await?;

            rows.into_iter()
                .map(|row| {
                    Ok(CategoryRollup {
                        name: row.name,
                        icon: row.icon,
                        kind: TransactionKind::try_from(row.kind.as_str())?,
                        total_minor: row.total_minor,
                        count: row.count as u64,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Transactions dated within `[now - days, now]`, newest first, capped at
    /// `limit`.
    pub async fn recent_transactions(
        &self,
        user_id: i32,
        days: u32,
        limit: u64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Transaction>> {
        if days == 0 || days > MAX_RECENT_DAYS {
            return Err(EngineError::Validation(format!(
                "days must be between 1 and {MAX_RECENT_DAYS}"
            )));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(EngineError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let start = now - chrono::Duration::days(i64::from(days));
        let rows: Vec<(transactions::Model, Option<categories::Model>)> =
            transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Date.gte(start))
                .filter(transactions::Column::Date.lte(now))
                .find_also_related(categories::Entity)
                .order_by_desc(transactions::Column::Date)
                .order_by_desc(transactions::Column::Id)
                .limit(limit)
                .all(&self.database)
                .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::mean_minor;

    #[test]
    fn mean_rounds_half_up_in_cents() {
        assert_eq!(mean_minor(0, 0), 0);
        assert_eq!(mean_minor(100_000, 1), 100_000);
        assert_eq!(mean_minor(125_000, 2), 62_500);
        // 1000.00 + 250.00 over 3 rows: 416.666... rounds to 416.67
        assert_eq!(mean_minor(125_000, 3), 41_667);
    }
}
