use sea_orm::{
    ConnectionTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, TransactionTrait, prelude::*, sea_query::Alias,
};

use crate::{ResultEngine, Transaction, TransactionKind, categories, transactions};

use super::super::{Engine, with_tx};
use super::{
    LedgerSummary, Page, TransactionFilter, TransactionPage, validate_filter, validate_page,
};

pub(super) trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::Date.lte(to));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(min) = filter.min_amount_minor {
            self = self.filter(transactions::Column::AmountMinor.gte(min));
        }
        if let Some(max) = filter.max_amount_minor {
            self = self.filter(transactions::Column::AmountMinor.lte(max));
        }
        self
    }
}

#[derive(Debug, FromQueryResult)]
struct KindTotalsRow {
    kind: String,
    total_minor: i64,
    count: i64,
}

/// Sum/count per kind over whatever `query` selects. One grouped statement,
/// cast so the sum stays integral on every backend.
pub(super) async fn kind_totals<C: ConnectionTrait>(
    query: Select<transactions::Entity>,
    db: &C,
) -> ResultEngine<LedgerSummary> {
    let rows = query
        .select_only()
        .column(transactions::Column::Kind)
        .column_as(
            transactions::Column::AmountMinor
                .sum()
                .cast_as(Alias::new("BIGINT")),
            "total_minor",
        )
        .column_as(transactions::Column::Id.count(), "count")
        .group_by(transactions::Column::Kind)
        .into_model::<KindTotalsRow>()
        .all(db)
        .await?;

    let mut summary = LedgerSummary::default();
    for row in rows {
        match TransactionKind::try_from(row.kind.as_str())? {
            TransactionKind::Income => summary.income_minor = row.total_minor,
            TransactionKind::Expense => summary.expense_minor = row.total_minor,
        }
        summary.count += row.count as u64;
    }
    Ok(summary)
}

impl Engine {
    /// Lists the caller's transactions, filtered and paginated.
    ///
    /// Ordering is `date DESC, id DESC` so pages are stable. `total` and
    /// `summary` are computed over the whole filtered set, not the returned
    /// slice, inside the same database transaction as the page read.
    pub async fn list_transactions(
        &self,
        user_id: i32,
        filter: &TransactionFilter,
        page: Page,
    ) -> ResultEngine<TransactionPage> {
        validate_filter(filter)?;
        validate_page(page)?;

        with_tx!(self, |db_tx| {
            let scoped = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .apply_tx_filters(filter);

            let total = scoped.clone().count(&db_tx).await?;
            let summary = kind_totals(scoped.clone(), &db_tx).await?;

            let rows: Vec<(transactions::Model, Option<categories::Model>)> = scoped
                .find_also_related(categories::Entity)
                .order_by_desc(transactions::Column::Date)
                .order_by_desc(transactions::Column::Id)
                .offset(page.skip)
                .limit(page.limit)
                .all(&db_tx)
                .await?;

            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                items.push(Transaction::try_from(row)?);
            }

            Ok(TransactionPage {
                items,
                total,
                summary,
            })
        })
    }

    /// Point lookup, enriched with category display fields. Foreign-owned
    /// rows look absent.
    pub async fn transaction(&self, user_id: i32, id: i32) -> ResultEngine<Transaction> {
        let row = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(|| crate::EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(row)
    }
}
