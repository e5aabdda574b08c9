//! Statistics API endpoints

use api_types::stats::{CategorySpending, RangeQuery, TransactionStats};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::MoneyCents;

use crate::{ServerError, server::ServerState, views::kind_to_api};

/// Aggregate totals over an optional date range, independent of pagination.
pub async fn stats(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<TransactionStats>, ServerError> {
    let stats = state
        .engine
        .transaction_stats(
            user.id,
            query.start_date.map(|dt| dt.with_timezone(&Utc)),
            query.end_date.map(|dt| dt.with_timezone(&Utc)),
        )
        .await?;

    Ok(Json(TransactionStats {
        total_income: MoneyCents::new(stats.income_minor).to_decimal(),
        total_expense: MoneyCents::new(stats.expense_minor).to_decimal(),
        net_balance: MoneyCents::new(stats.net_minor()).to_decimal(),
        transaction_count: stats.count,
        average_transaction: MoneyCents::new(stats.average_minor).to_decimal(),
    }))
}

/// Per-category rollup. Uncategorized transactions are not part of this
/// report.
pub async fn by_category(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<CategorySpending>>, ServerError> {
    let rollups = state
        .engine
        .spending_by_category(
            user.id,
            query.start_date.map(|dt| dt.with_timezone(&Utc)),
            query.end_date.map(|dt| dt.with_timezone(&Utc)),
        )
        .await?;

    Ok(Json(
        rollups
            .into_iter()
            .map(|rollup| CategorySpending {
                name: rollup.name,
                icon: rollup.icon,
                kind: kind_to_api(rollup.kind),
                total: MoneyCents::new(rollup.total_minor).to_decimal(),
                count: rollup.count,
            })
            .collect(),
    ))
}
