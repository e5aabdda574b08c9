//! Transaction API endpoints

use api_types::transaction::{
    RecentQuery, TransactionListQuery, TransactionNew, TransactionPageResponse, TransactionUpdate,
    TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::MoneyCents;

use crate::{
    ServerError,
    server::ServerState,
    views::{kind_from_api, summary_view, transaction_view},
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const DEFAULT_RECENT_DAYS: u32 = 30;

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionPageResponse>, ServerError> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let filter = engine::TransactionFilter {
        from: query.start_date.map(|dt| dt.with_timezone(&Utc)),
        to: query.end_date.map(|dt| dt.with_timezone(&Utc)),
        category_id: query.category_id,
        kind: query.kind.map(kind_from_api),
        min_amount_minor: query
            .min_amount
            .map(MoneyCents::try_from_decimal)
            .transpose()?
            .map(MoneyCents::cents),
        max_amount_minor: query
            .max_amount
            .map(MoneyCents::try_from_decimal)
            .transpose()?
            .map(MoneyCents::cents),
    };

    let page = state
        .engine
        .list_transactions(user.id, &filter, engine::Page { skip, limit })
        .await?;

    // The engine has validated `limit >= 1` by the time we get here.
    let pages = page.total.div_ceil(limit);

    Ok(Json(TransactionPageResponse {
        items: page.items.into_iter().map(transaction_view).collect(),
        total: page.total,
        page: skip / limit + 1,
        size: limit,
        pages,
        summary: summary_view(page.summary),
    }))
}

pub async fn create(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let amount = MoneyCents::try_from_decimal(payload.amount)?;

    let tx = state
        .engine
        .create_transaction(
            user.id,
            engine::NewTransaction {
                amount_minor: amount.cents(),
                date: payload.date.with_timezone(&Utc),
                description: payload.description,
                kind: kind_from_api(payload.kind),
                category_id: payload.category_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn get(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(user.id, id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn update(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let amount_minor = payload
        .amount
        .map(MoneyCents::try_from_decimal)
        .transpose()?
        .map(MoneyCents::cents);

    let tx = state
        .engine
        .update_transaction(
            user.id,
            id,
            engine::TransactionPatch {
                amount_minor,
                date: payload.date.map(|dt| dt.with_timezone(&Utc)),
                description: payload.description,
                kind: payload.kind.map(kind_from_api),
                category_id: payload.category_id,
            },
        )
        .await?;

    Ok(Json(transaction_view(tx)))
}

pub async fn remove(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recent(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let days = query.days.unwrap_or(DEFAULT_RECENT_DAYS);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let txs = state
        .engine
        .recent_transactions(user.id, days, limit, Utc::now())
        .await?;

    Ok(Json(txs.into_iter().map(transaction_view).collect()))
}
