use chrono::{DateTime, Duration, Utc};
use sea_orm::Database;

use engine::{
    Engine, EngineError, NewCategory, NewTransaction, NewUser, Page, TransactionFilter,
    TransactionKind, TransactionPatch, User,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build()
}

async fn register(engine: &Engine, username: &str) -> User {
    engine
        .register_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "a-long-password".to_string(),
        })
        .await
        .unwrap()
}

fn date(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn no_filter() -> TransactionFilter {
    TransactionFilter::default()
}

fn page(skip: u64, limit: u64) -> Page {
    Page { skip, limit }
}

/// Seeds the canonical two-transaction ledger: a 1000.00 salary income at D1
/// and a 250.00 groceries expense at D2 (later than D1). Returns
/// `(user, salary_category_id, groceries_category_id, income_tx_id,
/// expense_tx_id)`.
async fn seed_ledger(engine: &Engine) -> (User, i32, i32, i32, i32) {
    let user = register(engine, "alice").await;

    let salary = engine
        .create_category(
            user.id,
            NewCategory {
                name: "Salary".to_string(),
                kind: TransactionKind::Income,
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let groceries = engine
        .create_category(
            user.id,
            NewCategory {
                name: "Groceries".to_string(),
                kind: TransactionKind::Expense,
                icon: Some("🛒".to_string()),
                color: Some("#FF9800".to_string()),
            },
        )
        .await
        .unwrap();

    let income = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 100_000,
                date: date("2026-01-10T12:00:00Z"),
                description: Some("January pay".to_string()),
                kind: TransactionKind::Income,
                category_id: Some(salary.id),
            },
        )
        .await
        .unwrap();
    let expense = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 25_000,
                date: date("2026-02-15T09:30:00Z"),
                description: None,
                kind: TransactionKind::Expense,
                category_id: Some(groceries.id),
            },
        )
        .await
        .unwrap();

    (user, salary.id, groceries.id, income.id, expense.id)
}

#[tokio::test]
async fn listing_is_newest_first_with_totals_and_summary() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, expense_id) = seed_ledger(&engine).await;

    let result = engine
        .list_transactions(user.id, &no_filter(), page(0, 50))
        .await
        .unwrap();

    assert_eq!(result.total, 2);
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].id, expense_id);
    assert_eq!(result.items[1].id, income_id);

    assert_eq!(result.summary.income_minor, 100_000);
    assert_eq!(result.summary.expense_minor, 25_000);
    assert_eq!(result.summary.net_minor(), 75_000);
    assert_eq!(result.summary.count, 2);
}

#[tokio::test]
async fn listing_enriches_with_category_display_fields() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, expense_id) = seed_ledger(&engine).await;

    let result = engine
        .list_transactions(user.id, &no_filter(), page(0, 50))
        .await
        .unwrap();

    let expense = result.items.iter().find(|tx| tx.id == expense_id).unwrap();
    assert_eq!(expense.category_name.as_deref(), Some("Groceries"));
    assert_eq!(expense.category_icon.as_deref(), Some("🛒"));

    let income = result.items.iter().find(|tx| tx.id == income_id).unwrap();
    assert_eq!(income.category_name.as_deref(), Some("Salary"));
    assert_eq!(income.category_icon.as_deref(), Some("💰"));
}

#[tokio::test]
async fn pagination_slices_preserve_total_and_summary() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, expense_id) = seed_ledger(&engine).await;

    let first = engine
        .list_transactions(user.id, &no_filter(), page(0, 1))
        .await
        .unwrap();
    assert_eq!(first.total, 2);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].id, expense_id);
    assert_eq!(first.summary.count, 2);
    assert_eq!(first.summary.net_minor(), 75_000);

    let second = engine
        .list_transactions(user.id, &no_filter(), page(1, 1))
        .await
        .unwrap();
    assert_eq!(second.total, 2);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, income_id);

    let past_the_end = engine
        .list_transactions(user.id, &no_filter(), page(2, 1))
        .await
        .unwrap();
    assert_eq!(past_the_end.total, 2);
    assert!(past_the_end.items.is_empty());
}

#[tokio::test]
async fn concatenated_pages_reproduce_the_filtered_set() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;

    let base = date("2026-03-01T00:00:00Z");
    for i in 0..7 {
        engine
            .create_transaction(
                user.id,
                NewTransaction {
                    amount_minor: 1_000 + i,
                    date: base + Duration::days(i),
                    description: None,
                    kind: TransactionKind::Expense,
                    category_id: None,
                },
            )
            .await
            .unwrap();
    }

    let mut collected = Vec::new();
    let mut skip = 0;
    loop {
        let result = engine
            .list_transactions(user.id, &no_filter(), page(skip, 3))
            .await
            .unwrap();
        assert_eq!(result.total, 7);
        if result.items.is_empty() {
            break;
        }
        collected.extend(result.items.into_iter().map(|tx| tx.id));
        skip += 3;
    }

    assert_eq!(collected.len(), 7);
    let mut deduped = collected.clone();
    deduped.dedup();
    assert_eq!(deduped, collected);

    let full = engine
        .list_transactions(user.id, &no_filter(), page(0, 50))
        .await
        .unwrap();
    let full_ids: Vec<i32> = full.items.into_iter().map(|tx| tx.id).collect();
    assert_eq!(collected, full_ids);
}

#[tokio::test]
async fn filters_constrain_the_listing() {
    let engine = engine_with_db().await;
    let (user, _, groceries_id, income_id, expense_id) = seed_ledger(&engine).await;

    let by_kind = engine
        .list_transactions(
            user.id,
            &TransactionFilter {
                kind: Some(TransactionKind::Income),
                ..Default::default()
            },
            page(0, 50),
        )
        .await
        .unwrap();
    assert_eq!(by_kind.total, 1);
    assert_eq!(by_kind.items[0].id, income_id);
    assert_eq!(by_kind.summary.expense_minor, 0);

    let by_category = engine
        .list_transactions(
            user.id,
            &TransactionFilter {
                category_id: Some(groceries_id),
                ..Default::default()
            },
            page(0, 50),
        )
        .await
        .unwrap();
    assert_eq!(by_category.total, 1);
    assert_eq!(by_category.items[0].id, expense_id);

    let by_date = engine
        .list_transactions(
            user.id,
            &TransactionFilter {
                from: Some(date("2026-02-01T00:00:00Z")),
                to: Some(date("2026-02-28T23:59:59Z")),
                ..Default::default()
            },
            page(0, 50),
        )
        .await
        .unwrap();
    assert_eq!(by_date.total, 1);
    assert_eq!(by_date.items[0].id, expense_id);

    let by_amount = engine
        .list_transactions(
            user.id,
            &TransactionFilter {
                min_amount_minor: Some(50_000),
                ..Default::default()
            },
            page(0, 50),
        )
        .await
        .unwrap();
    assert_eq!(by_amount.total, 1);
    assert_eq!(by_amount.items[0].id, income_id);
}

#[tokio::test]
async fn date_bounds_are_inclusive() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, expense_id) = seed_ledger(&engine).await;

    let exact = engine
        .list_transactions(
            user.id,
            &TransactionFilter {
                from: Some(date("2026-01-10T12:00:00Z")),
                to: Some(date("2026-02-15T09:30:00Z")),
                ..Default::default()
            },
            page(0, 50),
        )
        .await
        .unwrap();
    assert_eq!(exact.total, 2);
    assert_eq!(exact.items[0].id, expense_id);
    assert_eq!(exact.items[1].id, income_id);
}

#[tokio::test]
async fn out_of_range_pages_are_rejected() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;

    for limit in [0, 201] {
        let err = engine
            .list_transactions(user.id, &no_filter(), page(0, limit))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "limit {limit}");
    }

    let inverted = TransactionFilter {
        from: Some(date("2026-02-01T00:00:00Z")),
        to: Some(date("2026-01-01T00:00:00Z")),
        ..Default::default()
    };
    let err = engine
        .list_transactions(user.id, &inverted, page(0, 50))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn create_rejects_nonpositive_amounts() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;

    for amount_minor in [0, -100] {
        let err = engine
            .create_transaction(
                user.id,
                NewTransaction {
                    amount_minor,
                    date: Utc::now(),
                    description: None,
                    kind: TransactionKind::Expense,
                    category_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}

#[tokio::test]
async fn create_rejects_category_kind_mismatch() {
    let engine = engine_with_db().await;
    let (user, salary_id, groceries_id, _, _) = seed_ledger(&engine).await;

    let err = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 5_000,
                date: Utc::now(),
                description: None,
                kind: TransactionKind::Income,
                category_id: Some(groceries_id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KindMismatch(_)));

    // Matching kind passes.
    engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 5_000,
                date: Utc::now(),
                description: None,
                kind: TransactionKind::Income,
                category_id: Some(salary_id),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn create_rejects_foreign_or_missing_category() {
    let engine = engine_with_db().await;
    let (_, salary_id, _, _, _) = seed_ledger(&engine).await;
    let bob = register(&engine, "bob").await;

    let err = engine
        .create_transaction(
            bob.id,
            NewTransaction {
                amount_minor: 5_000,
                date: Utc::now(),
                description: None,
                kind: TransactionKind::Income,
                category_id: Some(salary_id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .create_transaction(
            bob.id,
            NewTransaction {
                amount_minor: 5_000,
                date: Utc::now(),
                description: None,
                kind: TransactionKind::Income,
                category_id: Some(9_999),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn blank_descriptions_collapse_to_none() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;

    let tx = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 1_000,
                date: Utc::now(),
                description: Some("   ".to_string()),
                kind: TransactionKind::Expense,
                category_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(tx.description, None);
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, _) = seed_ledger(&engine).await;

    let updated = engine
        .update_transaction(
            user.id,
            income_id,
            TransactionPatch {
                amount_minor: Some(110_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.amount_minor, 110_000);
    assert_eq!(updated.kind, TransactionKind::Income);
    assert_eq!(updated.description.as_deref(), Some("January pay"));
    assert_eq!(updated.category_name.as_deref(), Some("Salary"));
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn update_validates_the_resulting_combination() {
    let engine = engine_with_db().await;
    let (user, _, groceries_id, income_id, _) = seed_ledger(&engine).await;

    // Flipping only the kind contradicts the attached income category.
    let err = engine
        .update_transaction(
            user.id,
            income_id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KindMismatch(_)));

    // Swapping kind and category together is consistent and passes.
    let updated = engine
        .update_transaction(
            user.id,
            income_id,
            TransactionPatch {
                kind: Some(TransactionKind::Expense),
                category_id: Some(Some(groceries_id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.kind, TransactionKind::Expense);
    assert_eq!(updated.category_name.as_deref(), Some("Groceries"));
}

#[tokio::test]
async fn update_can_clear_category_and_description() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, _) = seed_ledger(&engine).await;

    let updated = engine
        .update_transaction(
            user.id,
            income_id,
            TransactionPatch {
                description: Some(None),
                category_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.category_id, None);
    assert_eq!(updated.category_name, None);
    assert_eq!(updated.description, None);
}

#[tokio::test]
async fn operations_never_see_foreign_rows() {
    let engine = engine_with_db().await;
    let (_, _, _, income_id, _) = seed_ledger(&engine).await;
    let bob = register(&engine, "bob").await;

    let err = engine.transaction(bob.id, income_id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .update_transaction(bob.id, income_id, TransactionPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .delete_transaction(bob.id, income_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let listing = engine
        .list_transactions(bob.id, &no_filter(), page(0, 50))
        .await
        .unwrap();
    assert_eq!(listing.total, 0);
    assert_eq!(listing.summary.count, 0);
}

#[tokio::test]
async fn delete_removes_the_row_once() {
    let engine = engine_with_db().await;
    let (user, _, _, income_id, _) = seed_ledger(&engine).await;

    engine.delete_transaction(user.id, income_id).await.unwrap();

    let err = engine.transaction(user.id, income_id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let err = engine
        .delete_transaction(user.id, income_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn stats_cover_the_requested_range() {
    let engine = engine_with_db().await;
    let (user, _, _, _, _) = seed_ledger(&engine).await;

    // A range that excludes the February expense.
    let january = engine
        .transaction_stats(
            user.id,
            Some(date("2026-01-01T00:00:00Z")),
            Some(date("2026-01-31T23:59:59Z")),
        )
        .await
        .unwrap();
    assert_eq!(january.income_minor, 100_000);
    assert_eq!(january.expense_minor, 0);
    assert_eq!(january.net_minor(), 100_000);
    assert_eq!(january.count, 1);
    assert_eq!(january.average_minor, 100_000);

    let all = engine.transaction_stats(user.id, None, None).await.unwrap();
    assert_eq!(all.count, 2);
    assert_eq!(all.net_minor(), 75_000);
    assert_eq!(all.average_minor, 62_500);
}

#[tokio::test]
async fn stats_on_an_empty_range_have_zero_average() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;

    let stats = engine.transaction_stats(user.id, None, None).await.unwrap();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.average_minor, 0);
    assert_eq!(stats.net_minor(), 0);
}

#[tokio::test]
async fn rollup_groups_by_category_and_skips_uncategorized() {
    let engine = engine_with_db().await;
    let (user, _, groceries_id, _, _) = seed_ledger(&engine).await;

    engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 7_500,
                date: date("2026-02-20T10:00:00Z"),
                description: None,
                kind: TransactionKind::Expense,
                category_id: Some(groceries_id),
            },
        )
        .await
        .unwrap();
    // Uncategorized: must not appear in the rollup.
    engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 99_999,
                date: date("2026-02-21T10:00:00Z"),
                description: None,
                kind: TransactionKind::Expense,
                category_id: None,
            },
        )
        .await
        .unwrap();

    let rollups = engine
        .spending_by_category(user.id, None, None)
        .await
        .unwrap();

    assert_eq!(rollups.len(), 2);
    assert_eq!(rollups[0].name, "Groceries");
    assert_eq!(rollups[0].kind, TransactionKind::Expense);
    assert_eq!(rollups[0].total_minor, 32_500);
    assert_eq!(rollups[0].count, 2);
    assert_eq!(rollups[1].name, "Salary");
    assert_eq!(rollups[1].total_minor, 100_000);
    assert_eq!(rollups[1].count, 1);
}

#[tokio::test]
async fn recency_window_excludes_older_transactions() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;
    let now = Utc::now();

    let old = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 1_000,
                date: now - Duration::days(40),
                description: None,
                kind: TransactionKind::Expense,
                category_id: None,
            },
        )
        .await
        .unwrap();
    let fresh = engine
        .create_transaction(
            user.id,
            NewTransaction {
                amount_minor: 2_000,
                date: now - Duration::days(1),
                description: None,
                kind: TransactionKind::Expense,
                category_id: None,
            },
        )
        .await
        .unwrap();

    let within_month = engine
        .recent_transactions(user.id, 30, 50, now)
        .await
        .unwrap();
    assert_eq!(within_month.len(), 1);
    assert_eq!(within_month[0].id, fresh.id);

    let within_year = engine
        .recent_transactions(user.id, 365, 50, now)
        .await
        .unwrap();
    let ids: Vec<i32> = within_year.iter().map(|tx| tx.id).collect();
    assert_eq!(ids, vec![fresh.id, old.id]);

    let capped = engine
        .recent_transactions(user.id, 365, 1, now)
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, fresh.id);
}

#[tokio::test]
async fn recency_rejects_out_of_range_windows() {
    let engine = engine_with_db().await;
    let user = register(&engine, "alice").await;
    let now = Utc::now();

    for (days, limit) in [(0, 50), (366, 50), (30, 0), (30, 201)] {
        let err = engine
            .recent_transactions(user.id, days, limit, now)
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngineError::Validation(_)),
            "days={days} limit={limit}"
        );
    }
}
