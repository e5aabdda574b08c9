use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, categories, transactions};

use super::super::{Engine, normalize_description, with_tx};
use super::{NewTransaction, TransactionPatch, validate_amount_minor};

/// A transaction carrying a category must carry the category's kind; a
/// mismatch is a rejected operation, never a silent coercion.
fn ensure_kind_matches(
    category: &categories::Model,
    kind: TransactionKind,
) -> ResultEngine<()> {
    if category.kind != kind.as_str() {
        return Err(EngineError::KindMismatch(format!(
            "category '{}' is {}, transaction is {}",
            category.name,
            category.kind,
            kind.as_str()
        )));
    }
    Ok(())
}

impl Engine {
    /// Persists a new transaction for the caller and returns the enriched
    /// record.
    pub async fn create_transaction(
        &self,
        user_id: i32,
        new: NewTransaction,
    ) -> ResultEngine<Transaction> {
        validate_amount_minor(new.amount_minor)?;
        let description = normalize_description(new.description.as_deref())?;

        with_tx!(self, |db_tx| {
            let category = match new.category_id {
                Some(category_id) => {
                    let category = self.require_category(&db_tx, user_id, category_id).await?;
                    ensure_kind_matches(&category, new.kind)?;
                    Some(category)
                }
                None => None,
            };

            let active = transactions::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                category_id: ActiveValue::Set(new.category_id),
                amount_minor: ActiveValue::Set(new.amount_minor),
                date: ActiveValue::Set(new.date),
                description: ActiveValue::Set(description.clone()),
                kind: ActiveValue::Set(new.kind.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.insert(&db_tx).await?;
            Transaction::try_from((model, category))
        })
    }

    /// Applies a partial update and returns the enriched record.
    ///
    /// The *resulting* kind/category combination is validated: touching
    /// either field re-checks it against the category that will be attached
    /// after the update.
    pub async fn update_transaction(
        &self,
        user_id: i32,
        id: i32,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = patch.amount_minor {
            validate_amount_minor(amount_minor)?;
        }
        let description = match &patch.description {
            Some(value) => Some(normalize_description(value.as_deref())?),
            None => None,
        };

        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(id)
                .filter(transactions::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let kind = match patch.kind {
                Some(kind) => kind,
                None => TransactionKind::try_from(model.kind.as_str())?,
            };
            let category_id = match patch.category_id {
                Some(value) => value,
                None => model.category_id,
            };
            let category = match category_id {
                Some(category_id) => {
                    let category = self.require_category(&db_tx, user_id, category_id).await?;
                    ensure_kind_matches(&category, kind)?;
                    Some(category)
                }
                None => None,
            };

            let mut active: transactions::ActiveModel = model.into();
            if let Some(amount_minor) = patch.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(date) = patch.date {
                active.date = ActiveValue::Set(date);
            }
            if let Some(value) = description {
                active.description = ActiveValue::Set(value);
            }
            if patch.kind.is_some() {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if patch.category_id.is_some() {
                active.category_id = ActiveValue::Set(category_id);
            }
            active.updated_at = ActiveValue::Set(Some(Utc::now()));

            let model = active.update(&db_tx).await?;
            Transaction::try_from((model, category))
        })
    }

    /// Deletes the caller's transaction. A row owned by someone else reports
    /// not-found, same as a missing one.
    pub async fn delete_transaction(&self, user_id: i32, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let result = transactions::Entity::delete_many()
                .filter(transactions::Column::Id.eq(id))
                .filter(transactions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("transaction not exists".to_string()));
            }
            Ok(())
        })
    }
}
