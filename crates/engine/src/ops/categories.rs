use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    Value, prelude::*, sea_query::Expr,
};

use crate::{Category, EngineError, ResultEngine, TransactionKind, categories, transactions};

use super::{Engine, normalize_required_name, validate_color, validate_icon, with_tx};

const DEFAULT_ICON: &str = "💰";
const DEFAULT_COLOR: &str = "#4CAF50";

#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionKind,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Partial category update. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Engine {
    /// Point lookup scoped to the owner. Foreign rows look absent.
    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        category_id: i32,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    async fn category_name_taken(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        name: &str,
        exclude_id: Option<i32>,
    ) -> ResultEngine<bool> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(categories::Column::Id.ne(id));
        }
        Ok(query.one(db_tx).await?.is_some())
    }

    pub async fn create_category(&self, user_id: i32, new: NewCategory) -> ResultEngine<Category> {
        let name = normalize_required_name(&new.name, "category name", 100)?;
        let icon = match new.icon {
            Some(icon) => {
                validate_icon(&icon)?;
                icon
            }
            None => DEFAULT_ICON.to_string(),
        };
        let color = match new.color {
            Some(color) => {
                validate_color(&color)?;
                color
            }
            None => DEFAULT_COLOR.to_string(),
        };

        with_tx!(self, |db_tx| {
            if self
                .category_name_taken(&db_tx, user_id, &name, None)
                .await?
            {
                return Err(EngineError::ExistingKey(name));
            }

            let active = categories::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                name: ActiveValue::Set(name.clone()),
                kind: ActiveValue::Set(new.kind.as_str().to_string()),
                icon: ActiveValue::Set(icon.clone()),
                color: ActiveValue::Set(color.clone()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let model = active.insert(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Lists the caller's categories, name-ordered.
    pub async fn categories(&self, user_id: i32) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    pub async fn category(&self, user_id: i32, id: i32) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Applies a partial update.
    ///
    /// Renames collide per user. Changing the kind is refused while any
    /// transaction still references the category, otherwise those rows would
    /// silently contradict their own kind.
    pub async fn update_category(
        &self,
        user_id: i32,
        id: i32,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        let name = patch
            .name
            .as_deref()
            .map(|value| normalize_required_name(value, "category name", 100))
            .transpose()?;
        if let Some(icon) = patch.icon.as_deref() {
            validate_icon(icon)?;
        }
        if let Some(color) = patch.color.as_deref() {
            validate_color(color)?;
        }

        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, id).await?;
            let mut active: categories::ActiveModel = model.clone().into();

            if let Some(name) = name {
                if name != model.name
                    && self
                        .category_name_taken(&db_tx, user_id, &name, Some(id))
                        .await?
                {
                    return Err(EngineError::ExistingKey(name));
                }
                active.name = ActiveValue::Set(name);
            }

            if let Some(kind) = patch.kind
                && kind.as_str() != model.kind
            {
                let referencing = transactions::Entity::find()
                    .filter(transactions::Column::CategoryId.eq(id))
                    .count(&db_tx)
                    .await?;
                if referencing > 0 {
                    return Err(EngineError::KindMismatch(format!(
                        "category '{}' still has {referencing} transactions of kind {}",
                        model.name, model.kind
                    )));
                }
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }

            if let Some(icon) = patch.icon {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(color) = patch.color {
                active.color = ActiveValue::Set(color);
            }

            if !active.is_changed() {
                return Category::try_from(model);
            }

            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Deletes a category.
    ///
    /// Its transactions are financial history and survive: their
    /// `category_id` is cleared in the same transaction, then the category
    /// row goes.
    pub async fn delete_category(&self, user_id: i32, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, id).await?;

            transactions::Entity::update_many()
                .col_expr(transactions::Column::CategoryId, Expr::value(Value::Int(None)))
                .filter(transactions::Column::CategoryId.eq(id))
                .filter(transactions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;

            categories::Entity::delete_by_id(id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
