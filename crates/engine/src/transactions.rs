//! Transaction primitives.
//!
//! A `Transaction` is a single ledger event: a positive amount carried with a
//! direction (`income` or `expense`), a business timestamp and an optional
//! category link.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Direction of money movement. Shared by transactions and categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub amount_minor: i64,
    pub date: DateTimeUtc,
    pub description: Option<String>,
    pub kind: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A ledger row, annotated at read time with its category's display fields.
///
/// `category_name`/`category_icon` are denormalized into responses, never
/// stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub amount_minor: i64,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub kind: TransactionKind,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<(Model, Option<super::categories::Model>)> for Transaction {
    type Error = EngineError;

    fn try_from(
        (model, category): (Model, Option<super::categories::Model>),
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            amount_minor: model.amount_minor,
            date: model.date,
            description: model.description,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category_name: category.as_ref().map(|c| c.name.clone()),
            category_icon: category.as_ref().map(|c| c.icon.clone()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
