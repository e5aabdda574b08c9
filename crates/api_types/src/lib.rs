//! Wire types shared by the server and its clients.
//!
//! Amounts travel as two-decimal [`Decimal`] values; timestamps are RFC3339
//! with an offset. The JSON field for a transaction/category kind is `type`,
//! mapped onto [`TransactionKind`].

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// Direction of money movement, as it appears on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Distinguishes "field absent" (outer `None`) from "field set to null"
/// (`Some(None)`) in partial updates.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub mod auth {
    use super::*;

    fn validate_username(value: &str) -> Result<(), ValidationError> {
        let ok = value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if ok {
            Ok(())
        } else {
            Err(ValidationError::new("username"))
        }
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct Register {
        #[validate(
            length(min = 3, max = 50),
            custom(
                function = "validate_username",
                message = "Username must use letters, digits, '-' or '_'."
            )
        )]
        pub username: String,
        #[validate(
            email(message = "Email must be a valid address."),
            length(max = 100)
        )]
        pub email: String,
        #[validate(length(
            min = 8,
            max = 128,
            message = "Password must contain at least 8 characters."
        ))]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct Login {
        #[validate(length(min = 1))]
        pub username: String,
        #[validate(length(min = 1))]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Token {
        pub access_token: String,
        pub token_type: String,
        /// Seconds until the token expires.
        pub expires_in: u64,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
        pub email: String,
        pub is_active: bool,
        pub created_at: DateTime<FixedOffset>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    /// Partial update; absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub icon: String,
        pub color: String,
        pub created_at: DateTime<FixedOffset>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub amount: Decimal,
        pub date: DateTime<FixedOffset>,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category_id: Option<i32>,
    }

    /// Partial update. `description` and `category_id` can be cleared by
    /// sending an explicit `null`; leaving them out keeps the stored value.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount: Option<Decimal>,
        pub date: Option<DateTime<FixedOffset>>,
        #[serde(
            default,
            deserialize_with = "super::double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub description: Option<Option<String>>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        #[serde(
            default,
            deserialize_with = "super::double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub category_id: Option<Option<i32>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i32,
        pub amount: Decimal,
        pub date: DateTime<FixedOffset>,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub category_id: Option<i32>,
        pub category_name: Option<String>,
        pub category_icon: Option<String>,
        pub created_at: DateTime<FixedOffset>,
        pub updated_at: Option<DateTime<FixedOffset>>,
    }

    /// Query string for the transaction listing.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub skip: Option<u64>,
        pub limit: Option<u64>,
        pub start_date: Option<DateTime<FixedOffset>>,
        pub end_date: Option<DateTime<FixedOffset>>,
        pub category_id: Option<i32>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub min_amount: Option<Decimal>,
        pub max_amount: Option<Decimal>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecentQuery {
        pub days: Option<u32>,
        pub limit: Option<u64>,
    }

    /// Totals computed over the filtered set, not just the returned page.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionSummary {
        pub total_income: Decimal,
        pub total_expense: Decimal,
        pub net_balance: Decimal,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionPageResponse {
        pub items: Vec<TransactionView>,
        pub total: u64,
        pub page: u64,
        pub size: u64,
        pub pages: u64,
        pub summary: TransactionSummary,
    }
}

pub mod stats {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RangeQuery {
        pub start_date: Option<DateTime<FixedOffset>>,
        pub end_date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionStats {
        pub total_income: Decimal,
        pub total_expense: Decimal,
        pub net_balance: Decimal,
        pub transaction_count: u64,
        pub average_transaction: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorySpending {
        pub name: String,
        pub icon: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub total: Decimal,
        pub count: u64,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        pub database: String,
    }
}
