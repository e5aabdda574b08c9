//! Domain operations for the money tracker.
//!
//! The [`Engine`] owns a pooled [`sea_orm::DatabaseConnection`] and nothing
//! else: every operation is scoped to the calling user, runs inside a single
//! database transaction and either fully commits or fully rolls back.

pub use categories::Category;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    CategoryPatch, CategoryRollup, Engine, EngineBuilder, LedgerStats, LedgerSummary, NewCategory,
    NewTransaction, NewUser, Page, TransactionFilter, TransactionPage, TransactionPatch,
};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;

mod categories;
mod error;
mod money;
mod ops;
mod transactions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
