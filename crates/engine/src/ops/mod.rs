use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine};

mod categories;
mod transactions;
mod users;

pub use categories::{CategoryPatch, NewCategory};
pub use transactions::{
    CategoryRollup, LedgerStats, LedgerSummary, NewTransaction, Page, TransactionFilter,
    TransactionPage, TransactionPatch,
};
pub use users::NewUser;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Checks that the backing database answers. Used by health probes.
    pub async fn ping(&self) -> ResultEngine<()> {
        self.database.ping().await.map_err(Into::into)
    }
}

fn normalize_required_name(value: &str, label: &str, max_chars: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    if trimmed.chars().count() > max_chars {
        return Err(EngineError::Validation(format!(
            "{label} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions collapse to `None`; anything kept is length-bounded.
fn normalize_description(value: Option<&str>) -> ResultEngine<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            if trimmed.chars().count() > 500 {
                return Err(EngineError::Validation(
                    "description must be at most 500 characters".to_string(),
                ));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn validate_icon(value: &str) -> ResultEngine<()> {
    if value.trim().is_empty() || value.chars().count() > 50 {
        return Err(EngineError::Validation(
            "icon must be 1 to 50 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_color(value: &str) -> ResultEngine<()> {
    let mut chars = value.chars();
    let well_formed = chars.next() == Some('#')
        && value.len() == 7
        && chars.all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(EngineError::Validation(
            "color must be a #RRGGBB hex value".to_string(),
        ));
    }
    Ok(())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
