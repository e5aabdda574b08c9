//! Domain → wire mappings shared by the handler modules.

use api_types::{
    category::CategoryView,
    transaction::{TransactionSummary, TransactionView},
    user::UserView,
};
use engine::{Category, LedgerSummary, MoneyCents, Transaction, User};

pub fn kind_to_api(kind: engine::TransactionKind) -> api_types::TransactionKind {
    match kind {
        engine::TransactionKind::Income => api_types::TransactionKind::Income,
        engine::TransactionKind::Expense => api_types::TransactionKind::Expense,
    }
}

pub fn kind_from_api(kind: api_types::TransactionKind) -> engine::TransactionKind {
    match kind {
        api_types::TransactionKind::Income => engine::TransactionKind::Income,
        api_types::TransactionKind::Expense => engine::TransactionKind::Expense,
    }
}

pub fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
        is_active: user.is_active,
        created_at: user.created_at.fixed_offset(),
    }
}

pub fn category_view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: kind_to_api(category.kind),
        icon: category.icon,
        color: category.color,
        created_at: category.created_at.fixed_offset(),
    }
}

pub fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        amount: MoneyCents::new(tx.amount_minor).to_decimal(),
        date: tx.date.fixed_offset(),
        description: tx.description,
        kind: kind_to_api(tx.kind),
        category_id: tx.category_id,
        category_name: tx.category_name,
        category_icon: tx.category_icon,
        created_at: tx.created_at.fixed_offset(),
        updated_at: tx.updated_at.map(|dt| dt.fixed_offset()),
    }
}

pub fn summary_view(summary: LedgerSummary) -> TransactionSummary {
    TransactionSummary {
        total_income: MoneyCents::new(summary.income_minor).to_decimal(),
        total_expense: MoneyCents::new(summary.expense_minor).to_decimal(),
        net_balance: MoneyCents::new(summary.net_minor()).to_decimal(),
        count: summary.count,
    }
}
