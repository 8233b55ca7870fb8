use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    /// Share lists do not add up to the declared total, or the total is not positive
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Settlement requested against an edge that does not exist
    #[error("User {payer} owes nothing to user {payee} in this group")]
    NoSuchDebt { payer: Uuid, payee: Uuid },

    /// Settlement amount is larger than the outstanding edge weight
    #[error("Settlement amount {requested} exceeds outstanding debt {outstanding}")]
    AmountExceedsDebt {
        requested: Decimal,
        outstanding: Decimal,
    },

    /// Settlement amount is zero or negative
    #[error("Settlement amount must be positive")]
    InvalidSettlementAmount,

    /// Requester is not a party to the operation
    #[error("User {0} is not a party to this operation")]
    Unauthorized(Uuid),

    /// Transient failure of a backing store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Graph store operation failed
    #[error("Graph store error: {0}")]
    GraphError(String),

    /// Ledger record store operation failed
    #[error("Expense store error: {0}")]
    StorageError(String),
}
