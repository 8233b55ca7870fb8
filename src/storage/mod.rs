use crate::error::LedgerError;
use crate::models::Expense;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence boundary for ledger records (the authoritative expense
/// history). Single-record atomicity only; cross-store consistency with the
/// balance graph is handled by the service replaying records that still
/// carry pending deltas.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn save(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn get(&self, expense_id: Uuid) -> Result<Option<Expense>, LedgerError>;
    async fn update(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn delete(&self, expense_id: Uuid) -> Result<(), LedgerError>;

    /// Live (non-tombstoned) records of a group, oldest first.
    async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError>;

    /// Drops the record's pending deltas after they reached the graph.
    async fn clear_pending(&self, expense_id: Uuid) -> Result<(), LedgerError>;

    /// Records whose deltas have not reached the graph yet, oldest first.
    /// Includes tombstoned records awaiting their reversal.
    async fn pending_for_group(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError>;
}

pub mod in_memory;
