use crate::error::LedgerError;
use crate::models::Expense;
use crate::storage::ExpenseStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process ledger record store, standing in for an external document
/// database.
pub struct InMemoryExpenses {
    expenses: RwLock<HashMap<Uuid, Expense>>,
}

impl InMemoryExpenses {
    pub fn new() -> Self {
        InMemoryExpenses {
            expenses: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryExpenses {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpenseStore for InMemoryExpenses {
    async fn save(&self, expense: Expense) -> Result<(), LedgerError> {
        self.expenses.write().await.insert(expense.id, expense);
        Ok(())
    }

    async fn get(&self, expense_id: Uuid) -> Result<Option<Expense>, LedgerError> {
        Ok(self.expenses.read().await.get(&expense_id).cloned())
    }

    async fn update(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut expenses = self.expenses.write().await;
        if !expenses.contains_key(&expense.id) {
            return Err(LedgerError::ExpenseNotFound(expense.id));
        }
        expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn delete(&self, expense_id: Uuid) -> Result<(), LedgerError> {
        self.expenses
            .write()
            .await
            .remove(&expense_id)
            .map(|_| ())
            .ok_or(LedgerError::ExpenseNotFound(expense_id))
    }

    async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError> {
        let mut records: Vec<Expense> = self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| e.group_id == group_id && e.deleted_at.is_none())
            .cloned()
            .collect();
        records.sort_by_key(|e| e.created_at);
        Ok(records)
    }

    async fn clear_pending(&self, expense_id: Uuid) -> Result<(), LedgerError> {
        let mut expenses = self.expenses.write().await;
        let record = expenses
            .get_mut(&expense_id)
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        record.pending_deltas.clear();
        Ok(())
    }

    async fn pending_for_group(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError> {
        let mut records: Vec<Expense> = self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| e.group_id == group_id && !e.pending_deltas.is_empty())
            .cloned()
            .collect();
        records.sort_by_key(|e| e.created_at);
        Ok(records)
    }
}
