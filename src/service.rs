use crate::error::LedgerError;
use crate::graph::GraphStore;
use crate::models::{EdgeDelta, Expense, NetBalance, OwedDetail, Share};
use crate::netting;
use crate::split::{decompose, strip_self_pairs};
use crate::storage::ExpenseStore;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// One mutual-exclusion section per group. Every graph mutation for a group
/// (decomposition, netting, settlement, teardown) runs under its lock, so
/// concurrent requests and in-flight netting passes cannot interleave.
#[derive(Clone, Default)]
struct GroupLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl GroupLocks {
    async fn acquire(&self, group_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            Arc::clone(locks.entry(group_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops a group's registry entry once no task holds or awaits its
    /// lock, so torn-down groups do not accumulate entries forever. The
    /// strong-count check happens under the registry lock, which `acquire`
    /// also needs to clone the entry, so an in-use lock is never evicted;
    /// a later `acquire` simply recreates the entry.
    async fn evict_if_idle(&self, group_id: Uuid) {
        let mut locks = self.inner.lock().await;
        if let Some(lock) = locks.get(&group_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&group_id);
            }
        }
    }
}

/// The debt ledger and netting engine.
///
/// Owns the coordination between the ledger record store (authoritative
/// expense history) and the balance graph (derived pairwise debts). All
/// inputs are assumed membership-authorized by the group-management layer;
/// settlement additionally checks that the requester is a party to it.
pub struct LedgerService<G: GraphStore, S: ExpenseStore> {
    graph: Arc<G>,
    expenses: Arc<S>,
    locks: GroupLocks,
    netting_enabled: bool,
}

impl<G, S> LedgerService<G, S>
where
    G: GraphStore + 'static,
    S: ExpenseStore + 'static,
{
    pub fn new(graph: G, expenses: S) -> Self {
        info!("Initializing LedgerService");
        LedgerService {
            graph: Arc::new(graph),
            expenses: Arc::new(expenses),
            locks: GroupLocks::default(),
            netting_enabled: true,
        }
    }

    /// Disables the background netting pass; used by tests that assert on
    /// pre-netting graph shapes and drive `simplify_debts` directly.
    pub fn with_netting(mut self, enabled: bool) -> Self {
        self.netting_enabled = enabled;
        self
    }

    // EXPENSE MUTATIONS

    pub async fn create_expense(
        &self,
        group_id: Uuid,
        amount: Decimal,
        payer_shares: Vec<Share>,
        debtor_shares: Vec<Share>,
        category: Option<String>,
        created_by: Uuid,
    ) -> Result<Expense, LedgerError> {
        info!(%group_id, %amount, "Creating expense");
        validate_expense(amount, &payer_shares, &debtor_shares)?;

        let now = Utc::now();
        let pending = contribution_deltas(&payer_shares, &debtor_shares);
        let record = Expense {
            id: Uuid::new_v4(),
            group_id,
            amount,
            payer_shares,
            debtor_shares,
            category,
            created_by,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            pending_deltas: pending,
        };
        // Ledger first, graph second; the pending deltas stored on the
        // record make the window between the two writes recoverable.
        self.expenses.save(record.clone()).await?;

        {
            let _guard = self.locks.acquire(group_id).await;
            self.replay_pending(group_id).await?;
        }
        self.schedule_netting(group_id);

        debug!(expense_id = %record.id, "Expense created");
        Ok(Expense {
            pending_deltas: Vec::new(),
            ..record
        })
    }

    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        new_amount: Decimal,
        new_payer_shares: Vec<Share>,
        new_debtor_shares: Vec<Share>,
        new_category: Option<String>,
        requesting_user_id: Uuid,
    ) -> Result<Expense, LedgerError> {
        info!(%expense_id, user_id = %requesting_user_id, "Updating expense");
        let record = self
            .expenses
            .get(expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        validate_expense(new_amount, &new_payer_shares, &new_debtor_shares)?;

        let group_id = record.group_id;
        {
            let _guard = self.locks.acquire(group_id).await;
            self.replay_pending(group_id).await?;

            // Net out the stored contribution by decomposing with the roles
            // swapped, then apply the new one. Direct subtraction would miss
            // edges reshaped by intervening settlements or netting. Both
            // delta sets are committed to the record before touching the
            // graph, so a crash in between is replayed, not lost.
            let mut pending = reversal_deltas(&record);
            pending.extend(contribution_deltas(&new_payer_shares, &new_debtor_shares));

            let updated = Expense {
                amount: new_amount,
                payer_shares: new_payer_shares,
                debtor_shares: new_debtor_shares,
                category: new_category,
                updated_at: Utc::now(),
                pending_deltas: pending,
                ..record
            };
            self.expenses.update(updated.clone()).await?;
            self.replay_pending(group_id).await?;
            self.schedule_netting(group_id);

            debug!(%expense_id, "Expense updated");
            Ok(Expense {
                pending_deltas: Vec::new(),
                ..updated
            })
        }
    }

    pub async fn delete_expense(
        &self,
        expense_id: Uuid,
        requesting_user_id: Uuid,
    ) -> Result<(), LedgerError> {
        info!(%expense_id, user_id = %requesting_user_id, "Deleting expense");
        let record = self
            .expenses
            .get(expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;

        let group_id = record.group_id;
        {
            let _guard = self.locks.acquire(group_id).await;
            self.replay_pending(group_id).await?;

            // Tombstone the record with its reversal deltas before touching
            // the graph; the record disappears for good once the reversal
            // has been replayed into the graph.
            let now = Utc::now();
            let tombstone = Expense {
                deleted_at: Some(now),
                updated_at: now,
                pending_deltas: reversal_deltas(&record),
                ..record
            };
            self.expenses.update(tombstone).await?;
            self.replay_pending(group_id).await?;
        }
        self.schedule_netting(group_id);

        debug!(%expense_id, "Expense deleted");
        Ok(())
    }

    // SETTLEMENT

    /// Resolves (part of) one specific debt edge: an out-of-band cash
    /// transfer from payer to payee. Pure graph mutation; no ledger record
    /// is written.
    pub async fn settle(
        &self,
        group_id: Uuid,
        payer_id: Uuid,
        payee_id: Uuid,
        amount: Decimal,
        requesting_user_id: Uuid,
    ) -> Result<(), LedgerError> {
        info!(%group_id, %payer_id, %payee_id, %amount, "Settling debt");
        if requesting_user_id != payer_id && requesting_user_id != payee_id {
            warn!(user_id = %requesting_user_id, "Settlement attempted by a non-party");
            return Err(LedgerError::Unauthorized(requesting_user_id));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidSettlementAmount);
        }

        {
            let _guard = self.locks.acquire(group_id).await;
            self.replay_pending(group_id).await?;
            self.graph
                .decrement_edge(group_id, payer_id, payee_id, amount)
                .await?;
        }
        self.schedule_netting(group_id);

        debug!(%group_id, %payer_id, %payee_id, "Debt settled");
        Ok(())
    }

    // BALANCE QUERIES (read-only; may observe a pre-netting snapshot, which
    // is fine because net balances are netting-invariant)

    pub async fn net_balance_of(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Decimal, LedgerError> {
        let incoming: Decimal = self
            .graph
            .incoming_edges(group_id, user_id)
            .await?
            .iter()
            .map(|e| e.amount)
            .sum();
        let outgoing: Decimal = self
            .graph
            .outgoing_edges(group_id, user_id)
            .await?
            .iter()
            .map(|e| e.amount)
            .sum();
        Ok(incoming - outgoing)
    }

    pub async fn owed_detail(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<OwedDetail, LedgerError> {
        Ok(OwedDetail {
            outgoing: self.graph.outgoing_edges(group_id, user_id).await?,
            incoming: self.graph.incoming_edges(group_id, user_id).await?,
        })
    }

    pub async fn all_balances(&self, group_id: Uuid) -> Result<Vec<NetBalance>, LedgerError> {
        let edges = self.graph.group_edges(group_id).await?;
        let mut balances: Vec<NetBalance> = netting::net_balances(&edges)
            .into_iter()
            .map(|(user_id, balance)| NetBalance { user_id, balance })
            .collect();
        balances.sort_by_key(|b| b.user_id);
        Ok(balances)
    }

    pub async fn list_expenses(&self, group_id: Uuid) -> Result<Vec<Expense>, LedgerError> {
        self.expenses.list_by_group(group_id).await
    }

    // GROUP LIFECYCLE

    /// Tears down one member's node and incident edges. Called by the
    /// group-management collaborator on member removal; a group deletion
    /// cascades here once per member.
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        info!(%group_id, %user_id, "Removing member from balance graph");
        {
            let _guard = self.locks.acquire(group_id).await;
            self.graph.remove_member(group_id, user_id).await?;
        }
        // Teardown is the natural point to release the group's lock entry;
        // if the group lives on, the next mutation recreates it.
        self.locks.evict_if_idle(group_id).await;
        Ok(())
    }

    // NETTING

    /// Runs one netting pass synchronously under the group lock.
    pub async fn simplify_debts(&self, group_id: Uuid) -> Result<(), LedgerError> {
        let _guard = self.locks.acquire(group_id).await;
        netting::simplify(self.graph.as_ref(), group_id).await
    }

    /// Detached, best-effort netting pass after an accepted mutation.
    /// Failures are logged, never surfaced; the next mutation's pass retries
    /// from a fresh snapshot.
    fn schedule_netting(&self, group_id: Uuid) {
        if !self.netting_enabled {
            return;
        }
        let graph = Arc::clone(&self.graph);
        let locks = self.locks.clone();
        tokio::spawn(async move {
            let _guard = locks.acquire(group_id).await;
            if let Err(err) = netting::simplify(graph.as_ref(), group_id).await {
                error!(%group_id, error = %err, "background netting pass failed");
            }
        });
    }

    /// Pushes into the graph every pending delta committed to the ledger
    /// but never written to the graph (a crash between the two store
    /// writes). Runs under the group lock at the start of every mutation,
    /// and is the one code path that moves deltas into the graph: create,
    /// update and delete all commit their deltas to the record first and
    /// replay second. Tombstoned records are removed once their reversal
    /// has landed.
    async fn replay_pending(&self, group_id: Uuid) -> Result<(), LedgerError> {
        for record in self.expenses.pending_for_group(group_id).await? {
            debug!(expense_id = %record.id, "Applying pending deltas to balance graph");
            self.graph
                .apply_deltas(group_id, &record.pending_deltas)
                .await?;
            if record.deleted_at.is_some() {
                self.expenses.delete(record.id).await?;
            } else {
                self.expenses.clear_pending(record.id).await?;
            }
        }
        Ok(())
    }
}

/// Deltas that add an expense's contribution to the graph.
fn contribution_deltas(payer_shares: &[Share], debtor_shares: &[Share]) -> Vec<EdgeDelta> {
    let (lenders, debtors) = strip_self_pairs(payer_shares, debtor_shares);
    decompose(&lenders, &debtors)
}

/// Deltas that net an expense's contribution back out: the same
/// decomposition with lender and debtor roles swapped.
fn reversal_deltas(record: &Expense) -> Vec<EdgeDelta> {
    let (lenders, debtors) = strip_self_pairs(&record.payer_shares, &record.debtor_shares);
    decompose(&debtors, &lenders)
}

/// Rejects an expense before any store is touched: total must be positive,
/// both lists non-empty with strictly positive entries, and both sums equal
/// to the declared total.
fn validate_expense(
    amount: Decimal,
    payer_shares: &[Share],
    debtor_shares: &[Share],
) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidExpense(
            "amount must be greater than zero".to_string(),
        ));
    }
    if payer_shares.is_empty() || debtor_shares.is_empty() {
        return Err(LedgerError::InvalidExpense(
            "payer and debtor lists must be non-empty".to_string(),
        ));
    }
    if payer_shares
        .iter()
        .chain(debtor_shares)
        .any(|s| s.amount <= Decimal::ZERO)
    {
        return Err(LedgerError::InvalidExpense(
            "every share must be strictly positive".to_string(),
        ));
    }
    let paid: Decimal = payer_shares.iter().map(|s| s.amount).sum();
    let owed: Decimal = debtor_shares.iter().map(|s| s.amount).sum();
    if paid != amount || owed != amount {
        warn!(%amount, %paid, %owed, "Share sums do not match declared total");
        return Err(LedgerError::InvalidExpense(format!(
            "share sums (paid {paid}, owed {owed}) must both equal the total {amount}"
        )));
    }
    Ok(())
}
