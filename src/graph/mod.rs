use crate::error::LedgerError;
use crate::models::{Edge, EdgeDelta, PairBalance};
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Persistence boundary for the per-group balance graph.
///
/// Nodes are `(user_id, group_id)` pairs, created lazily the first time a
/// member appears in an edge operation. Every implementation must keep at
/// most one directed edge per ordered pair, with a strictly positive weight;
/// an edge driven to zero is deleted, never retained.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Accumulates each delta into the existing edge for its ordered pair,
    /// creating the edge if absent. One atomic call per expense mutation.
    async fn apply_deltas(&self, group_id: Uuid, deltas: &[EdgeDelta]) -> Result<(), LedgerError>;

    /// Edges pointing away from the member (debts they owe), sorted by
    /// counterparty id.
    async fn outgoing_edges(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PairBalance>, LedgerError>;

    /// Edges pointing at the member (debts owed to them), sorted by
    /// counterparty id.
    async fn incoming_edges(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PairBalance>, LedgerError>;

    /// Snapshot of every edge in the group.
    async fn group_edges(&self, group_id: Uuid) -> Result<Vec<Edge>, LedgerError>;

    /// Reduces one specific edge by `amount`, deleting it when the amount
    /// matches the edge weight exactly. Fails with `NoSuchDebt` if the edge
    /// does not exist and `AmountExceedsDebt` if the reduction is larger
    /// than the weight; the graph is unchanged on failure.
    async fn decrement_edge(
        &self,
        group_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<(), LedgerError>;

    /// Atomically replaces the group's entire edge set with the given
    /// deltas. The netting rebuild goes through this so a crashed pass can
    /// never leave the group half-deleted.
    async fn replace_group_edges(
        &self,
        group_id: Uuid,
        deltas: &[EdgeDelta],
    ) -> Result<(), LedgerError>;

    /// Deletes the member's node and every incident edge. Called by the
    /// group-management collaborator when a member is removed or the group
    /// is torn down.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), LedgerError>;
}

pub mod in_memory;
