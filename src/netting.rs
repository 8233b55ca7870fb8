//! Debt netting: collapsing a group's chains and cycles into the minimum
//! edge set with the same net effect.

use crate::error::LedgerError;
use crate::graph::GraphStore;
use crate::models::{Edge, Share};
use crate::split::decompose;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Net balance per node over an edge snapshot: incoming minus outgoing sums.
pub fn net_balances(edges: &[Edge]) -> HashMap<Uuid, Decimal> {
    let mut balances: HashMap<Uuid, Decimal> = HashMap::new();
    for edge in edges {
        *balances.entry(edge.to_user_id).or_insert(Decimal::ZERO) += edge.amount;
        *balances.entry(edge.from_user_id).or_insert(Decimal::ZERO) -= edge.amount;
    }
    balances
}

/// Rebuilds a group's edge set from scratch out of its current net balances.
///
/// Members owed money become lenders, members owing money become debtors,
/// zero-balance members drop out, and the decomposition algorithm produces
/// the replacement edges. Net balances are unchanged by construction and the
/// edge count is bounded by the number of non-zero-balance members minus
/// one. Idempotent given a consistent snapshot, so the caller may retry
/// freely; the caller must hold the group's mutation lock.
pub async fn simplify<G: GraphStore + ?Sized>(
    graph: &G,
    group_id: Uuid,
) -> Result<(), LedgerError> {
    let edges = graph.group_edges(group_id).await?;
    if edges.is_empty() {
        return Ok(());
    }

    let balances = net_balances(&edges);
    let mut creditors: Vec<Share> = Vec::new();
    let mut debtors: Vec<Share> = Vec::new();
    for (user_id, balance) in balances {
        if balance > Decimal::ZERO {
            creditors.push(Share::new(user_id, balance));
        } else if balance < Decimal::ZERO {
            debtors.push(Share::new(user_id, -balance));
        }
    }
    // Snapshot order is map order; fix it so rebuilds are deterministic.
    creditors.sort_by_key(|s| s.user_id);
    debtors.sort_by_key(|s| s.user_id);

    let rebuilt = decompose(&creditors, &debtors);
    debug!(
        %group_id,
        before = edges.len(),
        after = rebuilt.len(),
        "netting rebuilt group edges"
    );
    graph.replace_group_edges(group_id, &rebuilt).await
}
