use crate::error::LedgerError;
use crate::graph::GraphStore;
use crate::models::{Edge, EdgeDelta, PairBalance};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

type Adjacency = HashMap<Uuid, HashMap<Uuid, Decimal>>; // from -> (to -> amount)

/// In-process balance graph: one adjacency map per group behind a single
/// lock, standing in for an external graph database.
pub struct InMemoryGraph {
    groups: RwLock<HashMap<Uuid, Adjacency>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        InMemoryGraph {
            groups: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_into(adjacency: &mut Adjacency, deltas: &[EdgeDelta]) {
    for delta in deltas {
        let weight = adjacency
            .entry(delta.debtor_id)
            .or_default()
            .entry(delta.lender_id)
            .or_insert(Decimal::ZERO);
        *weight += delta.amount;
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn apply_deltas(&self, group_id: Uuid, deltas: &[EdgeDelta]) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        let adjacency = groups.entry(group_id).or_default();
        apply_into(adjacency, deltas);
        Ok(())
    }

    async fn outgoing_edges(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PairBalance>, LedgerError> {
        let groups = self.groups.read().await;
        let mut edges: Vec<PairBalance> = groups
            .get(&group_id)
            .and_then(|adjacency| adjacency.get(&user_id))
            .map(|targets| {
                targets
                    .iter()
                    .map(|(&to, &amount)| PairBalance { user_id: to, amount })
                    .collect()
            })
            .unwrap_or_default();
        edges.sort_by_key(|e| e.user_id);
        Ok(edges)
    }

    async fn incoming_edges(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<PairBalance>, LedgerError> {
        let groups = self.groups.read().await;
        let mut edges: Vec<PairBalance> = groups
            .get(&group_id)
            .map(|adjacency| {
                adjacency
                    .iter()
                    .filter_map(|(&from, targets)| {
                        targets
                            .get(&user_id)
                            .map(|&amount| PairBalance { user_id: from, amount })
                    })
                    .collect()
            })
            .unwrap_or_default();
        edges.sort_by_key(|e| e.user_id);
        Ok(edges)
    }

    async fn group_edges(&self, group_id: Uuid) -> Result<Vec<Edge>, LedgerError> {
        let groups = self.groups.read().await;
        let mut edges: Vec<Edge> = groups
            .get(&group_id)
            .map(|adjacency| {
                adjacency
                    .iter()
                    .flat_map(|(&from, targets)| {
                        targets.iter().map(move |(&to, &amount)| Edge {
                            from_user_id: from,
                            to_user_id: to,
                            amount,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        edges.sort_by_key(|e| (e.from_user_id, e.to_user_id));
        Ok(edges)
    }

    async fn decrement_edge(
        &self,
        group_id: Uuid,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        let targets = groups
            .get_mut(&group_id)
            .and_then(|adjacency| adjacency.get_mut(&from_user_id))
            .ok_or(LedgerError::NoSuchDebt {
                payer: from_user_id,
                payee: to_user_id,
            })?;
        let weight = targets.get_mut(&to_user_id).ok_or(LedgerError::NoSuchDebt {
            payer: from_user_id,
            payee: to_user_id,
        })?;
        if amount > *weight {
            return Err(LedgerError::AmountExceedsDebt {
                requested: amount,
                outstanding: *weight,
            });
        }
        *weight -= amount;
        if weight.is_zero() {
            targets.remove(&to_user_id);
        }
        Ok(())
    }

    async fn replace_group_edges(
        &self,
        group_id: Uuid,
        deltas: &[EdgeDelta],
    ) -> Result<(), LedgerError> {
        // Build the replacement fully before swapping it in, so a failure
        // here can never leave the group between old and new edge sets.
        let mut rebuilt: Adjacency = HashMap::new();
        apply_into(&mut rebuilt, deltas);

        let mut groups = self.groups.write().await;
        groups.insert(group_id, rebuilt);
        Ok(())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        if let Some(adjacency) = groups.get_mut(&group_id) {
            adjacency.remove(&user_id);
            for targets in adjacency.values_mut() {
                targets.remove(&user_id);
            }
        }
        Ok(())
    }
}
