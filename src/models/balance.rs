use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One directed edge of the balance graph: `from_user_id` owes
/// `to_user_id` the (strictly positive) amount.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: Decimal,
}

/// One counterparty entry of an itemized balance listing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairBalance {
    pub user_id: Uuid,
    pub amount: Decimal,
}

/// Itemized view of a member's position: who they owe and who owes them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OwedDetail {
    pub outgoing: Vec<PairBalance>,
    pub incoming: Vec<PairBalance>,
}

/// A member's net position in a group: incoming minus outgoing edge sums.
/// Positive means the member is owed money.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetBalance {
    pub user_id: Uuid,
    pub balance: Decimal,
}
