use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of a payer or debtor list: how much of an expense
/// a single member paid or owes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub user_id: Uuid,
    pub amount: Decimal,
}

impl Share {
    pub fn new(user_id: Uuid, amount: Decimal) -> Self {
        Self { user_id, amount }
    }
}

/// A pending increment to one directed edge of the balance graph:
/// debtor owes lender `amount` more than before.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDelta {
    pub debtor_id: Uuid,
    pub lender_id: Uuid,
    pub amount: Decimal,
}
