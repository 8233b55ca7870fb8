use super::share::{EdgeDelta, Share};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable ledger record of one expense event. The balance graph is derived
/// state; this record is the source of truth for history and for producing
/// the reversal lists on update/delete.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub amount: rust_decimal::Decimal,
    pub payer_shares: Vec<Share>,
    pub debtor_shares: Vec<Share>,
    pub category: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when a delete is committed to the ledger; the record is removed
    /// for good once its pending reversal reaches the graph.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Graph deltas committed to the ledger but not yet written to the
    /// graph. Non-empty only between the two store writes of a mutation;
    /// replayed before the group's next mutation.
    pub pending_deltas: Vec<EdgeDelta>,
}
