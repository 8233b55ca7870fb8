mod settlement_tests;

use crate::{InMemoryExpenses, InMemoryGraph, LedgerService};

/// Ledger with background netting disabled, so tests can assert on
/// pre-netting graph shapes and drive `simplify_debts` themselves.
pub(crate) fn ledger() -> LedgerService<InMemoryGraph, InMemoryExpenses> {
    LedgerService::new(InMemoryGraph::new(), InMemoryExpenses::new()).with_netting(false)
}
