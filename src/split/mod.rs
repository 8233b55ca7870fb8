//! Expense decomposition: turning an expense's payer and debtor share lists
//! into a minimal set of pairwise edge increments.
//!
//! The functions here are pure and operate on copies of their inputs, so the
//! algorithm can be exercised without a live graph store. The caller applies
//! the returned deltas to the balance graph in a single store operation.

use crate::models::{EdgeDelta, Share};
use rust_decimal::Decimal;

/// Cancels the overlap for every user appearing on both sides of an expense.
///
/// A payer who is also among the debtors of their own expense must not end
/// up owing themselves; the overlapping amount is subtracted from both sides
/// and entries driven to zero are dropped.
pub fn strip_self_pairs(lenders: &[Share], debtors: &[Share]) -> (Vec<Share>, Vec<Share>) {
    let mut debtors: Vec<Share> = debtors.to_vec();
    let mut stripped_lenders = Vec::with_capacity(lenders.len());

    for entry in lenders {
        let mut lender = *entry;
        if let Some(debtor) = debtors.iter_mut().find(|d| d.user_id == lender.user_id) {
            let cancelled = lender.amount.min(debtor.amount);
            lender.amount -= cancelled;
            debtor.amount -= cancelled;
        }
        if lender.amount > Decimal::ZERO {
            stripped_lenders.push(lender);
        }
    }
    debtors.retain(|d| d.amount > Decimal::ZERO);

    (stripped_lenders, debtors)
}

/// Greedy single-pass decomposition of an expense into pairwise debts.
///
/// Treats the lender list as a stack: the current debtor is settled against
/// the top-of-stack lender for `min(remaining, remaining)` until one side is
/// exhausted, emitting one "debtor owes lender" delta per settlement.
/// Deterministic given the input order. Precondition: both sides sum to the
/// same total and every entry is strictly positive; `strip_self_pairs` has
/// already removed any user present on both sides.
pub fn decompose(lenders: &[Share], debtors: &[Share]) -> Vec<EdgeDelta> {
    let mut stack: Vec<Share> = lenders.to_vec();
    let mut deltas = Vec::new();

    let mut lender = match stack.pop() {
        Some(top) => top,
        None => return deltas,
    };

    for debtor in debtors {
        let mut owed = debtor.amount;
        while owed > Decimal::ZERO {
            if lender.amount.is_zero() {
                match stack.pop() {
                    Some(next) => lender = next,
                    None => return deltas,
                }
                continue;
            }
            let settled = owed.min(lender.amount);
            deltas.push(EdgeDelta {
                debtor_id: debtor.user_id,
                lender_id: lender.user_id,
                amount: settled,
            });
            owed -= settled;
            lender.amount -= settled;
        }
    }

    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn share(user_id: Uuid, amount: Decimal) -> Share {
        Share::new(user_id, amount)
    }

    #[test]
    fn single_lender_two_debtors() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let deltas = decompose(
            &[share(a, dec!(60))],
            &[share(b, dec!(30)), share(c, dec!(30))],
        );

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].debtor_id, b);
        assert_eq!(deltas[0].lender_id, a);
        assert_eq!(deltas[0].amount, dec!(30));
        assert_eq!(deltas[1].debtor_id, c);
        assert_eq!(deltas[1].lender_id, a);
        assert_eq!(deltas[1].amount, dec!(30));
    }

    #[test]
    fn debtor_spans_multiple_lenders() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        // Lenders form a stack, so the last lender is consumed first.
        let deltas = decompose(
            &[share(a, dec!(40)), share(b, dec!(20))],
            &[share(c, dec!(60))],
        );

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].lender_id, b);
        assert_eq!(deltas[0].amount, dec!(20));
        assert_eq!(deltas[1].lender_id, a);
        assert_eq!(deltas[1].amount, dec!(40));
        assert!(deltas.iter().all(|d| d.debtor_id == c));
    }

    #[test]
    fn emitted_amounts_conserve_the_total() {
        let users: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let lenders = vec![share(users[0], dec!(70)), share(users[1], dec!(30))];
        let debtors = vec![
            share(users[2], dec!(25)),
            share(users[3], dec!(25)),
            share(users[4], dec!(50)),
        ];

        let deltas = decompose(&lenders, &debtors);
        let total: Decimal = deltas.iter().map(|d| d.amount).sum();
        assert_eq!(total, dec!(100));
        assert!(deltas.iter().all(|d| d.amount > Decimal::ZERO));
        assert!(deltas.iter().all(|d| d.debtor_id != d.lender_id));
    }

    #[test]
    fn strip_removes_payer_from_own_debtors() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let (lenders, debtors) = strip_self_pairs(
            &[share(a, dec!(90))],
            &[share(a, dec!(30)), share(b, dec!(30)), share(c, dec!(30))],
        );

        assert_eq!(lenders, vec![share(a, dec!(60))]);
        assert_eq!(debtors, vec![share(b, dec!(30)), share(c, dec!(30))]);

        // Scenario: after stripping, decomposition yields no self-loop.
        let deltas = decompose(&lenders, &debtors);
        assert_eq!(deltas.len(), 2);
        assert!(deltas.iter().all(|d| d.debtor_id != d.lender_id));
        assert!(deltas.iter().all(|d| d.lender_id == a && d.amount == dec!(30)));
    }

    #[test]
    fn strip_drops_fully_cancelled_entries_on_both_sides() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let (lenders, debtors) = strip_self_pairs(
            &[share(a, dec!(50)), share(b, dec!(50))],
            &[share(a, dec!(50)), share(b, dec!(50))],
        );

        assert!(lenders.is_empty());
        assert!(debtors.is_empty());
        assert!(decompose(&lenders, &debtors).is_empty());
    }

    #[test]
    fn inputs_are_not_mutated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lenders = vec![share(a, dec!(10))];
        let debtors = vec![share(b, dec!(10))];

        let _ = decompose(&lenders, &debtors);
        assert_eq!(lenders[0].amount, dec!(10));
        assert_eq!(debtors[0].amount, dec!(10));
    }
}
