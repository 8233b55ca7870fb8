use super::ledger;
use crate::error::LedgerError;
use crate::models::Share;
use crate::{InMemoryExpenses, InMemoryGraph, LedgerService};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Group of three with A having paid 60 split evenly between B and C:
/// edges B -> A: 30 and C -> A: 30.
async fn seeded_group(
    service: &LedgerService<InMemoryGraph, InMemoryExpenses>,
) -> (Uuid, Uuid, Uuid, Uuid) {
    let group = Uuid::new_v4();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    service
        .create_expense(
            group,
            dec!(60),
            vec![Share::new(a, dec!(60))],
            vec![Share::new(b, dec!(30)), Share::new(c, dec!(30))],
            None,
            a,
        )
        .await
        .unwrap();
    (group, a, b, c)
}

#[tokio::test]
async fn exact_settlement_deletes_the_edge_and_nothing_else() {
    let service = ledger();
    let (group, a, b, c) = seeded_group(&service).await;

    service.settle(group, b, a, dec!(30), b).await.unwrap();

    let b_detail = service.owed_detail(b, group).await.unwrap();
    assert!(b_detail.outgoing.is_empty());

    let c_detail = service.owed_detail(c, group).await.unwrap();
    assert_eq!(c_detail.outgoing.len(), 1);
    assert_eq!(c_detail.outgoing[0].user_id, a);
    assert_eq!(c_detail.outgoing[0].amount, dec!(30));
}

#[tokio::test]
async fn partial_settlement_decrements_the_edge() {
    let service = ledger();
    let (group, a, b, _) = seeded_group(&service).await;

    // The payee may request the settlement too.
    service.settle(group, b, a, dec!(10), a).await.unwrap();

    let b_detail = service.owed_detail(b, group).await.unwrap();
    assert_eq!(b_detail.outgoing.len(), 1);
    assert_eq!(b_detail.outgoing[0].amount, dec!(20));
    assert_eq!(service.net_balance_of(b, group).await.unwrap(), dec!(-20));
}

#[tokio::test]
async fn settlement_above_the_edge_weight_is_rejected() {
    let service = ledger();
    let (group, a, b, _) = seeded_group(&service).await;

    let result = service.settle(group, b, a, dec!(45), b).await;
    assert!(matches!(
        result,
        Err(LedgerError::AmountExceedsDebt { requested, outstanding })
            if requested == dec!(45) && outstanding == dec!(30)
    ));

    // Graph unchanged on failure.
    let b_detail = service.owed_detail(b, group).await.unwrap();
    assert_eq!(b_detail.outgoing[0].amount, dec!(30));
}

#[tokio::test]
async fn settlement_against_a_missing_edge_is_rejected() {
    let service = ledger();
    let (group, a, b, c) = seeded_group(&service).await;

    // C owes A, not B.
    let result = service.settle(group, c, b, dec!(10), c).await;
    assert!(matches!(
        result,
        Err(LedgerError::NoSuchDebt { payer, payee }) if payer == c && payee == b
    ));

    // A owes nobody.
    let result = service.settle(group, a, b, dec!(10), a).await;
    assert!(matches!(result, Err(LedgerError::NoSuchDebt { .. })));
}

#[tokio::test]
async fn only_a_party_to_the_debt_may_settle_it() {
    let service = ledger();
    let (group, a, b, c) = seeded_group(&service).await;

    let result = service.settle(group, b, a, dec!(30), c).await;
    assert!(matches!(result, Err(LedgerError::Unauthorized(id)) if id == c));

    let b_detail = service.owed_detail(b, group).await.unwrap();
    assert_eq!(b_detail.outgoing[0].amount, dec!(30));
}

#[tokio::test]
async fn non_positive_settlement_amounts_are_rejected() {
    let service = ledger();
    let (group, a, b, _) = seeded_group(&service).await;

    let result = service.settle(group, b, a, dec!(0), b).await;
    assert!(matches!(result, Err(LedgerError::InvalidSettlementAmount)));

    let result = service.settle(group, b, a, dec!(-5), b).await;
    assert!(matches!(result, Err(LedgerError::InvalidSettlementAmount)));
}

#[tokio::test]
async fn removed_member_loses_all_incident_edges() {
    let service = ledger();
    let (group, a, b, c) = seeded_group(&service).await;

    service.remove_member(group, b).await.unwrap();

    assert!(service.owed_detail(b, group).await.unwrap().outgoing.is_empty());
    assert!(service.owed_detail(b, group).await.unwrap().incoming.is_empty());
    assert_eq!(service.net_balance_of(a, group).await.unwrap(), dec!(30));
    assert_eq!(service.net_balance_of(c, group).await.unwrap(), dec!(-30));
}
