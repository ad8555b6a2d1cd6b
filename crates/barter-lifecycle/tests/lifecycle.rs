//! End-to-end lifecycle tests against a real `BarterDb`, covering the
//! scenarios in `spec.md` §8 that need a full `ChainCoordinator` rather
//! than a single helper function.

use std::sync::Arc;

use barter_core::clock::FixedClock;
use barter_core::{BarterConfig, BarterError, Clock, Item, ItemStatus, Money, User, UserId, WishlistEntry};
use barter_discovery::{discover, ValidCycle};
use barter_graph::{Cycle, CycleEdge};
use barter_lifecycle::ChainCoordinator;
use barter_ports::{ItemLocker, MockFeePolicy, MockNotificationSink, MockPaymentProvider, MockShippingProvider};
use barter_store::{BarterDb, ChainStatus};

fn user(id: u64, rating: f64, region: &str, trades: u32) -> User {
    User {
        id: UserId(id),
        display_name: format!("user{id}"),
        rating,
        region: Some(region.to_string()),
        completed_trades: trades,
    }
}

fn item(id: u64, owner: u64, value: i64) -> Item {
    Item {
        id: barter_core::ItemId(id),
        owner: UserId(owner),
        name: format!("item{id}"),
        value_cents: Money::cents(value),
        status: ItemStatus::Active,
    }
}

struct Harness {
    db: Arc<BarterDb>,
    coordinator: Arc<ChainCoordinator>,
    clock: Arc<FixedClock>,
    payment: Arc<MockPaymentProvider>,
    notifier: Arc<MockNotificationSink>,
    fee_policy: Arc<MockFeePolicy>,
    _dir: tempfile::TempDir,
}

fn harness(config: BarterConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(BarterDb::open(dir.path()).unwrap());
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let payment = Arc::new(MockPaymentProvider::new());
    let shipping = Arc::new(MockShippingProvider::new());
    let notifier = Arc::new(MockNotificationSink::new());
    let fee_policy = Arc::new(MockFeePolicy::new());
    let locker: Arc<dyn ItemLocker> = db.clone();

    let coordinator = Arc::new(ChainCoordinator::new(
        db.clone(),
        locker,
        payment.clone(),
        shipping,
        notifier.clone(),
        fee_policy.clone(),
        clock.clone() as Arc<dyn Clock>,
        config,
    ));

    Harness {
        db,
        coordinator,
        clock,
        payment,
        notifier,
        fee_policy,
        _dir: dir,
    }
}

/// U1/I1 <-> U2/I2 <-> U3/I3 triangle with zero cash balances (the
/// second, accepted variant of `spec.md` §8 Scenario S1).
fn happy_cycle() -> Cycle {
    Cycle {
        edges: vec![
            CycleEdge {
                from: UserId(1),
                to: UserId(2),
                item_id: barter_core::ItemId(1),
                value_cents: Money::cents(10_000),
                item_name: "item1".into(),
            },
            CycleEdge {
                from: UserId(2),
                to: UserId(3),
                item_id: barter_core::ItemId(2),
                value_cents: Money::cents(11_000),
                item_name: "item2".into(),
            },
            CycleEdge {
                from: UserId(3),
                to: UserId(1),
                item_id: barter_core::ItemId(3),
                value_cents: Money::cents(11_000),
                item_name: "item3".into(),
            },
        ],
    }
}

fn validate(cycle: &Cycle, config: &BarterConfig) -> ValidCycle {
    // Build a throwaway graph purely so `validate_cycle` has reputation/
    // trade-history metadata to check; these tests aren't exercising C1-C2.
    let users = vec![user(1, 4.5, "TX", 2), user(2, 4.0, "TX", 1), user(3, 4.8, "TX", 3)];
    let items = vec![item(1, 1, 10_000), item(2, 2, 11_000), item(3, 3, 11_000)];
    let wishlists = vec![
        WishlistEntry { user: UserId(1), item: barter_core::ItemId(3) },
        WishlistEntry { user: UserId(2), item: barter_core::ItemId(1) },
        WishlistEntry { user: UserId(3), item: barter_core::ItemId(2) },
    ];
    let graph = barter_graph::build_graph(&users, &items, &wishlists);
    let outcome = barter_discovery::validate_cycle(cycle, &graph, config);
    assert!(outcome.accepted, "{:?}", outcome.reject_reason);
    ValidCycle {
        cycle: cycle.clone(),
        outcome,
    }
}

fn seed_items(db: &BarterDb, items: &[(u64, u64, i64)]) {
    for &(id, owner, value) in items {
        db.put_item(&item(id, owner, value)).unwrap();
    }
}

/// Scenario S1 (accepted variant): a proposed chain runs the full
/// acceptance -> lock -> fund -> ship -> receive path and lands on
/// COMPLETED with every participant owning what their predecessor gave.
#[test]
fn full_happy_path_completes_and_transfers_ownership() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);

    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();

    for uid in [1, 2, 3] {
        h.coordinator.accept(chain_id, UserId(uid)).unwrap();
    }
    let (proposal, _) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert_eq!(proposal.status, ChainStatus::Locked);

    for item_id in [1u64, 2, 3] {
        assert_eq!(h.db.get_item(barter_core::ItemId(item_id)).unwrap().unwrap().status, ItemStatus::Locked);
    }

    for uid in [1, 2, 3] {
        h.coordinator.fund(chain_id, UserId(uid)).unwrap();
    }
    let (proposal, _) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert_eq!(proposal.status, ChainStatus::Shipping);

    let mut green_light = false;
    for (i, uid) in [1u64, 2, 3].into_iter().enumerate() {
        let (_, gl) = h
            .coordinator
            .submit_shipping(chain_id, UserId(uid), &format!("1234567890{i}"), None, None)
            .unwrap();
        green_light = gl;
    }
    assert!(green_light, "last submit_shipping call must report the green light");

    for uid in [1, 2, 3] {
        h.coordinator.verify_receipt(chain_id, UserId(uid)).unwrap();
    }
    let (proposal, participants) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert_eq!(proposal.status, ChainStatus::Completed);
    assert!(proposal.executed_at.is_some());

    // U1 gave I1 (to U2), received I3 (from U3); ownership must reflect that.
    for p in &participants {
        let transferred = h.db.get_item(p.receives_item_id).unwrap().unwrap();
        assert_eq!(transferred.owner, p.user_id);
        assert_eq!(transferred.status, ItemStatus::Active);
    }
}

/// Scenario S6: a fee-waived participant's `fund` call omits the platform
/// fee, charges only `max(0, cashDelta)`, and still flips `hasFunded`.
/// U1's `cashDelta` is -1000 (a net receiver), so with the fee waived the
/// component sum floors to 0 and no provider call happens at all; U2's
/// `cashDelta` is +1000 and is never waived, so it pays fee + cash.
#[test]
fn fee_waiver_skips_platform_fee() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);
    h.fee_policy.waive(UserId(1), "promo");

    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();
    for uid in [1, 2, 3] {
        h.coordinator.accept(chain_id, UserId(uid)).unwrap();
    }

    h.coordinator.fund(chain_id, UserId(1)).unwrap();
    assert!(h.payment.calls().is_empty(), "waived user with non-positive cashDelta makes no provider call");
    assert_eq!(h.fee_policy.trade_count(UserId(1)), 1, "waived fund call increments the trade counter");

    h.coordinator.fund(chain_id, UserId(2)).unwrap();
    let calls = h.payment.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        barter_ports::RecordedPaymentCall::CreateIntent(req) => {
            assert_eq!(req.fee_cents, 1_500);
            assert_eq!(req.cash_component_cents, 1_000);
            assert_eq!(req.amount_cents, 2_500);
        }
        other => panic!("expected CreateIntent, got {other:?}"),
    }

    let (_, participants) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert!(participants.iter().find(|p| p.user_id == UserId(1)).unwrap().has_funded);
    assert!(participants.iter().find(|p| p.user_id == UserId(2)).unwrap().has_funded);
}

/// Scenario S2: two proposals share item I1. Both reach final accept;
/// exactly one locks, the other fails with "already locked" and leaves no
/// orphan-locked items.
#[test]
fn race_on_shared_item_lock() {
    let h = harness(BarterConfig::default());
    seed_items(
        &h.db,
        &[(1, 1, 10_000), (2, 2, 10_000), (3, 3, 10_000), (7, 4, 10_000), (8, 5, 10_000)],
    );

    let chain_a = Cycle {
        edges: vec![
            CycleEdge { from: UserId(1), to: UserId(2), item_id: barter_core::ItemId(1), value_cents: Money::cents(10_000), item_name: "i1".into() },
            CycleEdge { from: UserId(2), to: UserId(3), item_id: barter_core::ItemId(2), value_cents: Money::cents(10_000), item_name: "i2".into() },
            CycleEdge { from: UserId(3), to: UserId(1), item_id: barter_core::ItemId(3), value_cents: Money::cents(10_000), item_name: "i3".into() },
        ],
    };
    // U1 also appears here giving item 1 again — the shared item.
    let chain_b = Cycle {
        edges: vec![
            CycleEdge { from: UserId(1), to: UserId(4), item_id: barter_core::ItemId(1), value_cents: Money::cents(10_000), item_name: "i1".into() },
            CycleEdge { from: UserId(4), to: UserId(5), item_id: barter_core::ItemId(7), value_cents: Money::cents(10_000), item_name: "i7".into() },
            CycleEdge { from: UserId(5), to: UserId(1), item_id: barter_core::ItemId(8), value_cents: Money::cents(10_000), item_name: "i8".into() },
        ],
    };

    let config = BarterConfig::default();
    let zero_balances = |cycle: &Cycle| -> ValidCycle {
        let mut balances = std::collections::HashMap::new();
        for e in &cycle.edges {
            balances.insert(e.from, Money::ZERO);
        }
        ValidCycle {
            cycle: cycle.clone(),
            outcome: barter_discovery::ValidationOutcome {
                participant_ids: cycle.participant_ids(),
                total_value_cents: Money::cents(30_000),
                cash_balances: balances,
                accepted: true,
                reject_reason: None,
                warnings: Vec::new(),
            },
        }
    };

    let chain_a_id = h.coordinator.propose_cycle(&zero_balances(&chain_a)).unwrap();
    let chain_b_id = h.coordinator.propose_cycle(&zero_balances(&chain_b)).unwrap();
    assert_ne!(chain_a_id, chain_b_id);

    for uid in [1, 2, 3] {
        h.coordinator.accept(chain_a_id, UserId(uid)).unwrap();
    }
    let (proposal_a, _) = h.coordinator.get_proposal(chain_a_id).unwrap().unwrap();
    assert_eq!(proposal_a.status, ChainStatus::Locked);

    for uid in [1, 4] {
        h.coordinator.accept(chain_b_id, UserId(uid)).unwrap();
    }
    let err = h.coordinator.accept(chain_b_id, UserId(5)).unwrap_err();
    match err {
        BarterError::RaceLost(item) => assert!(item.contains('1')),
        other => panic!("expected RaceLost, got {other:?}"),
    }

    let (proposal_b, _) = h.coordinator.get_proposal(chain_b_id).unwrap().unwrap();
    assert_eq!(proposal_b.status, ChainStatus::Failed);
    assert!(proposal_b.failed_reason.unwrap().contains("already locked"));

    // No orphan-locked items: item 7 and 8 (chain B's non-shared items)
    // must have been rolled back to active.
    assert_eq!(h.db.get_item(barter_core::ItemId(7)).unwrap().unwrap().status, ItemStatus::Active);
    assert_eq!(h.db.get_item(barter_core::ItemId(8)).unwrap().unwrap().status, ItemStatus::Active);
    // Item 1 remains locked, owned by chain A.
    assert_eq!(h.db.get_item(barter_core::ItemId(1)).unwrap().unwrap().status, ItemStatus::Locked);
}

/// Scenario S3: a rejected cycle is suppressed from re-discovery for 30
/// days, then reappears once the cooldown lapses.
#[test]
fn reject_then_rediscover_after_cooldown() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);

    let users = vec![user(1, 4.5, "TX", 2), user(2, 4.0, "TX", 1), user(3, 4.8, "TX", 3)];
    let items = vec![item(1, 1, 10_000), item(2, 2, 11_000), item(3, 3, 11_000)];
    let wishlists = vec![
        WishlistEntry { user: UserId(1), item: barter_core::ItemId(3) },
        WishlistEntry { user: UserId(2), item: barter_core::ItemId(1) },
        WishlistEntry { user: UserId(3), item: barter_core::ItemId(2) },
    ];

    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();
    h.coordinator
        .reject(chain_id, UserId(2), Some("no longer interested".into()))
        .unwrap();

    let now = h.clock.now();
    let (_, kept, _) = discover(&users, &items, &wishlists, &BarterConfig::default(), h.db.as_ref(), now);
    assert!(kept.is_empty(), "rejected cycle must be suppressed immediately after rejection");

    h.clock.advance(29 * 24 * 3600);
    let (_, kept, _) = discover(&users, &items, &wishlists, &BarterConfig::default(), h.db.as_ref(), h.clock.now());
    assert!(kept.is_empty(), "cooldown has not lapsed at +29 days");

    h.clock.advance(2 * 24 * 3600);
    let (_, kept, _) = discover(&users, &items, &wishlists, &BarterConfig::default(), h.db.as_ref(), h.clock.now());
    assert_eq!(kept.len(), 1, "cycle must reappear once the 30-day cooldown lapses");
}

/// `accept` is idempotent: a second `accept` from the same user errors
/// without mutating state.
#[test]
fn accept_twice_errors_without_mutating_state() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);
    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();

    h.coordinator.accept(chain_id, UserId(1)).unwrap();
    let err = h.coordinator.accept(chain_id, UserId(1)).unwrap_err();
    assert!(matches!(err, BarterError::AlreadyAccepted { .. }));

    let (proposal, participants) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert_eq!(proposal.status, ChainStatus::PendingAcceptance);
    assert_eq!(participants.iter().filter(|p| p.has_accepted).count(), 1);
}

/// `reject` on an already-FAILED chain is a no-op: no extra rejection
/// record, no additional refund calls, no re-notification of the other
/// participants.
#[test]
fn reject_on_already_failed_chain_is_a_no_op() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);
    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();

    h.coordinator.reject(chain_id, UserId(1), Some("first reject".into())).unwrap();
    let notifications_after_first = h.notifier.sent().len();

    let proposal = h.coordinator.reject(chain_id, UserId(2), Some("second reject".into())).unwrap();
    assert_eq!(proposal.status, ChainStatus::Failed);
    assert_eq!(proposal.failed_reason.unwrap(), "first reject", "second reject must not overwrite the reason");
    assert_eq!(h.notifier.sent().len(), notifications_after_first, "no-op reject must not notify again");
}

/// Re-discovering the same cycle while its first proposal is still open
/// returns the existing chain id instead of creating a duplicate.
#[test]
fn idempotent_reproposal_guard_returns_existing_chain() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);
    let valid = validate(&happy_cycle(), &BarterConfig::default());

    let first = h.coordinator.propose_cycle(&valid).unwrap();
    let second = h.coordinator.propose_cycle(&valid).unwrap();
    assert_eq!(first, second);
}

/// The 24h proposal expiry sweep moves a stale non-terminal proposal to
/// EXPIRED, unlocks its items, and never stores a rejection record.
#[test]
fn expiry_sweep_unlocks_items_without_a_rejection_record() {
    let h = harness(BarterConfig::default());
    seed_items(&h.db, &[(1, 1, 10_000), (2, 2, 11_000), (3, 3, 11_000)]);
    let valid = validate(&happy_cycle(), &BarterConfig::default());
    let chain_id = h.coordinator.propose_cycle(&valid).unwrap();
    for uid in [1, 2, 3] {
        h.coordinator.accept(chain_id, UserId(uid)).unwrap();
    }
    assert_eq!(h.db.get_item(barter_core::ItemId(1)).unwrap().unwrap().status, ItemStatus::Locked);

    h.clock.advance(25 * 3600);
    let expired = h.coordinator.expire_due(h.clock.now());
    assert_eq!(expired, vec![chain_id]);

    let (proposal, _) = h.coordinator.get_proposal(chain_id).unwrap().unwrap();
    assert_eq!(proposal.status, ChainStatus::Expired);
    assert_eq!(h.db.get_item(barter_core::ItemId(1)).unwrap().unwrap().status, ItemStatus::Active);
    assert!(h.db.get_rejection(&barter_discovery::fingerprint_of(&valid.cycle)).unwrap().is_none());
}
