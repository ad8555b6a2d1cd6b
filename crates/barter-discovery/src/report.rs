use std::collections::HashMap;

use barter_core::{BarterConfig, Item, Timestamp, User, WishlistEntry};
use barter_graph::{build_graph, enumerate_cycles, Cycle, TradeGraph};
use tracing::info;

use crate::rejection::{filter_rejected, RejectionLookup};
use crate::validate::{validate_cycle, ValidationOutcome};

/// One accepted cycle paired with the validation outcome that accepted it
/// (kept together so a caller never has to recompute balances to log or
/// persist them).
#[derive(Clone, Debug)]
pub struct ValidCycle {
    pub cycle: Cycle,
    pub outcome: ValidationOutcome,
}

/// Tally of what happened during one discovery pass, so a caller can tell
/// *why* a pass yielded zero proposals instead of guessing (§2 supplement:
/// nothing in the Non-goals excludes this, and without it an empty result
/// is indistinguishable from "nothing to discover" and "everything got
/// filtered").
#[derive(Clone, Debug, Default)]
pub struct DiscoveryReport {
    pub edges_built: usize,
    pub cycles_enumerated: usize,
    pub cycles_rejected_by_reason: HashMap<&'static str, usize>,
    pub cycles_rejected_by_cooldown: usize,
    pub cycles_proposed: usize,
}

/// Run the full discovery pipeline: build the graph, enumerate length-3
/// cycles, validate each (C3), then drop any still under the rejection
/// cooldown (C4).
pub fn discover<L: RejectionLookup>(
    users: &[User],
    items: &[Item],
    wishlists: &[WishlistEntry],
    config: &BarterConfig,
    rejections: &L,
    now: Timestamp,
) -> (TradeGraph, Vec<ValidCycle>, DiscoveryReport) {
    let graph = build_graph(users, items, wishlists);
    let all_cycles = enumerate_cycles(&graph);

    let mut report = DiscoveryReport {
        edges_built: graph.edge_count(),
        cycles_enumerated: all_cycles.len(),
        ..Default::default()
    };

    let mut accepted: Vec<ValidCycle> = Vec::new();
    for cycle in all_cycles {
        let outcome = validate_cycle(&cycle, &graph, config);
        if outcome.accepted {
            accepted.push(ValidCycle { cycle, outcome });
        } else {
            let reason = outcome
                .reject_reason
                .as_deref()
                .and_then(|r| r.split(':').next())
                .unwrap_or("unknown");
            let key = match reason {
                "min_reputation" => "min_reputation",
                "min_trades_completed" => "min_trades_completed",
                "positive_value" => "positive_value",
                "value_tolerance" => "value_tolerance",
                _ => "unknown",
            };
            *report.cycles_rejected_by_reason.entry(key).or_insert(0) += 1;
        }
    }

    let accepted_cycles: Vec<Cycle> = accepted.iter().map(|vc| vc.cycle.clone()).collect();
    let (kept_refs, dropped) = filter_rejected(&accepted_cycles, rejections, now);
    report.cycles_rejected_by_cooldown = dropped;

    let kept_fingerprints: std::collections::HashSet<String> =
        kept_refs.iter().map(|c| crate::rejection::fingerprint_of(c)).collect();
    let kept: Vec<ValidCycle> = accepted
        .into_iter()
        .filter(|vc| kept_fingerprints.contains(&crate::rejection::fingerprint_of(&vc.cycle)))
        .collect();

    report.cycles_proposed = kept.len();
    info!(
        edges_built = report.edges_built,
        cycles_enumerated = report.cycles_enumerated,
        cycles_rejected_by_cooldown = report.cycles_rejected_by_cooldown,
        cycles_proposed = report.cycles_proposed,
        "discovery pass complete"
    );

    (graph, kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::{ItemId, ItemStatus, Money, UserId};

    struct NoRejections;
    impl RejectionLookup for NoRejections {
        fn is_rejected(&self, _fingerprint: &str, _now: Timestamp) -> bool {
            false
        }
    }

    fn user(id: u64) -> User {
        User {
            id: UserId(id),
            display_name: format!("u{id}"),
            rating: 4.5,
            region: Some("TX".into()),
            completed_trades: 1,
        }
    }

    fn item(id: u64, owner: u64, value: i64) -> Item {
        Item {
            id: ItemId(id),
            owner: UserId(owner),
            name: format!("i{id}"),
            value_cents: Money::cents(value),
            status: ItemStatus::Active,
        }
    }

    #[test]
    fn happy_path_yields_one_proposal() {
        let users = vec![user(1), user(2), user(3)];
        let items = vec![item(1, 1, 10000), item(2, 2, 11000), item(3, 3, 11000)];
        let wishlists = vec![
            WishlistEntry { user: UserId(1), item: ItemId(3) },
            WishlistEntry { user: UserId(2), item: ItemId(1) },
            WishlistEntry { user: UserId(3), item: ItemId(2) },
        ];
        let (_, valid, report) =
            discover(&users, &items, &wishlists, &BarterConfig::default(), &NoRejections, 0);
        assert_eq!(valid.len(), 1);
        assert_eq!(report.cycles_proposed, 1);
        assert_eq!(report.cycles_enumerated, 1);
    }

    #[test]
    fn report_tallies_validation_rejections() {
        let users = vec![
            User { rating: 1.0, ..user(1) },
            user(2),
            user(3),
        ];
        let items = vec![item(1, 1, 10000), item(2, 2, 10000), item(3, 3, 10000)];
        let wishlists = vec![
            WishlistEntry { user: UserId(1), item: ItemId(3) },
            WishlistEntry { user: UserId(2), item: ItemId(1) },
            WishlistEntry { user: UserId(3), item: ItemId(2) },
        ];
        let (_, valid, report) =
            discover(&users, &items, &wishlists, &BarterConfig::default(), &NoRejections, 0);
        assert!(valid.is_empty());
        assert_eq!(report.cycles_rejected_by_reason.get("min_reputation"), Some(&1));
    }
}
