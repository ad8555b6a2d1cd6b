use barter_core::Timestamp;
use barter_crypto::{cycle_fingerprint, CycleMember};
use barter_graph::Cycle;

/// Narrow seam onto the rejection-record table (`barter-store`'s
/// `rejected_chains` tree) so this crate never takes a dependency on the
/// storage crate for the sake of one lookup — the same "pass a trait, not
/// a concrete db handle" shape the coordinator uses for the item locker.
pub trait RejectionLookup {
    /// `true` iff a rejection record for `fingerprint` exists with
    /// `expires_at > now`.
    fn is_rejected(&self, fingerprint: &str, now: Timestamp) -> bool;
}

/// The fingerprint C4 computes for a cycle: one `CycleMember` per
/// participant, keyed by the item *they give* (`edges[i].item_id`).
pub fn fingerprint_of(cycle: &Cycle) -> String {
    let members: Vec<CycleMember> = cycle
        .edges
        .iter()
        .map(|e| CycleMember {
            user: e.from,
            gives_item: e.item_id,
        })
        .collect();
    cycle_fingerprint(&members)
}

/// Drop any cycle whose fingerprint is currently under cooldown.
pub fn filter_rejected<'a, L: RejectionLookup>(
    cycles: &'a [Cycle],
    lookup: &L,
    now: Timestamp,
) -> (Vec<&'a Cycle>, usize) {
    let mut kept = Vec::with_capacity(cycles.len());
    let mut dropped = 0usize;
    for cycle in cycles {
        let fp = fingerprint_of(cycle);
        if lookup.is_rejected(&fp, now) {
            dropped += 1;
        } else {
            kept.push(cycle);
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::{ItemId, UserId};
    use barter_graph::CycleEdge;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct FakeRejections(RefCell<HashSet<String>>);

    impl RejectionLookup for FakeRejections {
        fn is_rejected(&self, fingerprint: &str, _now: Timestamp) -> bool {
            self.0.borrow().contains(fingerprint)
        }
    }

    fn sample_cycle() -> Cycle {
        Cycle {
            edges: vec![
                CycleEdge {
                    from: UserId(1),
                    to: UserId(2),
                    item_id: ItemId(10),
                    value_cents: barter_core::Money::cents(100),
                    item_name: "a".into(),
                },
                CycleEdge {
                    from: UserId(2),
                    to: UserId(3),
                    item_id: ItemId(20),
                    value_cents: barter_core::Money::cents(100),
                    item_name: "b".into(),
                },
                CycleEdge {
                    from: UserId(3),
                    to: UserId(1),
                    item_id: ItemId(30),
                    value_cents: barter_core::Money::cents(100),
                    item_name: "c".into(),
                },
            ],
        }
    }

    #[test]
    fn drops_cycle_under_cooldown() {
        let cycle = sample_cycle();
        let fp = fingerprint_of(&cycle);
        let rejections = FakeRejections(RefCell::new(HashSet::from([fp])));
        let (kept, dropped) = filter_rejected(&[cycle], &rejections, 0);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn keeps_cycle_not_under_cooldown() {
        let cycle = sample_cycle();
        let rejections = FakeRejections(RefCell::new(HashSet::new()));
        let (kept, dropped) = filter_rejected(&[cycle], &rejections, 0);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }
}
