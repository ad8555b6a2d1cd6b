use std::collections::HashSet;

use barter_core::config::MAX_CHAIN_DEPTH;
use barter_core::{ItemId, Money, UserId};
use serde::{Deserialize, Serialize};

use crate::builder::TradeGraph;

/// One edge of a discovered cycle, carrying the external ids the rest of
/// the engine needs (the graph's internal dense indices never leak past
/// this module). `Serialize`/`Deserialize` so a discovered cycle can
/// round-trip through a log line or a snapshot file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleEdge {
    pub from: UserId,
    pub to: UserId,
    pub item_id: ItemId,
    pub value_cents: Money,
    pub item_name: String,
}

/// An ordered length-`MAX_CHAIN_DEPTH` edge list closing back on itself:
/// `edges[i].to == edges[(i + 1) % len].from`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub edges: Vec<CycleEdge>,
}

impl Cycle {
    pub fn participant_ids(&self) -> Vec<UserId> {
        self.edges.iter().map(|e| e.from).collect()
    }
}

/// Enumerate every unique length-`MAX_CHAIN_DEPTH` simple directed cycle
/// in `graph`, per `spec.md` §4.2.
///
/// For each start node, DFS over a path-of-edges stack with an in-path
/// visited set; at the target depth, accept only if the current edge
/// closes back to the start node; at shallower depths, forbid revisiting
/// the start node. Cycles are canonicalized by the sorted participant-id
/// multiset (§9: cheaper than edge-rotation normalization) and emitted
/// once globally.
pub fn enumerate_cycles(graph: &TradeGraph) -> Vec<Cycle> {
    let depth = MAX_CHAIN_DEPTH;
    let mut found: Vec<Cycle> = Vec::new();
    let mut canonical_seen: HashSet<Vec<UserId>> = HashSet::new();

    for start in 0..graph.node_count() {
        let mut path: Vec<CycleEdge> = Vec::with_capacity(depth);
        let mut visited = vec![false; graph.node_count()];
        visited[start] = true;
        dfs(graph, start, start, depth, &mut path, &mut visited, &mut found, &mut canonical_seen);
    }

    found
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    graph: &TradeGraph,
    start: usize,
    current: usize,
    target_depth: usize,
    path: &mut Vec<CycleEdge>,
    visited: &mut [bool],
    found: &mut Vec<Cycle>,
    canonical_seen: &mut HashSet<Vec<UserId>>,
) {
    for edge in graph.edges_from(current) {
        let closes_cycle = edge.to == start;

        if path.len() + 1 == target_depth {
            // Only accepting a closure at exactly the target depth.
            if !closes_cycle {
                continue;
            }
        } else if closes_cycle {
            // Closing early (wrong depth) is never a valid length-d cycle.
            continue;
        } else if visited[edge.to] {
            // Revisiting a non-start intermediate node breaks simplicity.
            continue;
        }

        let cycle_edge = CycleEdge {
            from: graph.meta(current).id,
            to: graph.meta(edge.to).id,
            item_id: edge.item_id,
            value_cents: edge.value_cents,
            item_name: edge.item_name.clone(),
        };
        path.push(cycle_edge);

        if path.len() == target_depth && closes_cycle {
            record_if_new(path, found, canonical_seen);
        } else {
            visited[edge.to] = true;
            dfs(graph, start, edge.to, target_depth, path, visited, found, canonical_seen);
            visited[edge.to] = false;
        }

        path.pop();
    }
}

fn record_if_new(
    path: &[CycleEdge],
    found: &mut Vec<Cycle>,
    canonical_seen: &mut HashSet<Vec<UserId>>,
) {
    let mut canonical: Vec<UserId> = path.iter().map(|e| e.from).collect();
    canonical.sort();
    if canonical_seen.insert(canonical) {
        found.push(Cycle {
            edges: path.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use barter_core::{Item, ItemStatus, User, WishlistEntry};

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
    fn finds_one_triangle() {
        let users = vec![user(1), user(2), user(3)];
        let items = vec![item(10, 1, 10000), item(20, 2, 12000), item(30, 3, 11000)];
        let wishlists = vec![
            WishlistEntry { user: UserId(1), item: ItemId(30) },
            WishlistEntry { user: UserId(2), item: ItemId(10) },
            WishlistEntry { user: UserId(3), item: ItemId(20) },
        ];
        let g = build_graph(&users, &items, &wishlists);
        let cycles = enumerate_cycles(&g);
        assert_eq!(cycles.len(), 1);
        let mut ids = cycles[0].participant_ids();
        ids.sort();
        assert_eq!(ids, vec![UserId(1), UserId(2), UserId(3)]);
    }

    #[test]
    fn no_cycle_for_acyclic_graph() {
        let users = vec![user(1), user(2), user(3)];
        let items = vec![item(10, 1, 10000), item(20, 2, 12000)];
        let wishlists = vec![
            WishlistEntry { user: UserId(2), item: ItemId(10) },
            WishlistEntry { user: UserId(3), item: ItemId(20) },
        ];
        let g = build_graph(&users, &items, &wishlists);
        assert!(enumerate_cycles(&g).is_empty());
    }

    #[test]
    fn rotations_deduplicated() {
        let users = vec![user(1), user(2), user(3)];
        let items = vec![item(10, 1, 10000), item(20, 2, 12000), item(30, 3, 11000)];
        let wishlists = vec![
            WishlistEntry { user: UserId(1), item: ItemId(30) },
            WishlistEntry { user: UserId(2), item: ItemId(10) },
            WishlistEntry { user: UserId(3), item: ItemId(20) },
        ];
        let g = build_graph(&users, &items, &wishlists);
        // Enumeration starts from every node; the same triangle must
        // collapse to a single emitted cycle regardless of start node.
        assert_eq!(enumerate_cycles(&g).len(), 1);
    }

    #[test]
    fn four_cycle_not_emitted_as_length_three() {
        // A -> B -> C -> D -> A is a 4-cycle; no length-3 cycle exists.
        let users = vec![user(1), user(2), user(3), user(4)];
        let items = vec![item(10, 1, 100), item(20, 2, 100), item(30, 3, 100), item(40, 4, 100)];
        let wishlists = vec![
            WishlistEntry { user: UserId(2), item: ItemId(10) },
            WishlistEntry { user: UserId(3), item: ItemId(20) },
            WishlistEntry { user: UserId(4), item: ItemId(30) },
            WishlistEntry { user: UserId(1), item: ItemId(40) },
        ];
        let g = build_graph(&users, &items, &wishlists);
        assert!(enumerate_cycles(&g).is_empty());
    }
}
