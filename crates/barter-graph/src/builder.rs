use std::collections::{HashMap, HashSet};

use barter_core::{Item, ItemId, ItemStatus, Money, User, UserId, WishlistEntry};
use tracing::warn;

/// Per-user metadata carried alongside the adjacency list, indexed the
/// same way as `TradeGraph::edges` for cache locality (per `spec.md` §9's
/// "reimplementation should favor an indexed adjacency structure" note).
#[derive(Clone, Debug, PartialEq)]
pub struct UserMeta {
    pub id: UserId,
    pub name: String,
    pub rating: f64,
    pub region: Option<String>,
    pub completed_trades: u32,
}

/// One outgoing edge: the owner (implicit, the row this edge lives under)
/// has an active item that `to` wishlisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub to: usize,
    pub item_id: ItemId,
    pub value_cents: Money,
    pub item_name: String,
}

/// The immutable trade graph built by a single discovery pass.
///
/// Nodes are dense `usize` indices; `index_of` maps external `UserId`s to
/// them. Rebuilding from identical inputs produces the same edge set
/// (duplication is never allowed; node/edge ordering is not guaranteed).
#[derive(Clone, Debug, Default)]
pub struct TradeGraph {
    index_of: HashMap<UserId, usize>,
    users: Vec<UserMeta>,
    edges: Vec<Vec<Edge>>,
}

impl TradeGraph {
    pub fn node_count(&self) -> usize {
        self.users.len()
    }

    pub fn index_of(&self, user: UserId) -> Option<usize> {
        self.index_of.get(&user).copied()
    }

    pub fn meta(&self, idx: usize) -> &UserMeta {
        &self.users[idx]
    }

    pub fn meta_by_id(&self, user: UserId) -> Option<&UserMeta> {
        self.index_of(user).map(|idx| self.meta(idx))
    }

    pub fn edges_from(&self, idx: usize) -> &[Edge] {
        &self.edges[idx]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.iter().map(|u| u.id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|v| v.len()).sum()
    }
}

/// Build the trade graph: edge `A -> B` exists iff `A` owns an active item
/// that `B` wishlisted, excluding self-wishlists. Unknown users referenced
/// by a wishlist entry or item are skipped with a warning rather than
/// failing the whole pass — discovery runs best-effort over a snapshot
/// that may be slightly stale relative to the inventory subsystem.
pub fn build_graph(users: &[User], items: &[Item], wishlists: &[WishlistEntry]) -> TradeGraph {
    let mut index_of = HashMap::with_capacity(users.len());
    let mut metas = Vec::with_capacity(users.len());
    for u in users {
        let idx = metas.len();
        index_of.insert(u.id, idx);
        metas.push(UserMeta {
            id: u.id,
            name: u.display_name.clone(),
            rating: u.rating,
            region: u.region.clone(),
            completed_trades: u.completed_trades,
        });
    }

    let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); metas.len()];
    let active_items: HashMap<ItemId, &Item> = items
        .iter()
        .filter(|it| it.status == ItemStatus::Active)
        .map(|it| (it.id, it))
        .collect();

    let mut seen_edges: HashSet<(UserId, UserId, ItemId)> = HashSet::new();

    for w in wishlists {
        let Some(item) = active_items.get(&w.item) else {
            continue;
        };
        if item.owner == w.user {
            // Invariant from §3: a user never wishlists their own item.
            continue;
        }
        let Some(&from_idx) = index_of.get(&item.owner) else {
            warn!(owner = %item.owner, "wishlist references item owned by unknown user");
            continue;
        };
        let Some(&to_idx) = index_of.get(&w.user) else {
            warn!(user = %w.user, "wishlist references unknown user");
            continue;
        };
        if !seen_edges.insert((item.owner, w.user, item.id)) {
            continue;
        }
        edges[from_idx].push(Edge {
            to: to_idx,
            item_id: item.id,
            value_cents: item.value_cents,
            item_name: item.name.clone(),
        });
    }

    TradeGraph {
        index_of,
        users: metas,
        edges,
    }
}
