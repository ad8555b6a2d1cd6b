use std::collections::HashMap;

use barter_core::{BarterConfig, Money, UserId};
use barter_graph::{Cycle, TradeGraph};

/// Result of running C3's rules over one discovered cycle.
///
/// Always carries the computed balances, even on rejection, so a caller
/// inspecting a rejected outcome can still log what was rejected and why.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationOutcome {
    pub participant_ids: Vec<UserId>,
    pub total_value_cents: Money,
    pub cash_balances: HashMap<UserId, Money>,
    pub accepted: bool,
    pub reject_reason: Option<String>,
    /// Non-fatal findings (currently only the geographic rule, §4.3 rule 5).
    pub warnings: Vec<String>,
}

/// A short machine-stable tag for *why* a cycle was rejected, used to tally
/// `DiscoveryReport` counts without parsing the human reason string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    MinReputation,
    MinTradesCompleted,
    PositiveValue,
    ValueTolerance,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::MinReputation => "min_reputation",
            RejectReason::MinTradesCompleted => "min_trades_completed",
            RejectReason::PositiveValue => "positive_value",
            RejectReason::ValueTolerance => "value_tolerance",
        }
    }
}

/// Apply C3's five rules, in order, short-circuiting on the first failure.
/// Rule 5 (geographic) never rejects; it only appends a warning.
pub fn validate_cycle(cycle: &Cycle, graph: &TradeGraph, config: &BarterConfig) -> ValidationOutcome {
    let len = cycle.edges.len();
    let participant_ids = cycle.participant_ids();
    let total_value_cents = cycle
        .edges
        .iter()
        .fold(Money::ZERO, |acc, e| acc + e.value_cents);

    let mut cash_balances = HashMap::with_capacity(len);
    for (i, edge) in cycle.edges.iter().enumerate() {
        let receives = cycle.edges[(i + len - 1) % len].value_cents;
        cash_balances.insert(edge.from, edge.value_cents - receives);
    }

    let mut outcome = ValidationOutcome {
        participant_ids: participant_ids.clone(),
        total_value_cents,
        cash_balances,
        accepted: true,
        reject_reason: None,
        warnings: Vec::new(),
    };

    // Rule 1: minimum reputation.
    for uid in &participant_ids {
        let Some(meta) = graph.meta_by_id(*uid) else {
            return reject(outcome, RejectReason::MinReputation, format!("participant {uid} missing from graph"));
        };
        if meta.rating < config.min_reputation {
            return reject(
                outcome,
                RejectReason::MinReputation,
                format!("{uid} rating {:.2} below floor {:.2}", meta.rating, config.min_reputation),
            );
        }
    }

    // Rule 2: minimum trade history.
    for uid in &participant_ids {
        let meta = graph.meta_by_id(*uid).expect("checked above");
        if meta.completed_trades < config.min_trades_completed {
            return reject(
                outcome,
                RejectReason::MinTradesCompleted,
                format!(
                    "{uid} completed_trades {} below floor {}",
                    meta.completed_trades, config.min_trades_completed
                ),
            );
        }
    }

    // Rule 3: positive value.
    for edge in &cycle.edges {
        if !edge.value_cents.is_positive() {
            return reject(
                outcome,
                RejectReason::PositiveValue,
                format!("item {} has non-positive value", edge.item_id),
            );
        }
    }

    // Rule 4: value tolerance.
    let avg = total_value_cents.as_cents() as f64 / len as f64;
    let max_delta = outcome
        .cash_balances
        .values()
        .map(|m| m.abs().as_cents())
        .max()
        .unwrap_or(0) as f64;
    let tolerance_pct = if avg == 0.0 { 0.0 } else { (max_delta / avg) * 100.0 };
    if tolerance_pct > config.value_tolerance_percent {
        return reject(
            outcome,
            RejectReason::ValueTolerance,
            format!(
                "balance tolerance {:.1}% exceeds configured {:.1}%",
                tolerance_pct, config.value_tolerance_percent
            ),
        );
    }

    // Rule 5: geographic constraint. Warn-only, per spec.md §9's open
    // question: declared but never enforced.
    for uid in &participant_ids {
        let meta = graph.meta_by_id(*uid).expect("checked above");
        if meta.region.is_none() {
            outcome.warnings.push(format!("{uid} has unknown region"));
        }
    }

    outcome
}

fn reject(mut outcome: ValidationOutcome, reason: RejectReason, detail: String) -> ValidationOutcome {
    outcome.accepted = false;
    outcome.reject_reason = Some(format!("{}: {detail}", reason.as_str()));
    outcome
}
