/// Geographic-distance contract (§6). The validator's rule 5 only warns
/// today (§9 open question: declared but never enforced); this trait
/// exists so a future product decision can harden it without touching
/// `barter-discovery`.
pub trait GeoDistance: Send + Sync {
    fn same_region(&self, a: &Option<String>, b: &Option<String>) -> bool;
}

/// Exact string match on the region tag, treating `None` as "unknown,
/// never matches".
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactRegionMatch;

impl GeoDistance for ExactRegionMatch {
    fn same_region(&self, a: &Option<String>, b: &Option<String>) -> bool {
        matches!((a, b), (Some(x), Some(y)) if x == y)
    }
}
