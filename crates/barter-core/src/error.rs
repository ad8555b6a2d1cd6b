use thiserror::Error;

/// The engine's single error type, aggregated across crate boundaries the
/// way `ChronxError` aggregates DAG/state/recovery failures in the teacher
/// workspace — callers match on one enum rather than threading per-crate
/// error types through every call site.
#[derive(Debug, Error)]
pub enum BarterError {
    // ── Lookup ────────────────────────────────────────────────────────────
    #[error("chain proposal not found: {0}")]
    ChainNotFound(String),

    #[error("user {user} is not a participant in chain {chain}")]
    NotAParticipant { chain: String, user: String },

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    // ── Lifecycle ─────────────────────────────────────────────────────────
    #[error("illegal transition: {action} not valid while chain is {status}")]
    IllegalTransition { action: String, status: String },

    #[error("participant {user} already accepted chain {chain}")]
    AlreadyAccepted { chain: String, user: String },

    #[error("race condition: item {0} already locked")]
    RaceLost(String),

    // ── Validation (dropped silently from discovery output, never surfaced to a user) ──
    #[error("cycle rejected: {0}")]
    ValidationReject(String),

    // ── External collaborators ───────────────────────────────────────────
    #[error("{provider} call failed: {message}")]
    ProviderFailure { provider: String, message: String },

    // ── Storage ───────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // ── Invariants ────────────────────────────────────────────────────────
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("{0}")]
    Other(String),
}
