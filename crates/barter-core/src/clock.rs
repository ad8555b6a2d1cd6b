use crate::Timestamp;

/// Abstracts "now" so the 24h proposal expiry and 30d rejection cooldown
/// can be tested deterministically instead of racing the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Reads the real system clock. Used by `barter-node`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that returns a fixed, externally-advanced timestamp. Used by
/// every test that needs to simulate "31 days later" without sleeping.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: std::sync::Arc<std::sync::atomic::AtomicI64>,
}

impl FixedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::atomic::AtomicI64::new(start)),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, ts: Timestamp) {
        self.now.store(ts, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}
