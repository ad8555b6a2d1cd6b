use std::collections::HashMap;
use std::sync::Mutex;

use barter_core::UserId;

#[derive(Clone, Debug, PartialEq)]
pub struct FeeDecision {
    pub is_waived: bool,
    pub reason: String,
}

/// The fee-policy contract (§6).
pub trait FeePolicy: Send + Sync {
    fn calculate_trade_fee(&self, user_id: UserId) -> FeeDecision;
    fn increment_trade_counter(&self, user_id: UserId);
}

/// Always charges the platform fee unless the user id was explicitly
/// enrolled in a waiver via [`MockFeePolicy::waive`].
#[derive(Default)]
pub struct MockFeePolicy {
    waived: Mutex<HashMap<UserId, String>>,
    counters: Mutex<HashMap<UserId, u32>>,
}

impl MockFeePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waive(&self, user_id: UserId, reason: &str) {
        self.waived.lock().unwrap().insert(user_id, reason.to_string());
    }

    pub fn trade_count(&self, user_id: UserId) -> u32 {
        *self.counters.lock().unwrap().get(&user_id).unwrap_or(&0)
    }
}

impl FeePolicy for MockFeePolicy {
    fn calculate_trade_fee(&self, user_id: UserId) -> FeeDecision {
        match self.waived.lock().unwrap().get(&user_id) {
            Some(reason) => FeeDecision {
                is_waived: true,
                reason: reason.clone(),
            },
            None => FeeDecision {
                is_waived: false,
                reason: "standard platform fee".into(),
            },
        }
    }

    fn increment_trade_counter(&self, user_id: UserId) {
        *self.counters.lock().unwrap().entry(user_id).or_insert(0) += 1;
    }
}
