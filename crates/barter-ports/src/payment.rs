use std::sync::Mutex;

use barter_core::{BarterError, ChainId, UserId};
use serde::{Deserialize, Serialize};

/// Request to open a manual-capture payment intent, per `spec.md` §6.
/// `Serialize`/`Deserialize` so a request can be logged or replayed
/// verbatim from a test fixture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub chain_id: ChainId,
    pub user_id: UserId,
    pub fee_cents: i64,
    pub cash_component_cents: i64,
    pub waived: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentHandle {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub provider_reference: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub destination_account: String,
    pub amount_cents: i64,
    pub currency: String,
    pub chain_id: ChainId,
    pub user_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferHandle {
    pub id: String,
}

/// The payment provider contract (§6). `capture_payment`/`refund_payment`
/// act on a previously created intent's `provider_reference`.
pub trait PaymentProvider: Send + Sync {
    fn create_payment_intent(&self, req: CreateIntentRequest) -> Result<IntentHandle, BarterError>;
    fn capture_payment(&self, provider_reference: &str) -> Result<(), BarterError>;
    fn refund_payment(&self, provider_reference: &str, amount_cents: Option<i64>) -> Result<(), BarterError>;
    /// `None` when the destination account has no connected payouts (the
    /// escrow orchestrator falls back to a `pending_onboarding` payout).
    fn transfer(&self, req: TransferRequest) -> Result<Option<TransferHandle>, BarterError>;
    fn has_payouts_enabled(&self, user_id: UserId) -> bool;
}

/// One recorded call, for assertions in `barter-lifecycle`'s integration
/// tests — the same "record every call, assert on the log" shape the
/// teacher's in-memory test fakes use.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedPaymentCall {
    CreateIntent(CreateIntentRequest),
    Capture(String),
    Refund(String, Option<i64>),
    Transfer(TransferRequest),
}

#[derive(Default)]
pub struct MockPaymentProvider {
    calls: Mutex<Vec<RecordedPaymentCall>>,
    payouts_enabled: Mutex<std::collections::HashSet<UserId>>,
    next_id: Mutex<u64>,
    fail_capture: Mutex<bool>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_payouts(&self, user_id: UserId) {
        self.payouts_enabled.lock().unwrap().insert(user_id);
    }

    pub fn set_fail_capture(&self, fail: bool) {
        *self.fail_capture.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> Vec<RecordedPaymentCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reference(&self) -> String {
        let mut n = self.next_id.lock().unwrap();
        *n += 1;
        format!("pi_mock_{n}")
    }
}

impl PaymentProvider for MockPaymentProvider {
    fn create_payment_intent(&self, req: CreateIntentRequest) -> Result<IntentHandle, BarterError> {
        let reference = self.next_reference();
        self.calls
            .lock()
            .unwrap()
            .push(RecordedPaymentCall::CreateIntent(req));
        Ok(IntentHandle {
            id: reference.clone(),
            client_secret: Some(format!("{reference}_secret")),
            status: "requires_capture".into(),
            provider_reference: reference,
        })
    }

    fn capture_payment(&self, provider_reference: &str) -> Result<(), BarterError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedPaymentCall::Capture(provider_reference.to_string()));
        if *self.fail_capture.lock().unwrap() {
            return Err(BarterError::ProviderFailure {
                provider: "mock_payment".into(),
                message: "capture forced to fail".into(),
            });
        }
        Ok(())
    }

    fn refund_payment(&self, provider_reference: &str, amount_cents: Option<i64>) -> Result<(), BarterError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedPaymentCall::Refund(provider_reference.to_string(), amount_cents));
        Ok(())
    }

    fn transfer(&self, req: TransferRequest) -> Result<Option<TransferHandle>, BarterError> {
        let enabled = self.payouts_enabled.lock().unwrap().contains(&req.user_id);
        self.calls
            .lock()
            .unwrap()
            .push(RecordedPaymentCall::Transfer(req));
        if !enabled {
            return Ok(None);
        }
        Ok(Some(TransferHandle {
            id: self.next_reference(),
        }))
    }

    fn has_payouts_enabled(&self, user_id: UserId) -> bool {
        self.payouts_enabled.lock().unwrap().contains(&user_id)
    }
}
