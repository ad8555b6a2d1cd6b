use std::sync::Mutex;

use barter_core::{BarterError, ChainId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Carrier {
    Usps,
    Ups,
    Fedex,
    Dhl,
    Unknown,
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Carrier::Usps => "USPS",
            Carrier::Ups => "UPS",
            Carrier::Fedex => "FEDEX",
            Carrier::Dhl => "DHL",
            Carrier::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Infer a carrier from a tracking number's shape, per `spec.md` §6's
/// documented regex rules. Order matters only in that USPS and UPS
/// formats cannot collide with FedEx/DHL's pure-digit formats; checked
/// most-specific first.
pub fn detect_carrier(tracking_number: &str) -> Carrier {
    let t = tracking_number.trim();

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    // UPS: "1Z" + 16 chars from [A-Z0-9].
    if t.len() == 18
        && t.starts_with("1Z")
        && t[2..].bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return Carrier::Ups;
    }

    // USPS: 9 followed by 19-21 digits, or a 91-94 service-type prefix.
    if all_digits(t) {
        if t.starts_with('9') && (20..=22).contains(&t.len()) {
            return Carrier::Usps;
        }
        if t.len() >= 2 && matches!(&t[0..2], "91" | "92" | "93" | "94") {
            return Carrier::Usps;
        }
    }

    // DHL: exactly 10 digits, or "JD" + 18 digits.
    if all_digits(t) && t.len() == 10 {
        return Carrier::Dhl;
    }
    if t.len() == 20 && t.starts_with("JD") && all_digits(&t[2..]) {
        return Carrier::Dhl;
    }

    // FedEx: 12-15 digits, or exactly 22 digits.
    if all_digits(t) && ((12..=15).contains(&t.len()) || t.len() == 22) {
        return Carrier::Fedex;
    }

    Carrier::Unknown
}

/// The shipping/tracking provider contract (§6).
pub trait ShippingProvider: Send + Sync {
    fn create_tracking_record(
        &self,
        chain_id: ChainId,
        user_id: UserId,
        tracking_number: &str,
        carrier: Carrier,
    ) -> Result<(), BarterError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedTrackingCall {
    pub chain_id: ChainId,
    pub user_id: UserId,
    pub tracking_number: String,
    pub carrier: Carrier,
}

#[derive(Default)]
pub struct MockShippingProvider {
    calls: Mutex<Vec<RecordedTrackingCall>>,
}

impl MockShippingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedTrackingCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ShippingProvider for MockShippingProvider {
    fn create_tracking_record(
        &self,
        chain_id: ChainId,
        user_id: UserId,
        tracking_number: &str,
        carrier: Carrier,
    ) -> Result<(), BarterError> {
        self.calls.lock().unwrap().push(RecordedTrackingCall {
            chain_id,
            user_id,
            tracking_number: tracking_number.to_string(),
            carrier,
        });
        Ok(())
    }
}
