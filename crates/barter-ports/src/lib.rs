//! barter-ports
//!
//! Trait objects for every external collaborator named out-of-scope by
//! `spec.md` §1: payment provider, shipping provider, notification sink,
//! fee-policy, geographic distance, and the item-lock storage seam. Each
//! module also ships an in-memory test double, the same "abstract
//! collaborator behind an `Arc<dyn Trait>`" shape the teacher workspace
//! uses for `RpcServerState`'s optional transaction-sender channel.

pub mod fee;
pub mod geo;
pub mod locking;
pub mod notification;
pub mod payment;
pub mod shipping;

pub use fee::{FeeDecision, FeePolicy, MockFeePolicy};
pub use geo::{ExactRegionMatch, GeoDistance};
pub use locking::ItemLocker;
pub use notification::{MockNotificationSink, NotificationKind, NotificationSink, RecordedNotification};
pub use payment::{
    CreateIntentRequest, IntentHandle, MockPaymentProvider, PaymentProvider, RecordedPaymentCall,
    TransferHandle, TransferRequest,
};
pub use shipping::{detect_carrier, Carrier, MockShippingProvider, RecordedTrackingCall, ShippingProvider};
