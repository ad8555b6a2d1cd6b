use std::sync::Mutex;

use barter_core::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    ChainTradeOpportunity,
    ChainTradeLocked,
    ChainTradeShipping,
    ChainTradeCancelled,
    TrackingAdded,
    TradeCompleted,
}

/// Fire-and-forget notification sink (§6). Failures are logged by the
/// caller and never abort a transition — the trait itself has no
/// `Result` return for that reason.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: UserId, kind: NotificationKind, title: &str, body: &str);
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

#[derive(Default)]
pub struct MockNotificationSink {
    sent: Mutex<Vec<RecordedNotification>>,
}

impl MockNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<RecordedNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for MockNotificationSink {
    fn notify(&self, user_id: UserId, kind: NotificationKind, title: &str, body: &str) {
        self.sent.lock().unwrap().push(RecordedNotification {
            user_id,
            kind,
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}
