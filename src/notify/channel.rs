use serde::Serialize;

use crate::notify::message::ChannelMessage;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("telegram send failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("smtp delivery failed: {0}")]
    Smtp(String),

    #[error("channel misconfigured: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelKind {
    Telegram,
    Email,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "TELEGRAM",
            ChannelKind::Email => "EMAIL",
        }
    }
}

/// A notification transport. Implementations own their credentials and
/// connection state; the dispatcher only ever calls `send`.
#[async_trait::async_trait]
pub trait NotifyChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, message: &ChannelMessage) -> Result<(), ChannelError>;
}

/// Delivery lifecycle of one channel attempt sequence. Never reverts
/// once it leaves `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
        }
    }
}

/// Result of dispatching to a single channel: final status, how many
/// attempts were made, and the last error for operator visibility.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationOutcome {
    pub channel: ChannelKind,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl NotificationOutcome {
    pub fn pending(channel: ChannelKind) -> Self {
        Self {
            channel,
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }
}
