pub mod channel;
pub mod dispatcher;
pub mod email;
pub mod message;
pub mod rate_limit;
pub mod telegram;

pub use channel::{DeliveryStatus, NotificationOutcome, NotifyChannel};
pub use dispatcher::{DispatchStatus, NotificationDispatcher};
pub use email::EmailChannel;
pub use rate_limit::RateLimiter;
pub use telegram::TelegramChannel;
