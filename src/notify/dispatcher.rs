use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::time::sleep;

use crate::{
    domain::Classification,
    notify::{
        channel::{DeliveryStatus, NotificationOutcome, NotifyChannel},
        message::ChannelMessage,
        rate_limit::{RateLimitKey, RateLimiter},
    },
};

/// How one dispatch call ended. Suppression is a deliberate no-op and
/// must stay distinguishable from genuine delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// At least one channel reported SENT.
    Delivered,
    /// Every configured channel exhausted its retry budget.
    Failed,
    /// Cooldown window for this (target, priority) is still open.
    Suppressed,
    /// Nothing to send to; a configuration problem, not a send failure.
    NoChannels,
}

#[derive(Debug)]
pub struct DispatchReport {
    pub status: DispatchStatus,
    pub outcomes: Vec<NotificationOutcome>,
}

impl DispatchReport {
    fn empty(status: DispatchStatus) -> Self {
        Self {
            status,
            outcomes: Vec::new(),
        }
    }

    pub fn delivered(&self) -> bool {
        self.status == DispatchStatus::Delivered
    }
}

/// Exponential backoff schedule between attempts: 5s, 15s, 45s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(5 * 3u64.saturating_pow(attempt))
}

/// Fans a classified change out to every configured channel, with
/// per-channel retry and a per-(target, priority) cooldown gate.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotifyChannel>>,
    rate_limiter: RateLimiter,
    max_retries: u32,
    timezone: String,
}

impl NotificationDispatcher {
    pub fn new(
        channels: Vec<Arc<dyn NotifyChannel>>,
        rate_limiter: RateLimiter,
        max_retries: u32,
        timezone: String,
    ) -> Self {
        Self {
            channels,
            rate_limiter,
            max_retries: max_retries.max(1),
            timezone,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a change notification for one target. Channels run
    /// independently and concurrently; a failing channel never blocks
    /// its siblings. The cooldown is only refreshed when at least one
    /// channel actually got the message out.
    pub async fn dispatch(
        &self,
        target_id: i64,
        target_name: &str,
        target_url: &str,
        change: &Classification,
    ) -> DispatchReport {
        let key = RateLimitKey {
            target_id,
            priority: change.priority,
        };
        if self.rate_limiter.is_limited(&key) {
            tracing::info!(
                target: "notify",
                target_id,
                priority = change.priority.as_str(),
                "notification suppressed by cooldown"
            );
            return DispatchReport::empty(DispatchStatus::Suppressed);
        }

        if self.channels.is_empty() {
            tracing::warn!(
                target: "notify",
                target_id,
                "no notification channels configured"
            );
            return DispatchReport::empty(DispatchStatus::NoChannels);
        }

        let message = ChannelMessage::render(target_name, target_url, &self.timezone, change);
        let outcomes = join_all(
            self.channels
                .iter()
                .map(|channel| self.deliver(channel.as_ref(), &message)),
        )
        .await;

        let sent = outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Sent)
            .count();
        tracing::info!(
            target: "notify",
            target_id,
            priority = change.priority.as_str(),
            sent,
            total = outcomes.len(),
            "notification dispatch finished"
        );

        let status = if sent > 0 {
            self.rate_limiter.record_success(key);
            DispatchStatus::Delivered
        } else {
            DispatchStatus::Failed
        };
        DispatchReport { status, outcomes }
    }

    /// Attempt one channel with bounded retries. Retries are strictly
    /// sequential so the backoff schedule is honored, and the loop
    /// stops on the first success; a message is never sent twice.
    async fn deliver(
        &self,
        channel: &dyn NotifyChannel,
        message: &ChannelMessage,
    ) -> NotificationOutcome {
        let mut outcome = NotificationOutcome::pending(channel.kind());

        for attempt in 0..self.max_retries {
            outcome.attempts = attempt + 1;
            match channel.send(message).await {
                Ok(()) => {
                    tracing::info!(
                        target: "notify",
                        channel = channel.kind().as_str(),
                        attempts = outcome.attempts,
                        "notification sent"
                    );
                    outcome.status = DeliveryStatus::Sent;
                    return outcome;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "notify",
                        channel = channel.kind().as_str(),
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %err,
                        "notification attempt failed"
                    );
                    outcome.last_error = Some(err.to_string());
                    if attempt + 1 < self.max_retries {
                        sleep(backoff_delay(attempt)).await;
                    }
                }
            }
        }

        outcome.status = DeliveryStatus::Failed;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::{
        domain::{ChangeType, Priority},
        notify::channel::{ChannelError, ChannelKind},
    };

    struct MockChannel {
        kind: ChannelKind,
        calls: AtomicU32,
        succeed_on_attempt: Option<u32>,
    }

    impl MockChannel {
        fn succeeding(kind: ChannelKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                succeed_on_attempt: Some(1),
            })
        }

        fn failing(kind: ChannelKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                succeed_on_attempt: None,
            })
        }

        fn succeeding_on(kind: ChannelKind, attempt: u32) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicU32::new(0),
                succeed_on_attempt: Some(attempt),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl NotifyChannel for MockChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn send(&self, _message: &ChannelMessage) -> Result<(), ChannelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.succeed_on_attempt {
                Some(attempt) if call >= attempt => Ok(()),
                _ => Err(ChannelError::Smtp("mock failure".to_string())),
            }
        }
    }

    fn change(priority: Priority) -> Classification {
        Classification {
            has_changed: true,
            change_type: ChangeType::Keyword,
            priority,
            confidence: 0.92,
            description: "Warteliste offen".to_string(),
            diff: Some("+warteliste\n".to_string()),
            matched_keywords: Some(vec!["warteliste".to_string()]),
        }
    }

    fn dispatcher(
        channels: Vec<Arc<dyn NotifyChannel>>,
        cooldown: Duration,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(
            channels,
            RateLimiter::new(cooldown),
            3,
            "Europe/Berlin".to_string(),
        )
    }

    #[test]
    fn backoff_schedule_is_5_15_45() {
        assert_eq!(backoff_delay(0), Duration::from_secs(5));
        assert_eq!(backoff_delay(1), Duration::from_secs(15));
        assert_eq!(backoff_delay(2), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn delivers_to_all_channels() {
        let telegram = MockChannel::succeeding(ChannelKind::Telegram);
        let email = MockChannel::succeeding(ChannelKind::Email);
        let dispatcher = dispatcher(
            vec![telegram.clone() as Arc<dyn NotifyChannel>, email.clone()],
            Duration::from_secs(600),
        );

        let report = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change(Priority::Critical))
            .await;

        assert_eq!(report.status, DispatchStatus::Delivered);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.status == DeliveryStatus::Sent && o.attempts == 1));
        assert_eq!(telegram.calls(), 1);
        assert_eq!(email.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_still_counts_as_delivered() {
        let failing = MockChannel::failing(ChannelKind::Telegram);
        let ok = MockChannel::succeeding(ChannelKind::Email);
        let dispatcher = dispatcher(vec![failing.clone() as Arc<dyn NotifyChannel>, ok.clone()], Duration::from_secs(600));

        let report = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change(Priority::Critical))
            .await;

        assert_eq!(report.status, DispatchStatus::Delivered);
        let failed = report
            .outcomes
            .iter()
            .find(|o| o.channel == ChannelKind::Telegram)
            .unwrap();
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.attempts, 3);
        assert!(failed.last_error.is_some());
        assert_eq!(failing.calls(), 3);
        assert_eq!(ok.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_on_first_success() {
        let flaky = MockChannel::succeeding_on(ChannelKind::Telegram, 2);
        let dispatcher = dispatcher(vec![flaky.clone() as Arc<dyn NotifyChannel>], Duration::from_secs(600));

        let report = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change(Priority::Important))
            .await;

        assert_eq!(report.status, DispatchStatus::Delivered);
        assert_eq!(report.outcomes[0].attempts, 2);
        // No third attempt after success.
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn all_channels_failing_reports_failure() {
        let failing = MockChannel::failing(ChannelKind::Email);
        let dispatcher = dispatcher(vec![failing.clone() as Arc<dyn NotifyChannel>], Duration::from_secs(600));

        let report = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change(Priority::Info))
            .await;

        assert_eq!(report.status, DispatchStatus::Failed);
        assert_eq!(failing.calls(), 3);
    }

    #[tokio::test]
    async fn second_dispatch_within_cooldown_is_suppressed() {
        let channel = MockChannel::succeeding(ChannelKind::Telegram);
        let dispatcher = dispatcher(vec![channel.clone() as Arc<dyn NotifyChannel>], Duration::from_secs(600));
        let change = change(Priority::Critical);

        let first = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change)
            .await;
        assert_eq!(first.status, DispatchStatus::Delivered);

        let second = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change)
            .await;
        assert_eq!(second.status, DispatchStatus::Suppressed);
        assert!(second.outcomes.is_empty());
        // Zero additional sends.
        assert_eq!(channel.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dispatch_does_not_refresh_cooldown() {
        let failing = MockChannel::failing(ChannelKind::Telegram);
        let dispatcher = dispatcher(vec![failing.clone() as Arc<dyn NotifyChannel>], Duration::from_secs(600));
        let change = change(Priority::Critical);

        let first = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change)
            .await;
        assert_eq!(first.status, DispatchStatus::Failed);

        // Not suppressed: the cooldown only starts on success.
        let second = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change)
            .await;
        assert_eq!(second.status, DispatchStatus::Failed);
        assert_eq!(failing.calls(), 6);
    }

    #[tokio::test]
    async fn no_channels_is_distinguishable_from_failure() {
        let dispatcher = dispatcher(Vec::new(), Duration::from_secs(600));
        let report = dispatcher
            .dispatch(1, "Hafen", "https://example.de", &change(Priority::Info))
            .await;
        assert_eq!(report.status, DispatchStatus::NoChannels);
        assert_ne!(report.status, DispatchStatus::Failed);
    }
}
