use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use teloxide::Bot;
use tokio::{task::JoinHandle, time::timeout};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    config::AppConfig,
    db::{self, targets::TargetRepository},
    fetch::PageFetcher,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    notify::{
        message::ChannelMessage, EmailChannel, NotificationDispatcher, NotifyChannel,
        RateLimiter, TelegramChannel,
    },
    tasks::{
        runner::{request_cycle, CheckRunner},
        scheduler::configure_check_jobs,
    },
};

pub struct MonitorApp {
    _paths: ResolvedPaths,
    scheduler: JobScheduler,
    runner_handle: JoinHandle<()>,
    repo: Arc<TargetRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    admin_channel: Option<Arc<dyn NotifyChannel>>,
    shutdown: Shutdown,
}

impl MonitorApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let pool = db::init_pool(&paths.db_path).await?;
        let repo = Arc::new(TargetRepository::new(pool));
        repo.sync_from_config(&config.targets).await?;

        let http_client = Client::builder()
            .user_agent(format!("slipwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let fetcher = Arc::new(PageFetcher::new(http_client, config.fetch.clone()));

        let mut channels: Vec<Arc<dyn NotifyChannel>> = Vec::new();
        let mut admin_channel: Option<Arc<dyn NotifyChannel>> = None;
        if let (Some(token), Some(chat_id)) = (&config.telegram.bot_token, config.telegram.chat_id)
        {
            let telegram: Arc<dyn NotifyChannel> =
                Arc::new(TelegramChannel::new(Bot::new(token), chat_id));
            admin_channel = Some(telegram.clone());
            channels.push(telegram);
            tracing::info!(target: "notify", chat_id, "telegram channel configured");
        }
        if config.email.is_configured() {
            channels.push(Arc::new(EmailChannel::from_config(&config.email)?));
            tracing::info!(target: "notify", "email channel configured");
        }
        if channels.is_empty() {
            tracing::warn!(
                target: "notify",
                "no notification channels configured; changes will only be recorded"
            );
        }

        let dispatcher = Arc::new(NotificationDispatcher::new(
            channels,
            RateLimiter::new(config.notifications.cooldown),
            config.notifications.max_retries,
            config.timezone.clone(),
        ));

        let (runner, trigger) = CheckRunner::new(repo.clone(), fetcher, dispatcher.clone());
        let runner_handle = runner.spawn(shutdown.subscribe());

        let scheduler = configure_check_jobs(&config.scheduler.cron_specs, trigger.clone()).await?;

        // Initial cycle right away; the cron cadence takes over after.
        request_cycle(&trigger);

        Ok(Self {
            _paths: paths,
            scheduler,
            runner_handle,
            repo,
            dispatcher,
            admin_channel,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let MonitorApp {
            _paths: _,
            mut scheduler,
            mut runner_handle,
            repo,
            dispatcher,
            admin_channel,
            shutdown,
        } = self;

        tracing::info!(
            channels = dispatcher.channel_count(),
            "slipwatch started"
        );
        send_admin_notice(admin_channel.as_deref(), "🚀 slipwatch wurde gestartet.").await;

        let mut shutdown_listener = shutdown.subscribe();
        shutdown_listener.notified().await;
        tracing::info!("shutdown signal received (CTRL+C / SIGTERM)");

        let shutdown_timeout = Duration::from_secs(5);

        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(?err, "scheduler shutdown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        let runner_sleep = tokio::time::sleep(shutdown_timeout);
        tokio::pin!(runner_sleep);
        tokio::select! {
            res = &mut runner_handle => {
                if let Err(err) = res {
                    if err.is_panic() {
                        tracing::error!("check runner task panicked");
                    }
                }
            }
            _ = &mut runner_sleep => {
                tracing::warn!(
                    target: "runner",
                    "check runner did not stop within {:?}; aborting",
                    shutdown_timeout
                );
                runner_handle.abort();
            }
        }

        if timeout(shutdown_timeout, repo.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "database pool did not close within {:?}",
                shutdown_timeout
            );
        }

        send_admin_notice(admin_channel.as_deref(), "🛑 slipwatch wurde beendet.").await;
        tracing::info!("slipwatch stopped");
        Ok(())
    }
}

/// Operational notice to the Telegram channel, if one is configured.
/// A lost notice is never worth failing startup or shutdown over.
async fn send_admin_notice(channel: Option<&dyn NotifyChannel>, text: &str) {
    let Some(channel) = channel else { return };
    if let Err(err) = channel.send(&ChannelMessage::notice(text)).await {
        tracing::warn!(target: "notify", error = %err, "failed to send admin notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::notify::channel::{ChannelError, ChannelKind};

    struct CountingChannel {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl NotifyChannel for CountingChannel {
        fn kind(&self) -> ChannelKind {
            ChannelKind::Telegram
        }

        async fn send(&self, _message: &ChannelMessage) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::Config("down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn admin_notice_goes_through_the_channel() {
        let channel = CountingChannel {
            calls: AtomicU32::new(0),
            fail: false,
        };
        send_admin_notice(Some(&channel), "gestartet").await;
        assert_eq!(channel.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn admin_notice_without_channel_is_a_no_op() {
        send_admin_notice(None, "gestartet").await;
    }

    #[tokio::test]
    async fn admin_notice_failure_is_swallowed() {
        let channel = CountingChannel {
            calls: AtomicU32::new(0),
            fail: true,
        };
        send_admin_notice(Some(&channel), "gestartet").await;
        assert_eq!(channel.calls.load(Ordering::SeqCst), 1);
    }
}
