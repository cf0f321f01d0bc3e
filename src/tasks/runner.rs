use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    db::targets::{TargetRepository, TargetRow},
    detect::classify,
    domain::Snapshot,
    fetch::PageFetcher,
    infrastructure::shutdown::ShutdownListener,
    notify::{DeliveryStatus, DispatchStatus, NotificationDispatcher},
};

/// Fired by the scheduler (or once at startup) to request a full check
/// cycle. Triggers arriving while a cycle runs coalesce in the bounded
/// channel instead of piling up.
#[derive(Debug, Clone, Copy)]
pub struct CycleTrigger;

/// Runs check cycles: fetch every enabled target, classify against the
/// stored snapshot, persist, and dispatch notifications for changes.
pub struct CheckRunner {
    repo: Arc<TargetRepository>,
    fetcher: Arc<PageFetcher>,
    dispatcher: Arc<NotificationDispatcher>,
    triggers: mpsc::Receiver<CycleTrigger>,
}

impl CheckRunner {
    pub fn new(
        repo: Arc<TargetRepository>,
        fetcher: Arc<PageFetcher>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> (Self, mpsc::Sender<CycleTrigger>) {
        let (tx, triggers) = mpsc::channel(1);
        (
            Self {
                repo,
                fetcher,
                dispatcher,
                triggers,
            },
            tx,
        )
    }

    pub fn spawn(self, shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(err) = self.run_loop(shutdown).await {
                tracing::error!(target: "runner", error = %err, "check runner crashed");
            }
        })
    }

    async fn run_loop(mut self, mut shutdown: ShutdownListener) -> Result<()> {
        loop {
            tokio::select! {
                trigger = self.triggers.recv() => {
                    if trigger.is_none() {
                        break;
                    }
                    self.run_cycle(&mut shutdown).await;
                }
                _ = shutdown.notified() => break,
            }
            if shutdown.is_triggered() {
                break;
            }
        }
        tracing::info!(target: "runner", "check runner stopped");
        Ok(())
    }

    async fn run_cycle(&self, shutdown: &mut ShutdownListener) {
        let targets = match self.repo.list_enabled().await {
            Ok(targets) => targets,
            Err(err) => {
                tracing::error!(target: "runner", error = %err, "failed to load targets");
                return;
            }
        };
        if targets.is_empty() {
            tracing::warn!(target: "runner", "no enabled targets to check");
            return;
        }

        tracing::info!(target: "runner", total = targets.len(), "check cycle started");
        for target in targets {
            if shutdown.is_triggered() {
                tracing::info!(target: "runner", "shutdown requested; aborting cycle");
                return;
            }
            if let Err(err) = self.check_target(&target, shutdown).await {
                tracing::error!(
                    target: "runner",
                    error = %err,
                    name = %target.name,
                    url = %target.url,
                    "target check failed"
                );
            }
        }
        tracing::info!(target: "runner", "check cycle completed");
    }

    /// One target, start to finish. Classification always completes
    /// before any dispatch is attempted.
    async fn check_target(&self, target: &TargetRow, shutdown: &mut ShutdownListener) -> Result<()> {
        tracing::info!(target: "runner", name = %target.name, url = %target.url, "checking target");
        let checked_at = Utc::now();

        let fetched = tokio::select! {
            res = self.fetcher.fetch(&target.url) => res,
            _ = shutdown.notified() => {
                tracing::info!(target: "runner", name = %target.name, "shutdown during fetch");
                return Ok(());
            }
        };

        if !fetched.success() {
            self.repo
                .record_check(
                    target.id,
                    checked_at,
                    false,
                    fetched.duration_ms,
                    fetched.status_code,
                    fetched.error.as_deref(),
                    None,
                )
                .await?;
            self.repo.touch_last_checked(target.id, checked_at).await?;
            return Ok(());
        }

        let html = fetched.html.unwrap_or_default();
        let current = Snapshot::capture(&html);

        let check_id = self
            .repo
            .record_check(
                target.id,
                checked_at,
                true,
                fetched.duration_ms,
                fetched.status_code,
                None,
                Some(&current.hash),
            )
            .await?;

        let previous = self.repo.load_snapshot(target.id).await?;
        let result = classify(previous.as_ref(), &html, &current);

        self.repo.store_snapshot(target.id, &current, checked_at).await?;

        if !result.has_changed {
            tracing::info!(target: "runner", name = %target.name, "no changes detected");
            return Ok(());
        }

        tracing::warn!(
            target: "runner",
            name = %target.name,
            change_type = result.change_type.as_str(),
            priority = result.priority.as_str(),
            confidence = result.confidence,
            "change detected"
        );
        let change_id = self.repo.record_change(check_id, &result).await?;

        let report = self
            .dispatcher
            .dispatch(target.id, &target.name, &target.url, &result)
            .await;

        for outcome in &report.outcomes {
            let sent_at = (outcome.status == DeliveryStatus::Sent).then(Utc::now);
            self.repo
                .record_notification(change_id, outcome, sent_at)
                .await?;
        }

        match report.status {
            DispatchStatus::Delivered => {}
            DispatchStatus::Suppressed => {
                tracing::info!(target: "runner", name = %target.name, "notification suppressed");
            }
            DispatchStatus::Failed | DispatchStatus::NoChannels => {
                tracing::error!(
                    target: "runner",
                    name = %target.name,
                    status = ?report.status,
                    "change was not delivered to any channel"
                );
            }
        }

        Ok(())
    }
}

/// Fire a cycle trigger without waiting; a cycle already queued is
/// good enough.
pub fn request_cycle(tx: &mpsc::Sender<CycleTrigger>) {
    match tx.try_send(CycleTrigger) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::debug!(target: "runner", "check cycle already queued");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!(target: "runner", "check runner is gone; trigger dropped");
        }
    }
}
