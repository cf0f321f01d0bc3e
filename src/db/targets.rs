use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, sqlite::SqlitePool, FromRow};

use crate::{
    config::TargetConfig,
    domain::{Classification, Snapshot},
    notify::NotificationOutcome,
};

#[derive(Debug, Clone, FromRow)]
pub struct TargetRow {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// Persistence for monitored targets and their check history. The
/// runner reads the last known snapshot here and appends check, change
/// and notification records.
#[derive(Clone)]
pub struct TargetRepository {
    pool: SqlitePool,
}

impl TargetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Reconcile the configured target list: insert new targets,
    /// refresh URLs of known ones, disable targets that disappeared
    /// from the configuration.
    pub async fn sync_from_config(&self, targets: &[TargetConfig]) -> Result<()> {
        query("UPDATE targets SET enabled = 0").execute(&self.pool).await?;
        for target in targets {
            query(
                r#"INSERT INTO targets (name, url, enabled) VALUES (?1, ?2, 1)
                   ON CONFLICT(name) DO UPDATE SET url = ?2, enabled = 1"#,
            )
            .bind(&target.name)
            .bind(&target.url)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn list_enabled(&self) -> Result<Vec<TargetRow>> {
        let rows = query_as::<_, TargetRow>(
            r#"SELECT id, name, url FROM targets WHERE enabled = 1 ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Last known snapshot for a target, or None before the first
    /// successful check.
    pub async fn load_snapshot(&self, target_id: i64) -> Result<Option<Snapshot>> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = query_as(
            r#"SELECT last_html_normalized, last_html_original, last_hash
               FROM targets WHERE id = ?1"#,
        )
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(normalized, original, hash)| {
            match (normalized, original, hash) {
                (Some(normalized_html), Some(original_html), Some(hash)) => Some(Snapshot {
                    normalized_html,
                    original_html,
                    hash,
                }),
                _ => None,
            }
        }))
    }

    pub async fn store_snapshot(
        &self,
        target_id: i64,
        snapshot: &Snapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        query(
            r#"UPDATE targets
               SET last_checked = ?2, last_hash = ?3,
                   last_html_normalized = ?4, last_html_original = ?5
               WHERE id = ?1"#,
        )
        .bind(target_id)
        .bind(checked_at)
        .bind(&snapshot.hash)
        .bind(&snapshot.normalized_html)
        .bind(&snapshot.original_html)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn touch_last_checked(
        &self,
        target_id: i64,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        query(r#"UPDATE targets SET last_checked = ?2 WHERE id = ?1"#)
            .bind(target_id)
            .bind(checked_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_check(
        &self,
        target_id: i64,
        timestamp: DateTime<Utc>,
        success: bool,
        duration_ms: i64,
        status_code: Option<i64>,
        error: Option<&str>,
        html_hash: Option<&str>,
    ) -> Result<i64> {
        let result = query(
            r#"INSERT INTO checks (target_id, timestamp, status, duration_ms, status_code, error, html_hash)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(target_id)
        .bind(timestamp)
        .bind(if success { "SUCCESS" } else { "FAILED" })
        .bind(duration_ms)
        .bind(status_code)
        .bind(error)
        .bind(html_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn record_change(&self, check_id: i64, change: &Classification) -> Result<i64> {
        let keywords_json = change
            .matched_keywords
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let result = query(
            r#"INSERT INTO changes (check_id, change_type, priority, confidence, description, diff, matched_keywords)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(check_id)
        .bind(change.change_type.as_str())
        .bind(change.priority.as_str())
        .bind(change.confidence)
        .bind(&change.description)
        .bind(&change.diff)
        .bind(keywords_json)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn record_notification(
        &self,
        change_id: i64,
        outcome: &NotificationOutcome,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        query(
            r#"INSERT INTO notifications (change_id, channel, status, attempts, error, sent_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(change_id)
        .bind(outcome.channel.as_str())
        .bind(outcome.status.as_str())
        .bind(outcome.attempts as i64)
        .bind(&outcome.last_error)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
