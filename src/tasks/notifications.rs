use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use time::OffsetDateTime;

use crate::core::config::Settings;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::NotificationJob;
use crate::repositories;
use crate::services::notifications::retry_delay_seconds;

/// Jobs locked longer than this are assumed to belong to a dead worker.
pub(crate) const STALE_AFTER: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureAction {
    Retry,
    DeadLetter,
}

/// `attempts` already counts the delivery that just failed.
pub(crate) fn failure_action(attempts: i32, max_attempts: i32) -> FailureAction {
    if attempts >= max_attempts.max(1) {
        FailureAction::DeadLetter
    } else {
        FailureAction::Retry
    }
}

/// Delivers notification jobs to the configured webhook, or to the log when none is set.
#[derive(Clone)]
pub(crate) struct NotificationDispatcher {
    client: Client,
    webhook_url: Option<String>,
}

impl NotificationDispatcher {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let notifications = settings.notifications();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(notifications.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        let webhook_url = Some(notifications.webhook_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if webhook_url.is_none() {
            tracing::warn!("NOTIFICATION_WEBHOOK_URL not set; notifications will only be logged");
        }

        Ok(Self { client, webhook_url })
    }

    async fn deliver(&self, job: &NotificationJob) -> Result<()> {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::info!(
                job_id = %job.id,
                kind = %job.kind,
                recipient = %job.recipient,
                payload = %job.payload.0,
                "Notification (log delivery)"
            );
            return Ok(());
        };

        let body = json!({
            "id": job.id,
            "kind": job.kind,
            "recipient": job.recipient,
            "payload": job.payload.0,
        });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("Webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("webhook returned {status}");
        }
        Ok(())
    }
}

/// Claims and delivers one job. Returns false when the queue had nothing due.
pub(crate) async fn process_next(state: &AppState, dispatcher: &NotificationDispatcher) -> Result<bool> {
    let Some(job) = repositories::notification_jobs::claim_next(state.db(), primitive_now_utc())
        .await
        .context("Failed to claim notification job")?
    else {
        return Ok(false);
    };

    match dispatcher.deliver(&job).await {
        Ok(()) => {
            repositories::notification_jobs::mark_sent(state.db(), &job.id, primitive_now_utc())
                .await
                .context("Failed to mark notification sent")?;
            metrics::record_notification_job("sent");
            tracing::info!(job_id = %job.id, kind = %job.kind, attempts = job.attempts, "Notification sent");
        }
        Err(err) => handle_failure(state, &job, &format!("{err:#}")).await?,
    }

    Ok(true)
}

async fn handle_failure(state: &AppState, job: &NotificationJob, error: &str) -> Result<()> {
    let settings = state.settings().notifications();
    let now = OffsetDateTime::now_utc();

    match failure_action(job.attempts, settings.max_attempts) {
        FailureAction::Retry => {
            let delay = retry_delay_seconds(
                settings.backoff_base_seconds,
                job.attempts,
                &mut rand::thread_rng(),
            );
            let run_after = now + time::Duration::seconds(i64::try_from(delay).unwrap_or(i64::MAX));
            repositories::notification_jobs::schedule_retry(
                state.db(),
                &job.id,
                error,
                to_primitive_utc(run_after),
                to_primitive_utc(now),
            )
            .await
            .context("Failed to schedule notification retry")?;
            metrics::record_notification_job("retried");
            tracing::warn!(
                job_id = %job.id,
                kind = %job.kind,
                attempts = job.attempts,
                retry_in_seconds = delay,
                error,
                "Notification delivery failed; retry scheduled"
            );
        }
        FailureAction::DeadLetter => {
            repositories::notification_jobs::mark_dead_letter(
                state.db(),
                &job.id,
                error,
                to_primitive_utc(now),
            )
            .await
            .context("Failed to dead-letter notification")?;
            metrics::record_notification_job("dead_letter");
            tracing::error!(
                job_id = %job.id,
                kind = %job.kind,
                attempts = job.attempts,
                error,
                "Notification moved to dead letter"
            );
        }
    }
    Ok(())
}

pub(crate) async fn recover_stale_jobs(state: &AppState) -> Result<u64> {
    let now = OffsetDateTime::now_utc();
    let stale_before = now - STALE_AFTER;
    let recovered = repositories::notification_jobs::recover_stale(
        state.db(),
        to_primitive_utc(stale_before),
        to_primitive_utc(now),
    )
    .await
    .context("Failed to recover stale notification jobs")?;

    if recovered > 0 {
        tracing::warn!(recovered, "Returned stale notification jobs to the queue");
    }
    Ok(recovered)
}
