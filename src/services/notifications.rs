use rand::Rng;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::pagination::PaginatedResponse;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::NotificationJob;
use crate::repositories;
use crate::services::errors::DomainResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotificationKind {
    CourseReviewDecision,
    InstructorVerificationDecision,
}

impl NotificationKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::CourseReviewDecision => "course_review_decision",
            Self::InstructorVerificationDecision => "instructor_verification_decision",
        }
    }
}

/// A notification to hand to the dispatcher after the state change it reports has committed.
#[derive(Debug, Clone)]
pub(crate) struct Notification {
    pub(crate) kind: NotificationKind,
    pub(crate) recipient: String,
    pub(crate) entity_id: String,
    pub(crate) revision: String,
    pub(crate) payload: serde_json::Value,
}

impl Notification {
    pub(crate) fn course_review_decision(
        recipient: &str,
        instructor_name: &str,
        request_id: &str,
        course_title: &str,
        decision: &str,
        feedback: &str,
    ) -> Self {
        Self {
            kind: NotificationKind::CourseReviewDecision,
            recipient: recipient.to_string(),
            entity_id: request_id.to_string(),
            revision: decision.to_string(),
            payload: json!({
                "instructor_name": instructor_name,
                "course_title": course_title,
                "decision": decision,
                "feedback": feedback,
            }),
        }
    }

    pub(crate) fn verification_decision(
        recipient: &str,
        request_id: &str,
        user_name: &str,
        decision: &str,
        message: &str,
    ) -> Self {
        Self {
            kind: NotificationKind::InstructorVerificationDecision,
            recipient: recipient.to_string(),
            entity_id: request_id.to_string(),
            revision: decision.to_string(),
            payload: json!({
                "user_name": user_name,
                "decision": decision,
                "message": message,
            }),
        }
    }

    /// Stable key so re-enqueueing the same event is a no-op.
    pub(crate) fn dedupe_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.recipient.as_bytes());
        hasher.update(b"|");
        hasher.update(self.entity_id.as_bytes());
        hasher.update(b"|");
        hasher.update(self.revision.as_bytes());
        hex::encode(hasher.finalize())
    }
}

pub(crate) struct NotificationsService;

impl NotificationsService {
    /// Queues a notification. Called only after the triggering transaction has
    /// committed; failures are logged and never reach the caller.
    pub(crate) async fn enqueue_after_commit(pool: &sqlx::PgPool, notification: Notification) {
        let job_id = Uuid::new_v4().to_string();
        let dedupe_key = notification.dedupe_key();
        let result = repositories::notification_jobs::enqueue(
            pool,
            repositories::notification_jobs::EnqueueJob {
                id: &job_id,
                kind: notification.kind.as_str(),
                recipient: &notification.recipient,
                payload: &notification.payload,
                dedupe_key: &dedupe_key,
                created_at: primitive_now_utc(),
            },
        )
        .await;

        match result {
            Ok(true) => {
                metrics::record_notification_job("enqueued");
                tracing::info!(
                    kind = notification.kind.as_str(),
                    entity_id = %notification.entity_id,
                    "Notification enqueued"
                );
            }
            Ok(false) => {
                tracing::debug!(
                    kind = notification.kind.as_str(),
                    entity_id = %notification.entity_id,
                    "Notification already queued"
                );
            }
            Err(err) => {
                metrics::record_notification_job("enqueue_failed");
                tracing::error!(
                    kind = notification.kind.as_str(),
                    entity_id = %notification.entity_id,
                    error = %err,
                    "Failed to enqueue notification"
                );
            }
        }
    }

    pub(crate) async fn dead_letters(
        state: &AppState,
        skip: i64,
        limit: i64,
    ) -> DomainResult<PaginatedResponse<NotificationJob>> {
        let items =
            repositories::notification_jobs::list_dead_letter(state.db(), skip, limit).await?;
        let total_count = repositories::notification_jobs::count_dead_letter(state.db()).await?;
        Ok(PaginatedResponse { items, total_count, skip, limit })
    }
}

/// Delay before retry number `attempt` (1-based): base * 2^(attempt-1) plus up to
/// one base interval of jitter.
pub(crate) fn retry_delay_seconds(base_seconds: u64, attempt: i32, rng: &mut impl Rng) -> u64 {
    let exponent = attempt.saturating_sub(1).clamp(0, 16) as u32;
    let backoff = base_seconds.saturating_mul(2u64.saturating_pow(exponent));
    let jitter = if base_seconds == 0 { 0 } else { rng.gen_range(0..=base_seconds) };
    backoff.saturating_add(jitter)
}
