use uuid::Uuid;

use crate::api::pagination::PaginatedResponse;
use crate::core::metrics;
use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::CourseReviewRequest;
use crate::db::types::{CourseStatus, Decision, ReviewRequestStatus};
use crate::repositories;
use crate::repositories::courses::DecisionWrite;
use crate::repositories::review_requests::CreateReviewRequest;
use crate::services::course_drafts::{invalidate_instructor_cache, load_owned};
use crate::services::course_outline;
use crate::services::errors::{DomainError, DomainResult};
use crate::services::notifications::{Notification, NotificationsService};

#[derive(Debug)]
pub(crate) enum SubmitOutcome {
    Submitted(CourseReviewRequest),
    /// A pending request already existed; nothing was written.
    AlreadyPending(CourseReviewRequest),
}

pub(crate) struct CourseReviewService;

impl CourseReviewService {
    /// Opens a review request and moves the draft into review in one transaction.
    pub(crate) async fn submit(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
    ) -> DomainResult<SubmitOutcome> {
        let mut tx = state.db().begin().await?;

        let course =
            repositories::courses::find_owned_for_update(&mut *tx, course_id, &principal.user_id)
                .await?
                .ok_or_else(DomainError::course_not_found)?;

        if let Some(pending) =
            repositories::review_requests::find_pending_for_course(&mut *tx, course_id).await?
        {
            tx.rollback().await?;
            return Ok(SubmitOutcome::AlreadyPending(pending));
        }

        if course.status != CourseStatus::Draft {
            return Err(DomainError::InvalidState(format!(
                "Only draft courses can be submitted for review (current status: {})",
                course.status.as_str()
            )));
        }
        course_outline::ensure_ready_for_review(&course.modules.0)?;

        let version =
            repositories::review_requests::max_version(&mut *tx, course_id, &principal.user_id)
                .await?
                + 1;
        let now = primitive_now_utc();

        let flipped = repositories::courses::mark_in_review(
            &mut *tx,
            course_id,
            &principal.user_id,
            course.version,
            now,
        )
        .await?;
        if !flipped {
            metrics::record_course_conflict("submit_review");
            return Err(DomainError::concurrent_update());
        }

        let request_id = Uuid::new_v4().to_string();
        let inserted = repositories::review_requests::create(
            &mut *tx,
            CreateReviewRequest {
                id: &request_id,
                course_id,
                instructor_id: &principal.user_id,
                instructor_name: &principal.name,
                instructor_email: &principal.email,
                course_title: &course.title,
                version,
                created_at: now,
            },
        )
        .await;

        let request = match inserted {
            Ok(request) => request,
            Err(err) if db::is_unique_violation(&err) => {
                tx.rollback().await?;
                let pending =
                    repositories::review_requests::find_pending_for_course(state.db(), course_id)
                        .await?
                        .ok_or_else(DomainError::concurrent_update)?;
                return Ok(SubmitOutcome::AlreadyPending(pending));
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;

        metrics::record_course_mutation("submit_review");
        tracing::info!(
            course_id,
            instructor_id = %principal.user_id,
            request_id = %request.id,
            version,
            action = "submit_review",
            "Course submitted for review"
        );
        invalidate_instructor_cache(state, &principal.user_id).await;
        Ok(SubmitOutcome::Submitted(request))
    }

    /// Applies an admin decision to a pending request and its course atomically,
    /// then queues the instructor notification.
    pub(crate) async fn decide(
        state: &AppState,
        admin: &Principal,
        request_id: &str,
        decision: Decision,
        feedback: &str,
    ) -> DomainResult<CourseReviewRequest> {
        let feedback = feedback.trim();
        let mut tx = state.db().begin().await?;

        let request = repositories::review_requests::find_for_update(&mut *tx, request_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Review request not found".to_string()))?;
        if request.status != ReviewRequestStatus::Pending {
            return Err(DomainError::InvalidState("Review request was already processed".to_string()));
        }

        let now = primitive_now_utc();
        let (course_status, published_at) = match decision {
            Decision::Approved => (CourseStatus::Published, Some(now)),
            Decision::Rejected => (CourseStatus::Draft, None),
        };

        let moved = repositories::courses::apply_decision(
            &mut *tx,
            DecisionWrite {
                course_id: &request.course_id,
                status: course_status,
                feedback,
                reviewer_id: &admin.user_id,
                reviewed_at: now,
                published_at,
            },
        )
        .await?;
        if !moved {
            tx.rollback().await?;
            return Err(DomainError::InvalidState("Course is not awaiting review".to_string()));
        }

        let decided = repositories::review_requests::record_decision(
            &mut *tx,
            request_id,
            decision.into(),
            feedback,
            &admin.user_id,
            now,
        )
        .await?
        .ok_or_else(|| DomainError::InvalidState("Review request was already processed".to_string()))?;

        tx.commit().await?;

        metrics::record_course_mutation("review_decision");
        tracing::info!(
            course_id = %decided.course_id,
            request_id,
            reviewer_id = %admin.user_id,
            decision = decision.as_str(),
            action = "review_decision",
            "Review request decided"
        );
        invalidate_instructor_cache(state, &decided.instructor_id).await;

        NotificationsService::enqueue_after_commit(
            state.db(),
            Notification::course_review_decision(
                &decided.instructor_email,
                &decided.instructor_name,
                &decided.id,
                &decided.course_title,
                decision.as_str(),
                feedback,
            ),
        )
        .await;

        Ok(decided)
    }

    pub(crate) async fn history(
        state: &AppState,
        course_id: &str,
        instructor_id: &str,
    ) -> DomainResult<Vec<CourseReviewRequest>> {
        load_owned(state, course_id, instructor_id).await?;
        Ok(repositories::review_requests::list_for_course(state.db(), course_id, instructor_id)
            .await?)
    }

    pub(crate) async fn list(
        state: &AppState,
        status: Option<ReviewRequestStatus>,
        skip: i64,
        limit: i64,
    ) -> DomainResult<PaginatedResponse<CourseReviewRequest>> {
        let items = repositories::review_requests::list(state.db(), status, skip, limit).await?;
        let total_count = repositories::review_requests::count(state.db(), status).await?;
        Ok(PaginatedResponse { items, total_count, skip, limit })
    }
}

pub(crate) fn parse_status(value: Option<&str>) -> DomainResult<Option<ReviewRequestStatus>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some("pending") => Ok(Some(ReviewRequestStatus::Pending)),
        Some("approved") => Ok(Some(ReviewRequestStatus::Approved)),
        Some("rejected") => Ok(Some(ReviewRequestStatus::Rejected)),
        Some(other) => Err(DomainError::InvalidInput(format!("Unknown status '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_known_values_only() {
        assert_eq!(parse_status(None).expect("none"), None);
        assert_eq!(parse_status(Some(" ")).expect("blank"), None);
        assert_eq!(
            parse_status(Some("pending")).expect("pending"),
            Some(ReviewRequestStatus::Pending)
        );
        assert!(matches!(parse_status(Some("done")), Err(DomainError::InvalidInput(_))));
    }
}
