use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::{Enrollment, VideoProgress};
use crate::repositories;
use crate::repositories::enrollments::{EnrollmentWithCourse, ProgressWrite};
use crate::services::course_outline;
use crate::services::errors::{DomainError, DomainResult};
use crate::services::progress;

pub(crate) struct EnrollmentsService;

impl EnrollmentsService {
    pub(crate) async fn enroll(
        state: &AppState,
        student: &Principal,
        course_id: &str,
    ) -> DomainResult<Enrollment> {
        repositories::courses::find_published(state.db(), course_id)
            .await?
            .ok_or_else(DomainError::course_not_found)?;

        let enrollment = repositories::enrollments::create(
            state.db(),
            &Uuid::new_v4().to_string(),
            &student.user_id,
            course_id,
            primitive_now_utc(),
        )
        .await?
        .ok_or(DomainError::AlreadyEnrolled)?;

        tracing::info!(course_id, student_id = %student.user_id, action = "enroll", "Student enrolled");
        Ok(enrollment)
    }

    /// Records watch time for one video and recomputes course progress against
    /// the current outline.
    pub(crate) async fn save_progress(
        state: &AppState,
        student: &Principal,
        course_id: &str,
        module_id: &str,
        video_id: &str,
        watched_seconds: f64,
    ) -> DomainResult<(Enrollment, VideoProgress)> {
        if !watched_seconds.is_finite() {
            return Err(DomainError::InvalidInput("watched seconds must be a number".to_string()));
        }

        let course = repositories::courses::find_published(state.db(), course_id)
            .await?
            .ok_or_else(DomainError::course_not_found)?;
        let modules = course.modules.0;
        let duration = course_outline::find_video(&modules, module_id, video_id)
            .map(|video| video.duration)
            .ok_or_else(|| DomainError::NotFound("Video not found".to_string()))?;

        let attempts = state.settings().authoring().append_retry_limit.max(1);
        for _ in 0..attempts {
            let enrollment =
                repositories::enrollments::find(state.db(), &student.user_id, course_id)
                    .await?
                    .ok_or_else(|| DomainError::NotFound("Enrollment not found".to_string()))?;

            let now = OffsetDateTime::now_utc();
            let mut records = enrollment.video_progress.0;
            let record =
                progress::record_watch(&mut records, module_id, video_id, watched_seconds, duration, now);
            let (percent, is_completed) = progress::course_progress(&records, &modules);

            let saved = repositories::enrollments::save_progress(
                state.db(),
                ProgressWrite {
                    enrollment_id: &enrollment.id,
                    expected_version: enrollment.version,
                    video_progress: &records,
                    progress: percent,
                    is_completed,
                    updated_at: to_primitive_utc(now),
                },
            )
            .await?;

            if let Some(saved) = saved {
                tracing::debug!(
                    course_id,
                    student_id = %student.user_id,
                    video_id,
                    progress = percent,
                    "Progress saved"
                );
                return Ok((saved, record));
            }
        }

        Err(DomainError::Conflict("Progress was updated concurrently; retry".to_string()))
    }

    pub(crate) async fn list_for_student(
        state: &AppState,
        student_id: &str,
    ) -> DomainResult<Vec<EnrollmentWithCourse>> {
        Ok(repositories::enrollments::list_for_student(state.db(), student_id).await?)
    }
}
