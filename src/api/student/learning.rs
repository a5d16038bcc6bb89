use axum::{http::StatusCode, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::schemas::enrollment::{
    EnrollmentResponse, ProgressResponse, ProgressUpdate, StudentEnrollmentItem,
};
use crate::schemas::review::{RatingRequest, RatingResponse};
use crate::services::enrollments::EnrollmentsService;
use crate::services::ratings::RatingsService;

pub(super) async fn enroll(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentStudent(student): CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let enrollment = EnrollmentsService::enroll(&state, &student, &course_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

pub(super) async fn save_progress(
    axum::extract::Path((course_id, module_id, video_id)): axum::extract::Path<(
        String,
        String,
        String,
    )>,
    CurrentStudent(student): CurrentStudent,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ProgressUpdate>,
) -> Result<Json<ProgressResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (enrollment, record) = EnrollmentsService::save_progress(
        &state,
        &student,
        &course_id,
        &module_id,
        &video_id,
        payload.watched_seconds,
    )
    .await?;

    Ok(Json(ProgressResponse {
        course_id: enrollment.course_id,
        progress: enrollment.progress,
        is_completed: enrollment.is_completed,
        video: record.into(),
    }))
}

pub(super) async fn rate_course(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentStudent(student): CurrentStudent,
    state: axum::extract::State<AppState>,
    Json(payload): Json<RatingRequest>,
) -> Result<Json<RatingResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (review, aggregate) = RatingsService::rate(
        &state,
        &student,
        &course_id,
        payload.rating,
        payload.comment.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Json(RatingResponse {
        review: review.into(),
        average_rating: aggregate.average,
        rating_count: aggregate.count,
    }))
}

pub(super) async fn my_enrollments(
    CurrentStudent(student): CurrentStudent,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<StudentEnrollmentItem>>, ApiError> {
    let items = EnrollmentsService::list_for_student(&state, &student.user_id).await?;
    Ok(Json(items.into_iter().map(StudentEnrollmentItem::from).collect()))
}
