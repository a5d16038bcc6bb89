use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentInstructor, VerifiedInstructor};
use crate::core::state::AppState;
use crate::schemas::review::{ReviewRequestResponse, SubmissionStatus, SubmitReviewResponse};
use crate::schemas::verification::{VerificationCreate, VerificationResponse};
use crate::schemas::MessageResponse;
use crate::services::course_review::{CourseReviewService, SubmitOutcome};
use crate::services::verification::{VerificationService, VerificationSubmit};

/// 201 for a fresh submission, 200 when the pending request is returned as-is.
pub(super) async fn submit_for_review(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
) -> Result<(StatusCode, Json<SubmitReviewResponse>), ApiError> {
    let outcome = CourseReviewService::submit(&state, &instructor, &course_id).await?;

    let (code, status, request) = match outcome {
        SubmitOutcome::Submitted(request) => {
            (StatusCode::CREATED, SubmissionStatus::Submitted, request)
        }
        SubmitOutcome::AlreadyPending(request) => {
            (StatusCode::OK, SubmissionStatus::AlreadyPending, request)
        }
    };
    Ok((code, Json(SubmitReviewResponse { status, request: request.into() })))
}

pub(super) async fn review_history(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<ReviewRequestResponse>>, ApiError> {
    let history = CourseReviewService::history(&state, &course_id, &instructor.user_id).await?;
    Ok(Json(history.into_iter().map(ReviewRequestResponse::from).collect()))
}

pub(super) async fn submit_verification(
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<VerificationCreate>,
) -> Result<Response, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match VerificationService::submit(&state, &instructor, payload).await? {
        VerificationSubmit::AlreadyVerified => Ok((
            StatusCode::OK,
            Json(MessageResponse { message: "Instructor is already verified".to_string() }),
        )
            .into_response()),
        VerificationSubmit::Submitted(request) => {
            Ok((StatusCode::CREATED, Json(VerificationResponse::from(request))).into_response())
        }
    }
}

pub(super) async fn list_verification_requests(
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<VerificationResponse>>, ApiError> {
    let requests = VerificationService::list_for_user(&state, &instructor.user_id).await?;
    Ok(Json(requests.into_iter().map(VerificationResponse::from).collect()))
}
