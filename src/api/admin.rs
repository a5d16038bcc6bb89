use axum::{extract::Query, routing::get, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::schemas::admin::{NotificationJobResponse, QueueQuery};
use crate::schemas::review::{ReviewDecisionRequest, ReviewRequestResponse};
use crate::schemas::verification::{VerificationDecisionRequest, VerificationResponse};
use crate::services::course_review::{self, CourseReviewService};
use crate::services::notifications::NotificationsService;
use crate::services::verification::{self, VerificationService};

const MAX_PAGE: i64 = 100;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/review-requests", get(list_review_requests))
        .route("/review-requests/:request_id/decision", post(decide_review_request))
        .route("/verification-requests", get(list_verification_requests))
        .route("/verification-requests/:request_id/decision", post(decide_verification_request))
        .route("/notifications/dead-letter", get(list_dead_letters))
}

fn page_bounds(params: &QueueQuery) -> (i64, i64) {
    PageQuery { skip: params.skip, limit: params.limit }.bounded(MAX_PAGE)
}

async fn list_review_requests(
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Query(params): Query<QueueQuery>,
) -> Result<Json<PaginatedResponse<ReviewRequestResponse>>, ApiError> {
    let status = course_review::parse_status(params.status.as_deref())?;
    let (skip, limit) = page_bounds(&params);

    let page = CourseReviewService::list(&state, status, skip, limit).await?;
    Ok(Json(page.map(ReviewRequestResponse::from)))
}

async fn decide_review_request(
    axum::extract::Path(request_id): axum::extract::Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<Json<ReviewRequestResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let decided = CourseReviewService::decide(
        &state,
        &admin,
        &request_id,
        payload.action,
        payload.feedback.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(decided.into()))
}

async fn list_verification_requests(
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Query(params): Query<QueueQuery>,
) -> Result<Json<PaginatedResponse<VerificationResponse>>, ApiError> {
    let status = verification::parse_status(params.status.as_deref())?;
    let (skip, limit) = page_bounds(&params);

    let page = VerificationService::list(&state, status, skip, limit).await?;
    Ok(Json(page.map(VerificationResponse::from)))
}

async fn decide_verification_request(
    axum::extract::Path(request_id): axum::extract::Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Json(payload): Json<VerificationDecisionRequest>,
) -> Result<Json<VerificationResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let decided = VerificationService::decide(
        &state,
        &admin,
        &request_id,
        payload.action,
        payload.admin_message.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(decided.into()))
}

async fn list_dead_letters(
    CurrentAdmin(_admin): CurrentAdmin,
    state: axum::extract::State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<NotificationJobResponse>>, ApiError> {
    let (skip, limit) = params.bounded(MAX_PAGE);
    let page = NotificationsService::dead_letters(&state, skip, limit).await?;
    Ok(Json(page.map(NotificationJobResponse::from)))
}
