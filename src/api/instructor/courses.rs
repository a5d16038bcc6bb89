use axum::{extract::Query, http::StatusCode, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentInstructor, VerifiedInstructor};
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::schemas::course::{
    CourseAnalyticsResponse, CourseCreate, CourseResponse, CourseSummary, CourseUpdate,
};
use crate::schemas::review::CourseReviewResponse;
use crate::services::course_drafts::CourseDraftsService;

pub(super) async fn create_course(
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = CourseDraftsService::create_draft(&state, &instructor, payload).await?;
    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course, true))))
}

pub(super) async fn list_courses(
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let courses = CourseDraftsService::list_for_instructor(&state, &instructor.user_id).await?;
    Ok(Json(courses))
}

pub(super) async fn get_course(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = CourseDraftsService::get_owned(&state, &course_id, &instructor.user_id).await?;
    Ok(Json(CourseResponse::from_db(course, true)))
}

pub(super) async fn update_course(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course =
        CourseDraftsService::update_draft(&state, &instructor, &course_id, payload).await?;
    Ok(Json(CourseResponse::from_db(course, true)))
}

pub(super) async fn delete_course(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
) -> Result<StatusCode, ApiError> {
    CourseDraftsService::delete_draft(&state, &instructor, &course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn course_analytics(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<CourseAnalyticsResponse>, ApiError> {
    let row = CourseDraftsService::analytics(&state, &course_id, &instructor.user_id).await?;
    Ok(Json(row.into()))
}

pub(super) async fn student_reviews(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CourseReviewResponse>>, ApiError> {
    let (skip, limit) = params.bounded(100);
    let page = CourseDraftsService::student_reviews(
        &state,
        &course_id,
        &instructor.user_id,
        skip,
        limit,
    )
    .await?;
    Ok(Json(page.map(CourseReviewResponse::from)))
}
