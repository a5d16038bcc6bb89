use axum::{extract::Query, Json};

use crate::api::errors::ApiError;
use crate::api::guards::OptionalUser;
use crate::api::pagination::{PageQuery, PaginatedResponse};
use crate::core::state::AppState;
use crate::schemas::course::{CatalogQuery, CatalogResponse, CourseResponse};
use crate::schemas::review::CourseReviewResponse;
use crate::services::catalog::CatalogService;
use crate::services::ratings::RatingsService;

pub(super) async fn browse_courses(
    state: axum::extract::State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<CatalogResponse>, ApiError> {
    Ok(Json(CatalogService::browse(&state, params).await?))
}

/// Video URLs are only included for viewers entitled to watch.
pub(super) async fn course_detail(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    OptionalUser(viewer): OptionalUser,
    state: axum::extract::State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let (course, include_assets) =
        CatalogService::detail(&state, viewer.as_ref(), &course_id).await?;
    Ok(Json(CourseResponse::from_db(course, include_assets)))
}

pub(super) async fn list_reviews(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<CourseReviewResponse>>, ApiError> {
    let (skip, limit) = params.bounded(100);
    let page = RatingsService::list_for_course(&state, &course_id, skip, limit).await?;
    Ok(Json(page.map(CourseReviewResponse::from)))
}
