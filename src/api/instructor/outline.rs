use axum::{http::StatusCode, Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::VerifiedInstructor;
use crate::core::state::AppState;
use crate::schemas::course::{ModuleCreate, OutlineMutationResponse, ReorderRequest, VideoCreate};
use crate::services::course_authoring::{CourseAuthoringService, OutlineSnapshot};

fn respond(
    snapshot: OutlineSnapshot,
    module_id: Option<String>,
    video_id: Option<String>,
) -> Json<OutlineMutationResponse> {
    Json(OutlineMutationResponse::new(
        &snapshot.course_id,
        module_id,
        video_id,
        &snapshot.modules,
        snapshot.course_duration,
        snapshot.version,
    ))
}

pub(super) async fn append_module(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<OutlineMutationResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (snapshot, module_id) =
        CourseAuthoringService::append_module(&state, &instructor, &course_id, &payload.title)
            .await?;
    Ok((StatusCode::CREATED, respond(snapshot, Some(module_id), None)))
}

pub(super) async fn append_video(
    axum::extract::Path((course_id, module_id)): axum::extract::Path<(String, String)>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<VideoCreate>,
) -> Result<(StatusCode, Json<OutlineMutationResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (snapshot, video_id) =
        CourseAuthoringService::append_video(&state, &instructor, &course_id, &module_id, payload)
            .await?;
    Ok((StatusCode::CREATED, respond(snapshot, Some(module_id), Some(video_id))))
}

pub(super) async fn reorder_modules(
    axum::extract::Path(course_id): axum::extract::Path<String>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<OutlineMutationResponse>, ApiError> {
    let snapshot =
        CourseAuthoringService::reorder_modules(&state, &instructor, &course_id, &payload.order)
            .await?;
    Ok(respond(snapshot, None, None))
}

pub(super) async fn reorder_videos(
    axum::extract::Path((course_id, module_id)): axum::extract::Path<(String, String)>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<OutlineMutationResponse>, ApiError> {
    let snapshot = CourseAuthoringService::reorder_videos(
        &state,
        &instructor,
        &course_id,
        &module_id,
        &payload.order,
    )
    .await?;
    Ok(respond(snapshot, Some(module_id), None))
}

pub(super) async fn delete_module(
    axum::extract::Path((course_id, module_id)): axum::extract::Path<(String, String)>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<OutlineMutationResponse>, ApiError> {
    let snapshot =
        CourseAuthoringService::delete_module(&state, &instructor, &course_id, &module_id).await?;
    Ok(respond(snapshot, Some(module_id), None))
}

pub(super) async fn delete_video(
    axum::extract::Path((course_id, module_id, video_id)): axum::extract::Path<(
        String,
        String,
        String,
    )>,
    VerifiedInstructor(instructor): VerifiedInstructor,
    state: axum::extract::State<AppState>,
) -> Result<Json<OutlineMutationResponse>, ApiError> {
    let snapshot = CourseAuthoringService::delete_video(
        &state,
        &instructor,
        &course_id,
        &module_id,
        &video_id,
    )
    .await?;
    Ok(respond(snapshot, Some(module_id), Some(video_id)))
}
