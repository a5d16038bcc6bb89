use axum::{routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentInstructor;
use crate::core::state::AppState;
use crate::schemas::upload::{SignUploadRequest, SignUploadResponse};
use crate::services::assets::AssetsService;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/signature", post(sign_upload))
}

async fn sign_upload(
    CurrentInstructor(instructor): CurrentInstructor,
    state: axum::extract::State<AppState>,
    Json(payload): Json<SignUploadRequest>,
) -> Result<Json<SignUploadResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let signed = AssetsService::sign_upload(
        &state,
        payload.asset_class,
        &instructor.user_id,
        &payload.file_name,
        payload.content_type.trim(),
    )
    .await?;

    tracing::info!(
        user_id = %instructor.user_id,
        public_id = %signed.public_id,
        resource_type = signed.resource_type,
        "Upload signed"
    );
    Ok(Json(signed.into()))
}
