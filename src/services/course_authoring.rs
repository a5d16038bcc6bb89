//! Draft outline mutations persisted with an optimistic version check.
//!
//! Each operation loads the owned draft, applies a pure change from
//! `course_outline`, and writes the whole tree back only if nobody else wrote
//! in between. Appends commute, so a lost race is retried on fresh state;
//! reorders and deletes depend on what the caller saw and surface `Conflict`.

use time::OffsetDateTime;

use crate::core::metrics;
use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::to_primitive_utc;
use crate::db::models::{Module, Tombstones};
use crate::db::types::CourseStatus;
use crate::repositories;
use crate::repositories::courses::OutlineWrite;
use crate::schemas::course::VideoCreate;
use crate::services::asset_refs::AssetClass;
use crate::services::assets::{AssetsService, PendingDeletion};
use crate::services::course_drafts::{invalidate_instructor_cache, load_owned};
use crate::services::course_outline::{self, NewVideo, OutlineError};
use crate::services::errors::{DomainError, DomainResult};

/// The committed outline after a successful mutation.
#[derive(Debug, Clone)]
pub(crate) struct OutlineSnapshot {
    pub(crate) course_id: String,
    pub(crate) modules: Vec<Module>,
    pub(crate) course_duration: f64,
    pub(crate) version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryPolicy {
    OnConflict,
    Never,
}

pub(crate) struct CourseAuthoringService;

impl CourseAuthoringService {
    pub(crate) async fn append_module(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        title: &str,
    ) -> DomainResult<(OutlineSnapshot, String)> {
        mutate(state, principal, course_id, "append_module", RetryPolicy::OnConflict, |modules, _, now| {
            course_outline::append_module(modules, title, now)
        })
        .await
    }

    /// Validates the uploaded video, then appends it. The object is deleted
    /// again if the append does not commit.
    pub(crate) async fn append_video(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        module_id: &str,
        payload: VideoCreate,
    ) -> DomainResult<(OutlineSnapshot, String)> {
        let validated =
            AssetsService::resolve(state, AssetClass::Video, &payload.asset, &principal.user_id)
                .await?;
        let duration = validated.duration_seconds.unwrap_or_default();
        let video = NewVideo {
            title: payload.title,
            asset: validated.asset.clone(),
            duration,
            size_in_bytes: validated.bytes,
        };

        let result = mutate(
            state,
            principal,
            course_id,
            "append_video",
            RetryPolicy::OnConflict,
            |modules, _, now| course_outline::append_video(modules, module_id, video.clone(), now),
        )
        .await;

        match &result {
            Ok(_) => {}
            Err(DomainError::Storage(err)) => tracing::warn!(
                course_id,
                public_id = %validated.asset.public_id,
                error = %err,
                "Outline write outcome unknown; keeping uploaded video"
            ),
            Err(_) => {
                AssetsService::discard(
                    state,
                    &[PendingDeletion::new(validated.asset.public_id.clone(), AssetClass::Video)],
                )
                .await
            }
        }
        result
    }

    pub(crate) async fn reorder_modules(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        new_order: &[String],
    ) -> DomainResult<OutlineSnapshot> {
        let (snapshot, ()) =
            mutate(state, principal, course_id, "reorder_modules", RetryPolicy::Never, |modules, _, now| {
                course_outline::reorder_modules(modules, new_order, now)
            })
            .await?;
        Ok(snapshot)
    }

    pub(crate) async fn reorder_videos(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        module_id: &str,
        new_order: &[String],
    ) -> DomainResult<OutlineSnapshot> {
        let (snapshot, ()) =
            mutate(state, principal, course_id, "reorder_videos", RetryPolicy::Never, |modules, _, now| {
                course_outline::reorder_videos(modules, module_id, new_order, now)
            })
            .await?;
        Ok(snapshot)
    }

    /// Removes a module; its videos are deleted from the asset store only
    /// after the new outline has committed.
    pub(crate) async fn delete_module(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        module_id: &str,
    ) -> DomainResult<OutlineSnapshot> {
        let (snapshot, removed) = mutate(
            state,
            principal,
            course_id,
            "delete_module",
            RetryPolicy::Never,
            |modules, tombstones, now| {
                course_outline::delete_module(modules, tombstones, module_id, now)
            },
        )
        .await?;

        let cleanup: Vec<PendingDeletion> = removed
            .videos
            .iter()
            .map(|video| PendingDeletion::new(video.asset.public_id.clone(), AssetClass::Video))
            .collect();
        AssetsService::discard(state, &cleanup).await;
        Ok(snapshot)
    }

    pub(crate) async fn delete_video(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        module_id: &str,
        video_id: &str,
    ) -> DomainResult<OutlineSnapshot> {
        let (snapshot, removed) = mutate(
            state,
            principal,
            course_id,
            "delete_video",
            RetryPolicy::Never,
            |modules, tombstones, now| {
                course_outline::delete_video(modules, tombstones, module_id, video_id, now)
            },
        )
        .await?;

        AssetsService::discard(
            state,
            &[PendingDeletion::new(removed.asset.public_id.clone(), AssetClass::Video)],
        )
        .await;
        Ok(snapshot)
    }
}

async fn mutate<T, F>(
    state: &AppState,
    principal: &Principal,
    course_id: &str,
    operation: &'static str,
    retry: RetryPolicy,
    mut apply: F,
) -> DomainResult<(OutlineSnapshot, T)>
where
    F: FnMut(&mut Vec<Module>, &mut Tombstones, OffsetDateTime) -> Result<T, OutlineError>,
{
    let max_attempts = match retry {
        RetryPolicy::OnConflict => state.settings().authoring().append_retry_limit.max(1),
        RetryPolicy::Never => 1,
    };

    for attempt in 1..=max_attempts {
        let course = load_owned(state, course_id, &principal.user_id).await?;
        if course.status != CourseStatus::Draft {
            return Err(DomainError::InvalidState(format!(
                "Course content can only change while in draft (current status: {})",
                course.status.as_str()
            )));
        }

        let now = OffsetDateTime::now_utc();
        let mut modules = course.modules.0;
        let mut tombstones = course.tombstones.0;
        let outcome = apply(&mut modules, &mut tombstones, now)?;
        let course_duration = course_outline::course_duration(&modules);

        let saved = repositories::courses::save_outline(
            state.db(),
            OutlineWrite {
                course_id,
                instructor_id: &principal.user_id,
                expected_version: course.version,
                modules: &modules,
                tombstones: &tombstones,
                course_duration,
                updated_at: to_primitive_utc(now),
            },
        )
        .await?;

        match saved {
            Some(version) => {
                metrics::record_course_mutation(operation);
                tracing::info!(
                    course_id,
                    instructor_id = %principal.user_id,
                    action = operation,
                    version,
                    "Course outline updated"
                );
                invalidate_instructor_cache(state, &principal.user_id).await;
                let snapshot = OutlineSnapshot {
                    course_id: course_id.to_string(),
                    modules,
                    course_duration,
                    version,
                };
                return Ok((snapshot, outcome));
            }
            None => {
                metrics::record_course_conflict(operation);
                tracing::debug!(course_id, action = operation, attempt, "Outline version moved");
            }
        }
    }

    tracing::warn!(course_id, action = operation, "Outline update lost every race");
    Err(DomainError::concurrent_update())
}
