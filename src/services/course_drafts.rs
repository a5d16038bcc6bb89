use sqlx::types::Json;
use uuid::Uuid;

use crate::api::pagination::PaginatedResponse;
use crate::core::metrics;
use crate::core::security::Principal;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Course, CourseReview};
use crate::db::types::CourseStatus;
use crate::repositories;
use crate::repositories::courses::{CourseAnalyticsRow, CreateCourse, UpdateDetails};
use crate::schemas::course::{CourseCreate, CourseSummary, CourseUpdate};
use crate::services::asset_refs::AssetClass;
use crate::services::assets::{AssetsService, PendingDeletion};
use crate::services::errors::{DomainError, DomainResult};

pub(crate) struct CourseDraftsService;

impl CourseDraftsService {
    /// Creates a draft inside the instructor's quota.
    ///
    /// The thumbnail is validated first; if anything after that fails, the
    /// uploaded object is deleted.
    pub(crate) async fn create_draft(
        state: &AppState,
        principal: &Principal,
        payload: CourseCreate,
    ) -> DomainResult<Course> {
        let thumbnail = AssetsService::resolve(
            state,
            AssetClass::Thumbnail,
            &payload.thumbnail,
            &principal.user_id,
        )
        .await?;
        let cleanup = [PendingDeletion::new(thumbnail.asset.public_id.clone(), AssetClass::Thumbnail)];

        let created = async {
            let tags = normalize_tags(&payload.tags)?;
            let limit = state.settings().authoring().max_draft_courses;
            let course_id = Uuid::new_v4().to_string();

            let mut tx = state.db().begin().await?;
            repositories::courses::lock_instructor_quota(&mut *tx, &principal.user_id).await?;
            let existing =
                repositories::courses::count_quota_courses(&mut *tx, &principal.user_id).await?;
            if existing >= limit {
                tx.rollback().await?;
                return Err(DomainError::DraftLimitExceeded { limit });
            }

            let course = repositories::courses::create(
                &mut *tx,
                CreateCourse {
                    id: &course_id,
                    instructor_id: &principal.user_id,
                    instructor_name: &principal.name,
                    title: payload.title.trim(),
                    description: payload.description.trim(),
                    price: payload.price,
                    category: payload.category.trim(),
                    tags: &tags,
                    thumbnail: &thumbnail.asset,
                    created_at: primitive_now_utc(),
                },
            )
            .await?;
            tx.commit().await?;
            Ok::<Course, DomainError>(course)
        }
        .await;

        match created {
            Ok(course) => {
                metrics::record_course_mutation("create_draft");
                tracing::info!(
                    course_id = %course.id,
                    instructor_id = %principal.user_id,
                    action = "create_draft",
                    "Draft course created"
                );
                invalidate_instructor_cache(state, &principal.user_id).await;
                Ok(course)
            }
            Err(DomainError::Storage(err)) => {
                tracing::warn!(
                    instructor_id = %principal.user_id,
                    public_id = %thumbnail.asset.public_id,
                    error = %err,
                    "Draft write outcome unknown; keeping uploaded thumbnail"
                );
                Err(DomainError::Storage(err))
            }
            Err(err) => {
                AssetsService::discard(state, &cleanup).await;
                Err(err)
            }
        }
    }

    pub(crate) async fn update_draft(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
        payload: CourseUpdate,
    ) -> DomainResult<Course> {
        let current = load_owned(state, course_id, &principal.user_id).await?;
        if current.status != CourseStatus::Draft {
            return Err(DomainError::InvalidState(format!(
                "Only draft courses can be edited (current status: {})",
                current.status.as_str()
            )));
        }

        let thumbnail = match payload.thumbnail.as_ref() {
            Some(claim) => Some(
                AssetsService::resolve(state, AssetClass::Thumbnail, claim, &principal.user_id)
                    .await?,
            ),
            None => None,
        };
        let tags = match payload.tags.as_deref() {
            Some(tags) => Some(Json(normalize_tags(tags)?)),
            None => None,
        };

        let updated = repositories::courses::update_details(
            state.db(),
            course_id,
            &principal.user_id,
            current.version,
            UpdateDetails {
                title: payload.title.map(|value| value.trim().to_string()),
                description: payload.description.map(|value| value.trim().to_string()),
                price: payload.price,
                category: payload.category.map(|value| value.trim().to_string()),
                tags,
                thumbnail: thumbnail.as_ref().map(|validated| Json(validated.asset.clone())),
                updated_at: primitive_now_utc(),
            },
        )
        .await;

        let new_thumbnail = thumbnail
            .as_ref()
            .filter(|validated| validated.asset.public_id != current.thumbnail.0.public_id)
            .map(|validated| {
                PendingDeletion::new(validated.asset.public_id.clone(), AssetClass::Thumbnail)
            });

        let course = match updated {
            Ok(Some(course)) => course,
            Ok(None) => {
                metrics::record_course_conflict("update_draft");
                AssetsService::discard(state, new_thumbnail.as_slice()).await;
                return Err(DomainError::concurrent_update());
            }
            Err(err) => {
                AssetsService::discard(state, new_thumbnail.as_slice()).await;
                return Err(err.into());
            }
        };

        if new_thumbnail.is_some() {
            AssetsService::discard(
                state,
                &[PendingDeletion::new(current.thumbnail.0.public_id.clone(), AssetClass::Thumbnail)],
            )
            .await;
        }

        metrics::record_course_mutation("update_draft");
        tracing::info!(
            course_id,
            instructor_id = %principal.user_id,
            action = "update_draft",
            "Draft course updated"
        );
        invalidate_instructor_cache(state, &principal.user_id).await;
        Ok(course)
    }

    /// Removes a draft, then deletes its thumbnail and every video it referenced.
    pub(crate) async fn delete_draft(
        state: &AppState,
        principal: &Principal,
        course_id: &str,
    ) -> DomainResult<()> {
        let deleted =
            repositories::courses::delete_draft(state.db(), course_id, &principal.user_id).await?;

        let Some(course) = deleted else {
            let existing = load_owned(state, course_id, &principal.user_id).await?;
            return Err(DomainError::InvalidState(format!(
                "Only draft courses can be deleted (current status: {})",
                existing.status.as_str()
            )));
        };

        let mut cleanup =
            vec![PendingDeletion::new(course.thumbnail.0.public_id.clone(), AssetClass::Thumbnail)];
        cleanup.extend(course.modules.0.iter().flat_map(|module| {
            module
                .videos
                .iter()
                .map(|video| PendingDeletion::new(video.asset.public_id.clone(), AssetClass::Video))
        }));

        metrics::record_course_mutation("delete_draft");
        tracing::info!(
            course_id,
            instructor_id = %principal.user_id,
            assets = cleanup.len(),
            action = "delete_draft",
            "Draft course deleted"
        );
        AssetsService::discard(state, &cleanup).await;
        invalidate_instructor_cache(state, &principal.user_id).await;
        Ok(())
    }

    /// Lists the instructor's courses, served from Redis when a fresh copy exists.
    pub(crate) async fn list_for_instructor(
        state: &AppState,
        instructor_id: &str,
    ) -> DomainResult<Vec<CourseSummary>> {
        let key = instructor_cache_key(instructor_id);
        match state.redis().get_cached(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CourseSummary>>(&raw) {
                Ok(items) => return Ok(items),
                Err(err) => tracing::warn!(instructor_id, error = %err, "Discarding bad cache entry"),
            },
            Ok(None) => {}
            Err(err) => tracing::warn!(instructor_id, error = %err, "Course cache read failed"),
        }

        let items: Vec<CourseSummary> =
            repositories::courses::list_by_instructor(state.db(), instructor_id)
                .await?
                .into_iter()
                .map(CourseSummary::from_db)
                .collect();

        if let Ok(raw) = serde_json::to_string(&items) {
            let ttl = state.settings().redis().course_cache_ttl_seconds;
            if let Err(err) = state.redis().set_cached(&key, &raw, ttl).await {
                tracing::warn!(instructor_id, error = %err, "Course cache write failed");
            }
        }
        Ok(items)
    }

    pub(crate) async fn get_owned(
        state: &AppState,
        course_id: &str,
        instructor_id: &str,
    ) -> DomainResult<Course> {
        load_owned(state, course_id, instructor_id).await
    }

    pub(crate) async fn analytics(
        state: &AppState,
        course_id: &str,
        instructor_id: &str,
    ) -> DomainResult<CourseAnalyticsRow> {
        repositories::courses::analytics(state.db(), course_id, instructor_id)
            .await?
            .ok_or_else(DomainError::course_not_found)
    }

    pub(crate) async fn student_reviews(
        state: &AppState,
        course_id: &str,
        instructor_id: &str,
        skip: i64,
        limit: i64,
    ) -> DomainResult<PaginatedResponse<CourseReview>> {
        load_owned(state, course_id, instructor_id).await?;
        let items =
            repositories::course_reviews::list_for_course(state.db(), course_id, skip, limit)
                .await?;
        let total_count =
            repositories::course_reviews::count_for_course(state.db(), course_id).await?;
        Ok(PaginatedResponse { items, total_count, skip, limit })
    }
}

pub(crate) async fn load_owned(
    state: &AppState,
    course_id: &str,
    instructor_id: &str,
) -> DomainResult<Course> {
    repositories::courses::find_owned(state.db(), course_id, instructor_id)
        .await?
        .ok_or_else(DomainError::course_not_found)
}

pub(crate) fn instructor_cache_key(instructor_id: &str) -> String {
    format!("courses:instructor:{instructor_id}")
}

/// Drops the cached course list; a failure only means a stale read until the TTL expires.
pub(crate) async fn invalidate_instructor_cache(state: &AppState, instructor_id: &str) {
    if let Err(err) = state.redis().invalidate(&instructor_cache_key(instructor_id)).await {
        tracing::warn!(instructor_id, error = %err, "Failed to invalidate course cache");
    }
}

fn normalize_tags(tags: &[String]) -> DomainResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    if normalized.is_empty() {
        return Err(DomainError::InvalidInput("at least one tag is required".to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = vec![" rust ".to_string(), "rust".to_string(), "".to_string(), "async".to_string()];
        assert_eq!(normalize_tags(&tags).expect("tags"), vec!["rust", "async"]);
    }

    #[test]
    fn blank_tags_are_rejected() {
        let err = normalize_tags(&["  ".to_string()]).expect_err("must fail");
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn cache_key_is_scoped_per_instructor() {
        assert_eq!(instructor_cache_key("u1"), "courses:instructor:u1");
        assert_ne!(instructor_cache_key("u1"), instructor_cache_key("u2"));
    }
}
