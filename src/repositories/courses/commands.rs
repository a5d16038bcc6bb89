use sqlx::types::Json;
use time::PrimitiveDateTime;

use crate::db::models::Course;
use crate::db::types::CourseStatus;

use super::types::{CreateCourse, DecisionWrite, OutlineWrite, UpdateDetails};
use super::COLUMNS;

/// Serializes draft creation per instructor until the transaction ends.
pub(crate) async fn lock_instructor_quota(
    executor: impl sqlx::PgExecutor<'_>,
    instructor_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(instructor_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateCourse<'_>,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, instructor_id, instructor_name, title, description, price, category, tags,
            thumbnail, status, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.instructor_id)
    .bind(params.instructor_name)
    .bind(params.title)
    .bind(params.description)
    .bind(params.price)
    .bind(params.category)
    .bind(Json(params.tags))
    .bind(Json(params.thumbnail))
    .bind(CourseStatus::Draft)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

/// Writes a new module tree if the draft is still at `expected_version`.
/// Returns the new version, or `None` when the precondition no longer matches.
pub(crate) async fn save_outline(
    executor: impl sqlx::PgExecutor<'_>,
    params: OutlineWrite<'_>,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE courses
         SET modules = $1,
             tombstones = $2,
             course_duration = $3,
             updated_at = $4,
             version = version + 1
         WHERE id = $5 AND instructor_id = $6 AND status = $7 AND version = $8
         RETURNING version",
    )
    .bind(Json(params.modules))
    .bind(Json(params.tombstones))
    .bind(params.course_duration)
    .bind(params.updated_at)
    .bind(params.course_id)
    .bind(params.instructor_id)
    .bind(CourseStatus::Draft)
    .bind(params.expected_version)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn update_details(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
    expected_version: i64,
    params: UpdateDetails,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            price = COALESCE($3, price),
            category = COALESCE($4, category),
            tags = COALESCE($5, tags),
            thumbnail = COALESCE($6, thumbnail),
            updated_at = $7,
            version = version + 1
         WHERE id = $8 AND instructor_id = $9 AND status = $10 AND version = $11
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.price)
    .bind(params.category)
    .bind(params.tags)
    .bind(params.thumbnail)
    .bind(params.updated_at)
    .bind(course_id)
    .bind(instructor_id)
    .bind(CourseStatus::Draft)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
}

/// Flips an owned draft into review and drops its tombstones. Returns false
/// when the draft changed underneath.
pub(crate) async fn mark_in_review(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
    expected_version: i64,
    submitted_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE courses
         SET status = $1, submitted_for_review_at = $2, updated_at = $2, version = version + 1,
             tombstones = '{"modules": [], "videos": []}'::jsonb
         WHERE id = $3 AND instructor_id = $4 AND status = $5 AND version = $6"#,
    )
    .bind(CourseStatus::Review)
    .bind(submitted_at)
    .bind(course_id)
    .bind(instructor_id)
    .bind(CourseStatus::Draft)
    .bind(expected_version)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Moves a course out of review. Returns false when it is no longer in review.
pub(crate) async fn apply_decision(
    executor: impl sqlx::PgExecutor<'_>,
    params: DecisionWrite<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE courses
         SET status = $1,
             review_feedback = $2,
             reviewed_by = $3,
             reviewed_at = $4,
             published_at = COALESCE($5, published_at),
             updated_at = $4,
             version = version + 1
         WHERE id = $6 AND status = $7",
    )
    .bind(params.status)
    .bind(params.feedback)
    .bind(params.reviewer_id)
    .bind(params.reviewed_at)
    .bind(params.published_at)
    .bind(params.course_id)
    .bind(CourseStatus::Review)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn delete_draft(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "DELETE FROM courses
         WHERE id = $1 AND instructor_id = $2 AND status = $3
         RETURNING {COLUMNS}"
    ))
    .bind(course_id)
    .bind(instructor_id)
    .bind(CourseStatus::Draft)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn update_rating(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    average_rating: f64,
    rating_count: i32,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET average_rating = $1, rating_count = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(average_rating)
    .bind(rating_count)
    .bind(updated_at)
    .bind(course_id)
    .execute(executor)
    .await?;
    Ok(())
}
