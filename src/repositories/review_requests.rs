use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::CourseReviewRequest;
use crate::db::types::ReviewRequestStatus;

const COLUMNS: &str = "id, course_id, instructor_id, instructor_name, instructor_email, \
    course_title, version, status, feedback, reviewer_id, reviewed_at, created_at, updated_at";

pub(crate) struct CreateReviewRequest<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) instructor_id: &'a str,
    pub(crate) instructor_name: &'a str,
    pub(crate) instructor_email: &'a str,
    pub(crate) course_title: &'a str,
    pub(crate) version: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateReviewRequest<'_>,
) -> Result<CourseReviewRequest, sqlx::Error> {
    sqlx::query_as::<_, CourseReviewRequest>(&format!(
        "INSERT INTO course_review_requests (
            id, course_id, instructor_id, instructor_name, instructor_email, course_title,
            version, status, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.instructor_id)
    .bind(params.instructor_name)
    .bind(params.instructor_email)
    .bind(params.course_title)
    .bind(params.version)
    .bind(ReviewRequestStatus::Pending)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_pending_for_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<CourseReviewRequest>, sqlx::Error> {
    sqlx::query_as::<_, CourseReviewRequest>(&format!(
        "SELECT {COLUMNS} FROM course_review_requests WHERE course_id = $1 AND status = $2"
    ))
    .bind(course_id)
    .bind(ReviewRequestStatus::Pending)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn max_version(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(version), 0) FROM course_review_requests
         WHERE course_id = $1 AND instructor_id = $2",
    )
    .bind(course_id)
    .bind(instructor_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
) -> Result<Option<CourseReviewRequest>, sqlx::Error> {
    sqlx::query_as::<_, CourseReviewRequest>(&format!(
        "SELECT {COLUMNS} FROM course_review_requests WHERE id = $1 FOR UPDATE"
    ))
    .bind(request_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn record_decision(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
    status: ReviewRequestStatus,
    feedback: &str,
    reviewer_id: &str,
    reviewed_at: PrimitiveDateTime,
) -> Result<Option<CourseReviewRequest>, sqlx::Error> {
    sqlx::query_as::<_, CourseReviewRequest>(&format!(
        "UPDATE course_review_requests
         SET status = $1, feedback = $2, reviewer_id = $3, reviewed_at = $4, updated_at = $4
         WHERE id = $5 AND status = $6
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(feedback)
    .bind(reviewer_id)
    .bind(reviewed_at)
    .bind(request_id)
    .bind(ReviewRequestStatus::Pending)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
    instructor_id: &str,
) -> Result<Vec<CourseReviewRequest>, sqlx::Error> {
    sqlx::query_as::<_, CourseReviewRequest>(&format!(
        "SELECT {COLUMNS} FROM course_review_requests
         WHERE course_id = $1 AND instructor_id = $2
         ORDER BY version DESC"
    ))
    .bind(course_id)
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    status: Option<ReviewRequestStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<CourseReviewRequest>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM course_review_requests"));
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<CourseReviewRequest>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    status: Option<ReviewRequestStatus>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM course_review_requests");
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
