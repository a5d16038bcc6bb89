use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::CourseReview;

const COLUMNS: &str = "id, course_id, student_id, student_name, rating, comment, created_at, updated_at";

pub(crate) struct CreateCourseReview<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) student_name: &'a str,
    pub(crate) rating: i16,
    pub(crate) comment: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn find_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    student_id: &str,
) -> Result<Option<CourseReview>, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "SELECT {COLUMNS} FROM course_reviews WHERE course_id = $1 AND student_id = $2 FOR UPDATE"
    ))
    .bind(course_id)
    .bind(student_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateCourseReview<'_>,
) -> Result<CourseReview, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "INSERT INTO course_reviews (
            id, course_id, student_id, student_name, rating, comment, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.student_id)
    .bind(params.student_name)
    .bind(params.rating)
    .bind(params.comment)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    review_id: &str,
    rating: i16,
    comment: &str,
    updated_at: PrimitiveDateTime,
) -> Result<CourseReview, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "UPDATE course_reviews SET rating = $1, comment = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(rating)
    .bind(comment)
    .bind(updated_at)
    .bind(review_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<CourseReview>, sqlx::Error> {
    sqlx::query_as::<_, CourseReview>(&format!(
        "SELECT {COLUMNS} FROM course_reviews WHERE course_id = $1
         ORDER BY created_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(course_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 100))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_for_course(pool: &PgPool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM course_reviews WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await
}
