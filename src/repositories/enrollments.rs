use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Enrollment, VideoProgress};

const COLUMNS: &str =
    "id, student_id, course_id, progress, is_completed, video_progress, version, enrolled_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EnrollmentWithCourse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) enrolled_at: PrimitiveDateTime,
}

pub(crate) struct ProgressWrite<'a> {
    pub(crate) enrollment_id: &'a str,
    pub(crate) expected_version: i64,
    pub(crate) video_progress: &'a [VideoProgress],
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Inserts an enrollment; returns `None` when the student is already enrolled.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    student_id: &str,
    course_id: &str,
    enrolled_at: PrimitiveDateTime,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (id, student_id, course_id, enrolled_at, updated_at)
         VALUES ($1, $2, $3, $4, $4)
         ON CONFLICT (student_id, course_id) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(student_id)
    .bind(course_id)
    .bind(enrolled_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    student_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND course_id = $2)",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Compare-and-swap write of the per-video progress document.
pub(crate) async fn save_progress(
    executor: impl sqlx::PgExecutor<'_>,
    params: ProgressWrite<'_>,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments
         SET video_progress = $1, progress = $2, is_completed = $3, updated_at = $4,
             version = version + 1
         WHERE id = $5 AND version = $6
         RETURNING {COLUMNS}"
    ))
    .bind(Json(params.video_progress))
    .bind(params.progress)
    .bind(params.is_completed)
    .bind(params.updated_at)
    .bind(params.enrollment_id)
    .bind(params.expected_version)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithCourse>(
        "SELECT e.id, e.course_id, c.title AS course_title, e.progress, e.is_completed,
                e.enrolled_at
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         WHERE e.student_id = $1
         ORDER BY e.enrolled_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
