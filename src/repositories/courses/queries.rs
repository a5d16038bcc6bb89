use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;
use crate::db::types::CourseStatus;

use super::types::{CatalogFilter, CatalogSort, CourseAnalyticsRow};
use super::COLUMNS;

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(executor)
        .await
}

/// Ownership-scoped lookup; a course owned by someone else is reported as missing.
pub(crate) async fn find_owned(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND instructor_id = $2"
    ))
    .bind(course_id)
    .bind(instructor_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_owned_for_update(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    instructor_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND instructor_id = $2 FOR UPDATE"
    ))
    .bind(course_id)
    .bind(instructor_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_published(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND status = $2"
    ))
    .bind(course_id)
    .bind(CourseStatus::Published)
    .fetch_optional(executor)
    .await
}

/// Row lock used to serialize rating updates per course.
pub(crate) async fn lock_published(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND status = $2 FOR UPDATE"
    ))
    .bind(course_id)
    .bind(CourseStatus::Published)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_instructor(
    pool: &PgPool,
    instructor_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC"
    ))
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

/// Counts the instructor's courses in the statuses that consume draft quota.
pub(crate) async fn count_quota_courses(
    executor: impl sqlx::PgExecutor<'_>,
    instructor_id: &str,
) -> Result<i64, sqlx::Error> {
    let [draft, review, archived] = CourseStatus::QUOTA;
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM courses
         WHERE instructor_id = $1 AND status IN ($2, $3, $4)",
    )
    .bind(instructor_id)
    .bind(draft)
    .bind(review)
    .bind(archived)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_catalog(
    pool: &PgPool,
    filter: &CatalogFilter,
) -> Result<Vec<Course>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM courses WHERE status = "));
    builder.push_bind(CourseStatus::Published);
    push_catalog_filters(&mut builder, filter);

    match filter.sort {
        CatalogSort::Latest => builder.push(" ORDER BY created_at DESC, id"),
        CatalogSort::Oldest => builder.push(" ORDER BY created_at ASC, id"),
    };
    builder.push(" OFFSET ");
    builder.push_bind(filter.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit.clamp(1, 50));

    builder.build_query_as::<Course>().fetch_all(pool).await
}

pub(crate) async fn count_catalog(pool: &PgPool, filter: &CatalogFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM courses WHERE status = ");
    builder.push_bind(CourseStatus::Published);
    push_catalog_filters(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn analytics(
    pool: &PgPool,
    course_id: &str,
    instructor_id: &str,
) -> Result<Option<CourseAnalyticsRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseAnalyticsRow>(
        "SELECT c.id, c.title, c.status, c.average_rating, c.rating_count,
                (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count
         FROM courses c
         WHERE c.id = $1 AND c.instructor_id = $2",
    )
    .bind(course_id)
    .bind(instructor_id)
    .fetch_optional(pool)
    .await
}

fn push_catalog_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    if let Some(category) = &filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.clone());
    }

    if !filter.tags.is_empty() {
        builder.push(" AND tags ?| ");
        builder.push_bind(filter.tags.clone());
    }

    if let Some(title) = &filter.title {
        builder.push(" AND title ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(title)));
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_rust\\"), "100\\%\\_rust\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
