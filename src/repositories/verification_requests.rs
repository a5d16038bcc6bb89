use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{StoredAsset, VerificationRequest};
use crate::db::types::VerificationStatus;

const COLUMNS: &str = "id, user_id, user_name, user_email, highest_qualification, \
    experience_years, portfolio_link, resume, status, admin_message, reviewed_by, reviewed_at, \
    created_at, updated_at";

pub(crate) struct CreateVerificationRequest<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) user_name: &'a str,
    pub(crate) user_email: &'a str,
    pub(crate) highest_qualification: &'a str,
    pub(crate) experience_years: Option<i32>,
    pub(crate) portfolio_link: Option<&'a str>,
    pub(crate) resume: &'a StoredAsset,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateVerificationRequest<'_>,
) -> Result<VerificationRequest, sqlx::Error> {
    sqlx::query_as::<_, VerificationRequest>(&format!(
        "INSERT INTO verification_requests (
            id, user_id, user_name, user_email, highest_qualification, experience_years,
            portfolio_link, resume, status, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.user_name)
    .bind(params.user_email)
    .bind(params.highest_qualification)
    .bind(params.experience_years)
    .bind(params.portfolio_link)
    .bind(Json(params.resume))
    .bind(VerificationStatus::Pending)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_latest_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    status: VerificationStatus,
) -> Result<Option<VerificationRequest>, sqlx::Error> {
    sqlx::query_as::<_, VerificationRequest>(&format!(
        "SELECT {COLUMNS} FROM verification_requests
         WHERE user_id = $1 AND status = $2
         ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(status)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<VerificationRequest>, sqlx::Error> {
    sqlx::query_as::<_, VerificationRequest>(&format!(
        "SELECT {COLUMNS} FROM verification_requests WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Records a decision on a pending request; `None` if it was already decided.
pub(crate) async fn record_decision(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
    status: VerificationStatus,
    admin_message: &str,
    reviewer_id: &str,
    reviewed_at: PrimitiveDateTime,
) -> Result<Option<VerificationRequest>, sqlx::Error> {
    sqlx::query_as::<_, VerificationRequest>(&format!(
        "UPDATE verification_requests
         SET status = $1, admin_message = $2, reviewed_by = $3, reviewed_at = $4, updated_at = $4
         WHERE id = $5 AND status = $6
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(admin_message)
    .bind(reviewer_id)
    .bind(reviewed_at)
    .bind(request_id)
    .bind(VerificationStatus::Pending)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists(
    executor: impl sqlx::PgExecutor<'_>,
    request_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM verification_requests WHERE id = $1)")
        .bind(request_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    status: Option<VerificationStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<VerificationRequest>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM verification_requests"));
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<VerificationRequest>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    status: Option<VerificationStatus>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM verification_requests");
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}
