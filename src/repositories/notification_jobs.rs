use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::NotificationJob;
use crate::db::types::NotificationStatus;

const COLUMNS: &str = "id, kind, recipient, payload, dedupe_key, status, attempts, last_error, \
    run_after, locked_at, created_at, updated_at";

pub(crate) struct EnqueueJob<'a> {
    pub(crate) id: &'a str,
    pub(crate) kind: &'a str,
    pub(crate) recipient: &'a str,
    pub(crate) payload: &'a serde_json::Value,
    pub(crate) dedupe_key: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Inserts a job unless one with the same dedupe key exists. Returns true if inserted.
pub(crate) async fn enqueue(
    executor: impl sqlx::PgExecutor<'_>,
    params: EnqueueJob<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO notification_jobs (
            id, kind, recipient, payload, dedupe_key, status, attempts, run_after,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,0,$7,$7,$7)
         ON CONFLICT (dedupe_key) DO NOTHING",
    )
    .bind(params.id)
    .bind(params.kind)
    .bind(params.recipient)
    .bind(Json(params.payload))
    .bind(params.dedupe_key)
    .bind(NotificationStatus::Pending)
    .bind(params.created_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn claim_next(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Option<NotificationJob>, sqlx::Error> {
    sqlx::query_as::<_, NotificationJob>(&format!(
        "WITH candidate AS (
            SELECT id
            FROM notification_jobs
            WHERE status = $1 AND run_after <= $2
            ORDER BY run_after, created_at
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        UPDATE notification_jobs
        SET status = $3,
            attempts = attempts + 1,
            locked_at = $2,
            updated_at = $2
        FROM candidate
        WHERE notification_jobs.id = candidate.id
        RETURNING {}",
        prefixed_columns()
    ))
    .bind(NotificationStatus::Pending)
    .bind(now)
    .bind(NotificationStatus::InProgress)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn mark_sent(
    pool: &PgPool,
    job_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notification_jobs
         SET status = $1, locked_at = NULL, last_error = NULL, updated_at = $2
         WHERE id = $3",
    )
    .bind(NotificationStatus::Sent)
    .bind(now)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn schedule_retry(
    pool: &PgPool,
    job_id: &str,
    error: &str,
    run_after: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notification_jobs
         SET status = $1, locked_at = NULL, last_error = $2, run_after = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(NotificationStatus::Pending)
    .bind(error)
    .bind(run_after)
    .bind(now)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn mark_dead_letter(
    pool: &PgPool,
    job_id: &str,
    error: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE notification_jobs
         SET status = $1, locked_at = NULL, last_error = $2, updated_at = $3
         WHERE id = $4",
    )
    .bind(NotificationStatus::DeadLetter)
    .bind(error)
    .bind(now)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns jobs stuck in progress since before `stale_before` to the queue.
pub(crate) async fn recover_stale(
    pool: &PgPool,
    stale_before: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notification_jobs
         SET status = $1, locked_at = NULL, run_after = $2, updated_at = $2
         WHERE status = $3 AND locked_at < $4",
    )
    .bind(NotificationStatus::Pending)
    .bind(now)
    .bind(NotificationStatus::InProgress)
    .bind(stale_before)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_dead_letter(
    pool: &PgPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<NotificationJob>, sqlx::Error> {
    sqlx::query_as::<_, NotificationJob>(&format!(
        "SELECT {COLUMNS} FROM notification_jobs WHERE status = $1
         ORDER BY updated_at DESC OFFSET $2 LIMIT $3"
    ))
    .bind(NotificationStatus::DeadLetter)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_dead_letter(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notification_jobs WHERE status = $1")
        .bind(NotificationStatus::DeadLetter)
        .fetch_one(pool)
        .await
}

fn prefixed_columns() -> String {
    COLUMNS
        .split(',')
        .map(|column| format!("notification_jobs.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
