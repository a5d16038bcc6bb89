/// True while a course thumbnail, a course video or a verification resume
/// still points at `public_id`.
pub(crate) async fn is_referenced(
    executor: impl sqlx::PgExecutor<'_>,
    public_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM courses
             WHERE thumbnail->>'public_id' = $1
                OR modules @> jsonb_build_array(jsonb_build_object(
                       'videos', jsonb_build_array(jsonb_build_object(
                           'asset', jsonb_build_object('public_id', $1::text)))))
         ) OR EXISTS (
             SELECT 1 FROM verification_requests WHERE resume->>'public_id' = $1
         )",
    )
    .bind(public_id)
    .fetch_one(executor)
    .await
}
