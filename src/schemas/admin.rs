use serde::{Deserialize, Serialize};

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::models::NotificationJob;
use crate::db::types::NotificationStatus;

/// Shared query for the admin queues; `status` is parsed per queue.
#[derive(Debug, Deserialize)]
pub(crate) struct QueueQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationJobResponse {
    pub(crate) id: String,
    pub(crate) kind: String,
    pub(crate) recipient: String,
    pub(crate) payload: serde_json::Value,
    pub(crate) status: NotificationStatus,
    pub(crate) attempts: i32,
    pub(crate) last_error: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<NotificationJob> for NotificationJobResponse {
    fn from(job: NotificationJob) -> Self {
        Self {
            id: job.id,
            kind: job.kind,
            recipient: job.recipient,
            payload: job.payload.0,
            status: job.status,
            attempts: job.attempts,
            last_error: job.last_error,
            created_at: format_primitive(job.created_at),
            updated_at: format_primitive(job.updated_at),
        }
    }
}
