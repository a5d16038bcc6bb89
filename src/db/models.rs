use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::db::types::{CourseStatus, NotificationStatus, ReviewRequestStatus, VerificationStatus};

/// A validated reference to an object held by the external asset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredAsset {
    pub(crate) url: String,
    pub(crate) public_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Video {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) asset: StoredAsset,
    pub(crate) duration: f64,
    pub(crate) video_size_in_bytes: i64,
    pub(crate) order: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Module {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) videos: Vec<Video>,
    pub(crate) module_duration: f64,
    pub(crate) order: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

/// Ids removed by delete operations, kept so a repeated delete is distinguishable
/// from a delete of something that never existed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Tombstones {
    #[serde(default)]
    pub(crate) modules: BTreeSet<String>,
    #[serde(default)]
    pub(crate) videos: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) instructor_id: String,
    pub(crate) instructor_name: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: f64,
    pub(crate) category: String,
    pub(crate) tags: Json<Vec<String>>,
    pub(crate) thumbnail: Json<StoredAsset>,
    pub(crate) modules: Json<Vec<Module>>,
    pub(crate) tombstones: Json<Tombstones>,
    pub(crate) course_duration: f64,
    pub(crate) status: CourseStatus,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) version: i64,
    pub(crate) review_feedback: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) submitted_for_review_at: Option<PrimitiveDateTime>,
    pub(crate) published_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseReviewRequest {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) instructor_id: String,
    pub(crate) instructor_name: String,
    pub(crate) instructor_email: String,
    pub(crate) course_title: String,
    pub(crate) version: i32,
    pub(crate) status: ReviewRequestStatus,
    pub(crate) feedback: Option<String>,
    pub(crate) reviewer_id: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct VideoProgress {
    pub(crate) module_id: String,
    pub(crate) video_id: String,
    pub(crate) watched_seconds: f64,
    pub(crate) duration: f64,
    pub(crate) completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) last_watched_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) video_progress: Json<Vec<VideoProgress>>,
    pub(crate) version: i64,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseReview {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) rating: i16,
    pub(crate) comment: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct VerificationRequest {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
    pub(crate) highest_qualification: String,
    pub(crate) experience_years: Option<i32>,
    pub(crate) portfolio_link: Option<String>,
    pub(crate) resume: Json<StoredAsset>,
    pub(crate) status: VerificationStatus,
    pub(crate) admin_message: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct NotificationJob {
    pub(crate) id: String,
    pub(crate) kind: String,
    pub(crate) recipient: String,
    pub(crate) payload: Json<serde_json::Value>,
    pub(crate) dedupe_key: String,
    pub(crate) status: NotificationStatus,
    pub(crate) attempts: i32,
    pub(crate) last_error: Option<String>,
    pub(crate) run_after: PrimitiveDateTime,
    pub(crate) locked_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
