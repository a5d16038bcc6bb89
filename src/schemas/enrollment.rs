use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Enrollment, VideoProgress};
use crate::repositories::enrollments::EnrollmentWithCourse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressUpdate {
    #[serde(alias = "watchedSeconds")]
    #[validate(range(min = 0.0, message = "watched seconds must be non-negative"))]
    pub(crate) watched_seconds: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) enrolled_at: String,
    pub(crate) updated_at: String,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            progress: enrollment.progress,
            is_completed: enrollment.is_completed,
            enrolled_at: format_primitive(enrollment.enrolled_at),
            updated_at: format_primitive(enrollment.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) course_id: String,
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) video: VideoProgressResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoProgressResponse {
    pub(crate) module_id: String,
    pub(crate) video_id: String,
    pub(crate) watched_seconds: f64,
    pub(crate) duration: f64,
    pub(crate) completed: bool,
}

impl From<VideoProgress> for VideoProgressResponse {
    fn from(record: VideoProgress) -> Self {
        Self {
            module_id: record.module_id,
            video_id: record.video_id,
            watched_seconds: record.watched_seconds,
            duration: record.duration,
            completed: record.completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentEnrollmentItem {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) progress: i32,
    pub(crate) is_completed: bool,
    pub(crate) enrolled_at: String,
}

impl From<EnrollmentWithCourse> for StudentEnrollmentItem {
    fn from(row: EnrollmentWithCourse) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            course_title: row.course_title,
            progress: row.progress,
            is_completed: row.is_completed,
            enrolled_at: format_primitive(row.enrolled_at),
        }
    }
}
