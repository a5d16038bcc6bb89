use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{CourseReview, CourseReviewRequest};
use crate::db::types::{Decision, ReviewRequestStatus};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewDecisionRequest {
    pub(crate) action: Decision,
    #[serde(default)]
    #[validate(length(max = 5000, message = "feedback is too long"))]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewRequestResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) instructor_id: String,
    pub(crate) instructor_name: String,
    pub(crate) instructor_email: String,
    pub(crate) version: i32,
    pub(crate) status: ReviewRequestStatus,
    pub(crate) feedback: Option<String>,
    pub(crate) reviewer_id: Option<String>,
    pub(crate) reviewed_at: Option<String>,
    pub(crate) created_at: String,
}

impl From<CourseReviewRequest> for ReviewRequestResponse {
    fn from(request: CourseReviewRequest) -> Self {
        Self {
            id: request.id,
            course_id: request.course_id,
            course_title: request.course_title,
            instructor_id: request.instructor_id,
            instructor_name: request.instructor_name,
            instructor_email: request.instructor_email,
            version: request.version,
            status: request.status,
            feedback: request.feedback,
            reviewer_id: request.reviewer_id,
            reviewed_at: format_optional(request.reviewed_at),
            created_at: format_primitive(request.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SubmissionStatus {
    Submitted,
    AlreadyPending,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitReviewResponse {
    pub(crate) status: SubmissionStatus,
    pub(crate) request: ReviewRequestResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RatingRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub(crate) rating: i16,
    #[serde(default)]
    #[validate(length(max = 2000, message = "comment is too long"))]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseReviewResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) rating: i16,
    pub(crate) comment: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl From<CourseReview> for CourseReviewResponse {
    fn from(review: CourseReview) -> Self {
        Self {
            id: review.id,
            course_id: review.course_id,
            student_id: review.student_id,
            student_name: review.student_name,
            rating: review.rating,
            comment: review.comment,
            created_at: format_primitive(review.created_at),
            updated_at: format_primitive(review.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingResponse {
    pub(crate) review: CourseReviewResponse,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_payload_accepts_lowercase_actions() {
        let payload: ReviewDecisionRequest =
            serde_json::from_str(r#"{"action":"rejected","feedback":"needs captions"}"#)
                .expect("payload");
        assert_eq!(payload.action, Decision::Rejected);
        assert!(serde_json::from_str::<ReviewDecisionRequest>(r#"{"action":"maybe"}"#).is_err());
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        let low = RatingRequest { rating: 0, comment: None };
        let high = RatingRequest { rating: 6, comment: None };
        let ok = RatingRequest { rating: 5, comment: Some("great".to_string()) };
        assert!(low.validate().is_err());
        assert!(high.validate().is_err());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn submission_status_serializes_snake_case() {
        let value = serde_json::to_value(SubmissionStatus::AlreadyPending).expect("json");
        assert_eq!(value, serde_json::json!("already_pending"));
    }
}
