use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::{Course, Module, Video};
use crate::db::types::CourseStatus;
use crate::repositories::courses::CourseAnalyticsRow;
use crate::services::asset_refs::AssetClaim;

const MIN_TITLE_WORDS: usize = 3;
const MIN_DESCRIPTION_WORDS: usize = 30;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(max = 200), custom(function = "validate_title_words"))]
    pub(crate) title: String,
    #[validate(length(max = 20000), custom(function = "validate_description_words"))]
    pub(crate) description: String,
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: f64,
    #[validate(length(min = 1, max = 100, message = "category must not be empty"))]
    pub(crate) category: String,
    #[validate(length(min = 1, max = 20, message = "at least one tag is required"))]
    pub(crate) tags: Vec<String>,
    pub(crate) thumbnail: AssetClaim,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(max = 200), custom(function = "validate_title_words"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20000), custom(function = "validate_description_words"))]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub(crate) price: Option<f64>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "category must not be empty"))]
    pub(crate) category: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "at least one tag is required"))]
    pub(crate) tags: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) thumbnail: Option<AssetClaim>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(max = 200, message = "title is too long"))]
    pub(crate) title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VideoCreate {
    #[validate(length(max = 200, message = "title is too long"))]
    pub(crate) title: String,
    pub(crate) asset: AssetClaim,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReorderRequest {
    #[serde(alias = "newOrder")]
    #[validate(length(max = 500, message = "too many ids"))]
    pub(crate) order: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogQuery {
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Comma-separated; a course matches if it carries any of them.
    #[serde(default)]
    pub(crate) tags: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) sort: Option<String>,
    #[serde(default)]
    pub(crate) page: Option<i64>,
    #[serde(default)]
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogResponse {
    pub(crate) items: Vec<CourseSummary>,
    pub(crate) total_count: i64,
    pub(crate) page: i64,
    pub(crate) limit: i64,
    pub(crate) total_pages: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) public_id: Option<String>,
    pub(crate) duration: f64,
    pub(crate) video_size_in_bytes: i64,
    pub(crate) order: i32,
}

impl VideoResponse {
    fn from_video(video: &Video, include_asset: bool) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            url: include_asset.then(|| video.asset.url.clone()),
            public_id: include_asset.then(|| video.asset.public_id.clone()),
            duration: video.duration,
            video_size_in_bytes: video.video_size_in_bytes,
            order: video.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) order: i32,
    pub(crate) module_duration: f64,
    pub(crate) videos: Vec<VideoResponse>,
}

impl ModuleResponse {
    fn from_module(module: &Module, include_assets: bool) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            order: module.order,
            module_duration: module.module_duration,
            videos: module
                .videos
                .iter()
                .map(|video| VideoResponse::from_video(video, include_assets))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) instructor_id: String,
    pub(crate) instructor_name: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: f64,
    pub(crate) category: String,
    pub(crate) tags: Vec<String>,
    pub(crate) thumbnail_url: String,
    pub(crate) status: CourseStatus,
    pub(crate) course_duration: f64,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) version: i64,
    pub(crate) modules: Vec<ModuleResponse>,
    pub(crate) review_feedback: Option<String>,
    pub(crate) submitted_for_review_at: Option<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    /// `include_assets` controls whether video URLs are exposed.
    pub(crate) fn from_db(course: Course, include_assets: bool) -> Self {
        Self {
            modules: course
                .modules
                .0
                .iter()
                .map(|module| ModuleResponse::from_module(module, include_assets))
                .collect(),
            id: course.id,
            instructor_id: course.instructor_id,
            instructor_name: course.instructor_name,
            title: course.title,
            description: course.description,
            price: course.price,
            category: course.category,
            tags: course.tags.0,
            thumbnail_url: course.thumbnail.0.url,
            status: course.status,
            course_duration: course.course_duration,
            average_rating: course.average_rating,
            rating_count: course.rating_count,
            version: course.version,
            review_feedback: course.review_feedback,
            submitted_for_review_at: format_optional(course.submitted_for_review_at),
            published_at: format_optional(course.published_at),
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CourseSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) instructor_name: String,
    pub(crate) price: f64,
    pub(crate) category: String,
    pub(crate) tags: Vec<String>,
    pub(crate) thumbnail_url: String,
    pub(crate) status: CourseStatus,
    pub(crate) course_duration: f64,
    pub(crate) module_count: usize,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) created_at: String,
}

impl CourseSummary {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            module_count: course.modules.0.len(),
            id: course.id,
            title: course.title,
            instructor_name: course.instructor_name,
            price: course.price,
            category: course.category,
            tags: course.tags.0,
            thumbnail_url: course.thumbnail.0.url,
            status: course.status,
            course_duration: course.course_duration,
            average_rating: course.average_rating,
            rating_count: course.rating_count,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OutlineMutationResponse {
    pub(crate) course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) module_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) video_id: Option<String>,
    pub(crate) course_duration: f64,
    pub(crate) version: i64,
    pub(crate) modules: Vec<ModuleResponse>,
}

impl OutlineMutationResponse {
    pub(crate) fn new(
        course_id: &str,
        module_id: Option<String>,
        video_id: Option<String>,
        modules: &[Module],
        course_duration: f64,
        version: i64,
    ) -> Self {
        Self {
            course_id: course_id.to_string(),
            module_id,
            video_id,
            course_duration,
            version,
            modules: modules.iter().map(|module| ModuleResponse::from_module(module, true)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseAnalyticsResponse {
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) status: CourseStatus,
    pub(crate) average_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) enrollment_count: i64,
}

impl From<CourseAnalyticsRow> for CourseAnalyticsResponse {
    fn from(row: CourseAnalyticsRow) -> Self {
        Self {
            course_id: row.id,
            title: row.title,
            status: row.status,
            average_rating: row.average_rating,
            rating_count: row.rating_count,
            enrollment_count: row.enrollment_count,
        }
    }
}

fn word_count(value: &str) -> usize {
    value.split_whitespace().count()
}

fn validate_title_words(value: &str) -> Result<(), ValidationError> {
    if word_count(value) < MIN_TITLE_WORDS {
        let mut err = ValidationError::new("title_words");
        err.message = Some(format!("title must contain at least {MIN_TITLE_WORDS} words").into());
        return Err(err);
    }
    Ok(())
}

fn validate_description_words(value: &str) -> Result<(), ValidationError> {
    if word_count(value) < MIN_DESCRIPTION_WORDS {
        let mut err = ValidationError::new("description_words");
        err.message =
            Some(format!("description must contain at least {MIN_DESCRIPTION_WORDS} words").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> AssetClaim {
        AssetClaim {
            url: "https://cdn.example/thumbnails/u1/a.png".to_string(),
            public_id: "thumbnails/u1/a.png".to_string(),
            bytes: 10,
            resource_type: "image".to_string(),
            format: None,
            duration_seconds: None,
        }
    }

    fn valid() -> CourseCreate {
        CourseCreate {
            title: "Systems Programming in Rust".to_string(),
            description: "word ".repeat(30),
            price: 19.0,
            category: "programming".to_string(),
            tags: vec!["rust".to_string()],
            thumbnail: claim(),
        }
    }

    #[test]
    fn accepts_complete_draft_payload() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_short_title_and_description() {
        let mut payload = valid();
        payload.title = "Rust".to_string();
        assert!(payload.validate().is_err());

        let mut payload = valid();
        payload.description = "too short".to_string();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn rejects_negative_price_and_missing_tags() {
        let mut payload = valid();
        payload.price = -1.0;
        assert!(payload.validate().is_err());

        let mut payload = valid();
        payload.tags.clear();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let update = CourseUpdate {
            title: None,
            description: None,
            price: Some(5.0),
            category: None,
            tags: None,
            thumbnail: None,
        };
        assert!(update.validate().is_ok());

        let update = CourseUpdate { title: Some("One".to_string()), ..update };
        assert!(update.validate().is_err());
    }
}
