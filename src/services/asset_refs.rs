use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::StorageSettings;
use crate::db::models::StoredAsset;

const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];
const VIDEO_FORMATS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "ogv"];
const RESUME_FORMATS: &[&str] = &["pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AssetClass {
    Thumbnail,
    Video,
    Resume,
}

impl AssetClass {
    pub(crate) fn prefix(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnails",
            Self::Video => "videos",
            Self::Resume => "resumes",
        }
    }

    pub(crate) fn resource_type(self) -> &'static str {
        match self {
            Self::Thumbnail => "image",
            Self::Video => "video",
            Self::Resume => "raw",
        }
    }

    pub(crate) fn allowed_formats(self) -> &'static [&'static str] {
        match self {
            Self::Thumbnail => IMAGE_FORMATS,
            Self::Video => VIDEO_FORMATS,
            Self::Resume => RESUME_FORMATS,
        }
    }

    pub(crate) fn max_bytes(self, limits: &StorageSettings) -> i64 {
        match self {
            Self::Thumbnail => limits.max_image_bytes,
            Self::Video => limits.max_video_bytes,
            Self::Resume => limits.max_resume_bytes,
        }
    }

    /// Key prefix reserved for objects uploaded by `owner_id`.
    pub(crate) fn namespace(self, owner_id: &str) -> String {
        format!("{}/{}/", self.prefix(), owner_id)
    }

    /// True when `public_id` lies inside the owner's namespace for this class.
    pub(crate) fn owns(self, public_id: &str, owner_id: &str) -> bool {
        !owner_id.is_empty()
            && !public_id.contains("..")
            && public_id.starts_with(&self.namespace(owner_id))
    }
}

/// An asset reference as claimed by a client after a direct upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AssetClaim {
    pub(crate) url: String,
    pub(crate) public_id: String,
    pub(crate) bytes: i64,
    pub(crate) resource_type: String,
    #[serde(default)]
    pub(crate) format: Option<String>,
    #[serde(default)]
    pub(crate) duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedAsset {
    pub(crate) asset: StoredAsset,
    pub(crate) bytes: i64,
    pub(crate) format: String,
    pub(crate) duration_seconds: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum AssetRejection {
    #[error("asset url is missing or not http(s)")]
    InvalidUrl,
    #[error("asset does not belong to the caller")]
    ForeignNamespace,
    #[error("format '{0}' is not allowed for this asset")]
    UnsupportedFormat(String),
    #[error("asset is {bytes} bytes, limit is {max}")]
    TooLarge { bytes: i64, max: i64 },
    #[error("asset size must be positive")]
    EmptyAsset,
    #[error("expected resource type '{expected}', got '{actual}'")]
    ResourceTypeMismatch { expected: &'static str, actual: String },
    #[error("video duration is missing")]
    MissingDuration,
}

/// Checks a claimed reference against the rules of `class` for `owner_id`.
pub(crate) fn validate(
    class: AssetClass,
    claim: &AssetClaim,
    owner_id: &str,
    limits: &StorageSettings,
) -> Result<ValidatedAsset, AssetRejection> {
    let url = claim.url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) || !url.contains(&claim.public_id)
    {
        return Err(AssetRejection::InvalidUrl);
    }

    if !class.owns(&claim.public_id, owner_id) {
        return Err(AssetRejection::ForeignNamespace);
    }

    let format = claim
        .format
        .as_deref()
        .map(str::to_string)
        .or_else(|| extension(&claim.public_id))
        .or_else(|| extension(url))
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !class.allowed_formats().contains(&format.as_str()) {
        return Err(AssetRejection::UnsupportedFormat(format));
    }

    if claim.bytes <= 0 {
        return Err(AssetRejection::EmptyAsset);
    }
    let max = class.max_bytes(limits);
    if claim.bytes > max {
        return Err(AssetRejection::TooLarge { bytes: claim.bytes, max });
    }

    if !claim.resource_type.eq_ignore_ascii_case(class.resource_type()) {
        return Err(AssetRejection::ResourceTypeMismatch {
            expected: class.resource_type(),
            actual: claim.resource_type.clone(),
        });
    }

    let duration_seconds = match (class, claim.duration_seconds) {
        (AssetClass::Video, Some(value)) if value.is_finite() && value > 0.0 => Some(value),
        (AssetClass::Video, _) => return Err(AssetRejection::MissingDuration),
        (_, value) => value,
    };

    Ok(ValidatedAsset {
        asset: StoredAsset { url: url.to_string(), public_id: claim.public_id.clone() },
        bytes: claim.bytes,
        format,
        duration_seconds,
    })
}

/// Builds an object key for a new upload of `file_name` by `owner_id`.
pub(crate) fn upload_key(
    class: AssetClass,
    owner_id: &str,
    file_name: &str,
) -> Result<String, AssetRejection> {
    let format = extension(file_name).unwrap_or_default().to_ascii_lowercase();
    if !class.allowed_formats().contains(&format.as_str()) {
        return Err(AssetRejection::UnsupportedFormat(format));
    }
    Ok(format!("{}{}.{}", class.namespace(owner_id), uuid::Uuid::new_v4(), format))
}

fn extension(value: &str) -> Option<String> {
    let path = value.split(['?', '#']).next().unwrap_or(value);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> StorageSettings {
        StorageSettings {
            endpoint: "http://localhost:9000".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: "assets".to_string(),
            region: "us-east-1".to_string(),
            public_base_url: "https://cdn.example".to_string(),
            max_image_bytes: 5 * 1024 * 1024,
            max_video_bytes: 100 * 1024 * 1024,
            max_resume_bytes: 5 * 1024 * 1024,
            presigned_url_expire_minutes: 15,
            request_timeout_seconds: 5,
        }
    }

    fn claim(public_id: &str, resource_type: &str, bytes: i64) -> AssetClaim {
        AssetClaim {
            url: format!("https://cdn.example/{public_id}"),
            public_id: public_id.to_string(),
            bytes,
            resource_type: resource_type.to_string(),
            format: None,
            duration_seconds: None,
        }
    }

    #[test]
    fn accepts_owned_thumbnail_and_infers_format() {
        let validated =
            validate(AssetClass::Thumbnail, &claim("thumbnails/u1/cover.PNG", "image", 2048), "u1", &limits())
                .expect("valid");
        assert_eq!(validated.format, "png");
        assert_eq!(validated.asset.public_id, "thumbnails/u1/cover.PNG");
    }

    #[test]
    fn rejects_reference_in_another_users_namespace() {
        let result =
            validate(AssetClass::Thumbnail, &claim("thumbnails/u2/cover.png", "image", 10), "u1", &limits());
        assert_eq!(result, Err(AssetRejection::ForeignNamespace));

        let traversal =
            validate(AssetClass::Thumbnail, &claim("thumbnails/u1/../u2/x.png", "image", 10), "u1", &limits());
        assert_eq!(traversal, Err(AssetRejection::ForeignNamespace));
    }

    #[test]
    fn rejects_wrong_format_size_and_type() {
        let gif = validate(AssetClass::Thumbnail, &claim("thumbnails/u1/a.gif", "image", 10), "u1", &limits());
        assert_eq!(gif, Err(AssetRejection::UnsupportedFormat("gif".to_string())));

        let big = validate(
            AssetClass::Resume,
            &claim("resumes/u1/cv.pdf", "raw", 5 * 1024 * 1024 + 1),
            "u1",
            &limits(),
        );
        assert!(matches!(big, Err(AssetRejection::TooLarge { .. })));

        let typed = validate(AssetClass::Resume, &claim("resumes/u1/cv.pdf", "image", 10), "u1", &limits());
        assert!(matches!(typed, Err(AssetRejection::ResourceTypeMismatch { expected: "raw", .. })));
    }

    #[test]
    fn video_requires_positive_duration() {
        let mut video = claim("videos/u1/lesson.mp4", "video", 4096);
        assert_eq!(
            validate(AssetClass::Video, &video, "u1", &limits()),
            Err(AssetRejection::MissingDuration)
        );

        video.duration_seconds = Some(93.5);
        let validated = validate(AssetClass::Video, &video, "u1", &limits()).expect("valid");
        assert_eq!(validated.duration_seconds, Some(93.5));
    }

    #[test]
    fn url_must_point_at_the_public_id() {
        let mut thumb = claim("thumbnails/u1/a.png", "image", 10);
        thumb.url = "https://cdn.example/thumbnails/u1/other.png".to_string();
        assert_eq!(
            validate(AssetClass::Thumbnail, &thumb, "u1", &limits()),
            Err(AssetRejection::InvalidUrl)
        );
    }

    #[test]
    fn upload_key_is_namespaced_per_owner() {
        let key = upload_key(AssetClass::Video, "u9", "My Lesson.MOV").expect("key");
        assert!(key.starts_with("videos/u9/"));
        assert!(key.ends_with(".mov"));
        assert!(AssetClass::Video.owns(&key, "u9"));
        assert!(!AssetClass::Video.owns(&key, "u1"));
        assert!(upload_key(AssetClass::Resume, "u9", "cv.docx").is_err());
    }
}
