use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_optional, format_primitive};
use crate::db::models::VerificationRequest;
use crate::db::types::{Decision, VerificationStatus};
use crate::services::asset_refs::AssetClaim;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VerificationCreate {
    #[serde(alias = "highestQualification")]
    #[validate(length(min = 1, max = 200, message = "highest qualification is required"))]
    pub(crate) highest_qualification: String,
    #[serde(default, alias = "experienceYears")]
    #[validate(range(min = 0, max = 80, message = "experience years out of range"))]
    pub(crate) experience_years: Option<i32>,
    #[serde(default, alias = "portfolioLink")]
    #[validate(url(message = "portfolio link must be a URL"))]
    pub(crate) portfolio_link: Option<String>,
    pub(crate) resume: AssetClaim,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VerificationDecisionRequest {
    pub(crate) action: Decision,
    #[serde(default, alias = "adminMessage")]
    #[validate(length(max = 5000, message = "message is too long"))]
    pub(crate) admin_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerificationResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
    pub(crate) highest_qualification: String,
    pub(crate) experience_years: Option<i32>,
    pub(crate) portfolio_link: Option<String>,
    pub(crate) resume_url: String,
    pub(crate) status: VerificationStatus,
    pub(crate) admin_message: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<String>,
    pub(crate) created_at: String,
}

impl From<VerificationRequest> for VerificationResponse {
    fn from(request: VerificationRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            user_name: request.user_name,
            user_email: request.user_email,
            highest_qualification: request.highest_qualification,
            experience_years: request.experience_years,
            portfolio_link: request.portfolio_link,
            resume_url: request.resume.0.url,
            status: request.status,
            admin_message: request.admin_message,
            reviewed_by: request.reviewed_by,
            reviewed_at: format_optional(request.reviewed_at),
            created_at: format_primitive(request.created_at),
        }
    }
}
