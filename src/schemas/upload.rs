use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::asset_refs::AssetClass;
use crate::services::assets::SignedUpload;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SignUploadRequest {
    #[serde(alias = "assetClass")]
    pub(crate) asset_class: AssetClass,
    #[serde(alias = "fileName")]
    #[validate(length(min = 1, max = 255, message = "file name is required"))]
    pub(crate) file_name: String,
    #[serde(alias = "contentType")]
    #[validate(length(min = 1, max = 255, message = "content type is required"))]
    pub(crate) content_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUploadResponse {
    pub(crate) upload_url: String,
    pub(crate) public_id: String,
    pub(crate) url: String,
    pub(crate) resource_type: &'static str,
    pub(crate) expires_in_seconds: u64,
}

impl From<SignedUpload> for SignUploadResponse {
    fn from(signed: SignedUpload) -> Self {
        Self {
            upload_url: signed.upload_url,
            public_id: signed.public_id,
            url: signed.url,
            resource_type: signed.resource_type,
            expires_in_seconds: signed.expires_in_seconds,
        }
    }
}
