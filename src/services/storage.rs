use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;

use crate::core::config::Settings;

/// External object storage holding course media. Keys are the public ids
/// stored in asset references.
#[async_trait]
pub(crate) trait AssetStore: Send + Sync {
    /// Returns a time-boxed URL the client can PUT the object to.
    async fn sign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String>;

    /// Deletes an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str, resource_type: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if !settings.storage().is_configured() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.storage().access_key.clone(),
            settings.storage().secret_key.clone(),
            None,
            None,
            "courseforge-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.storage().endpoint.clone())
            .region(aws_config::Region::new(settings.storage().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();
        let client = Client::from_conf(s3_config);

        Ok(Some(Self { client, bucket: settings.storage().bucket.clone() }))
    }
}

#[async_trait]
impl AssetStore for StorageService {
    async fn sign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    async fn delete(&self, key: &str, resource_type: &str) -> anyhow::Result<()> {
        self.client.delete_object().bucket(&self.bucket).key(key).send().await?;
        tracing::debug!(key, resource_type, "Deleted stored asset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AssetStore, StorageService};
    use crate::core::config::Settings;
    use crate::test_support;

    #[tokio::test]
    async fn storage_is_disabled_without_credentials() {
        let settings = {
            let _guard = test_support::env_lock();
            test_support::set_test_env();
            Settings::load().expect("settings")
        };

        assert!(StorageService::from_settings(&settings).await.expect("storage").is_none());
    }

    #[tokio::test]
    async fn presign_put_returns_url_for_key() {
        let settings = {
            let _guard = test_support::env_lock();
            test_support::set_test_env();
            test_support::set_test_storage_env();
            let settings = Settings::load().expect("settings");
            test_support::clear_test_storage_env();
            settings
        };

        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let url = storage
            .sign_upload("thumbnails/u1/cover.png", "image/png", Duration::from_secs(300))
            .await
            .expect("presign put");

        assert!(url.contains("thumbnails/u1/cover.png"));
    }
}
