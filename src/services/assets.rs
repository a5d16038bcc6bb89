use std::future::Future;
use std::time::Duration;

use crate::core::config::StorageSettings;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::repositories;
use crate::services::asset_refs::{self, AssetClaim, AssetClass, ValidatedAsset};
use crate::services::errors::{DomainError, DomainResult};
use crate::services::storage::AssetStore;

/// An object scheduled for deletion once the commit that dropped its reference succeeds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingDeletion {
    pub(crate) public_id: String,
    pub(crate) class: AssetClass,
}

impl PendingDeletion {
    pub(crate) fn new(public_id: impl Into<String>, class: AssetClass) -> Self {
        Self { public_id: public_id.into(), class }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SignedUpload {
    pub(crate) upload_url: String,
    pub(crate) public_id: String,
    pub(crate) url: String,
    pub(crate) resource_type: &'static str,
    pub(crate) expires_in_seconds: u64,
}

pub(crate) struct AssetsService;

impl AssetsService {
    /// Validates a claimed reference before any write that would point at it.
    ///
    /// A rejected object inside the caller's own namespace is deleted
    /// best-effort; objects elsewhere are never touched.
    pub(crate) async fn resolve(
        state: &AppState,
        class: AssetClass,
        claim: &AssetClaim,
        owner_id: &str,
    ) -> DomainResult<ValidatedAsset> {
        match asset_refs::validate(class, claim, owner_id, state.settings().storage()) {
            Ok(validated) => Ok(validated),
            Err(rejection) => {
                tracing::warn!(
                    owner_id,
                    public_id = %claim.public_id,
                    class = class.prefix(),
                    reason = %rejection,
                    "Rejected asset reference"
                );
                if class.owns(&claim.public_id, owner_id) {
                    Self::discard(state, &[PendingDeletion::new(claim.public_id.clone(), class)])
                        .await;
                }
                Err(DomainError::InvalidAssetReference(rejection.to_string()))
            }
        }
    }

    /// Deletes objects whose references are gone. An object that a committed
    /// row still points at is kept. Failures are logged and counted, never returned.
    pub(crate) async fn discard(state: &AppState, deletions: &[PendingDeletion]) {
        let orphans = unreferenced(state, deletions).await;
        discard_with(state.assets(), state.settings().storage(), &orphans).await;
    }

    pub(crate) async fn sign_upload(
        state: &AppState,
        class: AssetClass,
        owner_id: &str,
        file_name: &str,
        content_type: &str,
    ) -> DomainResult<SignedUpload> {
        let store = state.assets().ok_or_else(|| {
            DomainError::UpstreamUnavailable("Asset storage is not configured".to_string())
        })?;
        let key = asset_refs::upload_key(class, owner_id, file_name)
            .map_err(|err| DomainError::InvalidInput(err.to_string()))?;

        let limits = state.settings().storage();
        let expires_in = Duration::from_secs(limits.presigned_url_expire_minutes * 60);
        let upload_url =
            with_timeout(limits, store.sign_upload(&key, content_type, expires_in)).await?;

        Ok(SignedUpload {
            upload_url,
            url: limits.public_url(&key),
            public_id: key,
            resource_type: class.resource_type(),
            expires_in_seconds: expires_in.as_secs(),
        })
    }
}

/// Keys are client supplied and may be shared between rows. Each one is
/// rechecked after the commit that dropped it and kept when the check fails.
async fn unreferenced(state: &AppState, deletions: &[PendingDeletion]) -> Vec<PendingDeletion> {
    let mut orphans: Vec<PendingDeletion> = Vec::with_capacity(deletions.len());
    for deletion in deletions {
        if orphans.iter().any(|seen| seen.public_id == deletion.public_id) {
            continue;
        }
        match repositories::asset_usage::is_referenced(state.db(), &deletion.public_id).await {
            Ok(false) => orphans.push(deletion.clone()),
            Ok(true) => {
                tracing::info!(public_id = %deletion.public_id, "Asset still referenced; keeping it")
            }
            Err(err) => tracing::warn!(
                public_id = %deletion.public_id,
                error = %err,
                "Could not check asset references; keeping it"
            ),
        }
    }
    orphans
}

pub(crate) async fn discard_with(
    store: Option<&dyn AssetStore>,
    limits: &StorageSettings,
    deletions: &[PendingDeletion],
) {
    let Some(store) = store else {
        if !deletions.is_empty() {
            tracing::warn!(count = deletions.len(), "Asset storage not configured; skipping cleanup");
        }
        return;
    };

    for deletion in deletions {
        let resource_type = deletion.class.resource_type();
        match with_timeout(limits, store.delete(&deletion.public_id, resource_type)).await {
            Ok(()) => {
                tracing::info!(public_id = %deletion.public_id, resource_type, "Asset cleaned up")
            }
            Err(err) => {
                metrics::record_asset_cleanup_failure(resource_type);
                tracing::error!(
                    public_id = %deletion.public_id,
                    resource_type,
                    error = %err,
                    "Failed to clean up asset; leaving orphan"
                );
            }
        }
    }
}

/// Bounds an asset-store call; a timeout or transport error becomes `UpstreamUnavailable`.
pub(crate) async fn with_timeout<T>(
    limits: &StorageSettings,
    call: impl Future<Output = anyhow::Result<T>>,
) -> DomainResult<T> {
    match tokio::time::timeout(Duration::from_secs(limits.request_timeout_seconds), call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(DomainError::UpstreamUnavailable(format!("Asset store error: {err}"))),
        Err(_) => Err(DomainError::UpstreamUnavailable("Asset store timed out".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{self, RecordingAssetStore};

    fn limits() -> StorageSettings {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        crate::core::config::Settings::load().expect("settings").storage().clone()
    }

    #[tokio::test]
    async fn discard_deletes_each_object_once() {
        let store = Arc::new(RecordingAssetStore::default());
        let deletions = vec![
            PendingDeletion::new("videos/u1/a.mp4", AssetClass::Video),
            PendingDeletion::new("thumbnails/u1/c.png", AssetClass::Thumbnail),
        ];

        discard_with(Some(store.as_ref() as &dyn AssetStore), &limits(), &deletions).await;

        assert_eq!(
            store.deleted(),
            vec![
                ("videos/u1/a.mp4".to_string(), "video".to_string()),
                ("thumbnails/u1/c.png".to_string(), "image".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failing_store_does_not_surface_errors() {
        let store = Arc::new(RecordingAssetStore::failing());
        discard_with(
            Some(store.as_ref() as &dyn AssetStore),
            &limits(),
            &[PendingDeletion::new("videos/u1/a.mp4", AssetClass::Video)],
        )
        .await;
        assert!(store.deleted().is_empty());
    }

    #[tokio::test]
    async fn slow_store_times_out_as_upstream_unavailable() {
        let mut limits = limits();
        limits.request_timeout_seconds = 1;

        let result = with_timeout(&limits, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        })
        .await;

        assert!(matches!(result, Err(DomainError::UpstreamUnavailable(_))));
    }
}
