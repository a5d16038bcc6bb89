use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::storage::AssetStore;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    assets: Option<Arc<dyn AssetStore>>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        assets: Option<Arc<dyn AssetStore>>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, assets }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    /// The external asset store, absent when storage credentials are not configured.
    pub(crate) fn assets(&self) -> Option<&dyn AssetStore> {
        self.inner.assets.as_deref()
    }
}
