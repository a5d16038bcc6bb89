use super::parsing::{
    env_flag, env_mib, env_number, env_optional, env_or_default, parse_cors_origins,
    parse_environment,
};
use super::types::{
    ApiSettings, AuthoringSettings, ConfigError, CorsSettings, DatabaseSettings,
    NotificationSettings, RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort,
    ServerSettings, Settings, StorageSettings, TelemetrySettings,
};

const DEV_SECRET_KEY: &str = "courseforge-development-secret";

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("COURSEFORGE_HOST", "0.0.0.0");
        let port = env_or_default("COURSEFORGE_PORT", "8000");

        let environment = parse_environment(
            env_optional("COURSEFORGE_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_flag("COURSEFORGE_STRICT_CONFIG") || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Courseforge");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = env_or_default("SECRET_KEY", "");
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = env_number::<u16>("POSTGRES_PORT", "5432")?;
        let postgres_user = env_or_default("POSTGRES_USER", "courseforge");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "courseforge");
        let database_url = env_optional("DATABASE_URL");
        let max_connections = env_number::<u32>("DATABASE_MAX_CONNECTIONS", "20")?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = env_number::<u16>("REDIS_PORT", "6379")?;
        let redis_db = env_number::<u16>("REDIS_DB", "0")?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");
        let course_cache_ttl_seconds = env_number::<u64>("COURSE_CACHE_TTL_SECONDS", "120")?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "http://localhost:9000");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "courseforge-assets");
        let s3_region = env_or_default("S3_REGION", "us-east-1");
        let public_base_url = env_optional("ASSET_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket));
        let max_image_bytes = env_mib("MAX_IMAGE_SIZE_MB", "5")?;
        let max_video_bytes = env_mib("MAX_VIDEO_SIZE_MB", "2048")?;
        let max_resume_bytes = env_mib("MAX_RESUME_SIZE_MB", "5")?;
        let presigned_url_expire_minutes = env_number::<u64>("PRESIGNED_URL_EXPIRE_MINUTES", "15")?;
        let storage_timeout_seconds = env_number::<u64>("STORAGE_REQUEST_TIMEOUT_SECONDS", "10")?;

        let max_draft_courses = env_number::<i64>("MAX_DRAFT_COURSES", "20")?;
        let append_retry_limit = env_number::<u32>("APPEND_RETRY_LIMIT", "8")?;

        let webhook_url = env_or_default("NOTIFICATION_WEBHOOK_URL", "");
        let max_attempts = env_number::<u32>("NOTIFICATION_MAX_ATTEMPTS", "3")?;
        let backoff_base_seconds = env_number::<u64>("NOTIFICATION_BACKOFF_SECONDS", "5")?;
        let poll_interval_seconds = env_number::<u64>("NOTIFICATION_POLL_INTERVAL_SECONDS", "2")?;
        let notification_timeout_seconds =
            env_number::<u64>("NOTIFICATION_REQUEST_TIMEOUT_SECONDS", "10")?;

        let log_level = env_or_default("COURSEFORGE_LOG_LEVEL", "info");
        let json = env_flag("COURSEFORGE_LOG_JSON");
        let prometheus_enabled = env_flag("PROMETHEUS_ENABLED");

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { secret_key, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
                course_cache_ttl_seconds,
            },
            storage: StorageSettings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
                public_base_url,
                max_image_bytes,
                max_video_bytes,
                max_resume_bytes,
                presigned_url_expire_minutes,
                request_timeout_seconds: storage_timeout_seconds,
            },
            authoring: AuthoringSettings { max_draft_courses, append_retry_limit },
            notifications: NotificationSettings {
                webhook_url,
                max_attempts: max_attempts as i32,
                backoff_base_seconds,
                poll_interval_seconds,
                request_timeout_seconds: notification_timeout_seconds,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn authoring(&self) -> &AuthoringSettings {
        &self.authoring
    }

    pub(crate) fn notifications(&self) -> &NotificationSettings {
        &self.notifications
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.authoring.max_draft_courses <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_DRAFT_COURSES",
                value: self.authoring.max_draft_courses.to_string(),
            });
        }

        if self.notifications.max_attempts <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "NOTIFICATION_MAX_ATTEMPTS",
                value: self.notifications.max_attempts.to_string(),
            });
        }

        if self.notifications.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "NOTIFICATION_POLL_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.storage.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "STORAGE_REQUEST_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            if self.security.secret_key.is_empty() {
                tracing::warn!("SECRET_KEY is not set; using the development signing key");
                self.security.secret_key = DEV_SECRET_KEY.to_string();
            }
            return Ok(self);
        }

        if self.security.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }
        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if !self.storage.is_configured() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support;

    use super::Settings;

    #[test]
    fn loads_defaults_for_authoring_and_notifications() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.authoring().max_draft_courses, 20);
        assert_eq!(settings.notifications().max_attempts, 3);
        assert_eq!(settings.storage().max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.storage().max_resume_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.redis().course_cache_ttl_seconds, 120);
    }

    #[test]
    fn strict_mode_requires_storage_credentials() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        std::env::set_var("COURSEFORGE_STRICT_CONFIG", "1");
        std::env::remove_var("S3_ACCESS_KEY");

        let result = Settings::load();
        std::env::remove_var("COURSEFORGE_STRICT_CONFIG");

        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_draft_quota() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        std::env::set_var("MAX_DRAFT_COURSES", "0");

        let result = Settings::load();
        std::env::remove_var("MAX_DRAFT_COURSES");

        assert!(result.is_err());
    }
}
