use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;
use crate::db::types::UserRole;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("jwt decoding failed")]
    JwtDecoding,
    #[cfg(test)]
    #[error("jwt encoding failed")]
    JwtEncoding,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims carried by principal tokens minted by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) role: UserRole,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) instructor_verified: bool,
    pub(crate) exp: i64,
}

/// The authenticated caller every core operation acts on behalf of.
#[derive(Debug, Clone)]
pub(crate) struct Principal {
    pub(crate) user_id: String,
    pub(crate) role: UserRole,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) instructor_verified: bool,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            name: claims.name,
            email: claims.email,
            instructor_verified: claims.instructor_verified,
        }
    }
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Principal, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.security().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.into())
    .map_err(|_| SecurityError::JwtDecoding)
}

#[cfg(test)]
pub(crate) fn issue_token(
    claims: &Claims,
    settings: &Settings,
) -> Result<String, SecurityError> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let algorithm = algorithm_from_settings(settings)?;
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(settings.security().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::JwtEncoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.security().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::test_support;

    fn claims(role: UserRole, exp: OffsetDateTime) -> Claims {
        Claims {
            sub: "user-123".to_string(),
            role,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            instructor_verified: true,
            exp: exp.unix_timestamp(),
        }
    }

    #[test]
    fn jwt_encode_decode_roundtrip() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let expires = OffsetDateTime::now_utc() + Duration::minutes(5);
        let token = issue_token(&claims(UserRole::Instructor, expires), &settings).expect("token");
        let principal = verify_token(&token, &settings).expect("principal");

        assert_eq!(principal.user_id, "user-123");
        assert_eq!(principal.role, UserRole::Instructor);
        assert!(principal.instructor_verified);
    }

    #[test]
    fn expired_token_is_rejected() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let expired = OffsetDateTime::now_utc() - Duration::hours(2);
        let token = issue_token(&claims(UserRole::Student, expired), &settings).expect("token");

        assert!(matches!(verify_token(&token, &settings), Err(SecurityError::JwtDecoding)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let _guard = test_support::env_lock();
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");
        std::env::set_var("SECRET_KEY", "another-secret");
        let other = Settings::load().expect("settings");
        test_support::set_test_env();

        let expires = OffsetDateTime::now_utc() + Duration::minutes(5);
        let token = issue_token(&claims(UserRole::Admin, expires), &other).expect("token");

        assert!(verify_token(&token, &settings).is_err());
    }
}
