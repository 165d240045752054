//! JWT token service
//!
//! Issues and validates HS256 access tokens. Refresh tokens are opaque and
//! live in the database (see `db::refresh_tokens`).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::User;
use thiserror::Error;

use crate::config::Config;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret (at least 32 bytes outside development)
    pub secret: String,
    /// Access token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl From<&Config> for JwtConfig {
    fn from(config: &Config) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_minutes: config.jwt_expiration_minutes,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        }
    }
}

/// Claims stored in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub is_staff: bool,
    /// Wholesaler the account acts for, if any
    pub wholesale_id: Option<i64>,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            JwtError::GenerationFailed(msg) => {
                tracing::error!("JWT generation failed: {msg}");
                AppError::new(ErrorCode::InternalError)
            }
            _ => AppError::invalid_token("Invalid token"),
        }
    }
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Access token lifetime in seconds
    pub fn expires_in_secs(&self) -> i64 {
        self.config.expiration_minutes * 60
    }

    /// Issue an access token for `user`
    pub fn generate_token(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            is_staff: user.is_staff,
            wholesale_id: user.wholesale_id,
            token_type: "access".to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Validate and decode an access token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })?;

        if token_data.claims.token_type != "access" {
            return Err(JwtError::InvalidToken("not an access token".to_string()));
        }
        Ok(token_data.claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Authenticated caller, resolved from a validated access token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub wholesale_id: Option<i64>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("bad subject: {}", claims.sub)))?;
        Ok(Self {
            id,
            username: claims.username,
            is_staff: claims.is_staff,
            wholesale_id: claims.wholesale_id,
        })
    }
}

impl CurrentUser {
    /// Office actions (approval, settlement, master data) are staff-only
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            return Ok(());
        }
        crate::security_log!(
            WARN,
            "staff_required",
            user_id = self.id,
            username = %self.username
        );
        Err(AppError::new(ErrorCode::StaffRequired))
    }

    /// Staff may act for any wholesaler; other accounts only for their own
    pub fn require_wholesale(&self, wholesale_id: i64) -> Result<(), AppError> {
        if self.is_staff || self.wholesale_id == Some(wholesale_id) {
            return Ok(());
        }
        crate::security_log!(
            WARN,
            "wholesale_forbidden",
            user_id = self.id,
            requested = wholesale_id
        );
        Err(AppError::permission_denied(
            "Account is not linked to this wholesaler",
        ))
    }

    /// Wholesaler filter for listings: staff see what they ask for, other
    /// accounts are pinned to their own wholesaler.
    pub fn wholesale_scope(&self, requested: Option<i64>) -> Result<Option<i64>, AppError> {
        if self.is_staff {
            return Ok(requested);
        }
        match (requested, self.wholesale_id) {
            (Some(id), _) => self.require_wholesale(id).map(|()| Some(id)),
            (None, Some(own)) => Ok(Some(own)),
            (None, None) => Err(AppError::permission_denied(
                "Account is not linked to a wholesaler",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-that-is-at-least-32-bytes-long".to_string(),
            expiration_minutes: 5,
            issuer: "voucher-server".to_string(),
            audience: "voucher-clients".to_string(),
        })
    }

    fn user(is_staff: bool, wholesale_id: Option<i64>) -> User {
        User {
            id: 42,
            username: "agen01".to_string(),
            email: None,
            is_active: true,
            is_staff,
            wholesale_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let svc = service();
        let token = svc.generate_token(&user(false, Some(3))).unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.wholesale_id, Some(3));
        assert!(!claims.is_staff);

        let current = CurrentUser::try_from(claims).unwrap();
        assert_eq!(current.id, 42);
        assert_eq!(current.username, "agen01");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().generate_token(&user(true, None)).unwrap();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-that-is-at-least-32-bytes".to_string(),
            ..service().config
        });
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let token = service().generate_token(&user(true, None)).unwrap();
        let other = JwtService::with_config(JwtConfig {
            audience: "someone-else".to_string(),
            ..service().config
        });
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let svc = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            username: "old".to_string(),
            is_staff: false,
            wholesale_id: None,
            token_type: "access".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            iss: "voucher-server".to_string(),
            aud: "voucher-clients".to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &svc.encoding_key).unwrap();
        assert!(matches!(
            svc.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
        let app: AppError = JwtError::ExpiredToken.into();
        assert_eq!(app.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }

    #[test]
    fn test_staff_and_wholesale_guards() {
        let staff = CurrentUser {
            id: 1,
            username: "office".into(),
            is_staff: true,
            wholesale_id: None,
        };
        assert!(staff.require_staff().is_ok());
        assert!(staff.require_wholesale(9).is_ok());

        let agent = CurrentUser {
            id: 2,
            username: "agen".into(),
            is_staff: false,
            wholesale_id: Some(5),
        };
        assert_eq!(
            agent.require_staff().unwrap_err().code,
            ErrorCode::StaffRequired
        );
        assert!(agent.require_wholesale(5).is_ok());
        assert_eq!(
            agent.require_wholesale(6).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
    }

    #[test]
    fn test_wholesale_scope() {
        let staff = CurrentUser {
            id: 1,
            username: "office".into(),
            is_staff: true,
            wholesale_id: None,
        };
        assert_eq!(staff.wholesale_scope(None).unwrap(), None);
        assert_eq!(staff.wholesale_scope(Some(4)).unwrap(), Some(4));

        let agent = CurrentUser {
            id: 2,
            username: "agen".into(),
            is_staff: false,
            wholesale_id: Some(5),
        };
        assert_eq!(agent.wholesale_scope(None).unwrap(), Some(5));
        assert_eq!(agent.wholesale_scope(Some(5)).unwrap(), Some(5));
        assert!(agent.wholesale_scope(Some(6)).is_err());

        let unlinked = CurrentUser {
            wholesale_id: None,
            ..agent
        };
        assert!(unlinked.wholesale_scope(None).is_err());
    }
}
