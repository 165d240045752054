//! Server configuration

use std::collections::HashMap;

use crate::BoxError;

/// Server configuration, read from the environment (after `.env` is loaded)
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Max pooled connections
    pub db_max_connections: u32,
    /// HTTP listen port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Access token lifetime
    pub jwt_expiration_minutes: i64,
    /// Refresh token lifetime
    pub refresh_token_days: i64,
    /// Directory uploaded images are written to
    pub media_root: String,
    /// URL prefix the media directory is served under
    pub media_url: String,
    /// Per-file upload limit in bytes
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    /// Rolling log directory; console only when unset
    pub log_dir: Option<String>,
    pub log_json: bool,
    /// SES sender; notifications are disabled when unset
    pub ses_from_email: Option<String>,
    /// Office recipients of registration notifications
    pub notify_emails: Vec<String>,
    /// Link included in notification emails
    pub verification_url: String,
    /// Bootstrap staff account, created when no user exists yet
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an in-memory map
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, BoxError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| -> Result<Option<i64>, BoxError> {
            var(key)
                .map(|v| {
                    v.trim().parse::<i64>().map_err(|_| -> BoxError {
                        format!("{key} must be an integer, got {v:?}").into()
                    })
                })
                .transpose()
        };

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "development" => "dev-JWT_SECRET-not-for-production".into(),
            None => return Err(format!("JWT_SECRET must be set in {environment} environment").into()),
        };
        if environment != "development" && jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters long".into());
        }

        let notify_emails = var("NOTIFY_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: var("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS")?.unwrap_or(10) as u32,
            http_port: parsed("HTTP_PORT")?.unwrap_or(8080) as u16,
            environment,
            jwt_secret,
            jwt_issuer: var("JWT_ISSUER").unwrap_or_else(|| "voucher-server".into()),
            jwt_audience: var("JWT_AUDIENCE").unwrap_or_else(|| "voucher-clients".into()),
            jwt_expiration_minutes: parsed("JWT_EXPIRATION_MINUTES")?.unwrap_or(60),
            refresh_token_days: parsed("REFRESH_TOKEN_DAYS")?.unwrap_or(7),
            media_root: var("MEDIA_ROOT").unwrap_or_else(|| "media".into()),
            media_url: var("MEDIA_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "/media".into()),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES")?.unwrap_or(5 * 1024 * 1024) as usize,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS")?.unwrap_or(30) as u64,
            log_dir: var("LOG_DIR"),
            log_json: var("LOG_JSON").is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
            ses_from_email: var("SES_FROM_EMAIL"),
            notify_emails,
            verification_url: var("VERIFICATION_URL")
                .unwrap_or_else(|| "http://localhost:3000/verification".into()),
            admin_username: var("ADMIN_USERNAME"),
            admin_email: var("ADMIN_EMAIL"),
            admin_password: var("ADMIN_PASSWORD"),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_map(&vars(&[("DATABASE_URL", "postgres://localhost/v")])).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.jwt_expiration_minutes, 60);
        assert_eq!(config.media_url, "/media");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.notify_emails.is_empty());
        assert!(config.is_development());
    }

    #[test]
    fn test_database_url_required() {
        assert!(Config::from_map(&vars(&[])).is_err());
    }

    #[test]
    fn test_production_requires_secret() {
        let err = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("ENVIRONMENT", "production"),
        ]));
        assert!(err.is_err());

        let short = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "short"),
        ]));
        assert!(short.is_err());

        let ok = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_lists_and_numbers() {
        let config = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("NOTIFY_EMAILS", "a@x.id, b@x.id,,"),
            ("HTTP_PORT", "9000"),
            ("MEDIA_URL", "https://cdn.example.com/media/"),
            ("LOG_JSON", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.notify_emails, vec!["a@x.id", "b@x.id"]);
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.media_url, "https://cdn.example.com/media");
        assert!(config.log_json);
    }

    #[test]
    fn test_bad_number_rejected() {
        let result = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("HTTP_PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }
}
