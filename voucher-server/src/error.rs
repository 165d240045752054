//! Service-layer error type
//!
//! `ServiceError` bridges database and infrastructure errors (`sqlx::Error`,
//! `BoxError`) and the API-layer `AppError`, so db functions can use `?` on
//! both and handlers can use `?` on db functions.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::BoxError;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: Business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl ServiceError {
    /// Flatten into a boxed error for startup paths
    pub fn into_boxed(self) -> BoxError {
        match self {
            ServiceError::Db(e) => e,
            ServiceError::App(e) => Box::new(e),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Whether `err` is a PostgreSQL unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// Map a unique violation to `on_conflict`, anything else to `ServiceError::Db`
pub fn unique_or(err: sqlx::Error, on_conflict: AppError) -> ServiceError {
    if is_unique_violation(&err) {
        ServiceError::App(on_conflict)
    } else {
        ServiceError::Db(err.into())
    }
}

/// Map a foreign-key violation to `on_violation`, anything else to `ServiceError::Db`
pub fn foreign_key_or(err: sqlx::Error, on_violation: AppError) -> ServiceError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
    {
        ServiceError::App(on_violation)
    } else {
        ServiceError::Db(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_passes_through() {
        let err: AppError = ServiceError::App(AppError::new(ErrorCode::VoucherExpired)).into();
        assert_eq!(err.code, ErrorCode::VoucherExpired);
    }

    #[test]
    fn test_db_error_becomes_internal() {
        let err: AppError = ServiceError::from(sqlx::Error::RowNotFound).into();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_unique_or_non_db_error() {
        let mapped = unique_or(
            sqlx::Error::PoolTimedOut,
            AppError::new(ErrorCode::UsernameExists),
        );
        assert!(matches!(mapped, ServiceError::Db(_)));
    }

    #[test]
    fn test_foreign_key_or_non_db_error() {
        let mapped = foreign_key_or(
            sqlx::Error::RowNotFound,
            AppError::new(ErrorCode::WholesaleNotFound),
        );
        assert!(matches!(mapped, ServiceError::Db(_)));
    }
}
