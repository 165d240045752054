//! Authentication middleware and extractor
//!
//! `require_auth` guards the protected router and stores the [`CurrentUser`]
//! in request extensions; the extractor reads it back (or validates the
//! token itself when used outside the guarded router).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use http::HeaderMap;
use shared::error::AppError;

use super::{CurrentUser, JwtService};
use crate::security_log;
use crate::state::AppState;

fn authenticate(headers: &HeaderMap, jwt: &JwtService, uri: &http::Uri) -> Result<CurrentUser, AppError> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!(WARN, "auth_missing", uri = %uri);
            return Err(AppError::not_authenticated());
        }
    };

    let claims = jwt.validate_token(token).map_err(|e| {
        security_log!(WARN, "auth_failed", error = %e, uri = %uri);
        AppError::from(e)
    })?;

    CurrentUser::try_from(claims).map_err(AppError::from)
}

/// Require a valid bearer token on every request except CORS preflight
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = authenticate(req.headers(), &state.jwt, req.uri())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Staff-only routes; must run inside [`require_auth`]
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    user.require_staff()?;
    Ok(next.run(req).await)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(&parts.headers, &state.jwt, &parts.uri)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
