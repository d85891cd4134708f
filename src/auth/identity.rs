//! Verified identity and its request extractor
//!
//! [`VerifiedIdentity`] can only be produced by [`JwtService::authenticate`],
//! so a handler that takes one as an argument cannot run for an
//! unauthenticated request.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::jwt::{Claims, JwtService},
    error::AppError,
    middleware::AppState,
};

/// Identity proven by a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    id: Uuid,
    username: String,
}

impl VerifiedIdentity {
    pub(crate) fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl FromRequestParts<Arc<AppState>> for VerifiedIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)?;

        authenticate(&state.jwt_service, token)
    }
}

/// Verify a bearer token, recording the rejection kind
pub fn authenticate(jwt_service: &JwtService, token: &str) -> Result<VerifiedIdentity, AppError> {
    jwt_service.authenticate(token).map_err(|e| {
        tracing::debug!(kind = e.kind(), "Token rejected");
        metrics::counter!("auth_token_rejections_total", "kind" => e.kind()).increment(1);
        AppError::InvalidToken(e)
    })
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthenticated)
}
