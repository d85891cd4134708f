//! 认证相关的 HTTP 处理器

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    auth::VerifiedIdentity,
    error::AppError,
    middleware::AppState,
    models::{auth::*, user::UserResponse},
};

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;

    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(user),
        }),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;

    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 获取当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.current_user(&identity).await?;

    Ok(Json(RegisterResponse {
        user: UserResponse::from(user),
    }))
}
