//! 用户自助管理的 HTTP 处理器

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::VerifiedIdentity,
    error::AppError,
    middleware::AppState,
    models::user::{UpdateEmailRequest, UserResponse},
};

/// 修改当前用户邮箱
pub async fn update_email(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
    body: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;

    let user = state.auth_service.update_email(&identity, req).await?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}
