//! 资产管理的 HTTP 处理器

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::VerifiedIdentity, error::AppError, middleware::AppState, models::asset::*,
};

/// 创建资产
pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
    body: Result<Json<CreateAssetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body?;

    let asset = state.asset_service.create(&identity, req).await?;

    Ok((StatusCode::CREATED, Json(json!({ "asset": asset }))))
}

/// 列出当前用户的资产
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
) -> Result<impl IntoResponse, AppError> {
    let assets = state.asset_service.list(&identity).await?;

    Ok(Json(json!({
        "count": assets.len(),
        "assets": assets,
    })))
}

/// 获取资产详情
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    let asset = state.asset_service.get(&identity, id).await?;

    Ok(Json(json!({ "asset": asset })))
}

/// 更新资产
pub async fn update_asset(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;

    let asset = state.asset_service.update(&identity, id, req).await?;

    Ok(Json(json!({ "asset": asset })))
}

/// 废弃资产
pub async fn discard_asset(
    State(state): State<Arc<AppState>>,
    identity: VerifiedIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path?;

    state.asset_service.discard(&identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
