//! 资产服务
//!
//! 所有修改路径（更新、废弃）都先从存储读取资产的真实所有者，经授权门判定后
//! 才调用存储层写入。所有者永远不从请求体获取。

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{gate::authorize, identity::VerifiedIdentity},
    error::AppError,
    models::asset::*,
    repository::AssetStore,
};

pub struct AssetService {
    assets: Arc<dyn AssetStore>,
}

impl AssetService {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self { assets }
    }

    /// 创建资产，创建者即当前身份
    pub async fn create(
        &self,
        identity: &VerifiedIdentity,
        req: CreateAssetRequest,
    ) -> Result<Asset, AppError> {
        req.validate().map_err(|e| AppError::validation(&e))?;

        let asset = self
            .assets
            .insert(NewAsset {
                id: Uuid::new_v4(),
                creator_id: identity.id(),
                category: req.category,
                name: req.name,
                currency: req.currency,
                amount_cents: req.amount_cents,
            })
            .await?;

        tracing::info!(asset_id = %asset.id, creator_id = %asset.creator_id, "Asset created");

        Ok(asset)
    }

    /// 获取资产详情（仅所有者可见）
    pub async fn get(&self, identity: &VerifiedIdentity, id: Uuid) -> Result<Asset, AppError> {
        let asset = self.assets.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        authorize(identity.id(), Some(asset.creator_id)).require()?;

        Ok(asset)
    }

    /// 列出当前身份拥有的资产
    pub async fn list(&self, identity: &VerifiedIdentity) -> Result<Vec<Asset>, AppError> {
        Ok(self.assets.list_by_creator(identity.id()).await?)
    }

    /// 更新资产
    pub async fn update(
        &self,
        identity: &VerifiedIdentity,
        id: Uuid,
        req: UpdateAssetRequest,
    ) -> Result<Asset, AppError> {
        req.validate().map_err(|e| AppError::validation(&e))?;

        self.require_owner(identity, id).await?;

        let asset = self
            .assets
            .update(id, &req)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(asset_id = %asset.id, user_id = %identity.id(), "Asset updated");

        Ok(asset)
    }

    /// 废弃（删除）资产
    pub async fn discard(&self, identity: &VerifiedIdentity, id: Uuid) -> Result<(), AppError> {
        self.require_owner(identity, id).await?;

        if !self.assets.delete(id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(asset_id = %id, user_id = %identity.id(), "Asset discarded");

        Ok(())
    }

    /// 授权门：查询失败或资产不存在都视为拒绝
    async fn require_owner(&self, identity: &VerifiedIdentity, id: Uuid) -> Result<(), AppError> {
        let owner = match self.assets.owner_of(id).await {
            Ok(owner) => owner,
            Err(e) => {
                tracing::error!(asset_id = %id, error = %e, "Owner lookup failed");
                None
            }
        };

        let decision = authorize(identity.id(), owner);
        if !decision.is_allowed() {
            tracing::warn!(asset_id = %id, user_id = %identity.id(), "Asset mutation denied");
        }

        decision.require()
    }
}
