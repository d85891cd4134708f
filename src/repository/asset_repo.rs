//! Asset repository (PostgreSQL 数据库访问层)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AssetStore, StoreError, StoreResult};
use crate::models::asset::{Asset, NewAsset, UpdateAssetRequest};

const ASSET_COLUMNS: &str =
    "id, category, name, currency, amount_cents, creator_id, created_at, updated_at";

/// 数据库行，currency 以文本存储
#[derive(sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    category: String,
    name: String,
    currency: String,
    amount_cents: i64,
    creator_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let currency = row.currency.parse().map_err(|e: String| {
            StoreError::Corrupt(format!("asset {}: {}", row.id, e))
        })?;

        Ok(Asset {
            id: row.id,
            category: row.category,
            name: row.name,
            currency,
            amount_cents: row.amount_cents,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct AssetRepository {
    db: PgPool,
}

impl AssetRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssetStore for AssetRepository {
    /// 创建资产
    async fn insert(&self, asset: NewAsset) -> StoreResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            INSERT INTO assets (id, category, name, currency, amount_cents, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(asset.id)
        .bind(&asset.category)
        .bind(&asset.name)
        .bind(asset.currency.as_str())
        .bind(asset.amount_cents)
        .bind(asset.creator_id)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    /// 获取资产
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM assets WHERE id = $1",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Asset::try_from).transpose()
    }

    /// 查询资产的所有者
    async fn owner_of(&self, id: Uuid) -> StoreResult<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT creator_id FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(owner)
    }

    /// 列出某用户创建的资产
    async fn list_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM assets WHERE creator_id = $1 ORDER BY created_at DESC",
            ASSET_COLUMNS
        ))
        .bind(creator_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Asset::try_from).collect()
    }

    /// 更新资产（creator_id 不在可更新字段内）
    async fn update(&self, id: Uuid, changes: &UpdateAssetRequest) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            UPDATE assets
            SET
                category = COALESCE($2, category),
                name = COALESCE($3, name),
                currency = COALESCE($4, currency),
                amount_cents = COALESCE($5, amount_cents),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(changes.category.as_deref())
        .bind(changes.name.as_deref())
        .bind(changes.currency.map(|c| c.as_str()))
        .bind(changes.amount_cents)
        .fetch_optional(&self.db)
        .await?;

        row.map(Asset::try_from).transpose()
    }

    /// 删除资产
    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
