//! In-memory storage backend
//!
//! Implements [`CredentialStore`] and [`AssetStore`] over maps guarded by
//! [`parking_lot::RwLock`]. Guards are never held across an `.await`. Data is
//! lost when the process exits; use it for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AssetStore, CredentialStore, StoreError, StoreResult, UniqueField};
use crate::models::{
    asset::{Asset, NewAsset, UpdateAssetRequest},
    user::{NewUser, User},
};

#[derive(Default)]
struct Users {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
}

impl Users {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.by_id
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// In-memory [`CredentialStore`]
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Users>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read();
        Ok(users
            .by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().by_id.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        // Both uniqueness checks and the write happen under one guard.
        let mut users = self.users.write();

        if users.by_username.contains_key(&user.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        if users.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }

        let now = Utc::now();
        let record = User {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };

        users.by_username.insert(record.username.clone(), record.id);
        users.by_id.insert(record.id, record.clone());

        Ok(record)
    }

    async fn update_email(&self, id: Uuid, email: &str) -> StoreResult<Option<User>> {
        let mut users = self.users.write();

        if users.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }

        Ok(users.by_id.get_mut(&id).map(|user| {
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

/// In-memory [`AssetStore`]
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<Uuid, Asset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn insert(&self, asset: NewAsset) -> StoreResult<Asset> {
        let now = Utc::now();
        let record = Asset {
            id: asset.id,
            category: asset.category,
            name: asset.name,
            currency: asset.currency,
            amount_cents: asset.amount_cents,
            creator_id: asset.creator_id,
            created_at: now,
            updated_at: now,
        };

        self.assets.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>> {
        Ok(self.assets.read().get(&id).cloned())
    }

    async fn owner_of(&self, id: Uuid) -> StoreResult<Option<Uuid>> {
        Ok(self.assets.read().get(&id).map(|a| a.creator_id))
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Asset>> {
        let mut owned: Vec<Asset> = self
            .assets
            .read()
            .values()
            .filter(|a| a.creator_id == creator_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update(&self, id: Uuid, changes: &UpdateAssetRequest) -> StoreResult<Option<Asset>> {
        let mut assets = self.assets.write();

        Ok(assets.get_mut(&id).map(|asset| {
            if let Some(category) = &changes.category {
                asset.category = category.clone();
            }
            if let Some(name) = &changes.name {
                asset.name = name.clone();
            }
            if let Some(currency) = changes.currency {
                asset.currency = currency;
            }
            if let Some(amount) = changes.amount_cents {
                asset.amount_cents = amount;
            }
            asset.updated_at = Utc::now();
            asset.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.assets.write().remove(&id).is_some())
    }
}
