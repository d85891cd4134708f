//! Storage layer
//!
//! The identity and asset services only see the narrow [`CredentialStore`] and
//! [`AssetStore`] contracts. Two backends implement them: PostgreSQL via sqlx
//! ([`UserRepository`], [`AssetRepository`]) and an in-memory backend
//! ([`MemoryCredentialStore`], [`MemoryAssetStore`]) for development and tests.
//!
//! Stores never retry; a failed call surfaces as [`StoreError`] and the caller
//! decides what to do with it.

pub mod asset_repo;
pub mod memory;
pub mod user_repo;

pub use asset_repo::AssetRepository;
pub use memory::{MemoryAssetStore, MemoryCredentialStore};
pub use user_repo::UserRepository;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    asset::{Asset, NewAsset, UpdateAssetRequest},
    user::{NewUser, User},
};

/// Column protected by a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

/// Storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0:?}")]
    Conflict(UniqueField),

    #[error("database error: {0}")]
    Backend(sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(user_repo::USERNAME_CONSTRAINT) => {
                        return StoreError::Conflict(UniqueField::Username)
                    }
                    Some(user_repo::EMAIL_CONSTRAINT) => {
                        return StoreError::Conflict(UniqueField::Email)
                    }
                    _ => {}
                }
            }
        }
        StoreError::Backend(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Username → identity mapping with password hashes
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Atomically insert a user. Fails with [`StoreError::Conflict`] when the
    /// username or email is already taken; nothing is written in that case.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    /// Returns `None` when no user has this id.
    async fn update_email(&self, id: Uuid, email: &str) -> StoreResult<Option<User>>;
}

/// Asset records and their ownership facts
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn insert(&self, asset: NewAsset) -> StoreResult<Asset>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Asset>>;

    /// Stored owner of an asset, `None` if the asset does not exist.
    async fn owner_of(&self, id: Uuid) -> StoreResult<Option<Uuid>>;

    /// Assets created by one identity, newest first.
    async fn list_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Asset>>;

    /// Applies the present fields; the owner is never touched.
    async fn update(&self, id: Uuid, changes: &UpdateAssetRequest) -> StoreResult<Option<Asset>>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}
