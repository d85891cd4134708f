//! 仓库层集成测试（PostgreSQL）
//!
//! 需要 TEST_DATABASE_URL，默认忽略：
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

use asset_registry::models::{asset::*, user::NewUser};
use asset_registry::repository::{
    AssetRepository, AssetStore, CredentialStore, StoreError, UniqueField, UserRepository,
};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::{create_pg_app_state, create_test_config, send, setup_test_db};

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=4096,t=1,p=1$c2FsdA$aGFzaA".to_string(),
    }
}

#[tokio::test]
#[ignore]
#[serial_test::serial]
async fn test_user_repository_insert_and_find() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = UserRepository::new(pool);

    let user = repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

    let found = repo.find_by_username("alice").await.unwrap().expect("User not found");
    assert_eq!(found.id, user.id);
    assert_eq!(found.email, "alice@example.com");

    let found = repo.find_by_id(user.id).await.unwrap().expect("User not found");
    assert_eq!(found.username, "alice");

    assert!(repo.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial_test::serial]
async fn test_user_repository_unique_constraints() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = UserRepository::new(pool);

    repo.insert(new_user("alice", "alice@example.com")).await.unwrap();

    let err = repo.insert(new_user("alice", "other@example.com")).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(UniqueField::Username)));

    let err = repo.insert(new_user("bob", "alice@example.com")).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));

    // 冲突时不留下任何记录
    assert!(repo.find_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
#[serial_test::serial]
async fn test_asset_repository_owner_and_update() {
    let pool = setup_test_db(&create_test_config()).await;
    let users = UserRepository::new(pool.clone());
    let assets = AssetRepository::new(pool);

    let owner = users.insert(new_user("alice", "alice@example.com")).await.unwrap();

    let asset = assets
        .insert(NewAsset {
            id: Uuid::new_v4(),
            creator_id: owner.id,
            category: "cash".to_string(),
            name: "Wallet".to_string(),
            currency: Currency::Eur,
            amount_cents: 500,
        })
        .await
        .unwrap();

    assert_eq!(assets.owner_of(asset.id).await.unwrap(), Some(owner.id));
    assert_eq!(assets.owner_of(Uuid::new_v4()).await.unwrap(), None);

    let updated = assets
        .update(
            asset.id,
            &UpdateAssetRequest {
                amount_cents: Some(750),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Asset not found");
    assert_eq!(updated.amount_cents, 750);
    assert_eq!(updated.currency, Currency::Eur);
    assert_eq!(updated.name, "Wallet");

    assert_eq!(assets.list_by_creator(owner.id).await.unwrap().len(), 1);
    assert!(assets.delete(asset.id).await.unwrap());
    assert!(!assets.delete(asset.id).await.unwrap());
}

#[tokio::test]
#[ignore]
#[serial_test::serial]
async fn test_assets_table_rejects_unknown_currency() {
    let pool = setup_test_db(&create_test_config()).await;
    let owner = UserRepository::new(pool.clone())
        .insert(new_user("alice", "alice@example.com"))
        .await
        .unwrap();

    let err = sqlx::query(
        "INSERT INTO assets (id, category, name, currency, amount_cents, creator_id) \
         VALUES ($1, 'cash', 'Wallet', 'GBP', 0, $2)",
    )
    .bind(Uuid::new_v4())
    .bind(owner.id)
    .execute(&pool)
    .await
    .unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("assets_currency_check"));
}

#[tokio::test]
#[ignore]
#[serial_test::serial]
async fn test_postgres_backed_api_flow() {
    let pool = setup_test_db(&create_test_config()).await;
    let app = asset_registry::routes::create_router(create_pg_app_state(pool));

    let alice = common::register_and_login(&app, "alice").await;
    let bob = common::register_and_login(&app, "bob").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/assets",
        Some(&alice),
        Some(json!({ "category": "cash", "name": "Wallet", "currency": "CNY", "amount_cents": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/assets/{}", json["asset"]["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["checks"][0]["name"], "database");
}
