//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use asset_registry::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, StorageBackend,
        StorageConfig,
    },
    db,
    middleware::AppState,
    repository::{
        AssetRepository, CredentialStore, MemoryAssetStore, MemoryCredentialStore, UserRepository,
    },
    routes,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "pw123!";

/// 创建测试配置（memory 后端，低开销哈希参数）
pub fn create_test_config() -> AppConfig {
    let database_url = std::env::var("TEST_DATABASE_URL").ok().map(Secret::new);

    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new("test-secret-key-for-testing-only-min-32-chars".to_string()),
            password_min_length: 6,
            hash_memory_kib: 4096,
            hash_iterations: 1,
            hash_parallelism: 1,
            max_body_bytes: 16 * 1024,
        },
    }
}

/// 创建基于内存存储的测试应用状态
pub fn create_test_app_state() -> Arc<AppState> {
    create_test_app_state_with(create_test_config())
}

pub fn create_test_app_state_with(config: AppConfig) -> Arc<AppState> {
    Arc::new(
        AppState::new(
            config,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryAssetStore::new()),
            None,
        )
        .expect("Failed to build app state"),
    )
}

/// 内存存储 + 给定连接池（用于就绪检查）
pub fn create_test_app_state_with_pool(pool: PgPool) -> Arc<AppState> {
    Arc::new(
        AppState::new(
            create_test_config(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryAssetStore::new()),
            Some(pool),
        )
        .expect("Failed to build app state"),
    )
}

/// 创建测试应用
pub fn create_test_app() -> Router {
    routes::create_router(create_test_app_state())
}

/// 初始化测试数据库（需要 TEST_DATABASE_URL）
pub async fn setup_test_db(config: &AppConfig) -> PgPool {
    let pool = db::create_pool(&config.database)
        .await
        .expect("Failed to create test database pool");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE TABLE assets, users CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to cleanup test database");

    pool
}

/// 基于 PostgreSQL 的测试应用状态
pub fn create_pg_app_state(pool: PgPool) -> Arc<AppState> {
    let users: Arc<dyn CredentialStore> = Arc::new(UserRepository::new(pool.clone()));
    Arc::new(
        AppState::new(
            create_test_config(),
            users,
            Arc::new(AssetRepository::new(pool.clone())),
            Some(pool),
        )
        .expect("Failed to build app state"),
    )
}

/// 发送请求并解析 JSON 响应
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// 注册测试用户，返回用户 ID
pub async fn register_user(app: &Router, username: &str, email: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": email,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["user"]["id"].as_str().unwrap().to_string()
}

/// 登录并返回令牌
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{json}");
    json["token"].as_str().unwrap().to_string()
}

/// 注册并登录
pub async fn register_and_login(app: &Router, username: &str) -> String {
    register_user(app, username, &format!("{}@example.com", username)).await;
    login(app, username, TEST_PASSWORD).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_config() {
        let config = create_test_config();
        assert_eq!(config.server.addr, "127.0.0.1:0");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }
}
