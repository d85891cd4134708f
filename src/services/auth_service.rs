//! 认证服务：注册、登录、当前用户
//!
//! 登录流程：Submitted → LookedUp → Verified → Issued，任一步失败即 Rejected。
//! 用户不存在与密码错误对外返回同一条消息，防止用户名枚举。

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{identity::VerifiedIdentity, jwt::JwtService, password::PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    models::{auth::*, user::*},
    repository::CredentialStore,
};

/// 用户不存在时参与校验的占位口令
const DUMMY_PASSWORD: &str = "asset-registry-dummy-password";

pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    policy: SecurityConfig,
    /// 用当前参数生成的占位哈希，未知用户登录时也走一次完整的 Argon2 校验
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
        policy: SecurityConfig,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;

        Ok(Self {
            users,
            jwt_service,
            hasher,
            policy,
            dummy_hash,
        })
    }

    /// 用户注册
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        req.validate().map_err(|e| AppError::validation(&e))?;

        if req.username.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "Username must not contain whitespace".to_string(),
            ));
        }

        PasswordHasher::validate_password_policy(req.password.expose_secret(), &self.policy)?;

        // 检查用户名是否已存在
        if self.users.find_by_username(&req.username).await?.is_some() {
            tracing::info!(username = %req.username, "Registration rejected: username taken");
            return Err(AppError::UsernameTaken);
        }

        let password_hash = self.hash_password(req.password).await?;

        // ID 在写入前分配；写入是原子的，并发注册同名用户时由唯一约束兜底
        let user = self
            .users
            .insert(NewUser {
                id: Uuid::new_v4(),
                username: req.username,
                email: normalize_email(&req.email),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        // LookedUp
        let Some(user) = self.users.find_by_username(&req.username).await? else {
            // 与密码错误路径耗时一致，避免通过响应时间枚举用户名
            self.verify_password(req.password, self.dummy_hash.clone()).await?;
            record_login_outcome("unknown_user");
            tracing::info!(username = %req.username, "Login rejected");
            return Err(AppError::UserNotFound);
        };

        // Verified
        if !self.verify_password(req.password, user.password_hash.clone()).await? {
            record_login_outcome("bad_password");
            tracing::info!(username = %req.username, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        // Issued
        let token = self.jwt_service.issue(user.id, &user.username)?;

        record_login_outcome("success");
        tracing::info!(user_id = %user.id, username = %user.username, "Login succeeded");

        Ok(LoginResponse { token })
    }

    /// 获取当前用户
    pub async fn current_user(&self, identity: &VerifiedIdentity) -> Result<User, AppError> {
        self.users
            .find_by_id(identity.id())
            .await?
            .ok_or(AppError::NotFound)
    }

    /// 修改自己的邮箱（只能修改令牌对应身份的记录）
    pub async fn update_email(
        &self,
        identity: &VerifiedIdentity,
        req: UpdateEmailRequest,
    ) -> Result<User, AppError> {
        req.validate().map_err(|e| AppError::validation(&e))?;

        let user = self
            .users
            .update_email(identity.id(), &normalize_email(&req.email))
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(user_id = %user.id, "Email updated");

        Ok(user)
    }

    /// Argon2 是 CPU 密集型操作，放到阻塞线程池执行
    async fn hash_password(&self, password: SecretString) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {}", e);
                AppError::Internal
            })?
    }

    async fn verify_password(
        &self,
        password: SecretString,
        password_hash: String,
    ) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &password_hash))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {}", e);
                AppError::Internal
            })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn record_login_outcome(outcome: &'static str) {
    metrics::counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryCredentialStore;
    use secrecy::Secret;

    fn policy() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: Secret::new("test_secret_key_32_characters_long!".to_string()),
            password_min_length: 6,
            hash_memory_kib: 4096,
            hash_iterations: 1,
            hash_parallelism: 1,
            max_body_bytes: 65536,
        }
    }

    fn service() -> AuthService {
        let policy = policy();
        AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(JwtService::from_config(&policy).unwrap()),
            PasswordHasher::from_config(&policy).unwrap(),
            policy,
        )
        .unwrap()
    }

    fn register_req(username: &str, password: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: Secret::new(password.to_string()),
            email: email.to_string(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: Secret::new(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let service = service();
        let user = service
            .register(register_req("alice", "pw123!", "Alice@Example.com"))
            .await
            .unwrap();

        assert_ne!(user.password_hash, "pw123!");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_twice_is_username_taken() {
        let service = service();
        let first = service
            .register(register_req("alice", "pw123!", "alice@example.com"))
            .await
            .unwrap();

        let err = service
            .register(register_req("alice", "other-pw", "alice2@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));

        // First record unaffected: the original password still logs in
        let stored = service.users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.email, "alice@example.com");
        assert!(service.login(login_req("alice", "pw123!")).await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_conflict() {
        let service = service();
        service
            .register(register_req("alice", "pw123!", "shared@example.com"))
            .await
            .unwrap();

        let err = service
            .register(register_req("bob", "pw123!", "SHARED@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();

        let err = service.register(register_req("", "pw123!", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .register(register_req("al ice", "pw123!", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.register(register_req("alice", "pw", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.register(register_req("alice", "pw123!", "nope")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let service = service();
        let user = service
            .register(register_req("bob", "pw123!", "bob@x.com"))
            .await
            .unwrap();

        let response = service.login(login_req("bob", "pw123!")).await.unwrap();
        let claims = service.jwt_service.verify(&response.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "bob");
    }

    #[tokio::test]
    async fn test_login_failures_look_identical() {
        let service = service();
        service
            .register(register_req("bob", "pw123!", "bob@x.com"))
            .await
            .unwrap();

        let wrong_password = service.login(login_req("bob", "pw123?")).await.unwrap_err();
        let unknown_user = service.login(login_req("nobody", "pw123!")).await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::UserNotFound));
        assert_eq!(wrong_password.status_code(), unknown_user.status_code());
        assert_eq!(wrong_password.user_message(), unknown_user.user_message());
    }

    #[test]
    fn test_dummy_hash_uses_configured_params() {
        let service = service();
        let parsed = argon2::password_hash::PasswordHash::new(&service.dummy_hash).unwrap();

        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_eq!(parsed.params.get_decimal("m"), Some(4096));
        assert_eq!(parsed.params.get_decimal("t"), Some(1));
        assert_eq!(parsed.params.get_decimal("p"), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_user_login_runs_password_hash() {
        let service = service();
        service
            .register(register_req("bob", "pw123!", "bob@x.com"))
            .await
            .unwrap();

        let mut wrong_password = std::time::Duration::ZERO;
        let mut unknown_user = std::time::Duration::ZERO;
        for _ in 0..3 {
            let start = std::time::Instant::now();
            let _ = service.login(login_req("bob", "pw123?")).await;
            wrong_password += start.elapsed();

            let start = std::time::Instant::now();
            let _ = service.login(login_req("nobody", "pw123?")).await;
            unknown_user += start.elapsed();
        }

        // 两条失败路径都做一次 Argon2 校验，耗时应处于同一量级
        assert!(
            unknown_user * 4 >= wrong_password,
            "unknown_user={:?} wrong_password={:?}",
            unknown_user,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_update_email_only_touches_own_record() {
        let service = service();
        service
            .register(register_req("alice", "pw123!", "alice@example.com"))
            .await
            .unwrap();
        let bob = service
            .register(register_req("bob", "pw123!", "bob@example.com"))
            .await
            .unwrap();

        let token = service.login(login_req("bob", "pw123!")).await.unwrap().token;
        let identity = service.jwt_service.authenticate(&token).unwrap();

        let updated = service
            .update_email(
                &identity,
                UpdateEmailRequest {
                    email: "robert@example.com".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, bob.id);
        assert_eq!(updated.email, "robert@example.com");

        let alice = service.users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.email, "alice@example.com");

        let err = service
            .update_email(
                &identity,
                UpdateEmailRequest {
                    email: "alice@example.com".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }
}
