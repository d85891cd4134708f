//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::jwt::TokenError,
    repository::{StoreError, UniqueField},
};

/// 登录失败时对外统一的提示，不区分用户不存在与密码错误
pub const CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// 令牌校验失败时对外统一的提示
pub const TOKEN_MESSAGE: &str = "Invalid or expired token";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Token rejected: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UserNotFound
            | AppError::InvalidCredentials
            | AppError::Unauthenticated
            | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::UsernameTaken | AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::Store(_)
            | AppError::Hashing(_)
            | AppError::Signing(_)
            | AppError::Config(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::UserNotFound | AppError::InvalidCredentials => {
                CREDENTIALS_MESSAGE.to_string()
            }
            AppError::PayloadTooLarge => "Request body too large".to_string(),
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::InvalidToken(_) => TOKEN_MESSAGE.to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::NotFound => "Resource not found".to_string(),
            AppError::UsernameTaken => "Username already taken".to_string(),
            AppError::EmailTaken => "Email already registered".to_string(),
            AppError::Store(_)
            | AppError::Hashing(_)
            | AppError::Signing(_)
            | AppError::Config(_)
            | AppError::Internal => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    /// 从 validator 的校验结果构造错误
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        AppError::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        // 服务端错误记 error，客户端错误记 warn；Display 中不含密钥或明文密码
        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::warn!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// 存储层错误映射：唯一约束冲突转为业务冲突，其余一律视为服务端错误
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(UniqueField::Username) => AppError::UsernameTaken,
            StoreError::Conflict(UniqueField::Email) => AppError::EmailTaken,
            other => AppError::Store(other),
        }
    }
}

/// 请求体无法解析为 JSON 时按校验错误处理，消息不回显请求内容
/// 超出大小限制（无 Content-Length 的分块请求）保留 413
impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!(error = %e.body_text(), "Request body rejected");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::Validation("Malformed request body".to_string())
    }
}

/// 路径参数解析失败，消息不回显解析细节
impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        tracing::debug!(error = %e.body_text(), "Path parameter rejected");
        AppError::Validation("Invalid path parameter".to_string())
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}
