//! 业务服务层

pub mod asset_service;
pub mod auth_service;

pub use asset_service::AssetService;
pub use auth_service::AuthService;
