//! 数据模型模块

pub mod asset;
pub mod auth;
pub mod user;
