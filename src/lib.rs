//! 资产登记服务库
//! 身份认证（注册、登录、JWT）与基于所有权的资产授权

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
