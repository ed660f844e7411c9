//! 仓库管理系统认证与授权核心
//! 密码哈希、JWT 令牌、角色层级、会话生命周期与用户管理

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
