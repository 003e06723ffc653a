//! SQL 指标服务公共模块
//!
//! 提供各模块共享的基础设施，包括：
//! - 配置加载
//! - 错误类型
//! - 数据模型（目录、结果集）
//! - HTTP 中间件

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
