//! 促销码服务
//!
//! 发放带有奖励内容的限次促销码，并保证同一账号对同一促销码
//! 至多兑换成功一次（并发场景下也成立）。
//!
//! ## 核心功能
//!
//! - **兑换**：行级锁事务内完成资格检查、使用台账写入、次数扣减与奖励解析
//! - **发放**：随机 key 批量生成，唯一约束冲突换 key 重试
//! - **内容目录**：奖励内容的 CRUD，负载原样透传
//! - **请求面**：公开 HTTP 兑换端点 + 内部 gRPC 服务间接口
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `code_key`: 促销码 key 的生成与校验
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `api`: HTTP 请求面
//! - `grpc`: gRPC 服务端实现

pub mod api;
pub mod code_key;
pub mod error;
pub mod grpc;
pub mod models;
pub mod repository;
pub mod service;

pub use error::{PromoError, Result};
pub use grpc::PromoCodeServiceImpl;
pub use models::{ContentEntry, NewPromoCode, PromoCode, RewardItem, UsageRecord};
pub use repository::{ContentRepository, PromoRepository};
pub use service::{ContentService, IssuanceService, RedemptionService, dto};
