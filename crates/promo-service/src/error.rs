//! 促销码服务错误类型
//!
//! 定义服务层的业务错误和系统错误，并提供 HTTP 状态码映射。

use axum::http::StatusCode;
use thiserror::Error;

/// 促销码服务错误类型
#[derive(Debug, Error)]
pub enum PromoError {
    // === 兑换相关错误 ===
    #[error("促销码格式不正确（应为 XXXX-XXXX-XXXX）")]
    InvalidKey,

    #[error("促销码不存在或已不可用")]
    CodeNotFound,

    #[error("该账号已使用过此促销码")]
    AlreadyUsed,

    #[error("促销码没有可发放的内容: code_id={0}")]
    NoContents(i64),

    #[error("促销码引用的内容已丢失: content_id={0}")]
    ContentMissing(i64),

    // === 发放相关错误 ===
    #[error("促销码已存在: {0}")]
    CodeExists(String),

    #[error("contents 必须是 内容名称 -> 数量 的映射")]
    InvalidContents,

    // === 内容目录相关错误 ===
    #[error("奖励内容不存在: {0}")]
    ContentNotFound(String),

    #[error("奖励内容已存在: {0}")]
    ContentExists(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 促销码服务 Result 类型别名
pub type Result<T> = std::result::Result<T, PromoError>;

impl PromoError {
    /// 检查是否为可重试的错误
    ///
    /// 连接池超时、死锁等存储层瞬态故障在事务回滚后不会留下部分效果，
    /// 调用方可以从头重试整个事务。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::ContentMissing(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidKey => "INVALID_KEY",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::NoContents(_) => "CODE_HAS_NO_CONTENTS",
            Self::ContentMissing(_) => "CONTENT_MISSING",
            Self::CodeExists(_) => "CODE_EXISTS",
            Self::InvalidContents => "INVALID_CONTENTS",
            Self::ContentNotFound(_) => "CONTENT_NOT_FOUND",
            Self::ContentExists(_) => "CONTENT_EXISTS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidKey | Self::NoContents(_) | Self::InvalidContents | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }

            Self::CodeNotFound | Self::ContentNotFound(_) => StatusCode::NOT_FOUND,

            Self::AlreadyUsed | Self::CodeExists(_) | Self::ContentExists(_) => {
                StatusCode::CONFLICT
            }

            Self::ContentMissing(_)
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for PromoError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
