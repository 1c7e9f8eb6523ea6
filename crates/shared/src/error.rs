//! 基础设施错误类型
//!
//! 仅覆盖共享层自身的失败场景，业务错误由各服务 crate 自行定义。

use thiserror::Error;

/// 基础设施错误
#[derive(Debug, Error)]
pub enum SharedError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 共享层 Result 类型别名
pub type Result<T> = std::result::Result<T, SharedError>;

impl SharedError {
    /// 是否为可重试错误
    ///
    /// 连接池超时、IO 类故障属于瞬态错误，调用方可整体重试；
    /// 配置错误重试没有意义。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}
