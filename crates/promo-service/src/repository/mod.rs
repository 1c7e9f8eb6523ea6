//! 数据库仓储层
//!
//! 所有 SQL 都集中在这里。兑换事务路径提供以 `_in_tx` 结尾、
//! 接收 `&mut PgConnection` 的静态方法，由服务层在单个事务内编排。

mod content_repo;
mod promo_repo;

pub use content_repo::ContentRepository;
pub use promo_repo::PromoRepository;

/// 判断是否为唯一约束冲突
///
/// 发放侧据此区分「换个 key 重试」和「整批中止」，
/// 兑换侧据此把并发的重复使用折叠为 AlreadyUsed。
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
