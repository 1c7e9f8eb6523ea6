//! 促销码仓储
//!
//! 提供促销码与使用记录的数据访问，支持事务和行级锁

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgConnection, PgPool, Row};

use super::is_unique_violation;
use crate::error::{PromoError, Result};
use crate::models::{NewPromoCode, PromoCode, UsageRecord};

/// 促销码仓储
///
/// 负责 promo_codes / promo_code_usages 两张表。
/// 计数器只通过事务方法修改，普通方法不触碰 code_amount。
pub struct PromoRepository {
    pool: PgPool,
}

impl PromoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 按 key 查找促销码（不做可兑换性过滤）
    pub async fn find_by_key(
        &self,
        gamespace_id: i64,
        code_key: &str,
    ) -> Result<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT code_id, gamespace_id, code_key, code_amount, code_expires,
                   code_contents, created_at
            FROM promo_codes
            WHERE gamespace_id = $1 AND code_key = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promo)
    }

    /// 按 ID 获取促销码
    pub async fn get(&self, gamespace_id: i64, code_id: i64) -> Result<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT code_id, gamespace_id, code_key, code_amount, code_expires,
                   code_contents, created_at
            FROM promo_codes
            WHERE gamespace_id = $1 AND code_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promo)
    }

    /// 列出使用过某促销码的账号
    pub async fn list_usages(&self, gamespace_id: i64, code_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id
            FROM promo_code_usages
            WHERE gamespace_id = $1 AND code_id = $2
            ORDER BY used_at
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("account_id")).collect())
    }

    // ==================== 写入操作 ====================

    /// 创建促销码
    ///
    /// (gamespace_id, code_key) 唯一约束冲突映射为 CodeExists，
    /// 由调用方决定是重新生成 key 还是直接上报冲突。
    pub async fn create_code(&self, code: &NewPromoCode) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO promo_codes
                (gamespace_id, code_key, code_amount, code_expires, code_contents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING code_id
            "#,
        )
        .bind(code.gamespace_id)
        .bind(&code.code_key)
        .bind(code.code_amount)
        .bind(code.code_expires)
        .bind(&code.code_contents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PromoError::CodeExists(code.code_key.clone())
            } else {
                PromoError::Database(e)
            }
        })?;

        Ok(row.get("code_id"))
    }

    /// 更新促销码
    pub async fn update(
        &self,
        gamespace_id: i64,
        code_id: i64,
        code_key: &str,
        code_amount: i32,
        code_expires: DateTime<Utc>,
        code_contents: &Value,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE promo_codes
            SET code_key = $3, code_amount = $4, code_expires = $5, code_contents = $6
            WHERE gamespace_id = $1 AND code_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .bind(code_key)
        .bind(code_amount)
        .bind(code_expires)
        .bind(code_contents)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PromoError::CodeExists(code_key.to_string())
            } else {
                PromoError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(PromoError::CodeNotFound);
        }

        Ok(())
    }

    /// 删除促销码及其全部使用记录
    ///
    /// 两条删除语句在同一事务内执行，不会留下孤儿使用记录。
    pub async fn delete_with_usages(&self, gamespace_id: i64, code_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            DELETE FROM promo_codes
            WHERE gamespace_id = $1 AND code_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PromoError::CodeNotFound);
        }

        sqlx::query(
            r#"
            DELETE FROM promo_code_usages
            WHERE gamespace_id = $1 AND code_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== 事务操作 ====================

    /// 在事务中按 key 锁定一个可兑换的促销码（带行级锁）
    ///
    /// WHERE 条件带上 code_amount > 0 和未过期过滤，
    /// FOR UPDATE 保证资格检查到计数器更新之间不会被并发兑换穿插。
    pub async fn find_redeemable_for_update(
        tx: &mut PgConnection,
        gamespace_id: i64,
        code_key: &str,
    ) -> Result<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>(
            r#"
            SELECT code_id, gamespace_id, code_key, code_amount, code_expires,
                   code_contents, created_at
            FROM promo_codes
            WHERE gamespace_id = $1 AND code_key = $2
              AND code_amount > 0 AND code_expires > NOW()
            FOR UPDATE
            "#,
        )
        .bind(gamespace_id)
        .bind(code_key)
        .fetch_optional(tx)
        .await?;

        Ok(promo)
    }

    /// 在事务中查询某账号对某促销码的使用记录
    pub async fn find_usage_in_tx(
        tx: &mut PgConnection,
        gamespace_id: i64,
        code_id: i64,
        account_id: i64,
    ) -> Result<Option<UsageRecord>> {
        let usage = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT usage_id, gamespace_id, code_id, account_id, used_at
            FROM promo_code_usages
            WHERE gamespace_id = $1 AND code_id = $2 AND account_id = $3
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .bind(account_id)
        .fetch_optional(tx)
        .await?;

        Ok(usage)
    }

    /// 在事务中插入使用记录
    ///
    /// 唯一约束冲突折叠为 AlreadyUsed：即使两个同账号请求
    /// 同时通过了存在性检查，也只有一个能插入成功。
    pub async fn insert_usage_in_tx(
        tx: &mut PgConnection,
        gamespace_id: i64,
        code_id: i64,
        account_id: i64,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO promo_code_usages (gamespace_id, code_id, account_id)
            VALUES ($1, $2, $3)
            RETURNING usage_id
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .bind(account_id)
        .fetch_one(tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PromoError::AlreadyUsed
            } else {
                PromoError::Database(e)
            }
        })?;

        Ok(row.get("usage_id"))
    }

    /// 在事务中把剩余次数减一
    pub async fn decrement_amount_in_tx(
        tx: &mut PgConnection,
        gamespace_id: i64,
        code_id: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE promo_codes
            SET code_amount = code_amount - 1
            WHERE gamespace_id = $1 AND code_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(code_id)
        .execute(tx)
        .await?;

        Ok(())
    }
}
