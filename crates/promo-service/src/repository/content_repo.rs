//! 奖励内容仓储
//!
//! promo_contents 表的 CRUD，外加兑换事务内的批量解析查询

use serde_json::Value;
use sqlx::{PgConnection, PgPool, Row};

use super::is_unique_violation;
use crate::error::{PromoError, Result};
use crate::models::ContentEntry;

/// 奖励内容仓储
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 按名称查找内容
    pub async fn find_by_name(
        &self,
        gamespace_id: i64,
        content_name: &str,
    ) -> Result<Option<ContentEntry>> {
        let entry = sqlx::query_as::<_, ContentEntry>(
            r#"
            SELECT content_id, gamespace_id, content_name, content_json,
                   created_at, updated_at
            FROM promo_contents
            WHERE gamespace_id = $1 AND content_name = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(content_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// 按 ID 获取内容
    pub async fn get(&self, gamespace_id: i64, content_id: i64) -> Result<Option<ContentEntry>> {
        let entry = sqlx::query_as::<_, ContentEntry>(
            r#"
            SELECT content_id, gamespace_id, content_name, content_json,
                   created_at, updated_at
            FROM promo_contents
            WHERE gamespace_id = $1 AND content_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// 列出 gamespace 下的全部内容
    pub async fn list(&self, gamespace_id: i64) -> Result<Vec<ContentEntry>> {
        let entries = sqlx::query_as::<_, ContentEntry>(
            r#"
            SELECT content_id, gamespace_id, content_name, content_json,
                   created_at, updated_at
            FROM promo_contents
            WHERE gamespace_id = $1
            ORDER BY content_name
            "#,
        )
        .bind(gamespace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 按名称批量查找内容（wrap_contents 使用）
    ///
    /// 未命中的名称不报错，直接缺席于结果集。
    pub async fn find_by_names(
        &self,
        gamespace_id: i64,
        names: &[String],
    ) -> Result<Vec<ContentEntry>> {
        let entries = sqlx::query_as::<_, ContentEntry>(
            r#"
            SELECT content_id, gamespace_id, content_name, content_json,
                   created_at, updated_at
            FROM promo_contents
            WHERE gamespace_id = $1 AND content_name = ANY($2)
            "#,
        )
        .bind(gamespace_id)
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // ==================== 写入操作 ====================

    /// 创建内容
    ///
    /// (gamespace_id, content_name) 唯一约束冲突映射为 ContentExists。
    pub async fn create(
        &self,
        gamespace_id: i64,
        content_name: &str,
        content_json: &Value,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO promo_contents (gamespace_id, content_name, content_json)
            VALUES ($1, $2, $3)
            RETURNING content_id
            "#,
        )
        .bind(gamespace_id)
        .bind(content_name)
        .bind(content_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PromoError::ContentExists(content_name.to_string())
            } else {
                PromoError::Database(e)
            }
        })?;

        Ok(row.get("content_id"))
    }

    /// 更新内容
    pub async fn update(
        &self,
        gamespace_id: i64,
        content_id: i64,
        content_name: &str,
        content_json: &Value,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE promo_contents
            SET content_name = $3, content_json = $4, updated_at = NOW()
            WHERE gamespace_id = $1 AND content_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(content_id)
        .bind(content_name)
        .bind(content_json)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PromoError::ContentExists(content_name.to_string())
            } else {
                PromoError::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(PromoError::ContentNotFound(content_id.to_string()));
        }

        Ok(())
    }

    /// 删除内容
    ///
    /// 不检查是否仍被促销码引用；悬空引用在兑换时按存储故障上报。
    pub async fn delete(&self, gamespace_id: i64, content_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM promo_contents
            WHERE gamespace_id = $1 AND content_id = $2
            "#,
        )
        .bind(gamespace_id)
        .bind(content_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PromoError::ContentNotFound(content_id.to_string()));
        }

        Ok(())
    }

    // ==================== 事务操作 ====================

    /// 在事务中按 ID 批量获取内容（兑换时的奖励解析）
    ///
    /// 与促销码行锁同一个事务，保证解析结果与扣减一致提交。
    pub async fn fetch_by_ids_in_tx(
        tx: &mut PgConnection,
        gamespace_id: i64,
        content_ids: &[i64],
    ) -> Result<Vec<ContentEntry>> {
        let entries = sqlx::query_as::<_, ContentEntry>(
            r#"
            SELECT content_id, gamespace_id, content_name, content_json,
                   created_at, updated_at
            FROM promo_contents
            WHERE gamespace_id = $1 AND content_id = ANY($2)
            "#,
        )
        .bind(gamespace_id)
        .bind(content_ids)
        .fetch_all(tx)
        .await?;

        Ok(entries)
    }
}
