//! 奖励内容目录服务
//!
//! promo_contents 的增删改查，单语句操作，无并发契约。

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{PromoError, Result};
use crate::models::ContentEntry;
use crate::repository::ContentRepository;

/// 奖励内容目录服务
pub struct ContentService {
    content_repo: Arc<ContentRepository>,
}

impl ContentService {
    pub fn new(content_repo: Arc<ContentRepository>) -> Self {
        Self { content_repo }
    }

    /// 创建内容
    ///
    /// 名称在 gamespace 内唯一，冲突由数据库唯一约束兜底
    /// （不做先查后插）。
    #[instrument(skip(self, content_data), fields(gamespace_id = %gamespace_id, content_name = %content_name))]
    pub async fn create(
        &self,
        gamespace_id: i64,
        content_name: &str,
        content_data: &Value,
    ) -> Result<i64> {
        let content_id = self
            .content_repo
            .create(gamespace_id, content_name, content_data)
            .await?;

        info!(content_id, "content created");
        Ok(content_id)
    }

    /// 按名称查找内容
    pub async fn find_by_name(&self, gamespace_id: i64, content_name: &str) -> Result<ContentEntry> {
        self.content_repo
            .find_by_name(gamespace_id, content_name)
            .await?
            .ok_or_else(|| PromoError::ContentNotFound(content_name.to_string()))
    }

    /// 按 ID 获取内容
    pub async fn get(&self, gamespace_id: i64, content_id: i64) -> Result<ContentEntry> {
        self.content_repo
            .get(gamespace_id, content_id)
            .await?
            .ok_or_else(|| PromoError::ContentNotFound(content_id.to_string()))
    }

    /// 更新内容
    #[instrument(skip(self, content_data), fields(gamespace_id = %gamespace_id, content_id = %content_id))]
    pub async fn update(
        &self,
        gamespace_id: i64,
        content_id: i64,
        content_name: &str,
        content_data: &Value,
    ) -> Result<()> {
        self.content_repo
            .update(gamespace_id, content_id, content_name, content_data)
            .await?;

        info!(content_id, "content updated");
        Ok(())
    }

    /// 删除内容
    #[instrument(skip(self), fields(gamespace_id = %gamespace_id, content_id = %content_id))]
    pub async fn delete(&self, gamespace_id: i64, content_id: i64) -> Result<()> {
        self.content_repo.delete(gamespace_id, content_id).await?;

        info!(content_id, "content deleted");
        Ok(())
    }

    /// 列出 gamespace 下的全部内容
    pub async fn list(&self, gamespace_id: i64) -> Result<Vec<ContentEntry>> {
        self.content_repo.list(gamespace_id).await
    }
}
