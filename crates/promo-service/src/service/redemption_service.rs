//! 促销码兑换服务
//!
//! 处理促销码兑换的核心业务逻辑，包括：
//! - key 格式校验（不合法的 key 不触碰存储）
//! - 资格检查（剩余次数、过期时间）与行级锁
//! - 每账号至多一次的使用台账
//! - 事务性扣减与奖励内容解析
//!
//! ## 兑换流程
//!
//! 1. 格式校验 -> 2. 行锁资格查询 -> 3. 内容非空检查 -> 4. 使用台账检查
//!    -> 5. 写入使用记录 -> 6. 扣减次数 -> 7. 解析奖励 -> 8. 提交
//!
//! 任何一步失败整个事务回滚：不会留下半条使用记录，也不会白扣次数。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::code_key;
use crate::error::{PromoError, Result};
use crate::models::{NewPromoCode, PromoCode, RewardItem};
use crate::repository::{ContentRepository, PromoRepository};
use crate::service::dto::parse_contents;

/// 促销码兑换服务
///
/// 持有促销码实体及其使用台账；计数器只在这里的兑换事务中被修改。
pub struct RedemptionService {
    promo_repo: Arc<PromoRepository>,
    content_repo: Arc<ContentRepository>,
    pool: PgPool,
}

impl RedemptionService {
    pub fn new(
        promo_repo: Arc<PromoRepository>,
        content_repo: Arc<ContentRepository>,
        pool: PgPool,
    ) -> Self {
        Self {
            promo_repo,
            content_repo,
            pool,
        }
    }

    /// 兑换促销码
    ///
    /// 成功时恰好写入一条使用记录、剩余次数减一，并返回奖励内容列表；
    /// 并发兑换依赖行级锁串行化，计数器不会被扣成负数。
    #[instrument(skip(self), fields(gamespace_id = %gamespace_id, account_id = %account_id))]
    pub async fn redeem(
        &self,
        gamespace_id: i64,
        account_id: i64,
        key: &str,
    ) -> Result<Vec<RewardItem>> {
        let result = self.redeem_inner(gamespace_id, account_id, key).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.error_code(),
        };
        metrics::counter!("promo_redemptions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn redeem_inner(
        &self,
        gamespace_id: i64,
        account_id: i64,
        key: &str,
    ) -> Result<Vec<RewardItem>> {
        // 1. 格式不对直接拒绝，不访问存储
        code_key::validate(key)?;

        let mut tx = self.pool.begin().await?;

        // 2. 行锁资格查询：剩余次数 > 0 且未过期，否则一律 CodeNotFound
        let promo =
            PromoRepository::find_redeemable_for_update(&mut tx, gamespace_id, key).await?;

        let Some(promo) = promo else {
            return Err(PromoError::CodeNotFound);
        };

        // 3. 空内容是数据完整性故障，回滚后不消耗使用次数
        let reward_map = promo.reward_map()?;
        if reward_map.is_empty() {
            warn!(code_id = promo.code_id, "promo code has no contents");
            return Err(PromoError::NoContents(promo.code_id));
        }

        // 4. 使用台账检查（同一事务内）
        let used =
            PromoRepository::find_usage_in_tx(&mut tx, gamespace_id, promo.code_id, account_id)
                .await?;
        if used.is_some() {
            return Err(PromoError::AlreadyUsed);
        }

        // 5. 写入使用记录；唯一约束冲突同样折叠为 AlreadyUsed
        PromoRepository::insert_usage_in_tx(&mut tx, gamespace_id, promo.code_id, account_id)
            .await?;

        // 6. 扣减剩余次数
        PromoRepository::decrement_amount_in_tx(&mut tx, gamespace_id, promo.code_id).await?;

        // 7. 解析奖励内容
        let rewards = Self::resolve_rewards(&mut tx, gamespace_id, &promo, &reward_map).await?;

        // 8. 提交
        tx.commit().await?;

        info!(
            code_id = promo.code_id,
            code_key = %promo.code_key,
            rewards = rewards.len(),
            "promo code redeemed"
        );

        Ok(rewards)
    }

    /// 在兑换事务内把奖励映射解析为内容负载
    ///
    /// 映射里的每个内容 ID 都必须能解析到；缺失说明被引用的内容
    /// 已被删除，按存储故障上报并回滚整个兑换。
    async fn resolve_rewards(
        tx: &mut sqlx::PgConnection,
        gamespace_id: i64,
        promo: &PromoCode,
        reward_map: &BTreeMap<String, i64>,
    ) -> Result<Vec<RewardItem>> {
        let mut content_ids = Vec::with_capacity(reward_map.len());
        for raw_id in reward_map.keys() {
            let id: i64 = raw_id.parse().map_err(|_| {
                PromoError::Internal(format!(
                    "促销码 {} 的奖励映射含非法内容引用: {}",
                    promo.code_id, raw_id
                ))
            })?;
            content_ids.push(id);
        }

        let entries =
            ContentRepository::fetch_by_ids_in_tx(tx, gamespace_id, &content_ids).await?;
        let by_id: HashMap<i64, &crate::models::ContentEntry> =
            entries.iter().map(|e| (e.content_id, e)).collect();

        let mut rewards = Vec::with_capacity(content_ids.len());
        for content_id in &content_ids {
            let entry = by_id
                .get(content_id)
                .ok_or(PromoError::ContentMissing(*content_id))?;
            rewards.push(RewardItem {
                payload: entry.content_json.clone(),
                amount: reward_map[&content_id.to_string()],
            });
        }

        Ok(rewards)
    }

    /// 把 内容名称 -> 数量 的映射解析到内容 ID 空间
    ///
    /// 名称在内容目录中不存在的条目被静默丢弃（沿用既有的宽松语义，
    /// 调用方如果在意缺失需要自行比对结果大小）。
    #[instrument(skip(self, contents), fields(gamespace_id = %gamespace_id))]
    pub async fn wrap_contents(
        &self,
        gamespace_id: i64,
        contents: &BTreeMap<String, i64>,
    ) -> Result<BTreeMap<String, i64>> {
        let names: Vec<String> = contents.keys().cloned().collect();
        let entries = self.content_repo.find_by_names(gamespace_id, &names).await?;

        if entries.len() < contents.len() {
            warn!(
                requested = contents.len(),
                resolved = entries.len(),
                "wrap_contents dropped unknown content names"
            );
        }

        Ok(entries
            .into_iter()
            .map(|entry| {
                let amount = contents[&entry.content_name];
                (entry.content_id.to_string(), amount)
            })
            .collect())
    }

    // ==================== 促销码实体管理 ====================

    /// 创建单个促销码（调用方指定 key）
    ///
    /// contents 是 名称 -> 数量 的映射，存储前 wrap 成 ID 映射；
    /// key 已存在时返回 CodeExists。
    #[instrument(skip(self, contents), fields(gamespace_id = %gamespace_id, code_key = %key))]
    pub async fn create_code(
        &self,
        gamespace_id: i64,
        key: &str,
        code_amount: i32,
        code_expires: DateTime<Utc>,
        contents: &Value,
    ) -> Result<i64> {
        let contents = parse_contents(contents)?;
        let wrapped = self.wrap_contents(gamespace_id, &contents).await?;

        let code_id = self
            .promo_repo
            .create_code(&NewPromoCode {
                gamespace_id,
                code_key: key.to_string(),
                code_amount,
                code_expires,
                code_contents: serde_json::to_value(&wrapped)?,
            })
            .await?;

        info!(code_id, "promo code created");
        Ok(code_id)
    }

    /// 按 key 查找促销码
    pub async fn find_code(&self, gamespace_id: i64, key: &str) -> Result<PromoCode> {
        self.promo_repo
            .find_by_key(gamespace_id, key)
            .await?
            .ok_or(PromoError::CodeNotFound)
    }

    /// 按 ID 获取促销码
    pub async fn get_code(&self, gamespace_id: i64, code_id: i64) -> Result<PromoCode> {
        self.promo_repo
            .get(gamespace_id, code_id)
            .await?
            .ok_or(PromoError::CodeNotFound)
    }

    /// 更新促销码
    ///
    /// code_contents 直接以 ID 映射写入（不重新 wrap），
    /// 但形状仍要求是 JSON 对象。
    #[instrument(skip(self, code_contents), fields(gamespace_id = %gamespace_id, code_id = %code_id))]
    pub async fn update_code(
        &self,
        gamespace_id: i64,
        code_id: i64,
        key: &str,
        code_amount: i32,
        code_expires: DateTime<Utc>,
        code_contents: &Value,
    ) -> Result<()> {
        parse_contents(code_contents)?;

        self.promo_repo
            .update(
                gamespace_id,
                code_id,
                key,
                code_amount,
                code_expires,
                code_contents,
            )
            .await?;

        info!(code_id, "promo code updated");
        Ok(())
    }

    /// 删除促销码及其全部使用记录
    #[instrument(skip(self), fields(gamespace_id = %gamespace_id, code_id = %code_id))]
    pub async fn delete_code(&self, gamespace_id: i64, code_id: i64) -> Result<()> {
        self.promo_repo
            .delete_with_usages(gamespace_id, code_id)
            .await?;

        info!(code_id, "promo code deleted with its usage records");
        Ok(())
    }

    /// 列出使用过某促销码的账号
    pub async fn list_usages(&self, gamespace_id: i64, code_id: i64) -> Result<Vec<i64>> {
        self.promo_repo.list_usages(gamespace_id, code_id).await
    }
}
