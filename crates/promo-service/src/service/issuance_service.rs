//! 促销码发放服务
//!
//! 批量生成促销码：内容映射 wrap 一次，然后逐个随机 key 入库。
//! key 唯一性采用「插入失败再重新生成」的乐观策略，
//! 不做先查后插（先查后插在并发下有竞态，插入冲突没有）。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::code_key;
use crate::error::{PromoError, Result};
use crate::models::NewPromoCode;
use crate::repository::PromoRepository;
use crate::service::dto::parse_contents;
use crate::service::RedemptionService;

/// 促销码发放服务
pub struct IssuanceService {
    redemption: Arc<RedemptionService>,
    promo_repo: Arc<PromoRepository>,
}

impl IssuanceService {
    pub fn new(redemption: Arc<RedemptionService>, promo_repo: Arc<PromoRepository>) -> Self {
        Self {
            redemption,
            promo_repo,
        }
    }

    /// 批量生成促销码
    ///
    /// 每个码共享同一份内容映射、可用次数和过期时间。
    /// 单个 key 的唯一约束冲突只丢弃该候选 key 并重新生成，
    /// 不会中止整批；其他任何持久化失败立即中止并原样上报。
    /// 返回按创建顺序排列的 key 列表。
    #[instrument(skip(self, contents), fields(gamespace_id = %gamespace_id, codes_count = %codes_count))]
    pub async fn generate_codes(
        &self,
        gamespace_id: i64,
        code_amount: i32,
        code_expires: DateTime<Utc>,
        contents: &Value,
        codes_count: usize,
    ) -> Result<Vec<String>> {
        if codes_count < 1 {
            return Err(PromoError::Validation(
                "codes_count 必须大于等于 1".to_string(),
            ));
        }

        let contents = parse_contents(contents)?;
        let wrapped = self.redemption.wrap_contents(gamespace_id, &contents).await?;
        let code_contents = serde_json::to_value(&wrapped)?;

        let mut keys = Vec::with_capacity(codes_count);
        while keys.len() < codes_count {
            let key = code_key::random_key();

            let created = self
                .promo_repo
                .create_code(&NewPromoCode {
                    gamespace_id,
                    code_key: key.clone(),
                    code_amount,
                    code_expires,
                    code_contents: code_contents.clone(),
                })
                .await;

            match created {
                Ok(_) => keys.push(key),
                Err(PromoError::CodeExists(_)) => {
                    // key 空间约 34^12，撞上唯一约束纯属小概率，换一个接着试
                    debug!(key = %key, "random key collided, regenerating");
                    metrics::counter!("promo_key_collisions_total").increment(1);
                }
                Err(e) => return Err(e),
            }
        }

        metrics::counter!("promo_codes_generated_total").increment(keys.len() as u64);
        info!(generated = keys.len(), "promo codes generated");

        Ok(keys)
    }
}
