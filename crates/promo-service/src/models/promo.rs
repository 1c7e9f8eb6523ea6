//! 促销码相关实体定义
//!
//! 包含促销码、使用记录以及兑换结果的奖励条目

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PromoError, Result};

/// 促销码
///
/// `code_contents` 是 内容 ID（字符串形式）-> 数量 的 JSON 对象，
/// 由发放侧通过 wrap_contents 从内容名称映射而来。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code_id: i64,
    pub gamespace_id: i64,
    /// 用户输入的兑换 key，形如 XXXX-XXXX-XXXX，每个 gamespace 内唯一
    pub code_key: String,
    /// 剩余可用次数，只会被兑换事务递减，不允许为负
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    pub code_contents: Value,
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// 解析奖励映射（内容 ID -> 数量）
    pub fn reward_map(&self) -> Result<BTreeMap<String, i64>> {
        serde_json::from_value(self.code_contents.clone()).map_err(PromoError::from)
    }

    /// 当前是否可兑换（还有剩余次数且未过期）
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.code_amount > 0 && self.code_expires > now
    }
}

/// 待插入的促销码
#[derive(Debug, Clone)]
pub struct NewPromoCode {
    pub gamespace_id: i64,
    pub code_key: String,
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    pub code_contents: Value,
}

/// 促销码使用记录
///
/// (gamespace_id, code_id, account_id) 上的唯一约束保证
/// 每个账号对每个促销码至多兑换一次。记录只插入、不更新，
/// 仅随所属促销码一起删除。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub usage_id: i64,
    pub gamespace_id: i64,
    pub code_id: i64,
    pub account_id: i64,
    pub used_at: DateTime<Utc>,
}

/// 兑换成功后返回的单条奖励
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardItem {
    /// 内容负载，按创建时存储的 JSON 原样透传
    pub payload: Value,
    /// 该内容的发放数量
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_code(amount: i32, expires_in: Duration, contents: Value) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            code_id: 1,
            gamespace_id: 100,
            code_key: "ABCD-1234-WXYZ".to_string(),
            code_amount: amount,
            code_expires: now + expires_in,
            code_contents: contents,
            created_at: now,
        }
    }

    #[test]
    fn test_reward_map_parses_contents() {
        let code = sample_code(5, Duration::days(1), json!({"17": 10, "42": 1}));
        let map = code.reward_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["17"], 10);
        assert_eq!(map["42"], 1);
    }

    #[test]
    fn test_reward_map_rejects_non_object() {
        let code = sample_code(5, Duration::days(1), json!([1, 2, 3]));
        assert!(code.reward_map().is_err());
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        let ok = sample_code(1, Duration::days(1), json!({}));
        assert!(ok.is_redeemable(now));

        let exhausted = sample_code(0, Duration::days(1), json!({}));
        assert!(!exhausted.is_redeemable(now));

        let expired = sample_code(1, Duration::days(-1), json!({}));
        assert!(!expired.is_redeemable(now));
    }
}
