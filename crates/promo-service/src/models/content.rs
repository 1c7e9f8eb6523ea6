//! 奖励内容实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 奖励内容条目
///
/// 名称在 gamespace 内唯一，负载是任意 JSON，存取均原样透传。
/// 促销码的奖励映射通过 `content_id` 引用内容条目（弱引用，
/// 删除被引用的内容不会被阻止，兑换时解析失败按存储故障处理）。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub content_id: i64,
    pub gamespace_id: i64,
    pub content_name: String,
    pub content_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
