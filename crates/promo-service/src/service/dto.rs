//! 服务层 DTO 定义
//!
//! HTTP 与 gRPC 两个边界共用的请求/响应结构

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{PromoError, Result};
use crate::models::{ContentEntry, PromoCode};

/// 解析 contents 参数
///
/// contents 必须是 内容名称 -> 整数数量 的 JSON 对象，
/// 其他任何形状（数组、标量、非整数数量）都拒绝为 InvalidContents。
pub fn parse_contents(contents: &Value) -> Result<BTreeMap<String, i64>> {
    let object = contents.as_object().ok_or(PromoError::InvalidContents)?;

    let mut parsed = BTreeMap::new();
    for (name, amount) in object {
        let amount = amount.as_i64().ok_or(PromoError::InvalidContents)?;
        parsed.insert(name.clone(), amount);
    }

    Ok(parsed)
}

// ==================== 请求 DTO ====================

/// 创建促销码请求（指定 key）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoRequest {
    #[validate(length(min = 1, max = 64, message = "key 长度必须在 1-64 个字符之间"))]
    pub code_key: String,
    #[validate(range(min = 0, message = "可用次数不能为负"))]
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    /// 内容名称 -> 数量，由服务端 wrap 成内容 ID 映射后存储
    pub contents: Value,
}

/// 更新促销码请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromoRequest {
    #[validate(length(min = 1, max = 64, message = "key 长度必须在 1-64 个字符之间"))]
    pub code_key: String,
    #[validate(range(min = 0, message = "可用次数不能为负"))]
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    /// 内容 ID -> 数量（更新时直接写入，不再 wrap）
    pub code_contents: Value,
}

/// 批量生成促销码请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodesRequest {
    #[validate(range(min = 1, message = "可用次数必须大于 0"))]
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    /// 内容名称 -> 数量
    pub contents: Value,
    /// 生成数量，缺省为 1
    #[serde(default = "default_codes_count")]
    pub codes_count: usize,
}

fn default_codes_count() -> usize {
    1
}

/// 创建内容请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 255, message = "内容名称长度必须在 1-255 个字符之间"))]
    pub content_name: String,
    /// 任意 JSON 负载，原样存储
    pub content_data: Value,
}

/// 更新内容请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    #[validate(length(min = 1, max = 255, message = "内容名称长度必须在 1-255 个字符之间"))]
    pub content_name: String,
    pub content_data: Value,
}

// ==================== 响应 DTO ====================

/// 促销码响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeDto {
    pub code_id: i64,
    pub code_key: String,
    pub code_amount: i32,
    pub code_expires: DateTime<Utc>,
    pub code_contents: Value,
    /// 此刻是否还能兑换（剩余次数 > 0 且未过期）
    pub redeemable: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PromoCode> for PromoCodeDto {
    fn from(promo: PromoCode) -> Self {
        let redeemable = promo.is_redeemable(Utc::now());
        Self {
            code_id: promo.code_id,
            code_key: promo.code_key,
            code_amount: promo.code_amount,
            code_expires: promo.code_expires,
            code_contents: promo.code_contents,
            redeemable,
            created_at: promo.created_at,
        }
    }
}

/// 内容响应 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDto {
    pub content_id: i64,
    pub content_name: String,
    pub content_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContentEntry> for ContentDto {
    fn from(entry: ContentEntry) -> Self {
        Self {
            content_id: entry.content_id,
            content_name: entry.content_name,
            content_data: entry.content_json,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// 批量生成响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCodesDto {
    pub keys: Vec<String>,
}

/// 使用记录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagesDto {
    pub account_ids: Vec<i64>,
}
