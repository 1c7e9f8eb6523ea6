//! 调用方身份提取
//!
//! 令牌校验在上游网关完成，本服务只信任网关注入的身份头：
//! `X-Gamespace-Id`（租户）与 `X-Account-Id`（账号）。
//! 管理端点只需要租户维度，公开兑换端点两者都要。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::PromoError;

/// 已认证的兑换调用方（租户 + 账号）
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub gamespace_id: i64,
    pub account_id: i64,
}

/// 管理请求的租户范围
#[derive(Debug, Clone, Copy)]
pub struct Gamespace {
    pub gamespace_id: i64,
}

fn header_i64(parts: &Parts, name: &str) -> Result<i64, PromoError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| PromoError::Validation(format!("缺少或非法的请求头: {}", name)))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = PromoError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            gamespace_id: header_i64(parts, "x-gamespace-id")?,
            account_id: header_i64(parts, "x-account-id")?,
        })
    }
}

impl<S> FromRequestParts<S> for Gamespace
where
    S: Send + Sync,
{
    type Rejection = PromoError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            gamespace_id: header_i64(parts, "x-gamespace-id")?,
        })
    }
}
