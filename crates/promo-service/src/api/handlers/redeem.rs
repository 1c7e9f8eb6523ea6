//! 兑换 API 处理器
//!
//! 公开面上唯一的端点：POST /use/{code_key}

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::api::identity::Caller;
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::error::PromoError;
use crate::models::RewardItem;

/// 兑换结果响应
#[derive(Debug, Serialize)]
pub struct RewardBundleDto {
    pub result: Vec<RewardItem>,
}

/// 兑换促销码
///
/// POST /use/{code_key}
///
/// 调用方代表自己的账号兑换；400 = 格式/内容问题，404 = 码不可用，
/// 409 = 该账号已用过，200 = 奖励内容列表。
pub async fn use_code(
    State(state): State<AppState>,
    caller: Caller,
    Path(code_key): Path<String>,
) -> Result<Json<ApiResponse<RewardBundleDto>>, PromoError> {
    let rewards = state
        .redemption
        .redeem(caller.gamespace_id, caller.account_id, &code_key)
        .await?;

    Ok(Json(ApiResponse::success(RewardBundleDto {
        result: rewards,
    })))
}
