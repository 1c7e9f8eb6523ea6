//! 促销码管理 API 处理器
//!
//! 面向内部运营工具的促销码 CRUD 与批量生成接口

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use validator::Validate;

use crate::api::identity::Gamespace;
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::error::PromoError;
use crate::service::dto::{
    CreatePromoRequest, GenerateCodesRequest, GeneratedCodesDto, PromoCodeDto, UpdatePromoRequest,
    UsagesDto,
};

/// 创建结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCreatedDto {
    pub code_id: i64,
}

/// 创建促销码（指定 key）
///
/// POST /v1/promos
pub async fn create_promo(
    State(state): State<AppState>,
    scope: Gamespace,
    Json(req): Json<CreatePromoRequest>,
) -> Result<Json<ApiResponse<PromoCreatedDto>>, PromoError> {
    req.validate()?;

    let code_id = state
        .redemption
        .create_code(
            scope.gamespace_id,
            &req.code_key,
            req.code_amount,
            req.code_expires,
            &req.contents,
        )
        .await?;

    Ok(Json(ApiResponse::success(PromoCreatedDto { code_id })))
}

/// 批量生成促销码
///
/// POST /v1/promos/generate
pub async fn generate_codes(
    State(state): State<AppState>,
    scope: Gamespace,
    Json(req): Json<GenerateCodesRequest>,
) -> Result<Json<ApiResponse<GeneratedCodesDto>>, PromoError> {
    req.validate()?;

    let keys = state
        .issuance
        .generate_codes(
            scope.gamespace_id,
            req.code_amount,
            req.code_expires,
            &req.contents,
            req.codes_count,
        )
        .await?;

    Ok(Json(ApiResponse::success(GeneratedCodesDto { keys })))
}

/// 按 key 查找促销码
///
/// GET /v1/promos/by-key/{code_key}
pub async fn find_promo(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(code_key): Path<String>,
) -> Result<Json<ApiResponse<PromoCodeDto>>, PromoError> {
    let promo = state
        .redemption
        .find_code(scope.gamespace_id, &code_key)
        .await?;

    Ok(Json(ApiResponse::success(promo.into())))
}

/// 按 ID 获取促销码
///
/// GET /v1/promos/{id}
pub async fn get_promo(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(code_id): Path<i64>,
) -> Result<Json<ApiResponse<PromoCodeDto>>, PromoError> {
    let promo = state
        .redemption
        .get_code(scope.gamespace_id, code_id)
        .await?;

    Ok(Json(ApiResponse::success(promo.into())))
}

/// 更新促销码
///
/// PUT /v1/promos/{id}
pub async fn update_promo(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(code_id): Path<i64>,
    Json(req): Json<UpdatePromoRequest>,
) -> Result<Json<ApiResponse<()>>, PromoError> {
    req.validate()?;

    state
        .redemption
        .update_code(
            scope.gamespace_id,
            code_id,
            &req.code_key,
            req.code_amount,
            req.code_expires,
            &req.code_contents,
        )
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 删除促销码（连同使用记录）
///
/// DELETE /v1/promos/{id}
pub async fn delete_promo(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(code_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, PromoError> {
    state
        .redemption
        .delete_code(scope.gamespace_id, code_id)
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 列出使用过促销码的账号
///
/// GET /v1/promos/{id}/usages
pub async fn list_usages(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(code_id): Path<i64>,
) -> Result<Json<ApiResponse<UsagesDto>>, PromoError> {
    let account_ids = state
        .redemption
        .list_usages(scope.gamespace_id, code_id)
        .await?;

    Ok(Json(ApiResponse::success(UsagesDto { account_ids })))
}
