//! 奖励内容管理 API 处理器
//!
//! 内容目录的 CRUD 接口

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use validator::Validate;

use crate::api::identity::Gamespace;
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::error::PromoError;
use crate::service::dto::{ContentDto, CreateContentRequest, UpdateContentRequest};

/// 创建结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCreatedDto {
    pub content_id: i64,
}

/// 创建内容
///
/// POST /v1/contents
pub async fn create_content(
    State(state): State<AppState>,
    scope: Gamespace,
    Json(req): Json<CreateContentRequest>,
) -> Result<Json<ApiResponse<ContentCreatedDto>>, PromoError> {
    req.validate()?;

    let content_id = state
        .contents
        .create(scope.gamespace_id, &req.content_name, &req.content_data)
        .await?;

    Ok(Json(ApiResponse::success(ContentCreatedDto { content_id })))
}

/// 获取内容列表
///
/// GET /v1/contents
pub async fn list_contents(
    State(state): State<AppState>,
    scope: Gamespace,
) -> Result<Json<ApiResponse<Vec<ContentDto>>>, PromoError> {
    let entries = state.contents.list(scope.gamespace_id).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(ContentDto::from).collect(),
    )))
}

/// 按名称查找内容
///
/// GET /v1/contents/by-name/{content_name}
pub async fn find_content(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(content_name): Path<String>,
) -> Result<Json<ApiResponse<ContentDto>>, PromoError> {
    let entry = state
        .contents
        .find_by_name(scope.gamespace_id, &content_name)
        .await?;

    Ok(Json(ApiResponse::success(entry.into())))
}

/// 按 ID 获取内容
///
/// GET /v1/contents/{id}
pub async fn get_content(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(content_id): Path<i64>,
) -> Result<Json<ApiResponse<ContentDto>>, PromoError> {
    let entry = state.contents.get(scope.gamespace_id, content_id).await?;

    Ok(Json(ApiResponse::success(entry.into())))
}

/// 更新内容
///
/// PUT /v1/contents/{id}
pub async fn update_content(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(content_id): Path<i64>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<ApiResponse<()>>, PromoError> {
    req.validate()?;

    state
        .contents
        .update(
            scope.gamespace_id,
            content_id,
            &req.content_name,
            &req.content_data,
        )
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 删除内容
///
/// DELETE /v1/contents/{id}
pub async fn delete_content(
    State(state): State<AppState>,
    scope: Gamespace,
    Path(content_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, PromoError> {
    state.contents.delete(scope.gamespace_id, content_id).await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}
