//! API 统一响应结构
//!
//! 所有 REST 端点都返回同一个信封：success/code/message/data。
//! 业务错误通过 PromoError 的 IntoResponse 实现落到对应的 HTTP 状态码。

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::error::PromoError;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }

    /// 创建错误响应
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

impl IntoResponse for PromoError {
    fn into_response(self) -> Response {
        // 系统错误记日志但不向外暴露存储层细节
        let message = if self.is_business_error() {
            self.to_string()
        } else {
            error!(error = %self, "internal error while handling request");
            "服务内部错误".to_string()
        };

        let body = ApiResponse::<()>::error(self.error_code(), message);
        (self.status_code(), Json(body)).into_response()
    }
}
