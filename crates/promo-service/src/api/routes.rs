//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::api::{handlers, state::AppState};

/// 公开路由（经网关认证的终端用户流量）
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/use/{code_key}", post(handlers::redeem::use_code))
}

/// 管理路由（内部运营工具流量）
///
/// 包含内容目录与促销码的 CRUD、批量生成、使用记录查询
pub fn management_routes() -> Router<AppState> {
    Router::new()
        // 内容目录
        .route("/contents", post(handlers::content::create_content))
        .route("/contents", get(handlers::content::list_contents))
        .route(
            "/contents/by-name/{content_name}",
            get(handlers::content::find_content),
        )
        .route("/contents/{id}", get(handlers::content::get_content))
        .route("/contents/{id}", put(handlers::content::update_content))
        .route("/contents/{id}", delete(handlers::content::delete_content))
        // 促销码
        .route("/promos", post(handlers::promo::create_promo))
        .route("/promos/generate", post(handlers::promo::generate_codes))
        .route("/promos/by-key/{code_key}", get(handlers::promo::find_promo))
        .route("/promos/{id}", get(handlers::promo::get_promo))
        .route("/promos/{id}", put(handlers::promo::update_promo))
        .route("/promos/{id}", delete(handlers::promo::delete_promo))
        .route("/promos/{id}/usages", get(handlers::promo::list_usages))
}
