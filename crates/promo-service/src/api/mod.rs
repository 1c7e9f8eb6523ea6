//! HTTP 请求面
//!
//! 对外暴露兑换端点，对内暴露内容/促销码管理端点。
//! 身份由上游网关注入的请求头提供（见 identity 模块）。

pub mod handlers;
pub mod identity;
pub mod response;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// 组装完整的 HTTP 路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::public_routes())
        .nest("/v1", routes::management_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
