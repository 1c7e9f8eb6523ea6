//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use crate::service::{ContentService, IssuanceService, RedemptionService};

/// Axum 应用共享状态
///
/// 三个服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub redemption: Arc<RedemptionService>,
    pub issuance: Arc<IssuanceService>,
    pub contents: Arc<ContentService>,
}

impl AppState {
    pub fn new(
        redemption: Arc<RedemptionService>,
        issuance: Arc<IssuanceService>,
        contents: Arc<ContentService>,
    ) -> Self {
        Self {
            redemption,
            issuance,
            contents,
        }
    }
}
