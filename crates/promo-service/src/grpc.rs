//! gRPC 服务端实现
//!
//! 将兑换与发放能力暴露给受信任的内部调用方，
//! 处理 Proto 类型与内部模型之间的转换

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tonic::{Request, Response, Status};
use tracing::instrument;

use promo_proto::promo::promo_code_service_server::{PromoCodeService, PromoCodeServiceServer};
use promo_proto::promo::{
    GenerateCodesRequest, GenerateCodesResponse, RewardItem as ProtoRewardItem, UseCodeRequest,
    UseCodeResponse,
};

use crate::error::PromoError;
use crate::service::{IssuanceService, RedemptionService};

// ==================== 错误转换 ====================

impl From<PromoError> for Status {
    fn from(err: PromoError) -> Self {
        match err {
            PromoError::InvalidKey
            | PromoError::InvalidContents
            | PromoError::NoContents(_)
            | PromoError::Validation(_) => Status::invalid_argument(err.to_string()),

            PromoError::CodeNotFound | PromoError::ContentNotFound(_) => {
                Status::not_found(err.to_string())
            }

            PromoError::AlreadyUsed
            | PromoError::CodeExists(_)
            | PromoError::ContentExists(_) => Status::already_exists(err.to_string()),

            PromoError::Database(_) if err.is_retryable() => {
                Status::unavailable(err.to_string())
            }

            PromoError::ContentMissing(_)
            | PromoError::Database(_)
            | PromoError::Serialization(_)
            | PromoError::Internal(_) => Status::internal(err.to_string()),
        }
    }
}

// ==================== 服务实现 ====================

/// 促销码 gRPC 服务
pub struct PromoCodeServiceImpl {
    redemption: Arc<RedemptionService>,
    issuance: Arc<IssuanceService>,
}

impl PromoCodeServiceImpl {
    pub fn new(redemption: Arc<RedemptionService>, issuance: Arc<IssuanceService>) -> Self {
        Self {
            redemption,
            issuance,
        }
    }

    /// 包装成 tonic 可挂载的服务
    pub fn into_server(self) -> PromoCodeServiceServer<Self> {
        PromoCodeServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl PromoCodeService for PromoCodeServiceImpl {
    #[instrument(skip(self, request))]
    async fn use_code(
        &self,
        request: Request<UseCodeRequest>,
    ) -> Result<Response<UseCodeResponse>, Status> {
        let req = request.into_inner();

        let rewards = self
            .redemption
            .redeem(req.gamespace_id, req.account_id, &req.key)
            .await
            .map_err(Status::from)?;

        let rewards = rewards
            .into_iter()
            .map(|item| {
                let payload_json = serde_json::to_string(&item.payload)
                    .map_err(|e| Status::internal(format!("奖励负载序列化失败: {}", e)))?;
                Ok(ProtoRewardItem {
                    payload_json,
                    amount: item.amount,
                })
            })
            .collect::<Result<Vec<_>, Status>>()?;

        Ok(Response::new(UseCodeResponse { rewards }))
    }

    #[instrument(skip(self, request))]
    async fn generate_codes(
        &self,
        request: Request<GenerateCodesRequest>,
    ) -> Result<Response<GenerateCodesResponse>, Status> {
        let req = request.into_inner();

        let expires: DateTime<Utc> = req
            .expires
            .parse()
            .map_err(|_| Status::invalid_argument("expires 必须是 RFC 3339 格式的时间"))?;

        let contents: serde_json::Value = serde_json::from_str(&req.contents_json)
            .map_err(|_| Status::invalid_argument("contents_json 不是合法的 JSON"))?;

        let codes_count = if req.codes_count == 0 {
            1
        } else {
            req.codes_count as usize
        };

        let keys = self
            .issuance
            .generate_codes(
                req.gamespace_id,
                req.code_amount,
                expires,
                &contents,
                codes_count,
            )
            .await
            .map_err(Status::from)?;

        Ok(Response::new(GenerateCodesResponse { keys }))
    }
}
