//! 促销码服务入口
//!
//! 同时启动两个监听面：HTTP（公开兑换 + 管理接口）与
//! gRPC（内部服务间接口），共享同一组服务实例。

use std::sync::Arc;

use anyhow::Result;
use promo_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tokio::signal;
use tonic::transport::Server;
use tracing::info;

use promo_service::api::{self, state::AppState};
use promo_service::grpc::PromoCodeServiceImpl;
use promo_service::repository::{ContentRepository, PromoRepository};
use promo_service::service::{ContentService, IssuanceService, RedemptionService};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 统一加载配置：config/{default,环境,服务}.toml + PROMO_ 环境变量
    let config = AppConfig::load("promo-service").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    // 2. 初始化可观测性（日志 + /metrics + /health）
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting promo-service...");
    info!(environment = %config.environment, "Configuration loaded");

    // 3. 初始化数据库连接并执行迁移
    let db = Database::connect(&config.database).await?;
    sqlx::migrate!("../../migrations").run(db.pool()).await?;
    info!("Database connection established, migrations applied");

    // 4. 创建仓储
    let promo_repo = Arc::new(PromoRepository::new(db.pool().clone()));
    let content_repo = Arc::new(ContentRepository::new(db.pool().clone()));

    // 5. 创建服务
    let redemption = Arc::new(RedemptionService::new(
        promo_repo.clone(),
        content_repo.clone(),
        db.pool().clone(),
    ));
    let issuance = Arc::new(IssuanceService::new(redemption.clone(), promo_repo.clone()));
    let contents = Arc::new(ContentService::new(content_repo.clone()));
    info!("Services initialized");

    // 6. HTTP 请求面
    let http_addr = config.server.http_addr();
    let app = api::router(AppState::new(
        redemption.clone(),
        issuance.clone(),
        contents,
    ));
    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    let http_server = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok::<_, anyhow::Error>(())
    };

    // 7. gRPC 服务间接口
    let grpc_addr = config.server.grpc_addr().parse()?;
    let grpc_service = PromoCodeServiceImpl::new(redemption, issuance);
    info!("gRPC server listening on {}", grpc_addr);

    let grpc_server = async {
        Server::builder()
            .add_service(grpc_service.into_server())
            .serve_with_shutdown(grpc_addr, shutdown_signal())
            .await?;
        Ok::<_, anyhow::Error>(())
    };

    tokio::try_join!(http_server, grpc_server)?;

    info!("Service shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号，用于 Kubernetes 优雅关闭
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
