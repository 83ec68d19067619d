//! 订单物流同步服务入口
//!
//! 装配存储、服务商客户端与 HTTP 路由并启动服务。
//! 独立运行时使用内存存储；嵌入宿主部署时由适配层
//! 注入真实的订单/选项存储实现。

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, routing::get};
use shipment_sync_service::client::SubmissionClient;
use shipment_sync_service::routes;
use shipment_sync_service::state::AppState;
use shipment_sync_service::store::MemoryOrderStore;
use shipsync_shared::config::AppConfig;
use shipsync_shared::observability;
use shipsync_shared::store::MemoryConfigStore;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("shipment-sync-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting shipment-sync-service on {}", config.server_addr());

    let store = Arc::new(MemoryOrderStore::new());
    let config_store = Arc::new(MemoryConfigStore::new());
    let provider = Arc::new(SubmissionClient::new(&config.provider));

    let addr = config.server_addr();
    let state = AppState::new(config, store, config_store, provider);

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(60)))
        .with_state(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接，
    // 等待已有请求（含进行中的批量重试调用）处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shipment-sync-service"
    }))
}
