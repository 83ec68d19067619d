//! 路由配置模块
//!
//! 定义回调端点与运营/宿主 API 的路由映射。

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{handlers, state::AppState};

/// 回调相关路由
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook/shipments", post(handlers::webhook::receive_webhook))
        .route("/webhook/audit", get(handlers::webhook::list_audit))
}

/// 订单同步相关路由（宿主适配层与运营界面调用）
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/retry", post(handlers::orders::retry_bulk))
        .route(
            "/orders/{id}",
            put(handlers::orders::upsert_order).get(handlers::orders::get_order),
        )
        .route("/orders/{id}/submit", post(handlers::orders::submit_order))
        .route("/orders/{id}/retry", post(handlers::orders::retry_order))
        .route("/orders/{id}/payload", put(handlers::orders::save_payload))
}

/// 运费询价路由
pub fn rate_routes() -> Router<AppState> {
    Router::new().route("/rates/quote", post(handlers::rates::quote))
}

/// 聚合全部 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(webhook_routes())
        .merge(order_routes())
        .merge(rate_routes())
}
