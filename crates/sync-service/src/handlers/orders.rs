//! 订单同步处理器
//!
//! 宿主适配层调用的订单入口：登记订单记录、触发提交、
//! 单笔/批量重试、载荷编辑与同步记录查询。

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ApiError, Result};
use crate::models::ShipmentOrder;
use crate::retry::{BulkRetrySummary, RetryReport};
use crate::state::AppState;
use crate::sync::SubmitDisposition;

/// PUT /orders/{id} — 登记/覆盖订单记录
///
/// 宿主观察到符合条件的订单时写入本地记录；body 即完整订单。
/// 路径中的 id 必须与 body 一致，避免错键写入。
pub async fn upsert_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(order): Json<ShipmentOrder>,
) -> Result<Json<ShipmentOrder>> {
    if order.order_id != order_id {
        return Err(ApiError::Malformed(format!(
            "路径订单号 {order_id} 与请求体 {} 不一致",
            order.order_id
        )));
    }

    state.store.put(order.clone()).await?;
    info!(%order_id, "订单记录已登记");
    Ok(Json(order))
}

/// GET /orders/{id} — 查询同步记录
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ShipmentOrder>> {
    let order = state.store.get(&order_id).await?;
    Ok(Json(order))
}

/// POST /orders/{id}/submit — 新订单触发提交
///
/// 宿主适配层在订单创建事件中直接调用；重复调用被幂等保护跳过。
#[instrument(skip(state))]
pub async fn submit_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<SubmitDisposition>> {
    let disposition = state.sync.on_order_created(&order_id).await?;
    Ok(Json(disposition))
}

/// POST /orders/{id}/retry — 单笔重试
#[instrument(skip(state))]
pub async fn retry_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<RetryReport>> {
    let report = state.retry.retry_single(&order_id).await?;
    Ok(Json(report))
}

/// 批量重试请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRetryRequest {
    pub order_ids: Vec<String>,
}

/// POST /orders/retry — 批量重试（严格串行）
#[instrument(skip(state, request), fields(total = request.order_ids.len()))]
pub async fn retry_bulk(
    State(state): State<AppState>,
    Json(request): Json<BulkRetryRequest>,
) -> Json<BulkRetrySummary> {
    let summary = state.retry.retry_bulk(&request.order_ids).await;
    Json(summary)
}

/// 载荷编辑请求体
#[derive(Debug, Deserialize)]
pub struct SavePayloadRequest {
    /// 新的请求载荷原文（JSON 字符串）
    pub payload: String,
}

/// 载荷编辑响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayloadResponse {
    pub order_id: String,
    pub saved: bool,
}

/// PUT /orders/{id}/payload — 运营人员编辑重放载荷
///
/// 先校验 JSON 合法性，非法输入直接拒绝、不产生任何写入；
/// 合法时按原文覆盖 last_payload（保持逐字节重放语义，不做
/// 规范化重排）。
#[instrument(skip(state, request))]
pub async fn save_payload(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<SavePayloadRequest>,
) -> Result<Json<SavePayloadResponse>> {
    if let Err(e) = serde_json::from_str::<serde_json::Value>(&request.payload) {
        return Err(ApiError::InvalidPayloadJson(e.to_string()));
    }

    let _guard = state.locks.acquire(&order_id).await;
    let mut order = state.store.get(&order_id).await?;
    order.last_payload = Some(request.payload);
    state.store.put(order).await?;

    info!(%order_id, "重放载荷已更新");
    Ok(Json(SavePayloadResponse {
        order_id,
        saved: true,
    }))
}
