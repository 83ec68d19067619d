//! 回调端点处理器
//!
//! 接收服务商的状态回调：先在原始字节上验签，再解析、路由、
//! 投影。每次入站调用（无论成败）恰好写入一条审计记录。
//! 响应体格式与服务商网关约定，不走统一的 ApiError 包装。

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use shipsync_shared::error::SyncError;
use shipsync_shared::store::keys;
use tracing::{info, warn};

use crate::state::AppState;
use crate::webhook::audit::{AuditEntry, AuditOutcome};
use crate::webhook::router::{self, RouteOutcome};
use crate::webhook::{WebhookEvent, signature};

/// POST /webhook/shipments
///
/// 响应约定：403 签名无效；400 事件畸形/缺失；200 处理成功
/// （含未知事件类型）；500 处理异常。
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received_signature = headers
        .get(state.config.webhook.signature_header.as_str())
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    // 审计快照：就算验签失败也要留痕，解析失败时保留原文
    let raw_snapshot: serde_json::Value = serde_json::from_slice(&body)
        .unwrap_or_else(|_| serde_json::json!({"raw": String::from_utf8_lossy(&body)}));
    let event_type = raw_snapshot
        .get("event")
        .and_then(|v| v.as_str())
        .unwrap_or("-")
        .to_string();

    // 每个返回路径恰好记录一次
    let record = |outcome: AuditOutcome, message: &str| {
        state.audit.record(AuditEntry::new(
            event_type.clone(),
            &received_signature,
            outcome,
            message,
            raw_snapshot.clone(),
        ));
    };

    // 1. 验签必须发生在任何解析之前，且针对原始字节
    let secret = state
        .config_store
        .get(keys::WEBHOOK_SECRET)
        .await
        .unwrap_or_default();
    if !signature::verify(&body, &received_signature, &secret) {
        warn!(%event_type, "回调签名验证失败");
        record(AuditOutcome::Error, "invalid signature");
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Invalid signature"})),
        )
            .into_response();
    }

    // 2. 解析事件信封
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            record(AuditOutcome::Error, &format!("invalid JSON body: {e}"));
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid JSON body"})),
            )
                .into_response();
        }
    };

    if event.event.is_none() {
        record(AuditOutcome::Error, "missing event type");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "missing event type"})),
        )
            .into_response();
    }

    // 3. 路由：信封完整性校验 + 状态映射（任何订单查找之前）
    let outcome = match router::route(&event) {
        Ok(outcome) => outcome,
        Err(err @ SyncError::MalformedEvent { .. }) => {
            record(AuditOutcome::Error, &err.to_string());
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response();
        }
        Err(err) => {
            record(AuditOutcome::Error, &err.to_string());
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response();
        }
    };

    // 4. 未知事件类型：接受并审计，不产生迁移
    let transition = match outcome {
        RouteOutcome::Transition(transition) => transition,
        RouteOutcome::Ignored => {
            info!(%event_type, "未知回调事件类型，忽略");
            record(AuditOutcome::Success, "unknown event type, no transition");
            return (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": "event accepted, no transition",
                    "event": event_type.clone(),
                })),
            )
                .into_response();
        }
    };

    // 5. 定位本地订单并投影
    let Some(order_id) = event.order_id().map(str::to_string) else {
        record(AuditOutcome::Error, "missing payload.metadata.orderId");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "missing payload.metadata.orderId"})),
        )
            .into_response();
    };

    match state.projector.apply(&order_id, &transition, &event).await {
        Ok(()) => {
            record(
                AuditOutcome::Success,
                &format!("order {order_id} -> {}", transition.shipment_status),
            );
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": format!("order {order_id} updated"),
                    "event": event_type.clone(),
                })),
            )
                .into_response()
        }
        Err(err) => {
            warn!(%order_id, error = %err, "回调投影失败");
            record(AuditOutcome::Error, &err.to_string());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": err.to_string()})),
            )
                .into_response()
        }
    }
}

/// GET /webhook/audit
///
/// 审计日志只读视图，最近优先。
pub async fn list_audit(State(state): State<AppState>) -> Json<Vec<AuditEntry>> {
    Json(state.audit.list())
}
