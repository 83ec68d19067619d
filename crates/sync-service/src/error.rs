//! 服务层错误类型定义
//!
//! 把核心的 SyncError 映射为带 HTTP 语义的 API 错误。错误码是
//! API 契约的一部分，宿主界面用它做条件分支。回调端点不走这里
//! （其响应体格式与服务商约定，见 handlers::webhook）。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shipsync_shared::error::SyncError;

/// 运营/宿主 API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("回调签名验证失败")]
    InvalidSignature,

    #[error("请求格式错误: {0}")]
    Malformed(String),

    #[error("载荷不是合法 JSON: {0}")]
    InvalidPayloadJson(String),

    #[error("订单不存在: {0}")]
    OrderNotFound(String),

    /// 上游（服务商/网络）失败：状态已落盘，响应用 502 区分于本服务故障
    #[error("上游请求失败: {0}")]
    Upstream(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::Malformed(_) | Self::InvalidPayloadJson(_) => StatusCode::BAD_REQUEST,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Malformed(_) => "MALFORMED_REQUEST",
            Self::InvalidPayloadJson(_) => "INVALID_PAYLOAD_JSON",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 内部错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidSignature => Self::InvalidSignature,
            SyncError::MalformedEvent { field } => Self::Malformed(format!("缺少必需字段: {field}")),
            SyncError::InvalidPayloadJson { message } => Self::InvalidPayloadJson(message),
            SyncError::OrderNotFound { order_id } => Self::OrderNotFound(order_id),
            SyncError::Transport { message } => Self::Upstream(message),
            SyncError::Provider { status, message } => {
                Self::Upstream(format!("http={status} {message}"))
            }
            SyncError::Internal(message) => Self::Internal(message),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
