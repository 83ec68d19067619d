//! 入站回调处理
//!
//! 服务商以异步回调推送运单状态：原始请求体先过签名验证，
//! 再解析为事件信封、路由出状态迁移、投影到本地订单，全程
//! 记录审计日志。

pub mod audit;
pub mod projector;
pub mod router;
pub mod signature;

use serde::{Deserialize, Serialize};

/// 回调事件信封
///
/// 字段全部可选：缺失检查在路由层做（MalformedEvent），反序列化
/// 本身不因此失败。`payload` 保留服务商原始嵌套结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// 事件类型，如 "localShipments.completed"
    pub event: Option<String>,
    pub request_id: Option<String>,
    pub webhook_id: Option<String>,
    pub account: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WebhookEvent {
    /// 从 payload.metadata 中取出本地订单号
    ///
    /// 出站元数据历史上用 snake_case，回调侧新版网关已转为驼峰，
    /// 两种键名都接受。
    pub fn order_id(&self) -> Option<&str> {
        let metadata = self.payload.get("metadata")?;
        metadata
            .get("orderId")
            .or_else(|| metadata.get("order_id"))
            .and_then(|v| v.as_str())
    }

    /// 回调携带的运单号（可选）
    pub fn tracking_number(&self) -> Option<&str> {
        self.payload
            .get("trackingNumber")
            .or_else(|| self.payload.get("tracking_number"))
            .and_then(|v| v.as_str())
    }
}
