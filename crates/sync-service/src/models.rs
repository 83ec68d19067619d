//! 订单同步领域模型
//!
//! 定义本地订单记录、同步状态以及运单/订单生命周期状态枚举。
//! 状态枚举的序列化形态即服务商事件中使用的 kebab-case 字符串，
//! 便于在日志、回调路由和宿主订单备注中统一引用。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SyncStatus — 同步状态
// ---------------------------------------------------------------------------

/// 订单与服务商之间的同步状态
///
/// `Submitted` 表示请求已被服务商接收（HTTP 2xx）但响应体无法解析，
/// 结果待后续回调确认；`Success` 必须伴随非空的运单号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    NotSubmitted,
    Submitted,
    Failed,
    Success,
}

impl SyncStatus {
    /// 是否允许走重试流程
    ///
    /// 已成功的订单重试属于调用方前置条件违反，核心不拒绝（重新提交
    /// 是安全的），但调用方 UI 只应对这两种状态提供重试入口。
    pub fn is_retry_candidate(&self) -> bool {
        matches!(self, Self::Failed | Self::NotSubmitted)
    }
}

// ---------------------------------------------------------------------------
// ShipmentStatus / OrderStatus — 状态机词汇
// ---------------------------------------------------------------------------

/// 服务商侧的运单状态
///
/// 与回调事件类型后缀一一对应，序列化为 kebab-case 与线上形态一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipmentStatus {
    Pending,
    Booked,
    Processing,
    OnBranch,
    Completed,
    Cancelled,
    Resent,
    Delayed,
    Released,
    Returning,
    Returned,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Booked => "booked",
            Self::Processing => "processing",
            Self::OnBranch => "on-branch",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Resent => "resent",
            Self::Delayed => "delayed",
            Self::Released => "released",
            Self::Returning => "returning",
            Self::Returned => "returned",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 宿主订单生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    OnHold,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnHold => "on-hold",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ShipmentOrder — 本地订单记录
// ---------------------------------------------------------------------------

/// 订单行项目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub sku: String,
    pub title: String,
    pub quantity: u32,
    pub width_cm: u32,
    pub height_cm: u32,
    pub length_cm: u32,
    /// 该行合计金额（非单价）
    pub line_total: f64,
    pub currency: String,
}

/// 可同步的本地订单记录
///
/// 首次观察到符合条件的订单时隐式创建；提交流程与回调投影流程
/// 各自更新同步字段；本核心从不删除订单记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentOrder {
    pub order_id: String,
    pub customer_id: String,
    pub destination_country: String,
    /// 可能编码为 "<city>::<area>" 的完整城市字段
    pub destination_city: String,
    pub destination_area: String,
    pub destination_address: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub line_items: Vec<LineItem>,
    pub notes: String,

    // ---- 同步派生字段 ----
    pub sync_status: SyncStatus,
    /// 服务商运单号 / 追踪号
    pub provider_reference: Option<String>,
    /// 最近一次实际发送的请求载荷原文，重试时逐字节重放
    pub last_payload: Option<String>,
    /// 最近一次服务商响应原文
    pub last_response_body: Option<String>,
    pub last_error_message: Option<String>,
    /// 服务商侧运单状态（来自回调）
    pub shipment_status: Option<ShipmentStatus>,
    /// 宿主订单生命周期状态
    pub order_status: Option<OrderStatus>,
    /// 最近一次回调的 requestId / webhookId / 账户标识
    pub last_request_id: Option<String>,
    pub last_webhook_id: Option<String>,
    pub provider_account: Option<String>,
    /// 订单状态变更备注（引用 requestId，便于排查）
    pub status_note: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<String>,
}

impl ShipmentOrder {
    /// 以未提交状态创建订单记录
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        destination_country: impl Into<String>,
        destination_city: impl Into<String>,
        destination_address: impl Into<String>,
        contact_name: impl Into<String>,
        contact_phone: impl Into<String>,
        line_items: Vec<LineItem>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            destination_country: destination_country.into(),
            destination_city: destination_city.into(),
            destination_area: String::new(),
            destination_address: destination_address.into(),
            contact_name: contact_name.into(),
            contact_phone: contact_phone.into(),
            line_items,
            notes: notes.into(),
            sync_status: SyncStatus::NotSubmitted,
            provider_reference: None,
            last_payload: None,
            last_response_body: None,
            last_error_message: None,
            shipment_status: None,
            order_status: None,
            last_request_id: None,
            last_webhook_id: None,
            provider_account: None,
            status_note: None,
            processed_at: None,
            processed_by: None,
        }
    }
}
