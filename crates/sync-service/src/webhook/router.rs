//! 回调事件路由
//!
//! 校验事件信封完整性，并把事件类型映射为本地状态迁移。
//! 纯函数：不读存储、不做 I/O，便于穷举测试映射表。

use shipsync_shared::error::{Result, SyncError};

use crate::models::{OrderStatus, ShipmentStatus};

use super::WebhookEvent;

/// 一次状态迁移：运单状态 + 宿主订单生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub shipment_status: ShipmentStatus,
    pub order_status: OrderStatus,
}

/// 路由结果
///
/// 未知事件类型不是错误：接受并审计，但不产生任何迁移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Transition(StatusTransition),
    Ignored,
}

/// 路由回调事件
///
/// requestId / webhookId / account 任一缺失（或为空）即判为畸形事件，
/// 在任何订单查找发生之前拒绝。
pub fn route(event: &WebhookEvent) -> Result<RouteOutcome> {
    let event_type = require(event.event.as_deref(), "event")?;
    require(event.request_id.as_deref(), "requestId")?;
    require(event.webhook_id.as_deref(), "webhookId")?;
    require(event.account.as_deref(), "account")?;

    // 事件类型形如 "localShipments.completed"，取最后一个 '.' 之后的后缀
    let suffix = event_type.rsplit('.').next().unwrap_or(event_type);

    let transition = match suffix {
        "pending" => transition(ShipmentStatus::Pending, OrderStatus::OnHold),
        "booked" => transition(ShipmentStatus::Booked, OrderStatus::Processing),
        "processing" => transition(ShipmentStatus::Processing, OrderStatus::Processing),
        "on-branch" => transition(ShipmentStatus::OnBranch, OrderStatus::Processing),
        "completed" => transition(ShipmentStatus::Completed, OrderStatus::Completed),
        "cancelled" => transition(ShipmentStatus::Cancelled, OrderStatus::Cancelled),
        "resent" => transition(ShipmentStatus::Resent, OrderStatus::Processing),
        "delayed" => transition(ShipmentStatus::Delayed, OrderStatus::OnHold),
        "released" => transition(ShipmentStatus::Released, OrderStatus::Cancelled),
        "returning" => transition(ShipmentStatus::Returning, OrderStatus::Cancelled),
        "returned" => transition(ShipmentStatus::Returned, OrderStatus::Cancelled),
        _ => return Ok(RouteOutcome::Ignored),
    };

    Ok(transition)
}

fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SyncError::MalformedEvent {
            field: field.to_string(),
        }),
    }
}

fn transition(shipment_status: ShipmentStatus, order_status: OrderStatus) -> RouteOutcome {
    RouteOutcome::Transition(StatusTransition {
        shipment_status,
        order_status,
    })
}
