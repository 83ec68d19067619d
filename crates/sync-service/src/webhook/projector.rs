//! 订单状态投影
//!
//! 把路由得到的状态迁移应用到本地订单记录。同一订单的并发回调
//! 通过单订单互斥锁串行化；事件重放幂等（只做赋值，不累加）。
//! 乱序投递不做防护——协议没有序号，后到的事件覆盖先到的。

use std::sync::Arc;

use shipsync_shared::error::Result;
use tracing::{info, instrument};

use crate::store::{OrderLocks, OrderStore};

use super::WebhookEvent;
use super::router::StatusTransition;

/// 订单投影器
pub struct OrderProjector {
    store: Arc<dyn OrderStore>,
    locks: Arc<OrderLocks>,
}

impl OrderProjector {
    pub fn new(store: Arc<dyn OrderStore>, locks: Arc<OrderLocks>) -> Self {
        Self { store, locks }
    }

    /// 将状态迁移作为一个整体应用到订单
    ///
    /// 订单不存在时返回 OrderNotFound，不产生任何部分写入。
    #[instrument(skip(self, event))]
    pub async fn apply(
        &self,
        order_id: &str,
        transition: &StatusTransition,
        event: &WebhookEvent,
    ) -> Result<()> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.store.get(order_id).await?;

        let request_id = event.request_id.as_deref().unwrap_or("-");
        order.order_status = Some(transition.order_status);
        order.shipment_status = Some(transition.shipment_status);
        order.status_note = Some(format!(
            "Shipment status changed to {} (request {})",
            transition.shipment_status, request_id
        ));
        order.last_request_id = event.request_id.clone();
        order.last_webhook_id = event.webhook_id.clone();
        order.provider_account = event.account.clone();

        if let Some(tracking) = event.tracking_number() {
            order.provider_reference = Some(tracking.to_string());
        }

        self.store.put(order).await?;

        info!(
            order_id,
            shipment_status = %transition.shipment_status,
            order_status = %transition.order_status,
            request_id,
            "回调状态已投影到订单"
        );

        Ok(())
    }
}
