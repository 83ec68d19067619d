//! 重试协调器
//!
//! 运营人员触发的单笔与批量重新提交。批量严格串行：一笔完成
//! （无论成败）才开始下一笔，既约束对服务商的压力，也让调用方
//! 拿到精确的进度；单笔失败不影响批次继续。

use std::sync::Arc;

use serde::Serialize;
use shipsync_shared::error::{Result, SyncError};
use tracing::{info, instrument, warn};

use crate::models::SyncStatus;
use crate::store::{OrderLocks, OrderStore};
use crate::sync::SyncService;

/// 单笔重试结论
///
/// `succeeded=false` 不是调用层面的错误：失败已落盘在订单上，
/// 这里把存储的消息透出给运营界面。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryReport {
    pub order_id: String,
    pub succeeded: bool,
    pub message: Option<String>,
}

/// 批量重试汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkRetrySummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// 重试协调器
pub struct RetryCoordinator {
    sync: Arc<SyncService>,
    store: Arc<dyn OrderStore>,
    locks: Arc<OrderLocks>,
}

impl RetryCoordinator {
    pub fn new(sync: Arc<SyncService>, store: Arc<dyn OrderStore>, locks: Arc<OrderLocks>) -> Self {
        Self { sync, store, locks }
    }

    /// 重试单笔订单
    ///
    /// 有 last_payload 时逐字节重放，否则按当前订单状态重建载荷。
    /// 对已成功订单发起重试属于调用方前置条件违反，这里不拒绝——
    /// 重新提交是安全的，只记录告警。
    #[instrument(skip(self))]
    pub async fn retry_single(&self, order_id: &str) -> Result<RetryReport> {
        let order = self.store.get(order_id).await?;

        if order.sync_status == SyncStatus::Success {
            warn!(order_id, "对已成功订单发起重试，按原样重新提交");
        }

        // 清除上一轮的错误标记，让本轮结果不与历史混淆
        {
            let _guard = self.locks.acquire(order_id).await;
            let mut fresh = self.store.get(order_id).await?;
            fresh.last_error_message = None;
            self.store.put(fresh).await?;
        }

        let payload_json = match &order.last_payload {
            Some(payload) => payload.clone(),
            None => self.sync.build_payload_json(&order).await?,
        };

        match self.sync.submit_payload(order_id, payload_json).await {
            Ok(report) => Ok(RetryReport {
                order_id: order_id.to_string(),
                succeeded: report.sync_status != SyncStatus::Failed,
                message: report.message,
            }),
            // 传输/服务商失败已落盘，转为报告而非向上冒泡
            Err(err @ (SyncError::Transport { .. } | SyncError::Provider { .. })) => {
                Ok(RetryReport {
                    order_id: order_id.to_string(),
                    succeeded: false,
                    message: Some(err.to_string()),
                })
            }
            Err(other) => Err(other),
        }
    }

    /// 批量重试，严格串行
    ///
    /// 每笔的结果相互独立；整个序列跑完后返回汇总计数。
    pub async fn retry_bulk(&self, order_ids: &[String]) -> BulkRetrySummary {
        let total = order_ids.len();
        let mut summary = BulkRetrySummary::default();

        for (index, order_id) in order_ids.iter().enumerate() {
            info!(current = index + 1, total, %order_id, "批量重试进行中");

            match self.retry_single(order_id).await {
                Ok(report) if report.succeeded => summary.succeeded += 1,
                Ok(report) => {
                    warn!(%order_id, message = ?report.message, "批量重试：单笔未成功");
                    summary.failed += 1;
                }
                Err(err) => {
                    warn!(%order_id, error = %err, "批量重试：单笔执行出错");
                    summary.failed += 1;
                }
            }
        }

        info!(
            total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "批量重试完成"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockProviderApi, SubmissionResult};
    use crate::models::{LineItem, ShipmentOrder};
    use crate::store::MemoryOrderStore;
    use shipsync_shared::store::{ConfigStore, MemoryConfigStore, keys};

    fn make_order(id: &str) -> ShipmentOrder {
        ShipmentOrder::new(
            id,
            "cust-1",
            "LY",
            "Tripoli::Hay Andalus",
            "Main street 5",
            "Ali Ahmed",
            "0912345678",
            vec![LineItem {
                sku: "SKU-1".to_string(),
                title: "Socks".to_string(),
                quantity: 1,
                width_cm: 10,
                height_cm: 5,
                length_cm: 20,
                line_total: 15.0,
                currency: "LYD".to_string(),
            }],
            "",
        )
    }

    fn success_result(reference: &str) -> SubmissionResult {
        SubmissionResult {
            http_status: 200,
            provider_status: Some(true),
            tracking_number: Some(reference.to_string()),
            message: None,
            raw_body: format!(r#"{{"status":true,"data":{{"reference":"{reference}"}}}}"#),
        }
    }

    fn failure_result(message: &str) -> SubmissionResult {
        SubmissionResult {
            http_status: 200,
            provider_status: Some(false),
            tracking_number: None,
            message: Some(message.to_string()),
            raw_body: format!(r#"{{"status":false,"message":"{message}"}}"#),
        }
    }

    async fn make_coordinator(
        provider: MockProviderApi,
        orders: Vec<ShipmentOrder>,
    ) -> (RetryCoordinator, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        for order in orders {
            store.put(order).await.unwrap();
        }
        let config_store = Arc::new(MemoryConfigStore::new());
        config_store.set(keys::SERVICE_ID, "svc-express").await;
        config_store.set(keys::ACCESS_TOKEN, "tok-abc").await;

        let locks = Arc::new(OrderLocks::new());
        let sync = Arc::new(SyncService::new(
            store.clone(),
            config_store,
            Arc::new(provider),
            locks.clone(),
            "LY",
            "shipment-sync-service",
        ));
        (
            RetryCoordinator::new(sync, store.clone(), locks),
            store,
        )
    }

    #[tokio::test]
    async fn test_retry_single_replays_last_payload_verbatim() {
        let stored_payload = r#"{"order":{"service":"svc-old"},"token":"tok-old"}"#;

        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            // 逐字节重放：收到的请求体必须与存储的完全一致
            .withf(move |payload| payload == stored_payload)
            .times(1)
            .returning(|_| Ok(success_result("TRK-R1")));

        let mut order = make_order("123");
        order.sync_status = SyncStatus::Failed;
        order.last_payload = Some(stored_payload.to_string());
        order.last_error_message = Some("previous failure".to_string());

        let (coordinator, store) = make_coordinator(provider, vec![order]).await;
        let report = coordinator.retry_single("123").await.unwrap();

        assert!(report.succeeded);
        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Success);
        // 重放后 last_payload 保持原文
        assert_eq!(order.last_payload.as_deref(), Some(stored_payload));
        assert!(order.last_error_message.is_none());
    }

    #[tokio::test]
    async fn test_retry_single_rebuilds_when_no_payload() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            // 重建的载荷来自当前订单状态，应包含订单号与服务标识
            .withf(|payload| payload.contains("\"order_id\":\"123\"") && payload.contains("svc-express"))
            .times(1)
            .returning(|_| Ok(success_result("TRK-R2")));

        let (coordinator, store) = make_coordinator(provider, vec![make_order("123")]).await;
        let report = coordinator.retry_single("123").await.unwrap();

        assert!(report.succeeded);
        assert_eq!(store.get("123").await.unwrap().sync_status, SyncStatus::Success);
    }

    #[tokio::test]
    async fn test_retry_single_reports_provider_failure_as_non_fatal() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Ok(failure_result("still not covered")));

        let mut order = make_order("123");
        order.sync_status = SyncStatus::Failed;
        order.last_payload = Some("{}".to_string());

        let (coordinator, _store) = make_coordinator(provider, vec![order]).await;
        let report = coordinator.retry_single("123").await.unwrap();

        assert!(!report.succeeded);
        assert_eq!(report.message.as_deref(), Some("still not covered"));
    }

    #[tokio::test]
    async fn test_retry_single_unknown_order_is_fatal() {
        let provider = MockProviderApi::new();
        let (coordinator, _store) = make_coordinator(provider, vec![]).await;

        let err = coordinator.retry_single("missing").await.unwrap_err();
        assert!(matches!(err, SyncError::OrderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_retry_single_on_success_order_resubmits_safely() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Ok(success_result("TRK-AGAIN")));

        let mut order = make_order("123");
        order.sync_status = SyncStatus::Success;
        order.provider_reference = Some("TRK-OLD".to_string());
        order.last_payload = Some("{}".to_string());

        let (coordinator, store) = make_coordinator(provider, vec![order]).await;
        let report = coordinator.retry_single("123").await.unwrap();

        // 前置条件违反但不破坏状态：正常重新提交
        assert!(report.succeeded);
        assert_eq!(
            store.get("123").await.unwrap().provider_reference.as_deref(),
            Some("TRK-AGAIN")
        );
    }

    /// 三笔订单分别遭遇 成功 / 服务商失败 / 传输失败，
    /// 汇总为 {succeeded:1, failed:2}，各订单状态互不影响
    #[tokio::test]
    async fn test_retry_bulk_mixed_outcomes() {
        let mut provider = MockProviderApi::new();
        provider.expect_submit().times(3).returning(|payload| {
            if payload.contains("ord-a") {
                Ok(success_result("TRK-A"))
            } else if payload.contains("ord-b") {
                Ok(failure_result("rejected"))
            } else {
                Err(SyncError::transport("connection reset"))
            }
        });

        let orders: Vec<ShipmentOrder> = ["ord-a", "ord-b", "ord-c"]
            .into_iter()
            .map(|id| {
                let mut order = make_order(id);
                order.sync_status = SyncStatus::Failed;
                order.last_payload = Some(format!(r#"{{"order":{{"metadata":{{"order_id":"{id}"}}}}}}"#));
                order
            })
            .collect();

        let (coordinator, store) = make_coordinator(provider, orders).await;
        let ids: Vec<String> = ["ord-a", "ord-b", "ord-c"].iter().map(|s| s.to_string()).collect();
        let summary = coordinator.retry_bulk(&ids).await;

        assert_eq!(summary, BulkRetrySummary { succeeded: 1, failed: 2 });

        assert_eq!(store.get("ord-a").await.unwrap().sync_status, SyncStatus::Success);
        assert_eq!(store.get("ord-b").await.unwrap().sync_status, SyncStatus::Failed);
        assert_eq!(store.get("ord-c").await.unwrap().sync_status, SyncStatus::Failed);
        assert!(
            store
                .get("ord-c")
                .await
                .unwrap()
                .last_error_message
                .unwrap()
                .contains("connection reset")
        );
    }

    #[tokio::test]
    async fn test_retry_bulk_missing_order_counts_failed_and_continues() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Ok(success_result("TRK-X")));

        let mut order = make_order("ord-present");
        order.sync_status = SyncStatus::Failed;
        order.last_payload = Some("{}".to_string());

        let (coordinator, _store) = make_coordinator(provider, vec![order]).await;
        let ids = vec!["ord-ghost".to_string(), "ord-present".to_string()];
        let summary = coordinator.retry_bulk(&ids).await;

        // 第一笔找不到订单不终止批次，第二笔照常执行
        assert_eq!(summary, BulkRetrySummary { succeeded: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_retry_bulk_empty_input() {
        let provider = MockProviderApi::new();
        let (coordinator, _store) = make_coordinator(provider, vec![]).await;
        let summary = coordinator.retry_bulk(&[]).await;
        assert_eq!(summary, BulkRetrySummary::default());
    }
}
