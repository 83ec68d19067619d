//! 订单提交流程
//!
//! 串起 载荷构建 -> 服务商提交 -> 结果落盘 的完整管道。
//! 网络调用期间不持有订单锁；落盘阶段短暂持锁并作为一个
//! 整体写入，保证失败路径同样可观测（先落盘、再报错）。

use std::sync::Arc;

use serde::Serialize;
use shipsync_shared::error::{Result, SyncError};
use shipsync_shared::store::{ConfigStore, SyncOptions};
use tracing::{info, instrument, warn};

use crate::client::{ProviderApi, SubmissionResult};
use crate::models::{ShipmentOrder, SyncStatus};
use crate::payload;
use crate::store::{OrderLocks, OrderStore};

/// 一次提交的落盘结论
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    pub order_id: String,
    pub sync_status: SyncStatus,
    pub provider_reference: Option<String>,
    pub message: Option<String>,
}

/// 新订单触发的处理结论
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "disposition")]
pub enum SubmitDisposition {
    /// 收货国家不在服务范围内，未做任何处理
    SkippedNotServed,
    /// 订单已提交过（幂等保护），未重复提交
    SkippedAlreadyProcessed,
    /// 已走完提交管道
    Submitted(SubmitReport),
}

/// 订单提交服务
///
/// 所有协作方通过构造函数注入：订单存储、宿主选项存储、
/// 服务商客户端与单订单锁表。
pub struct SyncService {
    store: Arc<dyn OrderStore>,
    config_store: Arc<dyn ConfigStore>,
    provider: Arc<dyn ProviderApi>,
    locks: Arc<OrderLocks>,
    served_country: String,
    service_name: String,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        config_store: Arc<dyn ConfigStore>,
        provider: Arc<dyn ProviderApi>,
        locks: Arc<OrderLocks>,
        served_country: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            config_store,
            provider,
            locks,
            served_country: served_country.into(),
            service_name: service_name.into(),
        }
    }

    /// 宿主观察到新订单时的入口
    ///
    /// 幂等决策：只有 NotSubmitted 的订单才会被提交，已处理过的
    /// 订单直接跳过；显式重试走 RetryCoordinator，不受此保护约束。
    #[instrument(skip(self))]
    pub async fn on_order_created(&self, order_id: &str) -> Result<SubmitDisposition> {
        let order = self.store.get(order_id).await?;

        if !payload::is_eligible(&order, &self.served_country) {
            info!(
                order_id,
                destination = %order.destination_country,
                served = %self.served_country,
                "目的地不在服务范围内，跳过同步"
            );
            return Ok(SubmitDisposition::SkippedNotServed);
        }

        if order.sync_status != SyncStatus::NotSubmitted {
            info!(order_id, sync_status = ?order.sync_status, "订单已处理过，跳过重复提交");
            return Ok(SubmitDisposition::SkippedAlreadyProcessed);
        }

        let payload_json = self.build_payload_json(&order).await?;
        let report = self.submit_payload(order_id, payload_json).await?;
        Ok(SubmitDisposition::Submitted(report))
    }

    /// 从当前订单状态与选项快照构建请求载荷
    ///
    /// 序列化恰好一次：返回的字符串既是发送的请求体也是落盘的
    /// last_payload，重试时逐字节重放。
    pub async fn build_payload_json(&self, order: &ShipmentOrder) -> Result<String> {
        let options = SyncOptions::load(self.config_store.as_ref()).await;
        let request = payload::build(order, &options);
        serde_json::to_string(&request)
            .map_err(|e| SyncError::Internal(format!("载荷序列化失败: {e}")))
    }

    /// 提交载荷并落盘结果
    ///
    /// HTTP 非 2xx 在落盘完成之后才作为 Provider 错误返回；
    /// 传输失败同样先落盘（Failed + 错误消息）再返回 Transport 错误。
    #[instrument(skip(self, payload_json))]
    pub async fn submit_payload(&self, order_id: &str, payload_json: String) -> Result<SubmitReport> {
        match self.provider.submit(&payload_json).await {
            Ok(result) => {
                let report = self.persist_submission(order_id, payload_json, &result).await?;

                if !result.is_http_success() {
                    let message = result
                        .message
                        .clone()
                        .unwrap_or_else(|| result.raw_body.clone());
                    return Err(SyncError::provider(result.http_status, message));
                }
                Ok(report)
            }
            Err(err) => {
                // 传输失败没有任何响应可记录，但失败本身要落在订单上
                self.persist_transport_failure(order_id, payload_json, &err)
                    .await?;
                Err(err)
            }
        }
    }

    /// 把一次提交的全部结论作为一个整体写入订单
    async fn persist_submission(
        &self,
        order_id: &str,
        payload_json: String,
        result: &SubmissionResult,
    ) -> Result<SubmitReport> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.store.get(order_id).await?;

        order.last_payload = Some(payload_json);
        order.last_response_body = Some(result.raw_body.clone());
        order.last_error_message = result.message.clone();
        if let Some(tracking) = &result.tracking_number {
            order.provider_reference = Some(tracking.clone());
        }

        order.sync_status = match result.provider_status {
            Some(true) => {
                // 不变量：Success 必须伴随非空运单号；服务商声称成功
                // 却没给出运单号时降级为 Submitted，等回调补全
                match order.provider_reference.as_deref() {
                    Some(reference) if !reference.is_empty() => SyncStatus::Success,
                    _ => {
                        warn!(order_id, "服务商返回成功但缺少运单号，记为 Submitted");
                        SyncStatus::Submitted
                    }
                }
            }
            Some(false) => SyncStatus::Failed,
            // 响应体不可解析：2xx 视为已送达待确认，非 2xx 视为失败
            None if result.is_http_success() => SyncStatus::Submitted,
            None => SyncStatus::Failed,
        };
        order.processed_at = Some(chrono::Utc::now());
        order.processed_by = Some(self.service_name.clone());

        let report = SubmitReport {
            order_id: order.order_id.clone(),
            sync_status: order.sync_status,
            provider_reference: order.provider_reference.clone(),
            message: order.last_error_message.clone(),
        };

        self.store.put(order).await?;

        info!(
            order_id,
            http_status = result.http_status,
            sync_status = ?report.sync_status,
            provider_reference = ?report.provider_reference,
            "提交结果已落盘"
        );

        Ok(report)
    }

    async fn persist_transport_failure(
        &self,
        order_id: &str,
        payload_json: String,
        err: &SyncError,
    ) -> Result<()> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.store.get(order_id).await?;

        order.last_payload = Some(payload_json);
        order.last_error_message = Some(err.to_string());
        order.sync_status = SyncStatus::Failed;
        order.processed_at = Some(chrono::Utc::now());
        order.processed_by = Some(self.service_name.clone());

        self.store.put(order).await?;

        warn!(order_id, error = %err, "传输失败已落盘");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockProviderApi;
    use crate::models::LineItem;
    use crate::store::MemoryOrderStore;
    use shipsync_shared::store::{ConfigStore, MemoryConfigStore, keys};

    fn make_order(id: &str, country: &str) -> ShipmentOrder {
        ShipmentOrder::new(
            id,
            "cust-1",
            country,
            "Tripoli::Hay Andalus",
            "Main street 5",
            "Ali Ahmed",
            "0912345678",
            vec![LineItem {
                sku: "SKU-1".to_string(),
                title: "Socks".to_string(),
                quantity: 2,
                width_cm: 10,
                height_cm: 5,
                length_cm: 20,
                line_total: 40.0,
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

    async fn make_service(
        provider: MockProviderApi,
        orders: Vec<ShipmentOrder>,
    ) -> (SyncService, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        for order in orders {
            store.put(order).await.unwrap();
        }
        let config_store = Arc::new(MemoryConfigStore::new());
        config_store.set(keys::SERVICE_ID, "svc-express").await;
        config_store.set(keys::INCLUDE_PRODUCT_PAYMENT, "1").await;
        config_store.set(keys::PAYMENT_DONE_BY_RECEIVER, "1").await;
        config_store.set(keys::ACCESS_TOKEN, "tok-abc").await;

        let service = SyncService::new(
            store.clone(),
            config_store,
            Arc::new(provider),
            Arc::new(OrderLocks::new()),
            "LY",
            "shipment-sync-service",
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_on_order_created_success_persists_everything() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Ok(success_result("TRK-1")));

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;
        let disposition = service.on_order_created("123").await.unwrap();

        let report = match disposition {
            SubmitDisposition::Submitted(report) => report,
            other => panic!("期望 Submitted，实际: {other:?}"),
        };
        assert_eq!(report.sync_status, SyncStatus::Success);
        assert_eq!(report.provider_reference.as_deref(), Some("TRK-1"));

        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Success);
        assert_eq!(order.provider_reference.as_deref(), Some("TRK-1"));
        assert!(order.last_response_body.unwrap().contains("TRK-1"));
        assert!(order.processed_at.is_some());
        assert_eq!(order.processed_by.as_deref(), Some("shipment-sync-service"));

        // last_payload 必须恰好等于构建出的载荷序列化结果
        let rebuilt = service
            .build_payload_json(&make_order("123", "LY"))
            .await
            .unwrap();
        assert_eq!(order.last_payload.as_deref(), Some(rebuilt.as_str()));
    }

    #[tokio::test]
    async fn test_provider_reported_failure_persists_failed_without_error() {
        let mut provider = MockProviderApi::new();
        provider.expect_submit().times(1).returning(|_| {
            Ok(SubmissionResult {
                http_status: 200,
                provider_status: Some(false),
                tracking_number: None,
                message: Some("area not covered".to_string()),
                raw_body: r#"{"status":false,"message":"area not covered"}"#.to_string(),
            })
        });

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;

        // 2xx + status=false 是服务商层失败：落盘 Failed，但不抛错
        let disposition = service.on_order_created("123").await.unwrap();
        assert!(matches!(
            disposition,
            SubmitDisposition::Submitted(SubmitReport {
                sync_status: SyncStatus::Failed,
                ..
            })
        ));

        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Failed);
        assert_eq!(order.last_error_message.as_deref(), Some("area not covered"));
    }

    #[tokio::test]
    async fn test_non_2xx_persists_then_raises_provider_error() {
        let mut provider = MockProviderApi::new();
        provider.expect_submit().times(1).returning(|_| {
            Ok(SubmissionResult {
                http_status: 502,
                provider_status: Some(false),
                tracking_number: None,
                message: Some("upstream down".to_string()),
                raw_body: r#"{"status":false,"message":"upstream down"}"#.to_string(),
            })
        });

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;

        let err = service.on_order_created("123").await.unwrap_err();
        assert!(matches!(err, SyncError::Provider { status: 502, .. }));

        // 可观测性：报错之前状态已落盘
        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Failed);
        assert!(order.last_payload.is_some());
        assert!(order.last_response_body.is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_persists_failed_then_raises() {
        let mut provider = MockProviderApi::new();
        provider
            .expect_submit()
            .times(1)
            .returning(|_| Err(SyncError::transport("connection refused")));

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;

        let err = service.on_order_created("123").await.unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));

        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Failed);
        assert!(order.last_payload.is_some());
        assert!(
            order
                .last_error_message
                .unwrap()
                .contains("connection refused")
        );
    }

    #[tokio::test]
    async fn test_unparseable_2xx_body_records_submitted() {
        let mut provider = MockProviderApi::new();
        provider.expect_submit().times(1).returning(|_| {
            Ok(SubmissionResult {
                http_status: 200,
                provider_status: None,
                tracking_number: None,
                message: None,
                raw_body: "<html>gateway</html>".to_string(),
            })
        });

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;
        service.on_order_created("123").await.unwrap();

        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Submitted);
        assert_eq!(order.last_response_body.as_deref(), Some("<html>gateway</html>"));
    }

    #[tokio::test]
    async fn test_success_without_reference_demoted_to_submitted() {
        let mut provider = MockProviderApi::new();
        provider.expect_submit().times(1).returning(|_| {
            Ok(SubmissionResult {
                http_status: 200,
                provider_status: Some(true),
                tracking_number: None,
                message: None,
                raw_body: r#"{"status":true}"#.to_string(),
            })
        });

        let (service, store) = make_service(provider, vec![make_order("123", "LY")]).await;
        service.on_order_created("123").await.unwrap();

        // Success 必须伴随运单号，缺失时保持 Submitted
        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::Submitted);
        assert!(order.provider_reference.is_none());
    }

    #[tokio::test]
    async fn test_unserved_country_skipped_without_provider_call() {
        let provider = MockProviderApi::new(); // 不设置期望：任何调用都会失败
        let (service, store) = make_service(provider, vec![make_order("123", "EG")]).await;

        let disposition = service.on_order_created("123").await.unwrap();
        assert!(matches!(disposition, SubmitDisposition::SkippedNotServed));

        let order = store.get("123").await.unwrap();
        assert_eq!(order.sync_status, SyncStatus::NotSubmitted);
        assert!(order.last_payload.is_none());
    }

    #[tokio::test]
    async fn test_already_processed_order_skipped() {
        let provider = MockProviderApi::new();
        let mut order = make_order("123", "LY");
        order.sync_status = SyncStatus::Failed;

        let (service, _store) = make_service(provider, vec![order]).await;
        let disposition = service.on_order_created("123").await.unwrap();
        assert!(matches!(disposition, SubmitDisposition::SkippedAlreadyProcessed));
    }

    #[tokio::test]
    async fn test_unknown_order_fails() {
        let provider = MockProviderApi::new();
        let (service, _store) = make_service(provider, vec![]).await;

        let err = service.on_order_created("missing").await.unwrap_err();
        assert!(matches!(err, SyncError::OrderNotFound { .. }));
    }
}
