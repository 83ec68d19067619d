//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态。所有组件显式构造并通过
//! 构造函数注入协作方，不做任何全局查找。

use std::sync::Arc;

use shipsync_shared::config::AppConfig;
use shipsync_shared::store::ConfigStore;

use crate::client::ProviderApi;
use crate::retry::RetryCoordinator;
use crate::store::{OrderLocks, OrderStore};
use crate::sync::SyncService;
use crate::webhook::audit::WebhookAuditLog;
use crate::webhook::projector::OrderProjector;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn OrderStore>,
    pub config_store: Arc<dyn ConfigStore>,
    pub provider: Arc<dyn ProviderApi>,
    pub locks: Arc<OrderLocks>,
    pub sync: Arc<SyncService>,
    pub retry: Arc<RetryCoordinator>,
    pub projector: Arc<OrderProjector>,
    pub audit: Arc<WebhookAuditLog>,
}

impl AppState {
    /// 装配全部组件
    ///
    /// 存储与服务商客户端由调用方（main 或测试）提供，
    /// 同步服务、重试协调器与投影器在这里完成接线。
    pub fn new(
        config: AppConfig,
        store: Arc<dyn OrderStore>,
        config_store: Arc<dyn ConfigStore>,
        provider: Arc<dyn ProviderApi>,
    ) -> Self {
        let locks = Arc::new(OrderLocks::new());

        let sync = Arc::new(SyncService::new(
            store.clone(),
            config_store.clone(),
            provider.clone(),
            locks.clone(),
            config.provider.served_country.clone(),
            config.service_name.clone(),
        ));

        let retry = Arc::new(RetryCoordinator::new(
            sync.clone(),
            store.clone(),
            locks.clone(),
        ));

        let projector = Arc::new(OrderProjector::new(store.clone(), locks.clone()));

        Self {
            config: Arc::new(config),
            store,
            config_store,
            provider,
            locks,
            sync,
            retry,
            projector,
            audit: Arc::new(WebhookAuditLog::new()),
        }
    }
}
