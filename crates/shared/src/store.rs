//! 宿主键值存储抽象
//!
//! 宿主系统（电商平台）持有一套自己的选项存储，访问令牌、默认服务、
//! 付款方式等运行期可变的选项都保存在那里。核心通过 `ConfigStore`
//! trait 读写这些选项，与宿主的持久化机制完全解耦；内存实现用于
//! 测试和独立运行。

use async_trait::async_trait;
use dashmap::DashMap;

/// 选项键名常量
///
/// 与宿主存储约定的键空间，宿主适配层需要使用相同的键写入。
pub mod keys {
    /// 服务商访问令牌（登录集成流程写入）
    pub const ACCESS_TOKEN: &str = "access_token";
    /// 默认物流服务标识
    pub const SERVICE_ID: &str = "service_id";
    /// 运费由收件人支付
    pub const PAYMENT_DONE_BY_RECEIVER: &str = "payment_done_by_receiver";
    /// 代收货款：把商品金额计入运单
    pub const INCLUDE_PRODUCT_PAYMENT: &str = "include_product_payment";
    /// 回调签名共享密钥
    pub const WEBHOOK_SECRET: &str = "webhook_secret";
}

/// 宿主键值存储接口
///
/// get/set 语义与宿主的选项 API 对齐：键不存在时返回 None，
/// set 总是覆盖写。实现方须保证单键读写的读己之写一致性。
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// 读取选项，不存在时返回 None
    async fn get(&self, key: &str) -> Option<String>;

    /// 写入选项，覆盖已有值
    async fn set(&self, key: &str, value: &str);
}

/// 带默认值的便捷读取
pub async fn get_or(store: &dyn ConfigStore, key: &str, default: &str) -> String {
    store.get(key).await.unwrap_or_else(|| default.to_string())
}

/// 布尔选项读取
///
/// 宿主存储的布尔选项以字符串形态落盘，"1"/"true"/"yes" 视为真。
pub async fn get_bool(store: &dyn ConfigStore, key: &str) -> bool {
    matches!(
        store.get(key).await.as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

// ---------------------------------------------------------------------------
// SyncOptions — 同步选项快照
// ---------------------------------------------------------------------------

/// 一次提交所需的全部宿主选项快照
///
/// 在提交流程入口一次性读取，流程内不再回读存储，
/// 避免同一笔订单的构建与提交看到不一致的选项。
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// 默认物流服务标识
    pub service: String,
    /// 运费由收件人支付（否则寄件人）
    pub payment_done_by_receiver: bool,
    /// 商品金额是否计入运单（代收货款）
    pub include_product_payment: bool,
    /// 服务商访问令牌
    pub access_token: String,
}

impl SyncOptions {
    /// 从宿主存储读取选项快照
    pub async fn load(store: &dyn ConfigStore) -> Self {
        Self {
            service: get_or(store, keys::SERVICE_ID, "").await,
            payment_done_by_receiver: get_bool(store, keys::PAYMENT_DONE_BY_RECEIVER).await,
            include_product_payment: get_bool(store, keys::INCLUDE_PRODUCT_PAYMENT).await,
            access_token: get_or(store, keys::ACCESS_TOKEN, "").await,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryConfigStore — 内存实现
// ---------------------------------------------------------------------------

/// 内存选项存储
///
/// 测试与独立运行时使用；生产部署由宿主适配层提供真实实现。
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: DashMap<String, String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一组选项，便于测试构造
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (k, v) in entries {
            store.entries.insert(k.into(), v.into());
        }
        store
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    async fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}
