//! 订单存储抽象
//!
//! 宿主系统的订单存储对核心不透明：这里只定义读写接口与
//! 单订单互斥锁表。内存实现用于测试与独立运行，生产部署由
//! 宿主适配层提供真实实现（要求单记录读己之写一致性）。

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shipsync_shared::error::{Result, SyncError};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::ShipmentOrder;

/// 订单存储接口
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 读取订单记录，不存在时返回 OrderNotFound
    async fn get(&self, order_id: &str) -> Result<ShipmentOrder>;

    /// 写入订单记录（覆盖）
    async fn put(&self, order: ShipmentOrder) -> Result<()>;
}

// ---------------------------------------------------------------------------
// OrderLocks — 单订单互斥锁表
// ---------------------------------------------------------------------------

/// 单订单互斥锁表
///
/// 回调可能并发乱序到达：不同订单并行处理，同一订单的
/// 读-改-写必须串行。提交流程只在网络调用完成后的持久化
/// 阶段短暂持锁，不跨网络调用持锁。
#[derive(Debug, Default)]
pub struct OrderLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定订单的锁，按需创建
    pub async fn acquire(&self, order_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

// ---------------------------------------------------------------------------
// MemoryOrderStore — 内存实现
// ---------------------------------------------------------------------------

/// 内存订单存储
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: DashMap<String, ShipmentOrder>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn get(&self, order_id: &str) -> Result<ShipmentOrder> {
        self.orders
            .get(order_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SyncError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn put(&self, order: ShipmentOrder) -> Result<()> {
        self.orders.insert(order.order_id.clone(), order);
        Ok(())
    }
}
