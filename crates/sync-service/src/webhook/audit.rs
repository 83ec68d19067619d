//! 回调审计日志
//!
//! 保留最近 N 条入站回调的处理记录，仅用于运维排查，
//! 任何正确性决策都不依赖它。有界 FIFO，溢出时淘汰最旧条目。

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signature::signature_prefix;

/// 默认保留条数
const DEFAULT_CAPACITY: usize = 50;

/// 处理结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Success,
    Error,
}

/// 单条审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    /// 签名前缀（完整签名不落日志）
    pub signature_prefix: String,
    pub outcome: AuditOutcome,
    pub message: String,
    /// 原始事件快照
    pub raw_event: serde_json::Value,
}

impl AuditEntry {
    pub fn new(
        event_type: impl Into<String>,
        received_signature: &str,
        outcome: AuditOutcome,
        message: impl Into<String>,
        raw_event: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: event_type.into(),
            signature_prefix: signature_prefix(received_signature),
            outcome,
            message: message.into(),
            raw_event,
        }
    }
}

/// 有界回调审计日志
#[derive(Debug)]
pub struct WebhookAuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl Default for WebhookAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookAuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// 头插一条记录，超出容量时截断尾部（最旧）
    pub fn record(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// 按最近优先返回全部记录
    pub fn list(&self) -> Vec<AuditEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
