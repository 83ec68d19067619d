//! 统一错误处理模块
//!
//! 定义同步核心的错误分类，使用 thiserror 提供良好的错误信息。
//! 错误码是对外契约的一部分，宿主适配层依赖它区分失败原因。

use thiserror::Error;

/// 同步核心错误类型
#[derive(Debug, Error)]
pub enum SyncError {
    // ==================== 出站请求错误 ====================
    /// 网络层故障：连接失败、超时等，未拿到任何服务商响应
    #[error("网络请求失败: {message}")]
    Transport { message: String },

    /// 服务商层失败：HTTP 非 2xx，或 2xx 但业务 status=false
    #[error("服务商返回失败: http={status} {message}")]
    Provider { status: u16, message: String },

    // ==================== 入站回调错误 ====================
    #[error("回调签名验证失败")]
    InvalidSignature,

    #[error("回调事件缺少必需字段: {field}")]
    MalformedEvent { field: String },

    // ==================== 业务逻辑错误 ====================
    #[error("订单未找到: order_id={order_id}")]
    OrderNotFound { order_id: String },

    /// 运营人员编辑的载荷不是合法 JSON，拒绝写入
    #[error("载荷不是合法 JSON: {message}")]
    InvalidPayloadJson { message: String },

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MalformedEvent { .. } => "MALFORMED_EVENT",
            Self::OrderNotFound { .. } => "ORDER_NOT_FOUND",
            Self::InvalidPayloadJson { .. } => "INVALID_PAYLOAD_JSON",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    ///
    /// 只有出站请求类失败适合重新提交；签名/事件格式/订单缺失
    /// 属于确定性失败，重试不会改变结果。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Provider { .. })
    }

    /// 便捷构造：网络错误
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// 便捷构造：服务商错误
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }
}
