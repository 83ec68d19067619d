//! 服务商 API 客户端
//!
//! 通过 `ProviderApi` trait 抽象出站调用，便于在测试中替换为 mock。
//! `SubmissionClient` 为 reqwest 实现：单次 POST、限定超时、不做内部
//! 重试也不做去重——重新提交完全由重试协调器负责。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shipsync_shared::config::ProviderConfig;
use shipsync_shared::error::{Result, SyncError};
use tracing::{debug, warn};

use crate::payload::{Destination, PaymentBy, Product};

// ---------------------------------------------------------------------------
// 结果与请求模型
// ---------------------------------------------------------------------------

/// 单次提交的解析结果
///
/// HTTP 层与业务层状态分离：`http_status` 是传输结论，
/// `provider_status` 是服务商业务结论（响应体不可解析时缺失）。
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub http_status: u16,
    /// 服务商业务 status 字段；响应体不是合法 JSON 时为 None
    pub provider_status: Option<bool>,
    /// 服务商返回的运单号
    pub tracking_number: Option<String>,
    pub message: Option<String>,
    /// 响应体原文，无论是否可解析都保留
    pub raw_body: String,
}

impl SubmissionResult {
    /// HTTP 层是否成功（2xx）
    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

/// 运费询价请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub service: String,
    pub products: Vec<Product>,
    pub payment_by: PaymentBy,
    pub to: Destination,
    pub is_pickup: bool,
    pub token: String,
}

/// 运费询价结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub amount: f64,
    pub label: Option<String>,
}

/// 服务商订单创建响应的宽松解析形态
///
/// 字段全部可选：服务商在失败路径上可能省略 data，甚至只返回 message。
#[derive(Debug, Deserialize)]
struct CreateResponse {
    status: Option<bool>,
    data: Option<CreateResponseData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponseData {
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CostResponse {
    data: Option<CostResponseData>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CostResponseData {
    amount: Option<f64>,
}

// ---------------------------------------------------------------------------
// ProviderApi trait
// ---------------------------------------------------------------------------

/// 服务商出站调用接口
///
/// `submit` 收到任意 HTTP 响应即返回 Ok（业务成败由调用方根据
/// 结果判定并落盘），只有未拿到响应（连接失败/超时）才返回
/// Transport 错误。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderApi: Send + Sync {
    /// 提交运单创建请求；payload_json 原文即请求体
    async fn submit(&self, payload_json: &str) -> Result<SubmissionResult>;

    /// 运费询价
    async fn rate_quote(&self, request: RateRequest) -> Result<RateQuote>;
}

// ---------------------------------------------------------------------------
// SubmissionClient — reqwest 实现
// ---------------------------------------------------------------------------

/// 基于 reqwest 的服务商客户端
pub struct SubmissionClient {
    http: reqwest::Client,
    create_url: String,
    cost_url: String,
    submit_timeout: Duration,
    rate_timeout: Duration,
}

impl SubmissionClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        Self {
            http: reqwest::Client::new(),
            create_url: format!("{base}/order/create"),
            cost_url: format!("{base}/order/cost"),
            submit_timeout: Duration::from_secs(config.submit_timeout_seconds),
            rate_timeout: Duration::from_secs(config.rate_timeout_seconds),
        }
    }
}

#[async_trait]
impl ProviderApi for SubmissionClient {
    async fn submit(&self, payload_json: &str) -> Result<SubmissionResult> {
        debug!(url = %self.create_url, "提交运单创建请求");

        let response = self
            .http
            .post(&self.create_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload_json.to_string())
            .timeout(self.submit_timeout)
            .send()
            .await
            .map_err(|e| SyncError::transport(e.to_string()))?;

        let http_status = response.status().as_u16();
        let raw_body = response
            .text()
            .await
            .map_err(|e| SyncError::transport(e.to_string()))?;

        // 响应体解析失败不是错误：保留原文，业务状态标记为缺失
        let result = match serde_json::from_str::<CreateResponse>(&raw_body) {
            Ok(parsed) => SubmissionResult {
                http_status,
                provider_status: parsed.status,
                tracking_number: parsed.data.and_then(|d| d.reference),
                message: parsed.message,
                raw_body,
            },
            Err(e) => {
                warn!(http_status, error = %e, "服务商响应体不是合法 JSON");
                SubmissionResult {
                    http_status,
                    provider_status: None,
                    tracking_number: None,
                    message: None,
                    raw_body,
                }
            }
        };

        Ok(result)
    }

    async fn rate_quote(&self, request: RateRequest) -> Result<RateQuote> {
        debug!(url = %self.cost_url, service = %request.service, "运费询价");

        let response = self
            .http
            .post(&self.cost_url)
            .json(&request)
            .timeout(self.rate_timeout)
            .send()
            .await
            .map_err(|e| SyncError::transport(e.to_string()))?;

        let http_status = response.status().as_u16();
        let raw_body = response
            .text()
            .await
            .map_err(|e| SyncError::transport(e.to_string()))?;

        if !(200..300).contains(&http_status) {
            return Err(SyncError::provider(http_status, raw_body));
        }

        let parsed: CostResponse = serde_json::from_str(&raw_body)
            .map_err(|e| SyncError::provider(http_status, format!("询价响应解析失败: {e}")))?;

        let amount = parsed
            .data
            .and_then(|d| d.amount)
            .ok_or_else(|| SyncError::provider(http_status, "询价响应缺少 data.amount"))?;

        Ok(RateQuote {
            amount,
            label: parsed.label,
        })
    }
}
