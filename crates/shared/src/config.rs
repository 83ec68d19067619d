//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。
//! 这里只承载部署期静态配置；宿主侧可变选项（访问令牌、回调密钥等）
//! 走 [`crate::store::ConfigStore`]。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 物流服务商配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// 中间件服务基础地址，订单创建/运费询价端点挂在其下
    pub base_url: String,
    /// 订单提交请求超时（秒）
    pub submit_timeout_seconds: u64,
    /// 运费询价请求超时（秒）
    pub rate_timeout_seconds: u64,
    /// 被服务的目的地国家代码，只有该国家的订单才会被同步
    pub served_country: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3005".to_string(),
            submit_timeout_seconds: 15,
            rate_timeout_seconds: 30,
            served_country: "LY".to_string(),
        }
    }
}

/// 入站回调配置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// 携带签名的请求头名称，按部署环境可变
    pub signature_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signature_header: "X-Payload-Signature".to_string(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub webhook: WebhookConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（SHIPSYNC_ 前缀，如 SHIPSYNC_SERVER_PORT -> server.port）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("SHIPSYNC_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                Environment::with_prefix("SHIPSYNC")
                    .separator("_")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 获取服务监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 订单创建端点完整地址
    pub fn order_create_url(&self) -> String {
        format!("{}/order/create", self.provider.base_url.trim_end_matches('/'))
    }

    /// 运费询价端点完整地址
    pub fn order_cost_url(&self) -> String {
        format!("{}/order/cost", self.provider.base_url.trim_end_matches('/'))
    }
}
