//! 订单物流同步服务
//!
//! 把宿主电商订单同步到外部物流服务商：构建并提交运单创建请求、
//! 接收并验签服务商的异步状态回调、把回调映射到本地订单状态，
//! 并支持失败后的单笔/批量重新提交。

pub mod client;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payload;
pub mod retry;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;
pub mod webhook;
