//! 运费询价处理器
//!
//! 宿主结账页面通过此端点取得实时运费；服务标识、付款方式与
//! 访问令牌从选项快照补全，调用方只提供商品与目的地。

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use shipsync_shared::store::SyncOptions;
use tracing::instrument;

use crate::client::{RateQuote, RateRequest};
use crate::error::Result;
use crate::payload::{Destination, PaymentBy, Product};
use crate::state::AppState;

/// 询价请求体（对宿主的外观，令牌等由服务端补全）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub products: Vec<Product>,
    pub to: Destination,
}

/// POST /rates/quote
#[instrument(skip(state, request))]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<RateQuote>> {
    let options = SyncOptions::load(state.config_store.as_ref()).await;

    let rate_request = RateRequest {
        service: options.service.clone(),
        products: request.products,
        payment_by: if options.payment_done_by_receiver {
            PaymentBy::Receiver
        } else {
            PaymentBy::Sender
        },
        to: request.to,
        is_pickup: true,
        token: options.access_token,
    };

    let quote = state.provider.rate_quote(rate_request).await?;
    Ok(Json(quote))
}
