//! 运单请求构建
//!
//! 纯转换：本地订单记录 + 选项快照 -> 服务商运单请求 DTO。
//! 无副作用、无 I/O，序列化发生在边界（提交流程序列化一次，
//! 发送与落盘使用同一份字节，保证重试可逐字节重放）。

use serde::{Deserialize, Serialize};
use shipsync_shared::store::SyncOptions;

use crate::models::ShipmentOrder;

// ---------------------------------------------------------------------------
// 城市/区域拆分
// ---------------------------------------------------------------------------

/// 拆分 "<city>::<area>" 形式的城市字段
///
/// 按第一个 "::" 分隔；没有分隔符时 area 为空字符串。
/// `split_city_area("")` 返回 `("", "")`。
pub fn split_city_area(full: &str) -> (String, String) {
    match full.split_once("::") {
        Some((city, area)) => (city.to_string(), area.to_string()),
        None => (full.to_string(), String::new()),
    }
}

// ---------------------------------------------------------------------------
// ShipmentRequest — 运单请求 DTO
// ---------------------------------------------------------------------------

/// 付款责任方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentBy {
    Receiver,
    Sender,
}

/// 收件联系人
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

/// 运单商品行
///
/// 尺寸字段的线上键名是历史约定（widthCM 而非 widthCm），显式重命名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub sku: String,
    pub title: String,
    pub quantity: u32,
    #[serde(rename = "widthCM")]
    pub width_cm: u32,
    #[serde(rename = "heightCM")]
    pub height_cm: u32,
    #[serde(rename = "lengthCM")]
    pub length_cm: u32,
    pub amount: f64,
    pub currency: String,
    pub is_chargeable: bool,
}

/// 目的地
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub country_code: String,
    pub city: String,
    pub area: String,
    pub address: String,
}

/// 关联元数据，回调时由服务商原样带回用于定位本地订单
///
/// 出站键名沿用服务商约定的历史格式（snake_case），与入站回调的
/// 驼峰形态解耦（见 webhook 模块的别名处理）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub order_id: String,
    pub customer_id: String,
}

/// 运单请求主体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentOrderBody {
    pub service: String,
    pub notes: String,
    pub contacts: Vec<Contact>,
    pub products: Vec<Product>,
    pub payment_by: PaymentBy,
    pub to: Destination,
    pub metadata: RequestMetadata,
}

/// 完整运单请求（含访问令牌信封）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub order: ShipmentOrderBody,
    pub token: String,
}

// ---------------------------------------------------------------------------
// PayloadBuilder
// ---------------------------------------------------------------------------

/// 服务商目的地国家代码（固定值，与宿主订单国家字段无关）
const DESTINATION_COUNTRY_CODE: &str = "lby";

/// 订单是否符合同步条件：收货国家等于被服务地区
///
/// 调用方必须在触发提交前检查；提交流程本身也会复核。
pub fn is_eligible(order: &ShipmentOrder, served_country: &str) -> bool {
    order
        .destination_country
        .eq_ignore_ascii_case(served_country)
}

/// 从订单与选项快照构建运单请求
///
/// 金额策略：include_product_payment 开启时商品行金额为该行合计
/// （代收货款），否则为 0 且不可计费。
pub fn build(order: &ShipmentOrder, options: &SyncOptions) -> ShipmentRequest {
    let (city, mut area) = split_city_area(&order.destination_city);
    if area.is_empty() {
        area = order.destination_area.clone();
    }

    let products = order
        .line_items
        .iter()
        .map(|item| Product {
            sku: item.sku.clone(),
            title: item.title.clone(),
            quantity: item.quantity,
            width_cm: item.width_cm,
            height_cm: item.height_cm,
            length_cm: item.length_cm,
            amount: if options.include_product_payment {
                item.line_total
            } else {
                0.0
            },
            currency: item.currency.to_lowercase(),
            is_chargeable: options.include_product_payment,
        })
        .collect();

    let payment_by = if options.payment_done_by_receiver {
        PaymentBy::Receiver
    } else {
        PaymentBy::Sender
    };

    ShipmentRequest {
        order: ShipmentOrderBody {
            service: options.service.clone(),
            notes: order.notes.clone(),
            contacts: vec![Contact {
                name: order.contact_name.clone(),
                phone: order.contact_phone.clone(),
            }],
            products,
            payment_by,
            to: Destination {
                country_code: DESTINATION_COUNTRY_CODE.to_string(),
                city,
                area,
                address: order.destination_address.clone(),
            },
            metadata: RequestMetadata {
                order_id: order.order_id.clone(),
                customer_id: order.customer_id.clone(),
            },
        },
        token: options.access_token.clone(),
    }
}
