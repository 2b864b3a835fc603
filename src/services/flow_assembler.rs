//! Flow 组装服务 - 业务能力层
//!
//! 把订单映射成平台的字段值列表，并创建 Flow

use crate::clients::WorkflowApi;
use crate::error::AppResult;
use crate::models::money::TAX_RATE_PERCENT;
use crate::models::order::NormalizedOrder;
use crate::models::resources::{Document, FieldValue, Flow, FlowDocumentPayload, FlowPayload};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{debug, info};

/// 产品明细字段名
pub const PRODUCTS_FIELD: &str = "Products";

/// Flow 组装服务
pub struct FlowAssembler {
    api: Arc<dyn WorkflowApi>,
}

impl FlowAssembler {
    pub fn new(api: Arc<dyn WorkflowApi>) -> Self {
        Self { api }
    }

    /// 用订单数据创建 Flow
    pub async fn create_flow(
        &self,
        org_id: &str,
        template_id: &str,
        document: &Document,
        order: &NormalizedOrder,
    ) -> AppResult<Flow> {
        let payload = build_payload(document, order)?;
        debug!(
            "Payload: {}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );

        let flow = self.api.create_flow(org_id, template_id, &payload).await?;
        info!(
            "✓ 已创建 Flow: {} (可用角色 {} 个)",
            flow.id,
            flow.available_roles.len()
        );
        Ok(flow)
    }
}

/// 构建创建 Flow 的请求体
///
/// 字段 ID 按名称从文档字段列表中查找，任一字段缺失即返回 `FieldNotFound`
pub fn build_payload(document: &Document, order: &NormalizedOrder) -> AppResult<FlowPayload> {
    let totals = &order.totals;
    let scalar = |name: &str, field_type: &str, value: String| -> AppResult<FieldValue> {
        Ok(FieldValue {
            id: Some(document.field_id(name)?.to_string()),
            field_type: Some(field_type.to_string()),
            name: name.to_string(),
            value: JsonValue::String(value),
            placeholder: Some(String::new()),
        })
    };

    let fields = vec![
        scalar("Order_Date", "date", order.date.clone())?,
        scalar("Client_Name", "text", order.client_name.clone())?,
        scalar("Address", "text", order.address.clone())?,
        scalar("City", "text", order.city.clone())?,
        scalar("State", "text", order.state.clone())?,
        scalar("Zip", "text", order.zip.clone())?,
        products_field(document, order),
        scalar("Terms", "text", order.terms.clone())?,
        scalar("Subtotal", "text", totals.subtotal.to_string())?,
        scalar("Discount", "text", totals.discount.to_string())?,
        scalar("TaxRate", "text", TAX_RATE_PERCENT.to_string())?,
        scalar("Tax", "text", totals.tax.to_string())?,
        scalar("Total", "text", totals.total.to_string())?,
    ];

    Ok(FlowPayload {
        documents: vec![FlowDocumentPayload {
            id: document.id.clone(),
            fields,
        }],
    })
}

/// 产品明细：每个订单行一个对象
fn products_field(document: &Document, order: &NormalizedOrder) -> FieldValue {
    let rows: Vec<JsonValue> = order
        .lines
        .iter()
        .map(|line| {
            json!({
                "ItemId": line.product.item_id,
                "Name": line.product.name,
                "Price": line.product.price.to_string(),
                "Qty": line.quantity.to_string(),
                "Amount": line.amount().to_string(),
            })
        })
        .collect();

    FieldValue {
        id: document.field(PRODUCTS_FIELD).map(|f| f.id.clone()),
        field_type: None,
        name: PRODUCTS_FIELD.to_string(),
        value: JsonValue::Array(rows),
        placeholder: None,
    }
}
