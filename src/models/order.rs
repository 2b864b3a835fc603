//! 采购订单

use crate::error::{AppResult, BusinessError};
use crate::models::catalog::{self, Product};
use crate::models::money::{Money, Totals};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

/// 表单提交的产品引用（只有 itemId 是必需的）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub item_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// 表单提交的订单行
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product: ProductRef,
    pub quantity: u32,
}

/// 表单提交的订单
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub date: String,
    pub client_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub terms: Option<String>,
}

/// 合并后的订单行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product: &'static Product,
    pub quantity: u32,
}

impl LineItem {
    pub fn amount(&self) -> Money {
        self.product.price.times(self.quantity)
    }
}

/// 校验并合并后的订单
#[derive(Debug, Clone)]
pub struct NormalizedOrder {
    /// MM-DD-YYYY
    pub date: String,
    pub client_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub terms: String,
    pub lines: Vec<LineItem>,
    pub totals: Totals,
}

impl Order {
    /// 订单日期，格式 MM-DD-YYYY
    pub fn formatted_date(&self) -> AppResult<String> {
        let raw = self.date.trim();
        let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%m-%d-%Y"))
            .map_err(|_| BusinessError::InvalidDate {
                date: self.date.clone(),
            })?;
        Ok(parsed.format("%m-%d-%Y").to_string())
    }

    /// 按产品合并订单行，数量为 0 的行丢弃
    pub fn merged_lines(&self) -> AppResult<Vec<LineItem>> {
        let mut lines: Vec<LineItem> = Vec::new();
        for item in &self.order_items {
            let product =
                catalog::lookup(&item.product.item_id).ok_or_else(|| BusinessError::UnknownProduct {
                    item_id: item.product.item_id.clone(),
                })?;
            if item.quantity == 0 {
                continue;
            }
            match lines.iter_mut().find(|l| l.product.item_id == product.item_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                        BusinessError::QuantityTooLarge {
                            item_id: product.item_id.to_string(),
                        }
                    })?;
                }
                None => lines.push(LineItem {
                    product,
                    quantity: item.quantity,
                }),
            }
        }
        Ok(lines)
    }

    /// 校验订单并计算合计，小计以订单行重新计算为准
    pub fn normalize(&self) -> AppResult<NormalizedOrder> {
        let date = self.formatted_date()?;
        let lines = self.merged_lines()?;
        let subtotal: Money = lines.iter().map(LineItem::amount).sum();
        if subtotal != self.subtotal {
            warn!(
                "提交的小计 {} 与订单行合计 {} 不一致，使用订单行合计",
                self.subtotal, subtotal
            );
        }

        Ok(NormalizedOrder {
            date,
            client_name: self.client_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            terms: self.terms.clone().unwrap_or_default(),
            lines,
            totals: Totals::from_subtotal(subtotal),
        })
    }
}
