//! 产品目录（固定数据）

use crate::models::money::Money;
use phf::phf_map;
use serde::Serialize;

/// 产品
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: &'static str,
    pub item_id: &'static str,
    pub price: Money,
}

static PRODUCTS: phf::Map<&'static str, Product> = phf_map! {
    "CCP123" => Product {
        name: "CloudConnect Pro Software",
        item_id: "CCP123",
        price: Money::from_cents(9_999),
    },
    "NDF456" => Product {
        name: "NetDefender Firewall",
        item_id: "NDF456",
        price: Money::from_cents(14_999),
    },
    "DVP789" => Product {
        name: "DataVault Pro Backup Solutions",
        item_id: "DVP789",
        price: Money::from_cents(19_999),
    },
};

/// 表单中的展示顺序
const DISPLAY_ORDER: [&str; 3] = ["CCP123", "NDF456", "DVP789"];

/// 按编号查找产品
pub fn lookup(item_id: &str) -> Option<&'static Product> {
    PRODUCTS.get(item_id)
}

/// 全部产品
pub fn all() -> Vec<&'static Product> {
    DISPLAY_ORDER.iter().filter_map(|id| PRODUCTS.get(id)).collect()
}

/// 按名称搜索（不区分大小写的子串匹配），空查询返回全部
pub fn search(query: &str) -> Vec<&'static Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return all();
    }
    all()
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}
