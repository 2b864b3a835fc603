//! 工作流平台的资源类型
//!
//! 只声明用到的字段，其余字段忽略

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 列表接口的外层结构 `{ "data": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// 组织
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subdomain: Option<String>,
}

/// 模板
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// 文档字段
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
}

/// 文档
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DocumentField>,
}

impl Document {
    /// 按名称查找字段
    pub fn field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 按名称查找字段 ID，找不到时返回 `FieldNotFound`
    pub fn field_id(&self, name: &str) -> AppResult<&str> {
        self.field(name)
            .map(|f| f.id.as_str())
            .ok_or_else(|| AppError::field_not_found(name))
    }
}

/// Flow 上的角色
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Flow（填好字段的文档实例）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Flow {
    pub id: String,
    #[serde(default)]
    pub available_roles: Vec<Role>,
}

/// 分享链接
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShareLink {
    #[serde(default)]
    pub role_id: Option<String>,
    pub url: String,
}

/// Flow 中的文档（诊断用）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// 创建模板的请求体
#[derive(Debug, Clone, Serialize)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub redirect_url: String,
}

/// 上传文档的请求体
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub content: String,
}

/// 创建 Flow 时的字段值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    pub name: String,
    pub value: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// 创建 Flow 时单个文档的字段集合
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDocumentPayload {
    pub id: String,
    pub fields: Vec<FieldValue>,
}

/// 创建 Flow 的请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPayload {
    pub documents: Vec<FlowDocumentPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_field_lookup() {
        let document: Document = serde_json::from_value(json!({
            "id": "doc-1",
            "name": "IT Purchase Order.docx",
            "fields": [
                {"id": "f-1", "name": "Client_Name", "type": "text"},
                {"id": "f-2", "name": "Total", "type": "text"}
            ],
            "extra": true
        }))
        .unwrap();

        assert_eq!(document.field_id("Total").unwrap(), "f-2");
        let err = document.field_id("Order_Date").unwrap_err();
        assert!(err.to_string().contains("Order_Date"));
    }

    #[test]
    fn test_list_envelope_defaults_to_empty() {
        let list: ListEnvelope<Organization> = serde_json::from_value(json!({})).unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn test_field_value_skips_absent_id() {
        let value = FieldValue {
            id: None,
            field_type: None,
            name: "Products".to_string(),
            value: json!([]),
            placeholder: None,
        };
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"name": "Products", "value": []})
        );
    }
}
