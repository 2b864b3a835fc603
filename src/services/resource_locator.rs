//! 资源定位服务 - 业务能力层
//!
//! 只负责"按名称查找，找不到就创建"，不关心缓存和流程

use crate::clients::WorkflowApi;
use crate::config::Config;
use crate::error::{AppResult, BusinessError};
use crate::models::resources::{Document, NewDocument, NewTemplate, Organization, Template};
use std::sync::Arc;
use tracing::{debug, info};

const DOCUMENT_TYPE: &str = "DOC_GENERATION";

/// 资源定位服务
///
/// 职责：
/// - organization / template / document 的 get-or-create
/// - 名称是固定配置，按名称精确匹配
/// - 只查第一页（100 条），之后的资源看不到
pub struct ResourceLocator {
    api: Arc<dyn WorkflowApi>,
    organization_name: String,
    organization_subdomain: String,
    new_template: NewTemplate,
    document_name: String,
    document_content_path: String,
}

impl ResourceLocator {
    /// 创建新的资源定位服务
    pub fn new(api: Arc<dyn WorkflowApi>, config: &Config) -> Self {
        Self {
            api,
            organization_name: config.organization_name.clone(),
            organization_subdomain: config.organization_subdomain.clone(),
            new_template: NewTemplate {
                name: config.template_name.clone(),
                description: config.template_description.clone(),
                redirect_url: config.redirect_url.clone(),
            },
            document_name: config.document_name.clone(),
            document_content_path: config.document_content_path.clone(),
        }
    }

    /// 查找或创建组织
    pub async fn organization(&self) -> AppResult<Organization> {
        let existing = self.api.list_organizations().await?;
        if let Some(org) = existing
            .into_iter()
            .find(|o| o.name == self.organization_name)
        {
            info!("✓ 找到组织: {} ({})", org.name, org.id);
            return Ok(org);
        }

        let org = self
            .api
            .create_organization(&self.organization_name, &self.organization_subdomain)
            .await?;
        info!("✓ 已创建组织: {}", org.id);
        Ok(org)
    }

    /// 查找或创建模板
    pub async fn template(&self, org_id: &str) -> AppResult<Template> {
        let existing = self.api.list_templates(org_id).await?;
        if let Some(template) = existing
            .into_iter()
            .find(|t| t.name == self.new_template.name)
        {
            info!("✓ 找到模板: {} ({})", template.name, template.id);
            return Ok(template);
        }

        debug!("Payload: {:?}", self.new_template);
        let template = self.api.create_template(org_id, &self.new_template).await?;
        info!("✓ 已创建模板: {}", template.id);
        Ok(template)
    }

    /// 查找或上传文档，返回带字段列表的完整文档
    pub async fn document(&self, org_id: &str, template_id: &str) -> AppResult<Document> {
        let existing = self.api.list_documents(org_id, template_id).await?;
        let document_id = match existing.into_iter().find(|d| d.name == self.document_name) {
            Some(found) => {
                info!("✓ 找到文档: {} ({})", found.name, found.id);
                found.id
            }
            None => {
                let content = self.read_document_content().await?;
                let uploaded = self
                    .api
                    .upload_document(
                        org_id,
                        template_id,
                        &NewDocument {
                            name: self.document_name.clone(),
                            document_type: DOCUMENT_TYPE.to_string(),
                            content,
                        },
                    )
                    .await?;
                info!("✓ 已上传文档: {}", uploaded.id);
                uploaded.id
            }
        };

        // 列表和上传接口不一定带字段，统一再取一次
        self.fetch_document(org_id, template_id, &document_id).await
    }

    /// 按 ID 获取完整文档
    pub async fn fetch_document(
        &self,
        org_id: &str,
        template_id: &str,
        document_id: &str,
    ) -> AppResult<Document> {
        let document = self
            .api
            .get_document(org_id, template_id, document_id)
            .await?;
        debug!("文档 {} 共有 {} 个字段", document.id, document.fields.len());
        Ok(document)
    }

    async fn read_document_content(&self) -> AppResult<String> {
        let content = tokio::fs::read_to_string(&self.document_content_path)
            .await
            .map_err(|source| BusinessError::DocumentContentUnreadable {
                path: self.document_content_path.clone(),
                source,
            })?;
        Ok(content.trim().to_string())
    }
}
