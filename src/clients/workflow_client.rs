/// 工作流平台 API 客户端
///
/// 封装所有与工作流平台 REST API 相关的调用逻辑
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{AuthorizedHttp, TokenProvider};
use crate::models::resources::{
    Document, Flow, FlowDocument, FlowPayload, ListEnvelope, NewDocument, NewTemplate,
    Organization, ShareLink, Template,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// 列表接口单页大小（只取一页）
pub const PAGE_SIZE: u32 = 100;

/// 工作流平台能力
///
/// 服务层只依赖这个接口，测试时可以替换成假实现
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    async fn list_organizations(&self) -> AppResult<Vec<Organization>>;
    async fn create_organization(&self, name: &str, subdomain: &str) -> AppResult<Organization>;

    async fn list_templates(&self, org_id: &str) -> AppResult<Vec<Template>>;
    async fn create_template(&self, org_id: &str, template: &NewTemplate) -> AppResult<Template>;

    async fn list_documents(&self, org_id: &str, template_id: &str) -> AppResult<Vec<Document>>;
    async fn get_document(
        &self,
        org_id: &str,
        template_id: &str,
        document_id: &str,
    ) -> AppResult<Document>;
    async fn upload_document(
        &self,
        org_id: &str,
        template_id: &str,
        document: &NewDocument,
    ) -> AppResult<Document>;

    async fn create_flow(
        &self,
        org_id: &str,
        template_id: &str,
        payload: &FlowPayload,
    ) -> AppResult<Flow>;
    async fn list_flow_documents(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
    ) -> AppResult<Vec<FlowDocument>>;

    async fn list_flow_links(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
    ) -> AppResult<Vec<ShareLink>>;
    async fn share_flow(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
        role_id: &str,
        expire: u32,
    ) -> AppResult<Vec<ShareLink>>;
}

/// 基于 HTTP 的工作流平台客户端
pub struct WorkflowClient {
    http: AuthorizedHttp,
}

impl WorkflowClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(http.clone(), config);
        Self {
            http: AuthorizedHttp::new(http, config.api_base_url.clone(), tokens),
        }
    }

    /// 令牌提供者（命令行工具需要）
    pub fn tokens(&self) -> &TokenProvider {
        self.http.tokens()
    }

    fn template_path(org_id: &str, template_id: &str) -> String {
        format!("/organizations/{}/templates/{}", org_id, template_id)
    }

    fn flow_path(org_id: &str, template_id: &str, flow_id: &str) -> String {
        format!("{}/flows/{}", Self::template_path(org_id, template_id), flow_id)
    }
}

#[async_trait]
impl WorkflowApi for WorkflowClient {
    async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
        let list: ListEnvelope<Organization> = self
            .http
            .get(&format!("/organizations?per_page={}", PAGE_SIZE))
            .await?;
        debug!("获取到 {} 个组织", list.data.len());
        Ok(list.data)
    }

    async fn create_organization(&self, name: &str, subdomain: &str) -> AppResult<Organization> {
        let payload = json!({ "name": name, "subdomain": subdomain });
        self.http.post("/organizations", &payload).await
    }

    async fn list_templates(&self, org_id: &str) -> AppResult<Vec<Template>> {
        let list: ListEnvelope<Template> = self
            .http
            .get(&format!(
                "/organizations/{}/templates?per_page={}",
                org_id, PAGE_SIZE
            ))
            .await?;
        debug!("获取到 {} 个模板", list.data.len());
        Ok(list.data)
    }

    async fn create_template(&self, org_id: &str, template: &NewTemplate) -> AppResult<Template> {
        self.http
            .post(&format!("/organizations/{}/templates", org_id), template)
            .await
    }

    async fn list_documents(&self, org_id: &str, template_id: &str) -> AppResult<Vec<Document>> {
        let list: ListEnvelope<Document> = self
            .http
            .get(&format!(
                "{}/documents",
                Self::template_path(org_id, template_id)
            ))
            .await?;
        debug!("获取到 {} 个文档", list.data.len());
        Ok(list.data)
    }

    async fn get_document(
        &self,
        org_id: &str,
        template_id: &str,
        document_id: &str,
    ) -> AppResult<Document> {
        self.http
            .get(&format!(
                "{}/documents/{}",
                Self::template_path(org_id, template_id),
                document_id
            ))
            .await
    }

    async fn upload_document(
        &self,
        org_id: &str,
        template_id: &str,
        document: &NewDocument,
    ) -> AppResult<Document> {
        self.http
            .post(
                &format!("{}/documents", Self::template_path(org_id, template_id)),
                document,
            )
            .await
    }

    async fn create_flow(
        &self,
        org_id: &str,
        template_id: &str,
        payload: &FlowPayload,
    ) -> AppResult<Flow> {
        self.http
            .post(
                &format!("{}/flows", Self::template_path(org_id, template_id)),
                payload,
            )
            .await
    }

    async fn list_flow_documents(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
    ) -> AppResult<Vec<FlowDocument>> {
        let list: ListEnvelope<FlowDocument> = self
            .http
            .get(&format!(
                "{}/documents",
                Self::flow_path(org_id, template_id, flow_id)
            ))
            .await?;
        Ok(list.data)
    }

    async fn list_flow_links(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
    ) -> AppResult<Vec<ShareLink>> {
        let list: ListEnvelope<ShareLink> = self
            .http
            .get(&format!(
                "{}/links",
                Self::flow_path(org_id, template_id, flow_id)
            ))
            .await?;
        Ok(list.data)
    }

    async fn share_flow(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
        role_id: &str,
        expire: u32,
    ) -> AppResult<Vec<ShareLink>> {
        let payload = json!({
            "data": [
                {
                    "auth_method": "none",
                    "expire": expire,
                    "role_id": role_id
                }
            ]
        });
        let list: ListEnvelope<ShareLink> = self
            .http
            .post(
                &format!("{}/share", Self::flow_path(org_id, template_id, flow_id)),
                &payload,
            )
            .await?;
        Ok(list.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            WorkflowClient::template_path("o1", "t1"),
            "/organizations/o1/templates/t1"
        );
        assert_eq!(
            WorkflowClient::flow_path("o1", "t1", "f1"),
            "/organizations/o1/templates/t1/flows/f1"
        );
    }
}
