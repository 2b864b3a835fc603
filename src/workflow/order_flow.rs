//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一张订单"的完整处理流程
//!
//! 流程顺序：
//! 1. organization → 2. template → 3. document → 4. flow → 5. 分享链接
//!
//! 每一步先查缓存，命中就跳过。任何一步失败都中止本次请求，
//! 失败前已经写入缓存的 ID 保留。

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clients::WorkflowApi;
use crate::config::Config;
use crate::error::{AppResult, BusinessError};
use crate::infrastructure::{clear_all, clear_flow, CacheKey, IdentifierStore};
use crate::models::order::{NormalizedOrder, Order};
use crate::models::resources::{Document, FlowDocument};
use crate::services::{FlowAssembler, LinkDistributor, ResourceLocator};
use crate::workflow::order_stage::OrderStage;

/// 订单处理流程
///
/// - 编排 locator / assembler / distributor
/// - 决定何时查缓存、何时查找、何时创建
/// - 缓存通过参数传入，不持有全局状态
pub struct OrderFlow {
    api: Arc<dyn WorkflowApi>,
    locator: ResourceLocator,
    assembler: FlowAssembler,
    distributor: LinkDistributor,
    // 同一进程内串行执行，避免并发请求重复创建资源
    run_lock: Mutex<()>,
}

impl OrderFlow {
    /// 创建新的订单处理流程
    pub fn new(api: Arc<dyn WorkflowApi>, config: &Config) -> Self {
        Self {
            locator: ResourceLocator::new(api.clone(), config),
            assembler: FlowAssembler::new(api.clone()),
            distributor: LinkDistributor::new(api.clone(), config.share_link_expire),
            api,
            run_lock: Mutex::new(()),
        }
    }

    /// 处理一张订单，返回分享链接
    pub async fn run(&self, store: &dyn IdentifierStore, order: &Order) -> AppResult<String> {
        let order = order.normalize()?;
        let _guard = self.run_lock.lock().await;

        log_stage(OrderStage::NoOrg);
        let org_id = self.organization_id(store).await?;
        log_stage(OrderStage::OrgReady);

        log_stage(OrderStage::NoTemplate);
        let template_id = self.template_id(store, &org_id).await?;
        log_stage(OrderStage::TemplateReady);

        let (flow_id, role_id) = match (
            store.get(CacheKey::FlowId).await,
            store.get(CacheKey::RoleId).await,
        ) {
            (Some(flow_id), Some(role_id)) => {
                info!("♻️ 复用缓存的 Flow: {}", flow_id);
                (flow_id, role_id)
            }
            _ => {
                self.new_flow(store, &org_id, &template_id, &order)
                    .await?
            }
        };
        log_stage(OrderStage::FlowReady);

        let url = self
            .distributor
            .share_link(&org_id, &template_id, &flow_id, &role_id)
            .await?;
        log_stage(OrderStage::LinkReady);
        Ok(url)
    }

    /// 清除 flow ID；等待进行中的订单结束，避免它在清除后又写回
    pub async fn reset_flow(&self, store: &dyn IdentifierStore) {
        let _guard = self.run_lock.lock().await;
        clear_flow(store).await;
    }

    /// 清除全部缓存的 ID
    pub async fn reset_all(&self, store: &dyn IdentifierStore) {
        let _guard = self.run_lock.lock().await;
        clear_all(store).await;
    }

    /// 列出缓存中 Flow 的文档（诊断用）
    pub async fn flow_documents(&self, store: &dyn IdentifierStore) -> AppResult<Vec<FlowDocument>> {
        let (Some(org_id), Some(template_id), Some(flow_id)) = (
            store.get(CacheKey::OrganizationId).await,
            store.get(CacheKey::TemplateId).await,
            store.get(CacheKey::FlowId).await,
        ) else {
            return Err(BusinessError::NoCachedFlow.into());
        };
        self.api
            .list_flow_documents(&org_id, &template_id, &flow_id)
            .await
    }

    async fn organization_id(&self, store: &dyn IdentifierStore) -> AppResult<String> {
        if let Some(id) = store.get(CacheKey::OrganizationId).await {
            debug!("缓存命中 organizationId: {}", id);
            return Ok(id);
        }
        let org = self.locator.organization().await?;
        store.set(CacheKey::OrganizationId, org.id.clone()).await;
        Ok(org.id)
    }

    async fn template_id(&self, store: &dyn IdentifierStore, org_id: &str) -> AppResult<String> {
        if let Some(id) = store.get(CacheKey::TemplateId).await {
            debug!("缓存命中 templateId: {}", id);
            return Ok(id);
        }
        let template = self.locator.template(org_id).await?;
        store.set(CacheKey::TemplateId, template.id.clone()).await;
        Ok(template.id)
    }

    async fn document(
        &self,
        store: &dyn IdentifierStore,
        org_id: &str,
        template_id: &str,
    ) -> AppResult<Document> {
        if let Some(id) = store.get(CacheKey::DocumentId).await {
            debug!("缓存命中 documentId: {}", id);
            return self.locator.fetch_document(org_id, template_id, &id).await;
        }
        let document = self.locator.document(org_id, template_id).await?;
        store.set(CacheKey::DocumentId, document.id.clone()).await;
        Ok(document)
    }

    /// 创建新 Flow，缓存 flow ID 和第一个可用角色
    async fn new_flow(
        &self,
        store: &dyn IdentifierStore,
        org_id: &str,
        template_id: &str,
        order: &NormalizedOrder,
    ) -> AppResult<(String, String)> {
        log_stage(OrderStage::NoDocument);
        let document = self.document(store, org_id, template_id).await?;
        log_stage(OrderStage::DocumentReady);

        log_stage(OrderStage::NoFlow);
        let flow = self
            .assembler
            .create_flow(org_id, template_id, &document, order)
            .await?;
        let role_id = flow
            .available_roles
            .first()
            .map(|r| r.id.clone())
            .ok_or_else(|| BusinessError::NoRoleAvailable {
                flow_id: flow.id.clone(),
            })?;

        store.set(CacheKey::FlowId, flow.id.clone()).await;
        store.set(CacheKey::RoleId, role_id.clone()).await;
        Ok((flow.id, role_id))
    }
}

fn log_stage(stage: OrderStage) {
    debug!("→ {}", stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AppError};
    use crate::infrastructure::MemoryStore;
    use crate::models::resources::{
        DocumentField, Flow, FlowPayload, NewDocument, NewTemplate, Organization, Role, ShareLink,
        Template,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    const FIELD_NAMES: [&str; 12] = [
        "Order_Date",
        "Client_Name",
        "Address",
        "City",
        "State",
        "Zip",
        "Terms",
        "Subtotal",
        "Discount",
        "TaxRate",
        "Tax",
        "Total",
    ];

    /// 记录调用的假平台
    #[derive(Default)]
    struct FakeApi {
        calls: StdMutex<Vec<String>>,
        orgs: StdMutex<Vec<Organization>>,
        links: StdMutex<Vec<ShareLink>>,
        flow_roles: Vec<Role>,
        fail_create_flow: bool,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                flow_roles: vec![Role {
                    id: "role-1".to_string(),
                    name: Some("Role 1".to_string()),
                }],
                ..Default::default()
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn creations(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| c.starts_with("create") || c.starts_with("upload") || c == "share_flow")
                .collect()
        }
    }

    #[async_trait]
    impl WorkflowApi for FakeApi {
        async fn list_organizations(&self) -> AppResult<Vec<Organization>> {
            self.record("list_organizations");
            Ok(self.orgs.lock().unwrap().clone())
        }

        async fn create_organization(&self, name: &str, subdomain: &str) -> AppResult<Organization> {
            self.record("create_organization");
            let org = Organization {
                id: "org-1".to_string(),
                name: name.to_string(),
                subdomain: Some(subdomain.to_string()),
            };
            self.orgs.lock().unwrap().push(org.clone());
            Ok(org)
        }

        async fn list_templates(&self, _org_id: &str) -> AppResult<Vec<Template>> {
            self.record("list_templates");
            Ok(Vec::new())
        }

        async fn create_template(&self, _org_id: &str, template: &NewTemplate) -> AppResult<Template> {
            self.record("create_template");
            Ok(Template {
                id: "tpl-1".to_string(),
                name: template.name.clone(),
            })
        }

        async fn list_documents(&self, _org_id: &str, _template_id: &str) -> AppResult<Vec<Document>> {
            self.record("list_documents");
            Ok(vec![Document {
                id: "doc-1".to_string(),
                name: "IT Purchase Order.docx".to_string(),
                fields: Vec::new(),
            }])
        }

        async fn get_document(
            &self,
            _org_id: &str,
            _template_id: &str,
            document_id: &str,
        ) -> AppResult<Document> {
            self.record("get_document");
            Ok(Document {
                id: document_id.to_string(),
                name: "IT Purchase Order.docx".to_string(),
                fields: FIELD_NAMES
                    .iter()
                    .map(|n| DocumentField {
                        id: format!("id-{}", n),
                        name: n.to_string(),
                        field_type: Some("text".to_string()),
                    })
                    .collect(),
            })
        }

        async fn upload_document(
            &self,
            _org_id: &str,
            _template_id: &str,
            _document: &NewDocument,
        ) -> AppResult<Document> {
            self.record("upload_document");
            unreachable!("document already exists in fake")
        }

        async fn create_flow(
            &self,
            _org_id: &str,
            _template_id: &str,
            _payload: &FlowPayload,
        ) -> AppResult<Flow> {
            self.record("create_flow");
            if self.fail_create_flow {
                return Err(ApiError::BadStatus {
                    endpoint: "/flows".to_string(),
                    status: 422,
                    body: json!({"message": "invalid fields"}),
                }
                .into());
            }
            Ok(Flow {
                id: "flow-1".to_string(),
                available_roles: self.flow_roles.clone(),
            })
        }

        async fn list_flow_documents(
            &self,
            _org_id: &str,
            _template_id: &str,
            flow_id: &str,
        ) -> AppResult<Vec<FlowDocument>> {
            self.record("list_flow_documents");
            Ok(vec![FlowDocument {
                id: format!("{}-doc", flow_id),
                name: None,
                status: Some("NEW".to_string()),
            }])
        }

        async fn list_flow_links(
            &self,
            _org_id: &str,
            _template_id: &str,
            _flow_id: &str,
        ) -> AppResult<Vec<ShareLink>> {
            self.record("list_flow_links");
            Ok(self.links.lock().unwrap().clone())
        }

        async fn share_flow(
            &self,
            _org_id: &str,
            _template_id: &str,
            flow_id: &str,
            role_id: &str,
            expire: u32,
        ) -> AppResult<Vec<ShareLink>> {
            self.record("share_flow");
            assert_eq!(expire, 60);
            let link = ShareLink {
                role_id: Some(role_id.to_string()),
                url: format!("https://share.example/{}/{}", flow_id, role_id),
            };
            self.links.lock().unwrap().push(link.clone());
            Ok(vec![link])
        }
    }

    fn order() -> Order {
        serde_json::from_value(json!({
            "date": "2024-03-07",
            "clientName": "Acme Corp",
            "address": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zip": "62701",
            "orderItems": [{"product": {"itemId": "DVP789"}, "quantity": 2}],
            "subtotal": 399.98
        }))
        .unwrap()
    }

    fn flow_with(api: Arc<FakeApi>) -> OrderFlow {
        OrderFlow::new(api, &Config::default())
    }

    #[tokio::test]
    async fn test_first_run_resolves_everything() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();

        let url = flow.run(&store, &order()).await.unwrap();

        assert_eq!(url, "https://share.example/flow-1/role-1");
        assert_eq!(
            api.calls(),
            vec![
                "list_organizations",
                "create_organization",
                "list_templates",
                "create_template",
                "list_documents",
                "get_document",
                "create_flow",
                "list_flow_links",
                "share_flow",
            ]
        );
        assert_eq!(store.get(CacheKey::OrganizationId).await.as_deref(), Some("org-1"));
        assert_eq!(store.get(CacheKey::TemplateId).await.as_deref(), Some("tpl-1"));
        assert_eq!(store.get(CacheKey::DocumentId).await.as_deref(), Some("doc-1"));
        assert_eq!(store.get(CacheKey::FlowId).await.as_deref(), Some("flow-1"));
        assert_eq!(store.get(CacheKey::RoleId).await.as_deref(), Some("role-1"));
    }

    #[tokio::test]
    async fn test_populated_cache_only_touches_links() {
        let api = Arc::new(FakeApi::new());
        api.links.lock().unwrap().push(ShareLink {
            role_id: Some("role-9".to_string()),
            url: "https://share.example/existing".to_string(),
        });
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();
        store.set(CacheKey::OrganizationId, "org-9".to_string()).await;
        store.set(CacheKey::TemplateId, "tpl-9".to_string()).await;
        store.set(CacheKey::DocumentId, "doc-9".to_string()).await;
        store.set(CacheKey::FlowId, "flow-9".to_string()).await;
        store.set(CacheKey::RoleId, "role-9".to_string()).await;

        let url = flow.run(&store, &order()).await.unwrap();

        assert_eq!(url, "https://share.example/existing");
        assert_eq!(api.calls(), vec!["list_flow_links"]);
        assert!(api.creations().is_empty());
    }

    #[tokio::test]
    async fn test_reset_flow_keeps_upstream_ids() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();
        flow.run(&store, &order()).await.unwrap();
        api.reset_calls();

        flow.reset_flow(&store).await;
        flow.run(&store, &order()).await.unwrap();

        // 组织/模板不再查找，文档从缓存 ID 直接获取
        assert_eq!(
            api.calls(),
            vec!["get_document", "create_flow", "list_flow_links"]
        );
    }

    #[tokio::test]
    async fn test_reset_cache_re_resolves_everything() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();
        flow.run(&store, &order()).await.unwrap();
        api.reset_calls();

        flow.reset_all(&store).await;
        flow.run(&store, &order()).await.unwrap();

        let calls = api.calls();
        assert_eq!(calls[0], "list_organizations");
        // 组织已存在，按名称找到，不再创建
        assert!(!calls.contains(&"create_organization".to_string()));
        assert!(calls.contains(&"list_templates".to_string()));
        assert!(calls.contains(&"list_documents".to_string()));
        assert!(calls.contains(&"create_flow".to_string()));
        assert_eq!(store.get(CacheKey::FlowId).await.as_deref(), Some("flow-1"));
    }

    #[tokio::test]
    async fn test_reset_waits_for_running_order() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api);
        let store = MemoryStore::new();
        store.set(CacheKey::FlowId, "flow-1".to_string()).await;

        // 模拟一张正在处理的订单
        let running = flow.run_lock.lock().await;
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), flow.reset_flow(&store)).await;
        assert!(blocked.is_err());
        assert_eq!(store.get(CacheKey::FlowId).await.as_deref(), Some("flow-1"));

        drop(running);
        flow.reset_flow(&store).await;
        assert_eq!(store.get(CacheKey::FlowId).await, None);
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_ids() {
        let api = Arc::new(FakeApi {
            fail_create_flow: true,
            ..FakeApi::new()
        });
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();

        let err = flow.run(&store, &order()).await.unwrap_err();

        assert_eq!(err.upstream_status(), Some(422));
        assert_eq!(store.get(CacheKey::OrganizationId).await.as_deref(), Some("org-1"));
        assert_eq!(store.get(CacheKey::DocumentId).await.as_deref(), Some("doc-1"));
        assert_eq!(store.get(CacheKey::FlowId).await, None);
    }

    #[tokio::test]
    async fn test_flow_without_roles_is_an_error() {
        let api = Arc::new(FakeApi {
            flow_roles: Vec::new(),
            ..FakeApi::new()
        });
        let flow = flow_with(api);
        let store = MemoryStore::new();

        let err = flow.run(&store, &order()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Business(BusinessError::NoRoleAvailable { .. })
        ));
        assert_eq!(store.get(CacheKey::FlowId).await, None);
    }

    #[tokio::test]
    async fn test_invalid_order_makes_no_calls() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api.clone());
        let mut bad = order();
        bad.date = "not a date".to_string();

        let err = flow.run(&MemoryStore::new(), &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Business(BusinessError::InvalidDate { .. })));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_flow_documents_requires_cached_flow() {
        let api = Arc::new(FakeApi::new());
        let flow = flow_with(api.clone());
        let store = MemoryStore::new();

        let err = flow.flow_documents(&store).await.unwrap_err();
        assert!(matches!(err, AppError::Business(BusinessError::NoCachedFlow)));

        flow.run(&store, &order()).await.unwrap();
        let docs = flow.flow_documents(&store).await.unwrap();
        assert_eq!(docs[0].id, "flow-1-doc");
    }
}
