//! 链接分发服务 - 业务能力层
//!
//! 为 flow + role 返回分享链接：已有就复用，没有就创建

use crate::clients::WorkflowApi;
use crate::error::{AppResult, BusinessError};
use std::sync::Arc;
use tracing::info;

/// 链接分发服务
pub struct LinkDistributor {
    api: Arc<dyn WorkflowApi>,
    expire: u32,
}

impl LinkDistributor {
    pub fn new(api: Arc<dyn WorkflowApi>, expire: u32) -> Self {
        Self { api, expire }
    }

    /// 获取或创建分享链接
    pub async fn share_link(
        &self,
        org_id: &str,
        template_id: &str,
        flow_id: &str,
        role_id: &str,
    ) -> AppResult<String> {
        let links = self.api.list_flow_links(org_id, template_id, flow_id).await?;
        if let Some(link) = links
            .into_iter()
            .find(|l| l.role_id.as_deref() == Some(role_id))
        {
            info!("✓ 复用已有分享链接 (flow {})", flow_id);
            return Ok(link.url);
        }

        let created = self
            .api
            .share_flow(org_id, template_id, flow_id, role_id, self.expire)
            .await?;
        let url = created
            .into_iter()
            .next()
            .map(|l| l.url)
            .ok_or_else(|| BusinessError::NoShareLink {
                flow_id: flow_id.to_string(),
            })?;
        info!("✓ 已创建分享链接 (flow {})", flow_id);
        Ok(url)
    }
}
