//! 单次订单处理的阶段

use std::fmt::Display;

/// 订单处理阶段
///
/// 按顺序推进，缓存命中时跳过对应的查找/创建
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderStage {
    NoOrg,
    OrgReady,
    NoTemplate,
    TemplateReady,
    NoDocument,
    DocumentReady,
    NoFlow,
    FlowReady,
    LinkReady,
}

impl Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStage::NoOrg => "NoOrg",
            OrderStage::OrgReady => "OrgReady",
            OrderStage::NoTemplate => "NoTemplate",
            OrderStage::TemplateReady => "TemplateReady",
            OrderStage::NoDocument => "NoDocument",
            OrderStage::DocumentReady => "DocumentReady",
            OrderStage::NoFlow => "NoFlow",
            OrderStage::FlowReady => "FlowReady",
            OrderStage::LinkReady => "LinkReady",
        };
        f.write_str(name)
    }
}
