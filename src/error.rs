use serde_json::Value as JsonValue;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 外部 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 令牌获取错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 代理请求错误
    #[error("代理错误: {0}")]
    Proxy(#[from] ProxyError),
}

/// 外部 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回非 2xx 状态
    #[error("API返回错误状态 ({endpoint}): {status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: JsonValue,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 令牌获取错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 没有配置 JWT 断言
    #[error("未配置 JWT 断言 (JWT_TOKEN)")]
    MissingAssertion,
    /// 令牌交换失败
    #[error("获取访问令牌失败: {message}")]
    TokenExchangeFailed { message: String },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 文档中不存在该字段
    #[error("文档中找不到字段: {name}")]
    FieldNotFound { name: String },
    /// 文档内容文件无法读取
    #[error("无法读取文档内容 ({path}): {source}")]
    DocumentContentUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Flow 没有可用角色
    #[error("Flow {flow_id} 没有可用角色")]
    NoRoleAvailable { flow_id: String },
    /// 分享接口没有返回链接
    #[error("Flow {flow_id} 没有返回分享链接")]
    NoShareLink { flow_id: String },
    /// 产品不在目录中
    #[error("未知产品: {item_id}")]
    UnknownProduct { item_id: String },
    /// 合并后的数量超出范围
    #[error("产品 {item_id} 的数量过大")]
    QuantityTooLarge { item_id: String },
    /// 日期格式无效
    #[error("无效的订单日期: {date}")]
    InvalidDate { date: String },
    /// 缓存中没有 Flow
    #[error("缓存中没有 Flow")]
    NoCachedFlow,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("解析配置文件失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 代理请求错误
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 缺少 url 参数
    #[error("缺少 url 参数")]
    MissingUrl,
    /// url 无法解析
    #[error("无效的 url: {url}")]
    InvalidUrl { url: String },
    /// 目标主机不在白名单内
    #[error("目标主机不在白名单内: {host}")]
    HostNotAllowed { host: String },
    /// 代理 HTTP 客户端创建失败
    #[error("代理客户端初始化失败: {source}")]
    ClientBuildFailed {
        #[source]
        source: reqwest::Error,
    },
    /// 上游请求失败
    #[error("Failed to fetch data")]
    FetchFailed { message: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建字段缺失错误
    pub fn field_not_found(name: impl Into<String>) -> Self {
        AppError::Business(BusinessError::FieldNotFound { name: name.into() })
    }

    /// 上游返回的 HTTP 状态（如果有）
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::Api(ApiError::BadStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
