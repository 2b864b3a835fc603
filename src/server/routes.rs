//! HTTP 路由和处理函数

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::error::{ApiError, AppError, BusinessError, ProxyError};
use crate::infrastructure::SessionCache;
use crate::models::catalog;
use crate::models::order::Order;
use crate::server::pages;
use crate::server::AppState;

/// 构建路由
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(order_form))
        .route("/embed", get(embed))
        .route("/health", get(health))
        .route("/api/createPurchaseOrder", post(create_purchase_order))
        .route("/api/resetFlow", post(reset_flow))
        .route("/api/resetCache", post(reset_cache))
        .route("/api/proxy", get(proxy))
        .route("/api/products", get(products))
        .route("/api/flowDocuments", get(flow_documents))
        .layer(cors)
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Api(ApiError::BadStatus { status, body, .. }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "error": body }),
            ),
            AppError::Business(BusinessError::InvalidDate { .. })
            | AppError::Business(BusinessError::UnknownProduct { .. })
            | AppError::Business(BusinessError::QuantityTooLarge { .. })
            | AppError::Proxy(ProxyError::MissingUrl)
            | AppError::Proxy(ProxyError::InvalidUrl { .. }) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            AppError::Business(BusinessError::NoCachedFlow) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            AppError::Proxy(ProxyError::HostNotAllowed { .. }) => {
                (StatusCode::FORBIDDEN, json!({ "error": self.to_string() }))
            }
            AppError::Proxy(ProxyError::FetchFailed { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to fetch data" }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        if status.is_server_error() {
            error!("请求失败 ({}): {}", status.as_u16(), self);
        } else {
            warn!("请求失败 ({}): {}", status.as_u16(), self);
        }
        (status, Json(body)).into_response()
    }
}

/// 把请求级缓存产生的 Set-Cookie 头附加到响应上
async fn with_cookies(session: &SessionCache, mut response: Response) -> Response {
    for cookie in session.set_cookie_headers().await {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("无法写入 Cookie {}: {}", cookie, e),
        }
    }
    response
}

async fn order_form() -> Html<&'static str> {
    Html(pages::ORDER_FORM_HTML)
}

#[derive(Debug, Deserialize)]
struct UrlQuery {
    url: Option<String>,
}

async fn embed(Query(query): Query<UrlQuery>) -> Html<String> {
    Html(pages::embed_page(query.url.as_deref()))
}

async fn health() -> &'static str {
    "ok"
}

async fn create_purchase_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(order): Json<Order>,
) -> Response {
    info!("📋 收到采购订单: {}", order.client_name);
    let session = state.session(&headers);

    let response = match state.flow().run(&session, &order).await {
        Ok(url) => {
            info!("✓ 分享链接: {}", url);
            (StatusCode::OK, Json(url)).into_response()
        }
        Err(e) => e.into_response(),
    };
    with_cookies(&session, response).await
}

async fn reset_flow(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);
    state.flow().reset_flow(&session).await;
    info!("已重置 flowId");
    let response = Json(json!({ "message": "Reset Flow ID Successfully." })).into_response();
    with_cookies(&session, response).await
}

async fn reset_cache(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);
    state.flow().reset_all(&session).await;
    info!("已重置全部缓存");
    let response = Json(json!({ "message": "Cache Reset." })).into_response();
    with_cookies(&session, response).await
}

async fn proxy(State(state): State<AppState>, Query(query): Query<UrlQuery>) -> Response {
    match state.proxy().fetch(query.url.as_deref()).await {
        Ok(data) => Json(data).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ProductQuery {
    #[serde(default)]
    q: String,
}

async fn products(Query(query): Query<ProductQuery>) -> Json<Vec<&'static catalog::Product>> {
    Json(catalog::search(&query.q))
}

async fn flow_documents(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);
    match state.flow().flow_documents(&session).await {
        Ok(documents) => Json(documents).into_response(),
        Err(e) => e.into_response(),
    }
}
