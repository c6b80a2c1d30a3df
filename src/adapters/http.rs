//! # HTTP adapter
//!
//! [`HttpProvider`] implements [`ResourceProvider`] against the FastAPI backend:
//!
//! | Operation | Request |
//! |---|---|
//! | `list`   | `GET {base}/{path}?page=..&page_size=..&sort_by=..&sort_order=..&{filters}` |
//! | `get`    | `GET {base}/{path}/{id}` |
//! | `create` | `POST {base}/{path}` |
//! | `update` | `PUT {base}/{path}/{id}` |
//! | `delete` | `DELETE {base}/{path}/{id}` (`204 No Content` accepted) |
//!
//! `page_size` falls back to the provider's default (`ui.default_page_size` when built by
//! [`ErpSystem`](crate::lifecycle::ErpSystem)) when the caller leaves it unset.
//!
//! [`HttpMetrics`] reads the `dashboard/...` endpoints and [`HttpBankTransactions`] the
//! `bank-transactions` ones (`GET ?matched=`, `POST import`, `PUT {id}/match`).
//!
//! All providers share one [`ApiClient`], which owns the `reqwest::Client` (connection pool,
//! timeout) and turns non-2xx responses into [`ProviderError::Http`] with the most specific
//! message the server gave.

use crate::framework::{
    BankTransactionProvider, ListParams, MetricsProvider, Page, ProviderError, Resource, ResourceProvider,
};
use crate::model::{
    BankTransaction, BankTransactionCreate, BankTransactionMatch, DashboardGlobal, EstadoRequisiciones, MetricasObra,
    ResumenProveedor,
};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Errors building an [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Shared HTTP client bound to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiClientError> {
        let invalid = |reason: String| ApiClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.url(segments);
        debug!(%method, %url, "Request");

        let mut request = self.client.request(method.clone(), url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let error = http_error(status, &text);
        warn!(%method, %url, status = status.as_u16(), error = %error, "Request failed");
        Err(error)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(String, String)],
    ) -> Result<T, ProviderError> {
        let response = self.execute(Method::GET, segments, query, None).await?;
        decode(response).await
    }

    pub async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let response = self.execute(method, segments, &[], Some(body)).await?;
        decode(response).await
    }

    /// Issues a DELETE; any 2xx (including `204 No Content`) is success and the body is ignored.
    pub async fn delete(&self, segments: &[&str]) -> Result<(), ProviderError> {
        self.execute(Method::DELETE, segments, &[], None).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Builds the error for a non-2xx response from its status and raw body.
///
/// Message preference: a string `detail` (FastAPI), then `message`, then `error`, then the raw
/// text body, then `HTTP {status}: {reason}`. A 422 whose `detail` is a list of validation
/// items renders as `field: msg; field2: msg2` and also fills `field_errors`.
pub fn http_error(status: StatusCode, body: &str) -> ProviderError {
    let fallback = || {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    };
    let json: Option<Value> = serde_json::from_str(body).ok();
    let mut field_errors = BTreeMap::new();

    let message = match json.as_ref() {
        Some(json) => match json.get("detail") {
            Some(Value::Array(items)) if status == StatusCode::UNPROCESSABLE_ENTITY => {
                field_errors = validation_field_errors(items);
                format_validation_errors(items)
            }
            Some(Value::String(detail)) => detail.clone(),
            _ => string_field(json, "message")
                .or_else(|| string_field(json, "error"))
                .unwrap_or_else(fallback),
        },
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => fallback(),
    };

    ProviderError::Http {
        status: status.as_u16(),
        message,
        field_errors,
    }
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Field path of a FastAPI validation item, without the leading `body` segment.
fn field_path(item: &Value) -> String {
    item.get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .filter(|segment| segment.as_str() != Some("body"))
                .map(|segment| match segment {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default()
}

fn item_message(item: &Value) -> String {
    item.get("msg")
        .and_then(Value::as_str)
        .unwrap_or("Error de validación")
        .to_string()
}

fn format_validation_errors(items: &[Value]) -> String {
    if items.is_empty() {
        return "Validation error".to_string();
    }
    items
        .iter()
        .map(|item| {
            let field = field_path(item);
            let msg = item_message(item);
            if field.is_empty() {
                msg
            } else {
                format!("{field}: {msg}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn validation_field_errors(items: &[Value]) -> BTreeMap<String, Vec<String>> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        let field = field_path(item);
        let field = if field.is_empty() { "general".to_string() } else { field };
        errors.entry(field).or_default().push(item_message(item));
    }
    errors
}

/// [`ResourceProvider`] over the REST API.
pub struct HttpProvider<R> {
    api: ApiClient,
    /// Sent as `page_size` when a list call leaves it unset.
    default_page_size: Option<u32>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpProvider<R> {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            default_page_size: None,
            _resource: PhantomData,
        }
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = Some(page_size);
        self
    }
}

#[async_trait]
impl<R: Resource> ResourceProvider<R> for HttpProvider<R> {
    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn list(&self, params: &ListParams) -> Result<Page<R>, ProviderError> {
        let query = match (params.page_size, self.default_page_size) {
            (None, Some(page_size)) => params.clone().page_size(page_size).to_query_pairs(),
            _ => params.to_query_pairs(),
        };
        let page: Page<R> = self.api.get_json(&[R::PATH], &query).await?;
        Ok(page.normalized())
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn get(&self, id: &str) -> Result<R, ProviderError> {
        self.api.get_json(&[R::PATH, id], &[]).await
    }

    #[instrument(skip(self, input), fields(resource = R::PATH))]
    async fn create(&self, input: R::Create) -> Result<R, ProviderError> {
        debug!(?input, "create called");
        self.api.send_json(Method::POST, &[R::PATH], &input).await
    }

    #[instrument(skip(self, input), fields(resource = R::PATH))]
    async fn update(&self, id: &str, input: R::Update) -> Result<R, ProviderError> {
        debug!(?input, "update called");
        self.api.send_json(Method::PUT, &[R::PATH, id], &input).await
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.api.delete(&[R::PATH, id]).await
    }
}

/// [`MetricsProvider`] over the dashboard endpoints.
pub struct HttpMetrics {
    api: ApiClient,
}

impl HttpMetrics {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MetricsProvider for HttpMetrics {
    #[instrument(skip(self))]
    async fn obra_metrics(&self, obra_id: &str) -> Result<MetricasObra, ProviderError> {
        self.api
            .get_json(&["dashboard", "obras", obra_id, "metricas"], &[])
            .await
    }

    #[instrument(skip(self))]
    async fn all_obra_metrics(&self) -> Result<Vec<MetricasObra>, ProviderError> {
        self.api.get_json(&["dashboard", "obras", "metricas"], &[]).await
    }

    #[instrument(skip(self))]
    async fn proveedor_summary(&self, proveedor_id: &str) -> Result<ResumenProveedor, ProviderError> {
        self.api
            .get_json(&["dashboard", "proveedores", proveedor_id, "resumen"], &[])
            .await
    }

    #[instrument(skip(self))]
    async fn requisiciones_status(&self, obra_id: Option<&str>) -> Result<Vec<EstadoRequisiciones>, ProviderError> {
        let query: Vec<(String, String)> = obra_id
            .map(|id| ("obra_id".to_string(), id.to_string()))
            .into_iter()
            .collect();
        self.api.get_json(&["dashboard", "requisiciones"], &query).await
    }

    #[instrument(skip(self))]
    async fn global_dashboard(&self) -> Result<DashboardGlobal, ProviderError> {
        self.api.get_json(&["dashboard", "resumen"], &[]).await
    }
}

/// [`BankTransactionProvider`] over the reconciliation endpoints.
pub struct HttpBankTransactions {
    api: ApiClient,
}

impl HttpBankTransactions {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BankTransactionProvider for HttpBankTransactions {
    #[instrument(skip(self))]
    async fn list(&self, matched: Option<bool>) -> Result<Vec<BankTransaction>, ProviderError> {
        let query: Vec<(String, String)> = matched
            .map(|matched| ("matched".to_string(), matched.to_string()))
            .into_iter()
            .collect();
        self.api.get_json(&[BankTransaction::PATH], &query).await
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn import(&self, items: Vec<BankTransactionCreate>) -> Result<Vec<BankTransaction>, ProviderError> {
        self.api
            .send_json(Method::POST, &[BankTransaction::PATH, "import"], &items)
            .await
    }

    #[instrument(skip(self))]
    async fn match_transaction(&self, id: &str, data: BankTransactionMatch) -> Result<BankTransaction, ProviderError> {
        self.api
            .send_json(Method::PUT, &[BankTransaction::PATH, id, "match"], &data)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail_is_preferred() {
        let err = http_error(
            StatusCode::CONFLICT,
            r#"{"detail":"El RFC ya está registrado","message":"ignored"}"#,
        );
        assert_eq!(err.to_string(), "El RFC ya está registrado");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_message_then_error_fields() {
        let err = http_error(StatusCode::BAD_REQUEST, r#"{"message":"bad filter"}"#);
        assert_eq!(err.to_string(), "bad filter");
        let err = http_error(StatusCode::BAD_GATEWAY, r#"{"error":"upstream down"}"#);
        assert_eq!(err.to_string(), "upstream down");
    }

    #[test]
    fn test_validation_list_is_flattened() {
        let body = r#"{"detail":[
            {"loc":["body","monto"],"msg":"must be greater than 0","type":"value_error"},
            {"loc":["body","items",0,"cantidad"],"msg":"field required","type":"missing"},
            {"loc":["body","monto"],"msg":"not a number","type":"type_error"},
            {"loc":[],"msg":"bad request","type":"value_error"}
        ]}"#;
        let err = http_error(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(
            err.to_string(),
            "monto: must be greater than 0; items.0.cantidad: field required; monto: not a number; bad request"
        );
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["monto"], vec!["must be greater than 0", "not a number"]);
        assert_eq!(fields["items.0.cantidad"], vec!["field required"]);
        assert_eq!(fields["general"], vec!["bad request"]);
    }

    #[test]
    fn test_fallbacks_for_unhelpful_bodies() {
        let err = http_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");

        let err = http_error(StatusCode::NOT_FOUND, "{}");
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
        assert!(err.is_not_found());

        let err = http_error(StatusCode::SERVICE_UNAVAILABLE, "maintenance window\n");
        assert_eq!(err.to_string(), "maintenance window");
    }

    #[test]
    fn test_url_segments_are_joined_and_encoded() {
        let api = ApiClient::new("http://localhost:8000/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.url(&["ordenes-compra", "oc 1"]).as_str(),
            "http://localhost:8000/api/v1/ordenes-compra/oc%201"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = ApiClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ApiClientError::InvalidBaseUrl { .. }));
    }
}
