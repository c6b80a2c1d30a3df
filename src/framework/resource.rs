//! # Resources, list parameters and pages
//!
//! [`Resource`] is the contract every backend entity (Obra, Proveedor, ...) satisfies so that
//! providers, queries and mutations can be written once and reused for all of them.
//!
//! [`ListParams`] carries pagination, sorting and filtering for `list` calls, and [`Page`] is the
//! paginated envelope every `list` returns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::warn;

/// Trait that any backend entity must implement to be served by a
/// [`ResourceProvider`](crate::framework::ResourceProvider).
///
/// The associated DTO types make it impossible to send an `ObraCreate` payload to the
/// `proveedores` endpoint: the compiler ties every payload to its resource.
pub trait Resource: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Path segment of the REST collection (e.g. `"obras"`, `"ordenes-compra"`).
    const PATH: &'static str;

    /// Payload accepted by `create`.
    type Create: Clone + Debug + Serialize + Send + Sync + 'static;

    /// Payload accepted by `update`. Fields left as `None` are not sent.
    type Update: Clone + Debug + Serialize + Send + Sync + 'static;

    /// The server-assigned identifier.
    fn id(&self) -> &str;
}

/// Sort direction, serialized as `asc` / `desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A single filter value. `Null` filters are ignored by every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl FilterValue {
    /// Query-string rendering, or `None` for `Null`.
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            FilterValue::Bool(b) => Some(b.to_string()),
            FilterValue::Number(n) => Some(n.to_string()),
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Null => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FilterValue::Bool(b) => serde_json::Value::Bool(*b),
            FilterValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FilterValue::Text(s) => serde_json::Value::String(s.clone()),
            FilterValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

/// Pagination, sort and filter parameters for a `list` call.
///
/// Two `ListParams` are equal when their values are equal; list queries use this to decide
/// whether a parameter change needs a new fetch. Filters are kept in a `BTreeMap` so that the
/// rendered query string is stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: BTreeMap<String, FilterValue>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Query-string pairs in wire order: `page`, `page_size`, `sort_by`, `sort_order`, then
    /// filters. Sort and filter keys are converted to snake_case, null filters are skipped.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_string(), to_snake_case(sort_by)));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sort_order".to_string(), order.as_str().to_string()));
        }
        for (key, value) in &self.filters {
            if let Some(value) = value.to_query_value() {
                pairs.push((to_snake_case(key), value));
            }
        }
        pairs
    }

    /// `key=value&...` rendering of [`to_query_pairs`](Self::to_query_pairs). Values are not
    /// escaped, so this is for logs only.
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Key under which list results for these params are cached.
    ///
    /// Distinct params give distinct keys: the JSON form keeps filter values typed and escaped,
    /// so `a="1&b=2"` and `{a="1", b="2"}` differ, as do `1` and `"1"`.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!(error = %e, "ListParams not serializable, falling back to query string");
            self.to_query_string()
        })
    }
}

/// Converts `numeroContrato` to `numero_contrato`. Already snake_case keys pass through.
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Paginated envelope returned by every `list` operation.
///
/// Accepts both the backend's snake_case keys and camelCase ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default, alias = "pageSize")]
    pub page_size: u32,
    #[serde(default, alias = "totalPages")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            data,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }

    /// Fills in `total`, `page_size` and `total_pages` when the server omitted them.
    pub fn normalized(mut self) -> Self {
        if self.total == 0 && !self.data.is_empty() {
            self.total = self.data.len() as u64;
        }
        if self.page_size == 0 {
            self.page_size = self.data.len() as u32;
        }
        if self.total_pages == 0 {
            self.total_pages = total_pages(self.total, self.page_size);
        }
        self
    }
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_order_and_snake_case() {
        let params = ListParams::new()
            .page(2)
            .page_size(25)
            .sort_by("fechaInicio", SortOrder::Desc)
            .filter("obraId", "obra-227")
            .filter("activo", true)
            .filter("residente", FilterValue::Null);

        let pairs = params.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("page_size".to_string(), "25".to_string()),
                ("sort_by".to_string(), "fecha_inicio".to_string()),
                ("sort_order".to_string(), "desc".to_string()),
                ("activo".to_string(), "true".to_string()),
                ("obra_id".to_string(), "obra-227".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_params_render_nothing() {
        assert!(ListParams::new().to_query_pairs().is_empty());
        assert_eq!(ListParams::new().to_query_string(), "");
    }

    #[test]
    fn test_params_compare_by_value() {
        let a = ListParams::new().page(1).filter("estado", "activa");
        let b = ListParams::new().page(1).filter("estado", "activa");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().page(2));
    }

    #[test]
    fn test_cache_key_separates_values_the_query_string_conflates() {
        let embedded = ListParams::new().filter("a", "1&b=2");
        let split = ListParams::new().filter("a", "1").filter("b", "2");
        assert_eq!(embedded.to_query_string(), split.to_query_string());
        assert_ne!(embedded.cache_key(), split.cache_key());

        let number = ListParams::new().filter("folio", 1_i64);
        let text = ListParams::new().filter("folio", "1");
        assert_eq!(number.to_query_string(), text.to_query_string());
        assert_ne!(number.cache_key(), text.cache_key());

        assert_eq!(
            ListParams::new().page(1).filter("estado", "activa").cache_key(),
            ListParams::new().page(1).filter("estado", "activa").cache_key()
        );
    }

    #[test]
    fn test_page_accepts_camel_case_and_derives_total_pages() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"data":[1,2,3],"total":7,"page":1,"pageSize":3}"#).unwrap();
        let page = page.normalized();
        assert_eq!(page.page_size, 3);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_page_new_rounds_up() {
        let page = Page::new(vec!['a'], 11, 3, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Page::<u8>::new(vec![], 0, 1, 10).total_pages, 0);
    }
}
