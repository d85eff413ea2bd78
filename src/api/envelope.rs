use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::filter::QueryParams;

/// Pagination block of a list envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: Option<u64>,
    pub current_page: Option<u64>,
    pub per_page: Option<u64>,
    pub last_page: Option<u64>,
}

/// `{success, data: [...], meta?, links?}`
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub links: Option<Value>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: Option<u64>,
    pub last_page: Option<u64>,
}

/// One page of a resource list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page_info: PageInfo,
}

impl<T> ListResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ListResult<Value> {
    /// Build from a raw list body fetched with `params`.
    ///
    /// `total` falls back to the number of rows when the backend sends no meta.
    pub fn from_body(body: &Value, params: &QueryParams) -> Result<Self, ClientError> {
        ensure_success(body)?;
        let envelope: ListEnvelope<Value> = serde_json::from_value(body.clone())?;
        let meta = envelope.meta.unwrap_or_default();
        let items = envelope.data;

        let requested_page = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let page_size = meta
            .per_page
            .or_else(|| params.get("pageSize").and_then(|p| p.parse().ok()));

        if let Some(size) = page_size {
            if items.len() as u64 > size {
                tracing::warn!("Backend returned {} rows for a page of {}", items.len(), size);
            }
        }

        let total = meta.total.unwrap_or(items.len() as u64).max(items.len() as u64);

        Ok(ListResult {
            total,
            page_info: PageInfo {
                page: meta.current_page.unwrap_or(requested_page),
                page_size,
                last_page: meta.last_page,
            },
            items,
        })
    }

    /// Decode the opaque rows into typed entities
    pub fn decode<T: DeserializeOwned>(&self) -> Result<ListResult<T>, ClientError> {
        let items = self
            .items
            .iter()
            .map(|row| serde_json::from_value(row.clone()))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(ListResult {
            items,
            total: self.total,
            page_info: self.page_info.clone(),
        })
    }
}

/// A 2xx body carrying `success: false` is still a rejection
pub fn ensure_success(body: &Value) -> Result<(), ClientError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ClientError::from_response(200, body));
    }
    Ok(())
}

/// Unwrap `{success, data}` from a detail, mutation or enumeration endpoint
pub fn item_data(body: &Value) -> Result<Value, ClientError> {
    ensure_success(body)?;
    match body.get("data") {
        Some(data) => Ok(data.clone()),
        None => Err(ClientError::decode("response envelope has no data field")),
    }
}
