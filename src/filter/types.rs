use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::FilterError;

/// Value of one logical UI filter. A filter that is not present in
/// [`ListQuery::filters`] is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// Empty strings and empty selections constrain nothing
    pub fn is_unset(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Many(values) => values.iter().all(|v| v.is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            FilterValue::Many(_) => None,
        }
    }

    /// Parse a CLI style `name=value` assignment; `a,b` becomes a multi-value
    pub fn parse_assignment(expr: &str) -> Result<(String, FilterValue), FilterError> {
        let (name, value) = expr
            .split_once('=')
            .ok_or_else(|| FilterError::InvalidFilterExpression(expr.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::InvalidFilterExpression(expr.to_string()));
        }
        let value = if value.contains(',') {
            FilterValue::Many(value.split(',').map(|v| v.trim().to_string()).collect())
        } else {
            FilterValue::Text(value.to_string())
        };
        Ok((name.to_string(), value))
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

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::Many(values)
    }
}

/// Requested table sort, by UI column id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column_id: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self { column_id: column_id.into(), descending: false }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self { column_id: column_id.into(), descending: true }
    }
}

/// Structured list request as the UI holds it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<SortSpec>,
    pub filters: BTreeMap<String, FilterValue>,
    /// Raw backend parameters passed through untouched (e.g. `list=1`)
    pub extra: BTreeMap<String, String>,
}

impl ListQuery {
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

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn filter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn filter_value(&self, name: &str) -> Option<&FilterValue> {
        self.filters.get(name).filter(|v| !v.is_unset())
    }
}

/// Flat backend query parameters.
///
/// Ordered map, so two parameter sets compare (and hash) equal exactly when
/// they would produce the same request. This is the normalized query used as
/// the list cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode as a query string: values percent-encoded (space as `%20`),
    /// filter brackets kept literal.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                let key = urlencoding::encode(k).replace("%5B", "[").replace("%5D", "]");
                format!("{}={}", key, urlencoding::encode(v))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryParams(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Per-resource mapping rules
#[derive(Debug, Clone, Copy)]
pub struct MapperRules {
    /// `None` leaves the page size to the server
    pub default_page_size: Option<u32>,
    /// UI column id -> backend column
    pub sortable: &'static [(&'static str, &'static str)],
    /// Logical filter name -> backend field (dotted for related entities)
    pub filter_fields: &'static [(&'static str, &'static str)],
}

impl MapperRules {
    pub const fn new(
        default_page_size: Option<u32>,
        sortable: &'static [(&'static str, &'static str)],
        filter_fields: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { default_page_size, sortable, filter_fields }
    }

    pub fn sort_column(&self, column_id: &str) -> Option<&'static str> {
        self.sortable
            .iter()
            .find(|(id, _)| *id == column_id)
            .map(|(_, backend)| *backend)
    }

    pub fn filter_field(&self, name: &str) -> Option<&'static str> {
        self.filter_fields
            .iter()
            .find(|(logical, _)| *logical == name)
            .map(|(_, backend)| *backend)
    }
}
