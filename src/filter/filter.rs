use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{ListQuery, MapperRules, QueryParams};

/// Maps a structured [`ListQuery`] into the backend's flat query dialect
/// using one resource's [`MapperRules`].
pub struct Filter<'a> {
    rules: &'a MapperRules,
}

impl<'a> Filter<'a> {
    pub fn new(rules: &'a MapperRules) -> Self {
        Self { rules }
    }

    /// Pure mapping; the same query always yields the same parameter set.
    pub fn to_params(&self, query: &ListQuery) -> QueryParams {
        let mut params = QueryParams::new();

        // Extra params first so structured keys win on collision
        for (key, value) in &query.extra {
            params.insert(key.clone(), value.clone());
        }

        let page = query.page.filter(|p| *p > 0).unwrap_or(1);
        params.insert("page", page.to_string());

        // Zero means "not chosen" in the UI; fall back to the resource default
        if let Some(size) = query.page_size.filter(|s| *s > 0).or(self.rules.default_page_size) {
            params.insert("pageSize", size.to_string());
        }

        if let Some(sort) = FilterOrder::generate(query.sort.as_ref(), self.rules) {
            params.insert("sort", sort);
        }

        for (key, value) in FilterWhere::generate(&query.filters, self.rules) {
            params.insert(key, value);
        }

        params
    }
}
