// List view state: filters, paging, cascade resets and the stale-response guard
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use super::cascade::FilterCascade;
use super::scoped::{Scoped, Ticket};
use crate::api::ListResult;
use crate::error::ClientError;
use crate::filter::{FilterValue, ListQuery, SortSpec};
use crate::resource::{Resource, ResourceClient};

/// Supplies candidate values for a child filter given its parent's value
#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn scoped_options(&self, parent: &str, child: &str, parent_value: &str) -> Result<Vec<String>, ClientError>;
}

/// A child whose option list must be re-derived for a new parent value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rescope {
    pub child: &'static str,
    pub scope: Option<String>,
}

/// Query snapshot tagged with the state generation it was issued for
#[derive(Debug, Clone)]
pub struct PendingFetch {
    tag: u64,
    pub query: ListQuery,
}

pub type OptionList = Scoped<String, Vec<String>>;

pub struct ListView<R: Resource> {
    client: ResourceClient<R>,
    cascade: FilterCascade,
    query: ListQuery,
    generation: u64,
    rows: Option<ListResult<R::Entity>>,
    error: Option<ClientError>,
    loading: bool,
    /// Tag of the most recently issued fetch, until it resolves
    in_flight: Option<u64>,
    options: BTreeMap<&'static str, OptionList>,
    locked: BTreeSet<&'static str>,
}

impl<R: Resource> ListView<R> {
    pub fn new(client: ResourceClient<R>, cascade: FilterCascade) -> Self {
        Self {
            client,
            cascade,
            query: ListQuery::new(),
            generation: 0,
            rows: None,
            error: None,
            loading: false,
            in_flight: None,
            options: BTreeMap::new(),
            locked: BTreeSet::new(),
        }
    }

    /// Start from a pre-seeded query (e.g. a forced branch filter)
    pub fn with_query(mut self, query: ListQuery) -> Self {
        self.query = query;
        let children: Vec<&'static str> = self
            .query
            .filters
            .keys()
            .flat_map(|name| self.cascade.dependents_of(name))
            .collect();
        for child in children {
            let scope = self.parent_scope(child);
            self.options.entry(child).or_default().rescope(scope);
        }
        self
    }

    /// Seed `name` with `value` and refuse later changes to it
    /// (e.g. the branch of an operator who may not choose one)
    pub fn with_locked_filter(self, name: &'static str, value: impl Into<FilterValue>) -> Self {
        let query = self.query.clone().filter(name, value);
        let mut view = self.with_query(query);
        view.locked.insert(name);
        view
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.locked.contains(name)
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Last successfully loaded page, kept while a refetch fails
    pub fn rows(&self) -> Option<&ListResult<R::Entity>> {
        self.rows.as_ref()
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn options(&self, child: &str) -> Option<&OptionList> {
        self.options.get(child)
    }

    fn parent_scope(&self, child: &str) -> Option<String> {
        let parent = self.cascade.parent_of(child)?;
        self.query
            .filter_value(parent)
            .and_then(FilterValue::as_text)
            .map(str::to_string)
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    /// Set a filter; returns the children whose options were rescoped.
    ///
    /// Any change resets the page to 1 and unsets every dependent filter.
    /// Locked filters never change.
    pub fn set_filter(&mut self, name: &str, value: impl Into<FilterValue>) -> Vec<Rescope> {
        if self.locked.contains(name) {
            tracing::debug!("Filter {} is locked for this operator, ignoring", name);
            return Vec::new();
        }
        let value = value.into();
        let current = self.query.filter_value(name).cloned();
        let next = if value.is_unset() { None } else { Some(value) };
        if current == next {
            return Vec::new();
        }

        match next {
            Some(value) => {
                self.query.filters.insert(name.to_string(), value);
            }
            None => {
                self.query.filters.remove(name);
            }
        }
        self.query.page = Some(1);

        let dependents = self.cascade.dependents_of(name);
        for child in &dependents {
            if self.query.filters.remove(*child).is_some() {
                tracing::debug!("Reset {} after {} changed", child, name);
            }
        }

        let mut rescoped = Vec::new();
        for child in dependents {
            let scope = self.parent_scope(child);
            if self.options.entry(child).or_default().rescope(scope.clone()) {
                rescoped.push(Rescope { child, scope });
            }
        }

        self.touch();
        rescoped
    }

    pub fn clear_filter(&mut self, name: &str) -> Vec<Rescope> {
        self.set_filter(name, FilterValue::Text(String::new()))
    }

    pub fn set_page(&mut self, page: u32) {
        if self.query.page != Some(page) {
            self.query.page = Some(page);
            self.touch();
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        if self.query.page_size != Some(page_size) {
            self.query.page_size = Some(page_size);
            self.query.page = Some(1);
            self.touch();
        }
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        if self.query.sort != sort {
            self.query.sort = sort;
            self.touch();
        }
    }

    /// Snapshot the current query for a fetch
    pub fn begin(&mut self) -> PendingFetch {
        self.loading = true;
        self.in_flight = Some(self.generation);
        PendingFetch { tag: self.generation, query: self.query.clone() }
    }

    /// Apply a fetch result unless the state moved on since `begin`.
    /// Returns whether the result was applied. Loading ends once the most
    /// recently issued fetch resolves, applied or not.
    pub fn complete(&mut self, pending: PendingFetch, result: Result<ListResult<R::Entity>, ClientError>) -> bool {
        if self.in_flight == Some(pending.tag) {
            self.in_flight = None;
            self.loading = false;
        }
        if pending.tag != self.generation {
            tracing::debug!("Discarding {} response for an outdated query", R::SPEC.key);
            return false;
        }
        match result {
            Ok(rows) => {
                self.rows = Some(rows);
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
        true
    }

    /// Fetch the current query and apply it
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let pending = self.begin();
        let outcome = self.client.list(&pending.query).await;
        let failure = outcome.as_ref().err().cloned();
        let applied = self.complete(pending, outcome);
        match failure {
            Some(e) if applied => Err(e),
            _ => Ok(()),
        }
    }

    /// Load every rescoped option list that has nothing yet
    pub async fn refresh_options(&mut self, source: &dyn OptionSource) -> Result<(), ClientError> {
        let tickets: Vec<(&'static str, Ticket<String>)> = self
            .options
            .iter_mut()
            .filter(|(_, list)| list.needs_fetch())
            .filter_map(|(child, list)| list.begin().map(|t| (*child, t)))
            .collect();

        let mut first_error = None;
        for (child, ticket) in tickets {
            let Some(parent) = self.cascade.parent_of(child) else {
                continue;
            };
            let result = source.scoped_options(parent, child, &ticket.scope).await;
            if let Err(e) = &result {
                first_error.get_or_insert_with(|| e.clone());
            }
            if let Some(list) = self.options.get_mut(child) {
                list.complete(ticket, result);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
