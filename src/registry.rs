// Collaborator facade over every resource client
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::api::ListResult;
use crate::auth::{AuthClient, SessionContext};
use crate::cache::QueryCache;
use crate::config::{AppConfig, UiConfig};
use crate::enums::{self, EnumGroup, EnumScope, EnumSet};
use crate::error::{ClientError, FieldErrors};
use crate::filter::ListQuery;
use crate::models::{Attachments, BranchOption, Branches, Districts, Mosques, Users, Workers};
use crate::resource::{mutation, spec, ClientCore, Resource, ResourceClient, ResourceSpec};
use crate::sync::{Debounced, FilterCascade, ListView, OptionSource};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Id, Operation};

/// Rows requested when filling a picker
const OPTION_PAGE_SIZE: u32 = 200;

/// A mutation expressed with an untyped JSON payload
#[derive(Debug, Clone)]
pub enum Mutation {
    Create(Value),
    Update(Id, Value),
    Delete(Id),
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Mutation::Create(_) => Operation::Create,
            Mutation::Update(..) => Operation::Update,
            Mutation::Delete(_) => Operation::Delete,
        }
    }
}

#[derive(Clone)]
pub struct Registry {
    core: ClientCore,
    session: SessionContext,
    ui: UiConfig,
}

impl Registry {
    pub fn new(transport: Arc<dyn Transport>, session: SessionContext, config: &AppConfig) -> Self {
        Self {
            core: ClientCore::new(transport, QueryCache::new(), config.cache.clone()),
            session,
            ui: config.ui.clone(),
        }
    }

    /// Build over the real HTTP transport
    pub fn connect(config: &AppConfig, session: SessionContext) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config.api, session.clone())?.into_shared();
        Ok(Self::new(transport, session, config))
    }

    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.core.transport.clone(), self.session.clone())
    }

    pub fn client<R: Resource>(&self) -> ResourceClient<R> {
        ResourceClient::new(self.core.clone())
    }

    pub fn users(&self) -> ResourceClient<Users> {
        self.client()
    }

    pub fn branches(&self) -> ResourceClient<Branches> {
        self.client()
    }

    pub fn districts(&self) -> ResourceClient<Districts> {
        self.client()
    }

    pub fn mosques(&self) -> ResourceClient<Mosques> {
        self.client()
    }

    pub fn workers(&self) -> ResourceClient<Workers> {
        self.client()
    }

    pub fn attachments(&self) -> ResourceClient<Attachments> {
        self.client()
    }

    pub fn spec(&self, key: &str) -> Result<&'static ResourceSpec, ClientError> {
        spec::lookup(key).ok_or_else(|| ClientError::UnknownResource(key.to_string()))
    }

    /// List view for `R`, locked to the operator's branch when the role may
    /// not choose one
    pub fn list_view<R: Resource>(&self, cascade: FilterCascade) -> ListView<R> {
        let view = ListView::new(self.client::<R>(), cascade);
        let scope = self.session.branch_scope();
        match scope.forced_branch_name {
            Some(name) if !scope.can_choose_branch && R::SPEC.rules.filter_field("branch_name").is_some() => {
                view.with_locked_filter("branch_name", name)
            }
            _ => view,
        }
    }

    /// Free-text filter input debounced by the configured delay.
    /// Must be called inside a tokio runtime.
    pub fn filter_input(&self, initial: impl Into<String>) -> Debounced<String> {
        Debounced::from_config(initial.into(), &self.ui)
    }

    pub async fn fetch_list(&self, key: &str, query: &ListQuery) -> Result<ListResult<Value>, ClientError> {
        let spec = self.spec(key)?;
        self.core.fetch_list_raw(spec, query).await
    }

    pub async fn fetch_one(&self, key: &str, id: impl Into<Id>) -> Result<Value, ClientError> {
        let spec = self.spec(key)?;
        self.core.fetch_detail_raw(spec, &id.into()).await
    }

    /// Apply a mutation. The JSON payload is decoded into the resource's
    /// schema first, so local validation runs exactly as for typed calls.
    /// Deletes resolve to `null`.
    pub async fn mutate(&self, key: &str, op: Mutation) -> Result<Value, ClientError> {
        let spec = self.spec(key)?;
        match spec.key {
            "users" => self.mutate_as::<Users>(op).await,
            "branches" => self.mutate_as::<Branches>(op).await,
            "districts" => self.mutate_as::<Districts>(op).await,
            "mosques" => self.mutate_as::<Mosques>(op).await,
            "workers" => self.mutate_as::<Workers>(op).await,
            _ => Err(ClientError::validation(format!("{} cannot be modified", spec.key), FieldErrors::new())),
        }
    }

    async fn mutate_as<R>(&self, op: Mutation) -> Result<Value, ClientError>
    where
        R: Resource,
        R::Create: DeserializeOwned,
        R::Update: DeserializeOwned,
    {
        match op {
            Mutation::Create(body) => {
                let payload: R::Create = decode_payload(R::SPEC, body)?;
                mutation::create(&self.core, R::SPEC, &payload).await
            }
            Mutation::Update(id, body) => {
                let payload: R::Update = decode_payload(R::SPEC, body)?;
                mutation::update(&self.core, R::SPEC, &id, &payload).await
            }
            Mutation::Delete(id) => {
                mutation::remove(&self.core, R::SPEC, &id).await?;
                Ok(Value::Null)
            }
        }
    }

    /// Drop every cached entry of `key`; the next read refetches
    pub fn invalidate(&self, key: &str) {
        let dropped = self.core.cache.invalidate_resource(key);
        tracing::debug!("Invalidated {} cached entries of {}", dropped, key);
    }

    pub async fn get_enums(&self, group: EnumGroup, scope: &EnumScope) -> Result<EnumSet, ClientError> {
        enums::fetch_group(&self.core, group, scope).await
    }

    pub async fn get_enums_named(&self, name: &str, scope: &EnumScope) -> Result<EnumSet, ClientError> {
        let group = enums::lookup_group(name).ok_or_else(|| ClientError::UnknownResource(name.to_string()))?;
        self.get_enums(group, scope).await
    }

    /// Short branch listing for pickers (`?list=1`)
    pub async fn branch_options(&self) -> Result<Vec<BranchOption>, ClientError> {
        let query = ListQuery::new().param("list", "1");
        self.core.fetch_list_raw(&spec::BRANCHES, &query).await?.decode().map(|page| page.items)
    }

    pub async fn district_options(&self, branch_name: &str) -> Result<Vec<String>, ClientError> {
        self.names_of(&spec::DISTRICTS, "branch_name", branch_name).await
    }

    pub async fn mosque_options(&self, parent: &str, value: &str) -> Result<Vec<String>, ClientError> {
        self.names_of(&spec::MOSQUES, parent, value).await
    }

    async fn names_of(&self, spec: &ResourceSpec, filter: &str, value: &str) -> Result<Vec<String>, ClientError> {
        let query = ListQuery::new().page_size(OPTION_PAGE_SIZE).filter(filter, value);
        let page = self.core.fetch_list_raw(spec, &query).await?;
        let mut names: Vec<String> = Vec::new();
        for row in &page.items {
            if let Some(name) = row.get("name").and_then(Value::as_str) {
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}

fn decode_payload<T: DeserializeOwned>(spec: &ResourceSpec, body: Value) -> Result<T, ClientError> {
    serde_json::from_value(body).map_err(|e| {
        tracing::error!("Rejected {} payload: {}", spec.key, e);
        ClientError::validation(format!("Invalid {} payload: {}", spec.key, e), FieldErrors::new())
    })
}

#[async_trait]
impl OptionSource for Registry {
    async fn scoped_options(&self, parent: &str, child: &str, parent_value: &str) -> Result<Vec<String>, ClientError> {
        match child {
            "district_name" => self.names_of(&spec::DISTRICTS, parent, parent_value).await,
            "mosque_name" => self.mosque_options(parent, parent_value).await,
            other => Err(ClientError::UnknownResource(other.to_string())),
        }
    }
}
