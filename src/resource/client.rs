// Generic per-resource client
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::mutation;
use super::payload::Payload;
use super::spec::ResourceSpec;
use crate::api::{ensure_success, item_data, ListResult};
use crate::cache::{CacheKey, CachePolicy, QueryCache};
use crate::config::CacheConfig;
use crate::error::ClientError;
use crate::filter::{Filter, ListQuery, QueryParams};
use crate::transport::{send_with_retry, ApiRequest, Transport};
use crate::types::Id;

/// Binds an entity type and its DTOs to a [`ResourceSpec`]
pub trait Resource: Send + Sync + 'static {
    type Entity: DeserializeOwned + Send + 'static;
    type Create: Payload;
    type Update: Payload;

    const SPEC: &'static ResourceSpec;
}

/// Transport, cache and cache settings shared by every resource client
#[derive(Clone)]
pub struct ClientCore {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cache: QueryCache,
    pub(crate) settings: CacheConfig,
}

impl ClientCore {
    pub fn new(transport: Arc<dyn Transport>, cache: QueryCache, settings: CacheConfig) -> Self {
        Self { transport, cache, settings }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn settings(&self) -> &CacheConfig {
        &self.settings
    }

    /// GET through the cache. A `success: false` body counts as a failure and
    /// is never stored.
    pub(crate) async fn cached_get(
        &self,
        key: CacheKey,
        policy: CachePolicy,
        request: ApiRequest,
    ) -> Result<Arc<Value>, ClientError> {
        let transport = self.transport.clone();
        let max_retries = self.settings.max_retries;
        self.cache
            .fetch_with(key, policy, move || async move {
                tracing::info!("GET {} {}", request.path, request.params.to_query_string());
                let response = send_with_retry(transport.as_ref(), request, max_retries).await?;
                ensure_success(&response.body)?;
                Ok::<_, ClientError>(response.body)
            })
            .await
    }

    pub async fn fetch_list_raw(&self, spec: &ResourceSpec, query: &ListQuery) -> Result<ListResult<Value>, ClientError> {
        let params = Filter::new(&spec.rules).to_params(query);
        self.fetch_params(spec, params).await
    }

    /// List fetch with already-mapped parameters
    pub async fn fetch_params(&self, spec: &ResourceSpec, params: QueryParams) -> Result<ListResult<Value>, ClientError> {
        let key = CacheKey::list(spec.key, params.clone());
        let request = ApiRequest::get(spec.path).with_params(params.clone());
        let body = self
            .cached_get(key, spec.staleness.policy(&self.settings), request)
            .await?;
        ListResult::from_body(&body, &params)
    }

    pub async fn fetch_detail_raw(&self, spec: &ResourceSpec, id: &Id) -> Result<Value, ClientError> {
        if id.is_empty() {
            return Err(ClientError::invalid_field("id", "Id is required"));
        }
        let key = CacheKey::detail(spec.key, id.clone());
        let request = ApiRequest::get(spec.item_path(id));
        let body = self
            .cached_get(key, spec.staleness.policy(&self.settings), request)
            .await?;
        item_data(&body)
    }
}

/// Typed list/get/create/update/remove for one resource
pub struct ResourceClient<R: Resource> {
    core: ClientCore,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self { core: self.core.clone(), _resource: PhantomData }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(core: ClientCore) -> Self {
        Self { core, _resource: PhantomData }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        R::SPEC
    }

    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListResult<R::Entity>, ClientError> {
        self.core.fetch_list_raw(R::SPEC, query).await?.decode()
    }

    pub async fn get(&self, id: impl Into<Id>) -> Result<R::Entity, ClientError> {
        let data = self.core.fetch_detail_raw(R::SPEC, &id.into()).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn create(&self, payload: &R::Create) -> Result<R::Entity, ClientError> {
        let data = mutation::create(&self.core, R::SPEC, payload).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn update(&self, id: impl Into<Id>, payload: &R::Update) -> Result<R::Entity, ClientError> {
        let data = mutation::update(&self.core, R::SPEC, &id.into(), payload).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub async fn remove(&self, id: impl Into<Id>) -> Result<(), ClientError> {
        mutation::remove(&self.core, R::SPEC, &id.into()).await
    }

    pub fn invalidate(&self) {
        self.core.cache.invalidate_resource(R::SPEC.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{CreateDistrict, Districts};
    use crate::testing::{list_body, FakeTransport};
    use crate::transport::Method;
    use serde_json::json;

    fn client(fake: &FakeTransport) -> ResourceClient<Districts> {
        ResourceClient::new(ClientCore::new(fake.shared(), QueryCache::new(), AppConfig::default().cache))
    }

    #[tokio::test]
    async fn list_maps_query_and_decodes_rows() {
        let fake = FakeTransport::new();
        fake.respond(
            Method::GET,
            "/dashboard/districts",
            list_body(vec![json!({"id": 1, "name": "Uptown", "branch_id": 2})], Some(31)),
        );
        let districts = client(&fake)
            .list(&ListQuery::new().filter("branch_name", "North"))
            .await
            .unwrap();

        assert_eq!(districts.total, 31);
        assert_eq!(districts.items[0].name, "Uptown");
        let call = &fake.calls()[0];
        assert_eq!(call.params.get("filter[branch.name]"), Some("North"));
        assert_eq!(call.params.get("pageSize"), Some("20"));
    }

    #[tokio::test]
    async fn list_retries_one_transient_failure() {
        let fake = FakeTransport::new();
        fake.fail_once(Method::GET, "/dashboard/districts", ClientError::transport("timeout", true));
        fake.respond(Method::GET, "/dashboard/districts", list_body(vec![], None));

        assert!(client(&fake).list(&ListQuery::new()).await.unwrap().is_empty());
        assert_eq!(fake.total_calls(), 2);
    }

    #[tokio::test]
    async fn success_false_is_not_cached() {
        let fake = FakeTransport::new();
        fake.respond_once(Method::GET, "/dashboard/districts/4", json!({"success": false, "message": "Not yours"}));
        fake.respond(Method::GET, "/dashboard/districts/4", json!({"success": true, "data": {"id": 4, "name": "Old Town", "branch_id": 1}}));
        let client = client(&fake);

        let err = client.get(4).await.unwrap_err();
        assert_eq!(err.display_message("x"), "Not yours");
        assert_eq!(client.get(4).await.unwrap().name, "Old Town");
    }

    #[tokio::test]
    async fn create_returns_typed_entity() {
        let fake = FakeTransport::new();
        fake.respond(
            Method::POST,
            "/dashboard/districts",
            json!({"success": true, "data": {"id": 12, "name": "Harbor", "branch_id": 3, "code": "HB"}}),
        );
        let created = client(&fake)
            .create(&CreateDistrict { name: "Harbor".into(), branch_id: Some(Id::from(3)), code: Some("HB".into()) })
            .await
            .unwrap();
        assert_eq!(created.id, Id::from(12));
        assert_eq!(created.code.as_deref(), Some("HB"));
    }
}
