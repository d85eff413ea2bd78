// Enumeration Aggregator
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::item_data;
use crate::cache::CacheKey;
use crate::error::ClientError;
use crate::filter::QueryParams;
use crate::resource::{ClientCore, Staleness};
use crate::transport::ApiRequest;
use crate::types::Id;

/// Merged result: enumeration name -> allowed values
pub type EnumSet = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumEndpoint {
    pub name: &'static str,
    pub path: &'static str,
    /// Whether the endpoint accepts the branch/district/name scope
    pub scoped: bool,
}

/// A named group of enumeration endpoints fetched together
#[derive(Debug, Clone, Copy)]
pub struct EnumGroup {
    pub key: &'static str,
    /// Resource whose mutations invalidate this group
    pub resource: &'static str,
    pub endpoints: &'static [EnumEndpoint],
}

const fn scoped(name: &'static str, path: &'static str) -> EnumEndpoint {
    EnumEndpoint { name, path, scoped: true }
}

const fn fixed(name: &'static str, path: &'static str) -> EnumEndpoint {
    EnumEndpoint { name, path, scoped: false }
}

pub const MOSQUE_ENUMS: EnumGroup = EnumGroup {
    key: "mosque-enums",
    resource: "mosques",
    endpoints: &[
        scoped("currentStatus", "/dashboard/mosques/enums/current-status"),
        scoped("category", "/dashboard/mosques/enums/category"),
        scoped("technicalStatus", "/dashboard/mosques/enums/technical-status"),
        scoped("types", "/dashboard/mosques/enums/type"),
        fixed("demolitionPercentage", "/dashboard/mosques/enums/demolition-percentage"),
        fixed("destructionStatus", "/dashboard/mosques/enums/destruction-status"),
        fixed("attachments", "/dashboard/mosques/enums/mosque-attachments"),
    ],
};

pub const WORKER_ENUMS: EnumGroup = EnumGroup {
    key: "worker-enums",
    resource: "workers",
    endpoints: &[
        fixed("jobTitles", "/dashboard/workers/enums/job-title"),
        fixed("jobStatuses", "/dashboard/workers/enums/job-status"),
        fixed("quranLevels", "/dashboard/workers/enums/quran-levels"),
        fixed("sponsorshipTypes", "/dashboard/workers/enums/sponsorship-types"),
        fixed("educationalLevels", "/dashboard/workers/enums/educational-level"),
    ],
};

pub fn lookup_group(name: &str) -> Option<EnumGroup> {
    match name {
        "mosques" | "mosque" | "mosque-enums" => Some(MOSQUE_ENUMS),
        "workers" | "worker" | "worker-enums" => Some(WORKER_ENUMS),
        _ => None,
    }
}

/// Cache resource prefix of every enumeration owned by `resource`
pub fn cache_prefix(resource: &str) -> String {
    format!("{}:enums:", resource)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumScope {
    pub branch_id: Option<Id>,
    pub district_id: Option<Id>,
    pub name: Option<String>,
}

impl EnumScope {
    pub fn params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(id) = self.branch_id.as_ref().filter(|id| !id.is_empty()) {
            params.insert("branch_id", id.as_str());
        }
        if let Some(id) = self.district_id.as_ref().filter(|id| !id.is_empty()) {
            params.insert("district_id", id.as_str());
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            params.insert("name", name);
        }
        params
    }
}

fn values_of(body: &Value) -> Result<Vec<String>, ClientError> {
    let data = item_data(body)?;
    let Value::Array(items) = data else {
        return Err(ClientError::decode("enumeration data is not a list"));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

/// Fetch every member of `group` concurrently and merge them.
///
/// Any change of scope refetches every member, scoped or not. One failing
/// member fails the whole set; nothing partial is returned.
pub async fn fetch_group(core: &ClientCore, group: EnumGroup, scope: &EnumScope) -> Result<EnumSet, ClientError> {
    let scope_params = scope.params();
    let policy = Staleness::Enumeration.policy(core.settings());

    let fetches = group.endpoints.iter().map(|endpoint| {
        // Keyed by the whole scope so a scope change refetches unscoped members too
        let key = CacheKey::list(format!("{}{}", cache_prefix(group.resource), endpoint.name), scope_params.clone());
        let params = if endpoint.scoped { scope_params.clone() } else { QueryParams::new() };
        let request = ApiRequest::get(endpoint.path).with_params(params);
        async move {
            let body = core.cached_get(key, policy, request).await?;
            Ok::<_, ClientError>((endpoint.name.to_string(), values_of(&body)?))
        }
    });

    match try_join_all(fetches).await {
        Ok(pairs) => Ok(pairs.into_iter().collect()),
        Err(e) => {
            tracing::error!("Failed to load {}: {}", group.key, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryCache;
    use crate::config::AppConfig;
    use crate::testing::FakeTransport;
    use crate::transport::Method;
    use serde_json::json;

    fn core(fake: &FakeTransport) -> ClientCore {
        ClientCore::new(fake.shared(), QueryCache::new(), AppConfig::default().cache)
    }

    fn script_all(fake: &FakeTransport, group: EnumGroup) {
        for endpoint in group.endpoints {
            fake.respond(Method::GET, endpoint.path, json!({"success": true, "data": [format!("{}-a", endpoint.name)]}));
        }
    }

    #[tokio::test]
    async fn merges_every_member() {
        let fake = FakeTransport::new();
        script_all(&fake, WORKER_ENUMS);

        let set = fetch_group(&core(&fake), WORKER_ENUMS, &EnumScope::default()).await.unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(set["quranLevels"], vec!["quranLevels-a".to_string()]);
    }

    #[tokio::test]
    async fn one_failure_fails_the_set() {
        let fake = FakeTransport::new();
        script_all(&fake, MOSQUE_ENUMS);
        fake.fail_always(
            Method::GET,
            "/dashboard/mosques/enums/category",
            ClientError::from_response(500, &json!({"message": "boom"})),
        );

        let err = fetch_group(&core(&fake), MOSQUE_ENUMS, &EnumScope::default()).await.unwrap_err();
        assert_eq!(err.display_message("x"), "boom");
    }

    #[tokio::test]
    async fn scope_only_reaches_scoped_members() {
        let fake = FakeTransport::new();
        script_all(&fake, MOSQUE_ENUMS);
        let scope = EnumScope { branch_id: Some(Id::from(2)), district_id: None, name: Some(String::new()) };

        fetch_group(&core(&fake), MOSQUE_ENUMS, &scope).await.unwrap();
        let types = fake.calls_to(&Method::GET, "/dashboard/mosques/enums/type");
        assert_eq!(types[0].params.to_query_string(), "branch_id=2");
        let demolition = fake.calls_to(&Method::GET, "/dashboard/mosques/enums/demolition-percentage");
        assert!(demolition[0].params.is_empty());
    }

    #[tokio::test]
    async fn scope_change_refetches_every_member() {
        let fake = FakeTransport::new();
        script_all(&fake, MOSQUE_ENUMS);
        let core = core(&fake);

        fetch_group(&core, MOSQUE_ENUMS, &EnumScope::default()).await.unwrap();
        assert_eq!(fake.total_calls(), 7);
        fetch_group(&core, MOSQUE_ENUMS, &EnumScope::default()).await.unwrap();
        assert_eq!(fake.total_calls(), 7);

        let north = EnumScope { branch_id: Some(Id::from(1)), ..EnumScope::default() };
        fetch_group(&core, MOSQUE_ENUMS, &north).await.unwrap();
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/mosques/enums/category"), 2);
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/mosques/enums/destruction-status"), 2);
        assert_eq!(fake.total_calls(), 14);
    }

    #[tokio::test]
    async fn mutation_of_owner_refetches_its_enums() {
        let fake = FakeTransport::new();
        script_all(&fake, MOSQUE_ENUMS);
        script_all(&fake, WORKER_ENUMS);
        fake.respond(Method::POST, "/dashboard/mosques", json!({"success": true, "data": {"id": 8, "name": "Dawn"}}));
        let core = core(&fake);

        fetch_group(&core, MOSQUE_ENUMS, &EnumScope::default()).await.unwrap();
        fetch_group(&core, WORKER_ENUMS, &EnumScope::default()).await.unwrap();
        assert_eq!(fake.total_calls(), 12);

        let created = crate::models::CreateMosque {
            branch_id: Some(Id::from(1)),
            district_id: Some(Id::from(4)),
            name: "Dawn".into(),
            category: Some("NewCat".into()),
            ..Default::default()
        };
        crate::resource::mutation::create(&core, &crate::resource::spec::MOSQUES, &created).await.unwrap();

        fetch_group(&core, MOSQUE_ENUMS, &EnumScope::default()).await.unwrap();
        fetch_group(&core, WORKER_ENUMS, &EnumScope::default()).await.unwrap();
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/mosques/enums/category"), 2);
        // Worker enumerations are untouched by a mosque mutation
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/workers/enums/job-title"), 1);
        assert_eq!(fake.total_calls(), 12 + 1 + 7);
    }

    #[test]
    fn groups_resolve_by_name() {
        assert_eq!(lookup_group("workers").map(|g| g.key), Some("worker-enums"));
        assert_eq!(lookup_group("mosque-enums").map(|g| g.resource), Some("mosques"));
        assert!(lookup_group("imams").is_none());
    }
}
