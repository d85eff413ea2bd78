use crate::cache::CachePolicy;
use crate::config::CacheConfig;
use crate::filter::MapperRules;
use crate::transport::Method;

/// How mutation bodies are sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    FormUrlEncoded,
    /// Always multipart; also chosen automatically when a payload carries a file
    Multipart,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    Put,
    /// `POST {path}/{id}`, for endpoints that take multipart updates
    Post,
}

impl UpdateMethod {
    pub fn method(&self) -> Method {
        match self {
            UpdateMethod::Put => Method::PUT,
            UpdateMethod::Post => Method::POST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Filtered views that change quickly; every read goes to the backend
    AlwaysFresh,
    /// Reference data such as branch lists
    Reference,
    Enumeration,
}

impl Staleness {
    pub fn policy(&self, cache: &CacheConfig) -> CachePolicy {
        match self {
            Staleness::AlwaysFresh => CachePolicy::ALWAYS_FRESH,
            Staleness::Reference => CachePolicy::stale_after(cache.reference_stale_time()),
            Staleness::Enumeration => CachePolicy::stale_after(cache.enum_stale_time()),
        }
    }
}

/// Everything the generic client needs to know about one resource
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub key: &'static str,
    pub path: &'static str,
    pub rules: MapperRules,
    pub body: BodyEncoding,
    pub update_method: UpdateMethod,
    pub staleness: Staleness,
}

impl ResourceSpec {
    pub fn item_path(&self, id: impl std::fmt::Display) -> String {
        format!("{}/{}", self.path, id)
    }

    pub fn is_read_only(&self) -> bool {
        self.body == BodyEncoding::ReadOnly
    }
}

pub const USERS: ResourceSpec = ResourceSpec {
    key: "users",
    path: "/dashboard/users",
    rules: MapperRules::new(
        None,
        &[("id", "id"), ("created_at", "created_at"), ("is_active", "is_active")],
        &[("name", "name")],
    ),
    body: BodyEncoding::FormUrlEncoded,
    update_method: UpdateMethod::Put,
    staleness: Staleness::AlwaysFresh,
};

pub const BRANCHES: ResourceSpec = ResourceSpec {
    key: "branches",
    path: "/dashboard/branches",
    rules: MapperRules::new(None, &[("id", "id"), ("name", "name")], &[("name", "name")]),
    body: BodyEncoding::Json,
    update_method: UpdateMethod::Put,
    staleness: Staleness::Reference,
};

pub const DISTRICTS: ResourceSpec = ResourceSpec {
    key: "districts",
    path: "/dashboard/districts",
    rules: MapperRules::new(Some(20), &[], &[("name", "name"), ("branch_name", "branch.name")]),
    body: BodyEncoding::Json,
    update_method: UpdateMethod::Put,
    staleness: Staleness::AlwaysFresh,
};

pub const MOSQUES: ResourceSpec = ResourceSpec {
    key: "mosques",
    path: "/dashboard/mosques",
    rules: MapperRules::new(
        Some(20),
        &[("id", "id"), ("created_at", "created_at")],
        &[
            ("name", "name"),
            ("branch_name", "branch.name"),
            ("district_name", "district.name"),
            ("current_status", "current_status"),
            ("category", "category"),
            ("types", "types.type"),
        ],
    ),
    body: BodyEncoding::FormUrlEncoded,
    update_method: UpdateMethod::Put,
    staleness: Staleness::Reference,
};

pub const WORKERS: ResourceSpec = ResourceSpec {
    key: "workers",
    path: "/dashboard/workers",
    rules: MapperRules::new(None, &[], &[("name", "name"), ("mosque_name", "mosque.name")]),
    body: BodyEncoding::Multipart,
    update_method: UpdateMethod::Post,
    staleness: Staleness::AlwaysFresh,
};

pub const ATTACHMENTS: ResourceSpec = ResourceSpec {
    key: "mosque-attachments",
    path: "/dashboard/mosque-attachments",
    rules: MapperRules::new(None, &[], &[("mosque_id", "mosque_id")]),
    body: BodyEncoding::ReadOnly,
    update_method: UpdateMethod::Put,
    staleness: Staleness::AlwaysFresh,
};

pub const ALL: [&ResourceSpec; 6] = [&USERS, &BRANCHES, &DISTRICTS, &MOSQUES, &WORKERS, &ATTACHMENTS];

pub fn lookup(key: &str) -> Option<&'static ResourceSpec> {
    ALL.into_iter().find(|spec| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lookup_by_key() {
        assert_eq!(lookup("mosques").map(|s| s.path), Some("/dashboard/mosques"));
        assert_eq!(lookup("mosque-attachments").map(|s| s.is_read_only()), Some(true));
        assert!(lookup("imams").is_none());
    }

    #[test]
    fn staleness_follows_config() {
        let cache = CacheConfig { reference_stale_secs: 300, enum_stale_secs: 600, max_retries: 1 };
        assert_eq!(MOSQUES.staleness.policy(&cache).stale_time, Duration::from_secs(300));
        assert_eq!(USERS.staleness.policy(&cache), CachePolicy::ALWAYS_FRESH);
        assert_eq!(Staleness::Enumeration.policy(&cache).stale_time, Duration::from_secs(600));
    }

    #[test]
    fn workers_update_with_post() {
        assert_eq!(WORKERS.update_method.method(), Method::POST);
        assert_eq!(WORKERS.item_path(9), "/dashboard/workers/9");
    }
}
