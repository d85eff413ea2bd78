#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use wiremock::MockServer;

use mosque_registry::auth::{RoleName, Session, SessionContext, SessionUser};
use mosque_registry::config::AppConfig;
use mosque_registry::types::Id;
use mosque_registry::Registry;

/// API prefix the mock backend serves under
pub const API_PREFIX: &str = "/api";

pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

pub fn app_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.api.base_url = format!("{}{}", server.uri(), API_PREFIX);
    config.api.timeout_secs = 5;
    config
}

pub fn session_as(role: RoleName, branch: Option<(i64, &str)>) -> Session {
    Session {
        token: "test-token".to_string(),
        token_type: "Bearer".to_string(),
        user: SessionUser {
            id: Id::from(1),
            name: "Test Operator".to_string(),
            username: "operator".to_string(),
            branch_id: branch.map(|(id, _)| Id::from(id)),
            branch_name: branch.map(|(_, name)| name.to_string()),
            roles: json!({"name": role.as_str()}),
        },
        role_name: Some(role),
        logged_in_at: Utc::now(),
    }
}

/// Registry over the real HTTP transport, logged in as a system administrator
pub fn registry(server: &MockServer) -> Result<Registry> {
    let session = SessionContext::with_session(session_as(RoleName::SystemAdministrator, None));
    Ok(Registry::connect(&app_config(server), session)?)
}

pub fn anonymous_registry(server: &MockServer) -> Result<Registry> {
    Ok(Registry::connect(&app_config(server), SessionContext::new())?)
}

pub fn list_body(rows: Vec<Value>, total: u64) -> Value {
    json!({
        "success": true,
        "data": rows,
        "meta": {"total": total, "current_page": 1, "per_page": 20, "last_page": 1}
    })
}

pub fn item_body(data: Value) -> Value {
    json!({"success": true, "data": data})
}

/// Raw query strings of every GET the mock received for `path`
pub async fn received_queries(server: &MockServer, path: &str) -> Vec<String> {
    let full = api_path(path);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == full)
        .map(|r| r.url.query().unwrap_or_default().to_string())
        .collect()
}
