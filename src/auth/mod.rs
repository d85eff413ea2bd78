// Auth collaborator: session ownership, role facts and the login endpoints
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, PoisonError, RwLock};

use crate::api::item_data;
use crate::error::ClientError;
use crate::transport::{ApiRequest, Method, RequestBody, Transport};
use crate::types::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    SystemAdministrator,
    Supervisor,
    BranchManager,
    FieldCommittee,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::SystemAdministrator,
        RoleName::Supervisor,
        RoleName::BranchManager,
        RoleName::FieldCommittee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SystemAdministrator => "system_administrator",
            RoleName::Supervisor => "supervisor",
            RoleName::BranchManager => "branch_manager",
            RoleName::FieldCommittee => "field_committee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        RoleName::ALL.into_iter().find(|r| r.as_str() == value.trim())
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged-in operator as returned by `/auth/login` and `/dashboard/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub roles: Value,
}

impl SessionUser {
    pub fn role_name(&self) -> Option<RoleName> {
        extract_role_name(&self.roles)
    }
}

/// `roles` arrives either as one `{name}` object or as a list of them
/// (the first entry wins). Bare strings are accepted too.
pub fn extract_role_name(roles: &Value) -> Option<RoleName> {
    let first = match roles {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match first {
        Value::String(name) => RoleName::parse(name),
        Value::Object(map) => map.get("name").and_then(Value::as_str).and_then(RoleName::parse),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub token_type: String,
    pub user: SessionUser,
    pub role_name: Option<RoleName>,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

/// Which branches an operator may pick from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchScope {
    pub can_choose_branch: bool,
    pub forced_branch_id: Option<Id>,
    pub forced_branch_name: Option<String>,
}

impl BranchScope {
    fn unrestricted() -> Self {
        Self {
            can_choose_branch: true,
            forced_branch_id: None,
            forced_branch_name: None,
        }
    }
}

/// Role-based visibility predicate
pub fn can(role: Option<RoleName>, allowed: &[RoleName]) -> bool {
    role.map(|r| allowed.contains(&r)).unwrap_or(false)
}

/// Single owned session shared by the transport and the presentation layer.
///
/// Everything outside this module reads; only the auth client writes.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub fn snapshot(&self) -> Option<Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn has_token(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| !s.token.is_empty())
            .unwrap_or(false)
    }

    /// `Authorization` header value, if a session exists
    pub fn authorization(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|s| !s.token.is_empty())
            .map(Session::authorization)
    }

    pub fn current_role(&self) -> Option<RoleName> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.role_name)
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.current_role() == Some(role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        can(self.current_role(), roles)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(RoleName::SystemAdministrator)
    }

    pub fn branch_scope(&self) -> BranchScope {
        match self.snapshot() {
            Some(session) if session.role_name != Some(RoleName::SystemAdministrator) => BranchScope {
                can_choose_branch: false,
                forced_branch_id: session.user.branch_id.clone(),
                forced_branch_name: session.user.branch_name.clone(),
            },
            _ => BranchScope::unrestricted(),
        }
    }

    pub(crate) fn replace(&self, session: Option<Session>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "tokenType", default)]
    token_type: Option<String>,
}

/// Talks to the login endpoints and owns writes to the session
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    session: SessionContext,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionContext) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        if username.trim().is_empty() {
            return Err(ClientError::invalid_field("username", "Username is required"));
        }
        if password.is_empty() {
            return Err(ClientError::invalid_field("password", "Password is required"));
        }

        let request = ApiRequest::new(Method::POST, "/auth/login")
            .with_body(RequestBody::Json(json!({"username": username, "password": password})));
        let response = self.transport.send(request).await.map_err(|e| {
            tracing::error!("Login failed for {}: {}", username, e);
            e
        })?;

        let data = item_data(&response.body)?;
        let auth: LoginAuth = serde_json::from_value(
            data.get("auth")
                .cloned()
                .ok_or_else(|| ClientError::decode("login response has no auth block"))?,
        )?;
        let user: SessionUser = serde_json::from_value(data)?;

        let session = Session {
            token: auth.access_token,
            token_type: auth.token_type.filter(|t| !t.is_empty()).unwrap_or_else(|| "Bearer".to_string()),
            role_name: user.role_name(),
            user,
            logged_in_at: Utc::now(),
        };
        tracing::info!(
            "Logged in as {} ({})",
            session.user.username,
            session.role_name.map(|r| r.as_str()).unwrap_or("no role")
        );
        self.session.replace(Some(session.clone()));
        Ok(session)
    }

    /// Forget the session; nothing is sent to the backend
    pub fn logout(&self) {
        self.session.replace(None);
        tracing::info!("Session cleared");
    }

    /// `GET /dashboard/me`. A 401 clears the session before propagating.
    pub async fn whoami(&self) -> Result<SessionUser, ClientError> {
        match self.transport.send(ApiRequest::get("/dashboard/me")).await {
            Ok(response) => Ok(serde_json::from_value(item_data(&response.body)?)?),
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Session rejected by backend, clearing");
                self.session.replace(None);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
