use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::{Session, SessionContext};
use crate::config::{config, AppConfig};
use crate::registry::Registry;

const STATE_FILE: &str = "state.json";

/// Everything the CLI remembers between invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliState {
    pub api_url: Option<String>,
    pub session: Option<Session>,
}

impl CliState {
    /// Process config with the saved API URL applied
    pub fn app_config(&self) -> AppConfig {
        let mut app = config().clone();
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            app.api.base_url = url.trim().to_string();
        }
        app
    }

    pub fn session_context(&self) -> SessionContext {
        match &self.session {
            Some(session) => SessionContext::with_session(session.clone()),
            None => SessionContext::new(),
        }
    }

    pub fn registry(&self) -> anyhow::Result<Registry> {
        Ok(Registry::connect(&self.app_config(), self.session_context())?)
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("REGISTRY_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("mosque-registry").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_state() -> anyhow::Result<CliState> {
    load_state_from(&get_config_dir()?)
}

pub fn save_state(state: &CliState) -> anyhow::Result<()> {
    save_state_to(&get_config_dir()?, state)
}

pub fn load_state_from(dir: &Path) -> anyhow::Result<CliState> {
    let state_file = dir.join(STATE_FILE);

    if !state_file.exists() {
        return Ok(CliState::default());
    }

    let content = fs::read_to_string(state_file)?;
    let state: CliState = serde_json::from_str(&content)?;
    Ok(state)
}

pub fn save_state_to(dir: &Path, state: &CliState) -> anyhow::Result<()> {
    let state_file = dir.join(STATE_FILE);

    let content = serde_json::to_string_pretty(state)?;
    fs::write(state_file, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{RoleName, SessionUser};
    use crate::types::Id;
    use chrono::Utc;
    use serde_json::json;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("registry-cli-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_state_file_is_empty_state() {
        let dir = scratch_dir("empty");
        let _ = fs::remove_file(dir.join(STATE_FILE));
        assert_eq!(load_state_from(&dir).unwrap(), CliState::default());
    }

    #[test]
    fn session_survives_save_and_load() {
        let dir = scratch_dir("session");
        let state = CliState {
            api_url: Some("http://127.0.0.1:9000/api".into()),
            session: Some(Session {
                token: "tok".into(),
                token_type: "Bearer".into(),
                user: SessionUser {
                    id: Id::from(1),
                    name: "Admin".into(),
                    username: "admin".into(),
                    branch_id: None,
                    branch_name: None,
                    roles: json!({"name": "system_administrator"}),
                },
                role_name: Some(RoleName::SystemAdministrator),
                logged_in_at: Utc::now(),
            }),
        };
        save_state_to(&dir, &state).unwrap();

        let loaded = load_state_from(&dir).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.app_config().api.base_url, "http://127.0.0.1:9000/api");
        assert!(loaded.session_context().is_super_admin());
    }
}
