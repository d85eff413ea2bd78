use clap::Subcommand;
use serde_json::json;
use std::io::BufRead;

use crate::cli::config::{load_state, save_state};
use crate::cli::utils::{failure, output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the dashboard API")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the saved session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

pub async fn handle(cmd: AuthCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let mut state = load_state()?;
            let registry = state.registry()?;
            let session = registry
                .auth()
                .login(&username, &password)
                .await
                .map_err(|e| failure(e, "Login failed"))?;

            let role = session.role_name.map(|r| r.as_str()).unwrap_or("none");
            let message = format!("Logged in as {} ({})", session.user.username, role);
            state.session = Some(session.clone());
            save_state(&state)?;

            output_success(
                output_format,
                &message,
                Some(json!({ "username": session.user.username, "role": role })),
            )
        }
        AuthCommands::Logout => {
            let mut state = load_state()?;
            state.registry()?.auth().logout();
            state.session = None;
            save_state(&state)?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let state = load_state()?;
            let context = state.session_context();
            match context.snapshot() {
                Some(session) => {
                    let scope = context.branch_scope();
                    output_value(
                        output_format,
                        &json!({
                            "authenticated": true,
                            "username": session.user.username,
                            "role": session.role_name.map(|r| r.as_str()),
                            "can_choose_branch": scope.can_choose_branch,
                            "branch": scope.forced_branch_name,
                            "logged_in_at": session.logged_in_at.to_rfc3339(),
                        }),
                    )
                }
                None => output_value(output_format, &json!({ "authenticated": false })),
            }
        }
        AuthCommands::Whoami => {
            let mut state = load_state()?;
            if state.session.is_none() {
                return Err(anyhow::anyhow!("Not logged in"));
            }
            let registry = state.registry()?;
            match registry.auth().whoami().await {
                Ok(user) => output_value(output_format, &serde_json::to_value(user)?),
                Err(e) => {
                    // The auth client already dropped a rejected session; persist that
                    if registry.session().snapshot().is_none() {
                        state.session = None;
                        save_state(&state)?;
                    }
                    Err(failure(e, "Could not load the current user"))
                }
            }
        }
    }
}
