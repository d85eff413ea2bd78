use clap::Subcommand;
use serde_json::json;
use url::Url;

use crate::cli::config::{load_state, save_state};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Set the dashboard API base URL")]
    SetUrl {
        #[arg(help = "Base URL, e.g. https://registry.example.com/api")]
        url: String,
    },

    #[command(about = "Show the effective settings")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::SetUrl { url } => {
            Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", url, e))?;
            let mut state = load_state()?;
            state.api_url = Some(url.clone());
            save_state(&state)?;
            output_success(output_format, &format!("API URL set to {}", url), Some(json!({ "api_url": url })))
        }
        ConfigCommands::Show => {
            let state = load_state()?;
            let app = state.app_config();
            output_value(
                output_format,
                &json!({
                    "environment": format!("{:?}", app.environment),
                    "api_url": app.api.base_url,
                    "timeout_secs": app.api.timeout_secs,
                    "debounce_ms": app.ui.debounce_ms,
                    "reference_stale_secs": app.cache.reference_stale_secs,
                    "enum_stale_secs": app.cache.enum_stale_secs,
                }),
            )
        }
    }
}
