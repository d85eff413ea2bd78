pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "registry")]
#[command(about = "Registry CLI - Command-line interface for the mosque-affairs dashboard API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Local CLI settings")]
    Config {
        #[command(subcommand)]
        cmd: commands::config::ConfigCommands,
    },

    #[command(flatten)]
    Data(commands::data::DataCommands),

    #[command(about = "Show enumeration values (mosques or workers)")]
    Enums(commands::enums::EnumsArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &output_format).await,
        Commands::Config { cmd } => commands::config::handle(cmd, &output_format).await,
        Commands::Data(cmd) => commands::data::handle(cmd, &output_format).await,
        Commands::Enums(args) => commands::enums::handle(args, &output_format).await,
    };

    // JSON callers get a machine-readable failure; text callers get stderr from main
    if let (Err(e), OutputFormat::Json) = (&result, &output_format) {
        utils::output_error(&output_format, &e.to_string(), utils::error_code_of(e))?;
    }
    result
}
