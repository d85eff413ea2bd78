use clap::Args;

use crate::cli::config::load_state;
use crate::cli::utils::{failure, output_value};
use crate::cli::OutputFormat;
use crate::enums::EnumScope;
use crate::types::Id;

#[derive(Args)]
pub struct EnumsArgs {
    #[arg(help = "Enumeration group: mosques or workers")]
    pub group: String,
    #[arg(long, help = "Scope by branch id")]
    pub branch_id: Option<String>,
    #[arg(long, help = "Scope by district id")]
    pub district_id: Option<String>,
    #[arg(long, help = "Scope by mosque name")]
    pub name: Option<String>,
}

pub async fn handle(args: EnumsArgs, output_format: &OutputFormat) -> anyhow::Result<()> {
    let registry = load_state()?.registry()?;
    let scope = EnumScope {
        branch_id: args.branch_id.map(Id::new),
        district_id: args.district_id.map(Id::new),
        name: args.name,
    };

    let set = registry
        .get_enums_named(&args.group, &scope)
        .await
        .map_err(|e| failure(e, "Could not load enumerations"))?;

    match output_format {
        OutputFormat::Json => output_value(output_format, &serde_json::to_value(&set)?),
        OutputFormat::Text => {
            if set.is_empty() {
                println!("No enumerations returned");
            }
            for (name, values) in &set {
                println!("{}: {}", name, values.join(", "));
            }
            Ok(())
        }
    }
}
