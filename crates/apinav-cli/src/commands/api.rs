//! Saved API list CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use apinav_core::error::AppError;
use apinav_service::ApiCatalogService;

use crate::output::{self, OutputFormat};

/// Arguments for API list commands
#[derive(Debug, Args)]
pub struct ApiArgs {
    /// API subcommand
    #[command(subcommand)]
    pub command: ApiCommand,
}

/// API list subcommands
#[derive(Debug, Subcommand)]
pub enum ApiCommand {
    /// List saved APIs
    List,
    /// Save an API
    Add {
        /// API name
        name: String,
        /// Version tag (defaults to v1.0)
        #[arg(long)]
        version: Option<String>,
    },
    /// Delete every saved API
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// API display row
#[derive(Debug, Serialize, Tabled)]
struct ApiRow {
    /// Name
    name: String,
    /// Version
    version: String,
}

/// Execute API list commands
pub async fn execute(
    args: &ApiArgs,
    service: &ApiCatalogService,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ApiCommand::List => {
            let rows: Vec<ApiRow> = service
                .list()
                .await?
                .into_iter()
                .map(|a| ApiRow {
                    name: a.name,
                    version: a.version,
                })
                .collect();
            output::print_list(&rows, format);
        }
        ApiCommand::Add { name, version } => {
            let api = service.add(name, version.as_deref()).await?;
            match format {
                OutputFormat::Json => output::print_json(&api),
                OutputFormat::Table => {
                    output::print_success(&format!("Saved {} {}", api.name, api.version))
                }
            }
        }
        ApiCommand::Clear { yes } => {
            if !yes {
                return Err(AppError::malformed_intent("Refusing to clear saved APIs without --yes"));
            }
            let removed = service.clear().await?;
            output::print_success(&format!("Removed {removed} APIs"));
        }
    }
    Ok(())
}
