//! Request history CLI commands.

use chrono::{Local, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use apinav_core::error::AppError;
use apinav_core::types::id::HistoryId;
use apinav_entity::HistoryEntry;
use apinav_service::HistoryService;

use crate::output::{self, OutputFormat};

/// Arguments for history commands
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// History subcommand
    #[command(subcommand)]
    pub command: HistoryCommand,
}

/// History subcommands
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List entries grouped by day
    List,
    /// Record a sent request
    Add {
        /// HTTP method
        method: String,
        /// Target URL
        url: String,
    },
    /// Delete one entry
    Delete {
        /// Entry ID
        id: String,
    },
    /// Copy an entry to the top of the list
    Duplicate {
        /// Entry ID
        id: String,
    },
    /// Delete every entry under a day label (`Today`, `Yesterday`, `Mar 4`)
    ClearGroup {
        /// Day label
        label: String,
    },
    /// Delete every entry
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// History display row
#[derive(Debug, Serialize, Tabled)]
struct HistoryRow {
    /// Day label
    day: String,
    /// Entry ID
    id: String,
    /// Method
    method: String,
    /// URL
    url: String,
    /// Sent at
    sent_at: String,
}

/// Execute history commands
pub async fn execute(
    args: &HistoryArgs,
    service: &HistoryService,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        HistoryCommand::List => {
            let now = Local::now();
            let rows: Vec<HistoryRow> = service
                .groups(&now)
                .await?
                .into_iter()
                .flat_map(|group| {
                    let label = group.label;
                    group.entries.into_iter().map(move |e| HistoryRow {
                        day: label.clone(),
                        id: e.id.to_string(),
                        method: e.method,
                        url: e.url,
                        sent_at: e
                            .timestamp
                            .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    })
                })
                .collect();
            output::print_list(&rows, format);
        }
        HistoryCommand::Add { method, url } => {
            let entry = HistoryEntry::new(HistoryId::new(""), method.to_uppercase(), url.as_str(), Utc::now());
            let added = service.add(entry).await?;
            report(format, &added, &format!("Recorded {}", added.id));
        }
        HistoryCommand::Delete { id } => {
            service.delete(&HistoryId::new(id.as_str())).await?;
            output::print_success(&format!("Deleted {id}"));
        }
        HistoryCommand::Duplicate { id } => {
            let copy = service.duplicate(&HistoryId::new(id.as_str()), Utc::now()).await?;
            report(format, &copy, &format!("Duplicated {id} as {}", copy.id));
        }
        HistoryCommand::ClearGroup { label } => {
            let removed = service.clear_group(label, &Local::now()).await?;
            output::print_success(&format!("Removed {removed} entries under {label}"));
        }
        HistoryCommand::Clear { yes } => {
            if !yes {
                return Err(AppError::malformed_intent("Refusing to clear history without --yes"));
            }
            let removed = service.clear().await?;
            output::print_success(&format!("Removed {removed} entries"));
        }
    }
    Ok(())
}

fn report(format: OutputFormat, entry: &HistoryEntry, message: &str) {
    match format {
        OutputFormat::Json => output::print_json(entry),
        OutputFormat::Table => output::print_success(message),
    }
}
