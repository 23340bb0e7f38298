//! Read-only views: collection list, tree, export.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use apinav_core::error::AppError;
use apinav_core::types::id::CollectionId;
use apinav_entity::{Collection, Folder, RequestRecord, TreeContainer};
use apinav_service::CollectionService;

use crate::output::{self, OutputFormat};

/// Arguments for `tree`
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Collection ID
    pub collection: String,
    /// Include requests flagged hidden
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `export`
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Collection ID
    pub collection: String,
}

/// Collection display row
#[derive(Debug, Serialize, Tabled)]
struct CollectionRow {
    /// Collection ID
    id: String,
    /// Name
    name: String,
    /// Folders at any depth
    folders: usize,
    /// Requests at any depth
    requests: usize,
    /// Created at
    created_at: String,
}

/// List every collection
pub async fn list(service: &CollectionService, format: OutputFormat) -> Result<(), AppError> {
    let snapshot = service.snapshot().await?.value;
    let rows: Vec<CollectionRow> = snapshot
        .collections()
        .iter()
        .map(|c| CollectionRow {
            id: c.id.to_string(),
            name: c.name.clone(),
            folders: c.total_folders(),
            requests: c.total_requests(),
            created_at: c
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}

/// Print a collection's tree
pub async fn tree(args: &TreeArgs, service: &CollectionService, format: OutputFormat) -> Result<(), AppError> {
    let snapshot = service.snapshot().await?.value;
    let id = CollectionId::new(args.collection.as_str());
    let collection = snapshot
        .collection(&id)
        .ok_or_else(|| AppError::not_found(format!("Collection {id} not found")))?;

    match format {
        OutputFormat::Json => output::print_json(collection),
        OutputFormat::Table => output::print_lines(&render_tree(collection, args.all)),
    }
    Ok(())
}

/// Print one collection as pretty JSON
pub async fn export(args: &ExportArgs, service: &CollectionService) -> Result<(), AppError> {
    let json = service
        .export_collection(&CollectionId::new(args.collection.as_str()))
        .await?;
    println!("{json}");
    Ok(())
}

/// Render a collection as indented lines, folders before requests.
pub fn render_tree(collection: &Collection, include_hidden: bool) -> Vec<String> {
    let mut lines = vec![format!("{} [{}]", collection.name, collection.id)];
    render_children(collection, 1, include_hidden, &mut lines);
    lines
}

fn render_children(container: &dyn TreeContainer, depth: usize, include_hidden: bool, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for folder in container.folders() {
        lines.push(folder_line(folder, &indent));
        render_children(folder, depth + 1, include_hidden, lines);
    }
    for request in container.requests() {
        if request.hidden && !include_hidden {
            continue;
        }
        lines.push(request_line(request, &indent));
    }
}

fn folder_line(folder: &Folder, indent: &str) -> String {
    format!("{indent}{}/ [{}]", folder.name, folder.id)
}

fn request_line(request: &RequestRecord, indent: &str) -> String {
    let hidden = if request.hidden { " (hidden)" } else { "" };
    format!(
        "{indent}{} {} [{}]{hidden}",
        request.method,
        request.display_name(),
        request.id
    )
}
