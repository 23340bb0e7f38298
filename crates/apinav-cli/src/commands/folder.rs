//! Folder management CLI commands.

use clap::{Args, Subcommand};

use apinav_core::error::AppError;
use apinav_core::types::id::{CollectionId, FolderId};
use apinav_service::{CollectionService, Mutation};

use crate::output::OutputFormat;

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Create a folder
    Add {
        /// Collection ID
        collection: String,
        /// Folder name
        name: String,
        /// Parent folder path as `id/id` (omit for the collection root)
        #[arg(short, long, default_value = "")]
        path: String,
    },
    /// Rename a folder
    Rename {
        /// Collection ID
        collection: String,
        /// Folder ID
        folder: String,
        /// New name
        name: String,
    },
    /// Delete a folder and everything in it
    Delete {
        /// Collection ID
        collection: String,
        /// Folder ID
        folder: String,
    },
    /// Deep-copy a folder next to the original
    Duplicate {
        /// Collection ID
        collection: String,
        /// Folder ID
        folder: String,
    },
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    service: &CollectionService,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mutation = match &args.command {
        FolderCommand::Add {
            collection,
            name,
            path,
        } => Mutation::AddFolder {
            collection_id: CollectionId::new(collection.as_str()),
            path: super::parse_path(path),
            name: name.clone(),
        },
        FolderCommand::Rename {
            collection,
            folder,
            name,
        } => Mutation::RenameFolder {
            collection_id: CollectionId::new(collection.as_str()),
            folder_id: FolderId::new(folder.as_str()),
            path: None,
            name: name.clone(),
        },
        FolderCommand::Delete { collection, folder } => Mutation::DeleteFolder {
            collection_id: CollectionId::new(collection.as_str()),
            folder_id: FolderId::new(folder.as_str()),
            path: None,
        },
        FolderCommand::Duplicate { collection, folder } => Mutation::DuplicateFolder {
            collection_id: CollectionId::new(collection.as_str()),
            folder_id: FolderId::new(folder.as_str()),
            path: None,
        },
    };
    super::run_mutation(service, mutation, format).await
}
