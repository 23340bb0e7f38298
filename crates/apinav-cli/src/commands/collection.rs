//! Collection management CLI commands.

use clap::{Args, Subcommand};

use apinav_core::error::AppError;
use apinav_core::types::id::CollectionId;
use apinav_service::{CollectionService, Mutation};

use crate::output::OutputFormat;

/// Arguments for collection commands
#[derive(Debug, Args)]
pub struct CollectionArgs {
    /// Collection subcommand
    #[command(subcommand)]
    pub command: CollectionCommand,
}

/// Collection subcommands
#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// Create an empty collection
    Add {
        /// Collection name
        name: String,
    },
    /// Rename a collection
    Rename {
        /// Collection ID
        collection: String,
        /// New name
        name: String,
    },
    /// Delete a collection and everything in it
    Delete {
        /// Collection ID
        collection: String,
    },
    /// Deep-copy a collection
    Duplicate {
        /// Collection ID
        collection: String,
    },
    /// Delete every collection
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Execute collection commands
pub async fn execute(
    args: &CollectionArgs,
    service: &CollectionService,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mutation = match &args.command {
        CollectionCommand::Add { name } => Mutation::AddCollection { name: name.clone() },
        CollectionCommand::Rename { collection, name } => Mutation::RenameCollection {
            collection_id: CollectionId::new(collection.as_str()),
            name: name.clone(),
        },
        CollectionCommand::Delete { collection } => Mutation::DeleteCollection {
            collection_id: CollectionId::new(collection.as_str()),
        },
        CollectionCommand::Duplicate { collection } => Mutation::DuplicateCollection {
            collection_id: CollectionId::new(collection.as_str()),
        },
        CollectionCommand::Clear { yes } => {
            if !yes {
                return Err(AppError::malformed_intent(
                    "Refusing to delete every collection without --yes",
                ));
            }
            Mutation::ClearCollections
        }
    };
    super::run_mutation(service, mutation, format).await
}
