//! Request management CLI commands.

use std::collections::BTreeMap;

use clap::{Args, Subcommand};

use apinav_core::error::AppError;
use apinav_core::types::id::{CollectionId, RequestId};
use apinav_entity::{AuthDescriptor, Encoded, FolderPath, RequestPatch};
use apinav_service::{CollectionService, Mutation};

use crate::output::OutputFormat;

/// Arguments for request commands
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Request subcommand
    #[command(subcommand)]
    pub command: RequestCommand,
}

/// Request addressed by id, optionally with the path of its container
#[derive(Debug, Args)]
pub struct RequestRef {
    /// Collection ID
    pub collection: String,
    /// Request ID
    pub request: String,
    /// Container path as `id/id`; located by id when omitted
    #[arg(short, long)]
    pub path: Option<String>,
}

/// Request fields; omitted flags are left unchanged, empty values clear
#[derive(Debug, Default, Args)]
pub struct RequestFields {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    /// HTTP method
    #[arg(short = 'X', long)]
    pub method: Option<String>,
    /// URL
    #[arg(long)]
    pub url: Option<String>,
    /// Header as `Key=Value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
    /// Query parameter as `key=value` (repeatable)
    #[arg(short = 'q', long = "query")]
    pub query: Vec<String>,
    /// Body
    #[arg(long)]
    pub body: Option<String>,
    /// Bearer token
    #[arg(long)]
    pub bearer: Option<String>,
    /// Description
    #[arg(long)]
    pub description: Option<String>,
}

impl RequestFields {
    /// Build the patch these flags describe.
    pub fn to_patch(&self) -> Result<RequestPatch, AppError> {
        Ok(RequestPatch {
            name: self.name.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            headers: pairs(&self.headers)?.map(Encoded::new),
            query: pairs(&self.query)?.map(Encoded::new),
            body: self.body.clone(),
            auth: self.bearer.as_deref().map(AuthDescriptor::bearer).map(Encoded::new),
            description: self.description.clone(),
            ..Default::default()
        })
    }
}

fn pairs(raw: &[String]) -> Result<Option<BTreeMap<String, String>>, AppError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| AppError::malformed_intent(format!("Expected key=value, got '{pair}'")))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

/// Request subcommands
#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Create a request
    Add {
        /// Collection ID
        collection: String,
        /// Container path as `id/id` (omit for the collection root)
        #[arg(short, long, default_value = "")]
        path: String,
        /// Request fields
        #[command(flatten)]
        fields: RequestFields,
    },
    /// Merge fields into a request
    Update {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
        /// Request fields
        #[command(flatten)]
        fields: RequestFields,
    },
    /// Rename a request
    Rename {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
        /// New name
        #[arg(long = "to")]
        new_name: String,
    },
    /// Delete a request
    Delete {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
    },
    /// Copy a request next to the original
    Duplicate {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
    },
    /// Hide a request from the sidebar
    Hide {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
    },
    /// Show a hidden request again
    Show {
        /// Target request
        #[command(flatten)]
        target: RequestRef,
    },
    /// Save a request under folders named `A/B`, creating missing ones
    Save {
        /// Collection ID
        collection: String,
        /// Folder names from the collection root
        #[arg(long, default_value = "")]
        folders: String,
        /// Request fields
        #[command(flatten)]
        fields: RequestFields,
    },
}

impl RequestRef {
    fn collection_id(&self) -> CollectionId {
        CollectionId::new(self.collection.as_str())
    }

    fn request_id(&self) -> RequestId {
        RequestId::new(self.request.as_str())
    }

    fn folder_path(&self) -> Option<FolderPath> {
        self.path.as_deref().map(super::parse_path)
    }
}

/// Execute request commands
pub async fn execute(
    args: &RequestArgs,
    service: &CollectionService,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mutation = match &args.command {
        RequestCommand::Add {
            collection,
            path,
            fields,
        } => Mutation::AddRequest {
            collection_id: CollectionId::new(collection.as_str()),
            path: super::parse_path(path),
            draft: fields.to_patch()?,
        },
        RequestCommand::Update { target, fields } => Mutation::UpdateRequest {
            collection_id: target.collection_id(),
            request_id: target.request_id(),
            path: target.folder_path(),
            patch: fields.to_patch()?,
        },
        RequestCommand::Rename { target, new_name } => Mutation::RenameRequest {
            collection_id: target.collection_id(),
            request_id: target.request_id(),
            path: target.folder_path(),
            name: new_name.clone(),
        },
        RequestCommand::Delete { target } => Mutation::DeleteRequest {
            collection_id: target.collection_id(),
            request_id: target.request_id(),
            path: target.folder_path(),
        },
        RequestCommand::Duplicate { target } => Mutation::DuplicateRequest {
            collection_id: target.collection_id(),
            request_id: target.request_id(),
            path: target.folder_path(),
        },
        RequestCommand::Hide { target } | RequestCommand::Show { target } => Mutation::SetRequestHidden {
            collection_id: target.collection_id(),
            request_id: target.request_id(),
            path: target.folder_path(),
            hidden: matches!(args.command, RequestCommand::Hide { .. }),
        },
        RequestCommand::Save {
            collection,
            folders,
            fields,
        } => Mutation::SaveRequestAtNames {
            collection_id: CollectionId::new(collection.as_str()),
            folder_names: folders
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            draft: fields.to_patch()?,
        },
    };
    super::run_mutation(service, mutation, format).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_to_patch() {
        let fields = RequestFields {
            url: Some("https://x/y".to_string()),
            headers: vec!["Accept = application/json".to_string()],
            bearer: Some("t0k".to_string()),
            description: Some(String::new()),
            ..Default::default()
        };
        let patch = fields.to_patch().unwrap();
        assert_eq!(patch.url.as_deref(), Some("https://x/y"));
        assert_eq!(
            patch.headers.unwrap().get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(patch.query, None);
        assert_eq!(patch.auth.unwrap().kind, "bearer");
        assert_eq!(patch.description.as_deref(), Some(""));
    }

    #[test]
    fn test_bad_pair_is_rejected() {
        let fields = RequestFields {
            query: vec!["novalue".to_string()],
            ..Default::default()
        };
        assert!(fields.to_patch().is_err());
    }
}
