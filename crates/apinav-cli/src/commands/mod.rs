//! CLI command definitions and dispatch.

pub mod api;
pub mod collection;
pub mod folder;
pub mod history;
pub mod request;
pub mod view;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use apinav_core::config::AppConfig;
use apinav_core::error::AppError;
use apinav_core::types::generator::{IdGenerator, UuidGenerator};
use apinav_core::types::id::FolderId;
use apinav_entity::FolderPath;
use apinav_service::{
    ApiCatalogService, CollectionService, HistoryService, Mutation, SavePolicy, TreeMutator,
};
use apinav_storage::{ApiStore, CollectionStore, HistoryStore, build_backend};

use crate::output::{self, OutputFormat};

/// apinav: API request collections from the command line
#[derive(Debug, Parser)]
#[command(name = "apinav", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (loads config/<env>.toml over config/default.toml)
    #[arg(short, long, default_value = "development")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every collection
    Collections,
    /// Print a collection's folder/request tree
    Tree(view::TreeArgs),
    /// Print one collection as JSON
    Export(view::ExportArgs),
    /// Collection management
    Collection(collection::CollectionArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// Request management
    Request(request::RequestArgs),
    /// Request history
    History(history::HistoryArgs),
    /// Saved API list
    Api(api::ApiArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let services = open_services(&self.config).await?;
        let service = &services.collections;
        match &self.command {
            Commands::Collections => view::list(service, self.format).await,
            Commands::Tree(args) => view::tree(args, service, self.format).await,
            Commands::Export(args) => view::export(args, service).await,
            Commands::Collection(args) => collection::execute(args, service, self.format).await,
            Commands::Folder(args) => folder::execute(args, service, self.format).await,
            Commands::Request(args) => request::execute(args, service, self.format).await,
            Commands::History(args) => history::execute(args, &services.history, self.format).await,
            Commands::Api(args) => api::execute(args, &services.apis, self.format).await,
        }
    }
}

/// Services over one configured backend
pub struct Services {
    /// Collections tree
    pub collections: CollectionService,
    /// Request history
    pub history: HistoryService,
    /// Saved API list
    pub apis: ApiCatalogService,
}

/// Helper: wire stores and services from configuration
pub async fn open_services(env: &str) -> Result<Services, AppError> {
    let config = AppConfig::load(env)?;
    let backend = build_backend(&config.store).await?;
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
    let policy = SavePolicy::from(&config.sync);

    let store = Arc::new(CollectionStore::new(backend.clone(), config.store.state_key.clone()));
    let collections = CollectionService::new(store, TreeMutator::new(ids.clone()), &config.sync);
    let history = HistoryService::new(
        Arc::new(HistoryStore::new(backend.clone(), config.store.history_key.clone())),
        ids,
        config.store.history_limit,
        policy,
    );
    let apis = ApiCatalogService::new(
        Arc::new(ApiStore::new(backend, config.store.apis_key.clone())),
        policy,
    );
    Ok(Services {
        collections,
        history,
        apis,
    })
}

/// Helper: parse `f1/f2` (or an empty string) into a folder path
pub fn parse_path(raw: &str) -> FolderPath {
    FolderPath::new(
        raw.split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FolderId::new)
            .collect(),
    )
}

/// Summary printed after a mutation
#[derive(Debug, Serialize)]
struct MutationSummary<'a> {
    op: &'a str,
    changed: bool,
    version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
}

/// Helper: apply a mutation and report the outcome
pub async fn run_mutation(
    service: &CollectionService,
    mutation: Mutation,
    format: OutputFormat,
) -> Result<(), AppError> {
    let op = mutation.op_name();
    let outcome = service.apply(mutation).await?;
    let summary = MutationSummary {
        op,
        changed: outcome.changed,
        version: outcome.version.value(),
        created: outcome.created,
    };

    match format {
        OutputFormat::Json => output::print_json(&summary),
        OutputFormat::Table => match (&summary.created, summary.changed) {
            (Some(id), _) => output::print_success(&format!("{op}: created {id}")),
            (None, true) => output::print_success(&format!("{op}: saved ({})", outcome.version)),
            (None, false) => output::print_warning(&format!("{op}: nothing changed")),
        },
    }
    Ok(())
}
