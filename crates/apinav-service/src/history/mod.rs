//! Side lists kept next to the collections: request history and saved APIs.

pub mod apis;
pub mod service;

pub use apis::ApiCatalogService;
pub use service::HistoryService;
