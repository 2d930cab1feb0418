//! Storefront review ingestion: page user reviews per title from the public
//! `appreviews` endpoint and upsert titles, reviewers and reviews into SQLite.

pub mod config;
pub mod fetch;
pub mod import;
pub mod ingest;
pub mod models;
pub mod query;
pub mod selector;
pub mod storage;
pub mod tracing;

pub mod util {
    pub mod env;
}
