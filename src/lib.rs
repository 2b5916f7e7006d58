//! # storyvault
//!
//! A thin query-and-aggregation facade over a MongoDB collection of short
//! stories.
//!
//! This crate provides:
//! - Connection management with the official MongoDB driver
//! - A one-time bulk loader for a JSON array of stories
//! - The finite set of read operations the archive needs (exact-match
//!   find, sort+limit, date-range filters, random sampling, distinct
//!   values)
//! - Fixed, server-side aggregation pipelines (counts by author and month,
//!   average-length statistics, recency-window facets, length bucketing)
//! - Single-document author updates keyed by title
//!
//! Query planning, indexing, and aggregation semantics all belong to the
//! server; nothing here reimplements them. Handles are explicit: a caller
//! builds a [`StoreClient`], binds a [`StoryCollection`], and passes that
//! handle into every operation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use storyvault::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StoreClient::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database("mongo_stories")
//!         .build()
//!         .await?;
//!
//!     let stories = client.collection("stories");
//!
//!     // One-time setup.
//!     let documents = loader::load_from_file("Short_Stories.json")?;
//!     stories.insert_all(documents).await?;
//!
//!     // Queries and aggregations.
//!     let recent = stories.find_recent(5).await?;
//!     let by_author = stories.count_by_author().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod loader;
pub mod query;
pub mod story;
pub mod update;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use aggregate::{LengthThreshold, RecencyWindow};
pub use client::{StoreClient, StoreClientBuilder, StoryCollection};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{StoreError, StoreResult};
pub use loader::{InsertReport, load_from_file};
pub use story::{AuthorCount, AuthorLengthStats, LengthCategoryCount, MonthCount, Story};
pub use update::UpdateReport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use bson::oid::ObjectId;

    pub use crate::aggregate::{LengthThreshold, RecencyWindow};
    pub use crate::client::{StoreClient, StoreClientBuilder, StoryCollection};
    pub use crate::config::{StoreConfig, StoreConfigBuilder};
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::loader::{self, InsertReport};
    pub use crate::story::Story;
    pub use crate::update::UpdateReport;
}
