//! Story store client and collection handle.

use std::sync::Arc;

use bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::story::Story;

/// A client bound to one logical story database.
///
/// The MongoDB driver handles connection pooling internally; this wraps the
/// driver's `Client` and the named `Database` so that every facade call
/// receives an explicit handle instead of relying on an ambient "current
/// database" selection.
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    database: Database,
    config: Arc<StoreConfig>,
}

impl StoreClient {
    /// Create a new client from configuration.
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| StoreError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            uri = %config.uri,
            database = %config.database,
            "story store client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Create a builder for the client.
    pub fn builder() -> StoreClientBuilder {
        StoreClientBuilder::new()
    }

    /// Bind a collection handle by name.
    ///
    /// Binding never fails: a collection that does not exist yet is created
    /// lazily by the server on first write.
    pub fn collection(&self, name: &str) -> StoryCollection {
        StoryCollection {
            stories: self.database.collection(name),
            raw: self.database.collection(name),
            name: name.to_string(),
        }
    }

    /// Explicitly create a collection, mirroring `db.createCollection`.
    ///
    /// Not required before writing; the server errors if the collection
    /// already exists and that error is surfaced unchanged.
    pub async fn create_collection(&self, name: &str) -> StoreResult<()> {
        debug!(collection = %name, "creating collection");
        self.database
            .create_collection(name, None)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    /// Check if the client is healthy by pinging the server.
    pub async fn ping(&self) -> bool {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    /// List all collection names in the database.
    pub async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let names = self
            .database
            .list_collection_names(None)
            .await
            .map_err(StoreError::from)?;
        Ok(names)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying MongoDB client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

/// An explicit handle to one story collection.
///
/// All query, aggregation, update, and bulk-load operations take place
/// through a handle obtained from [`StoreClient::collection`]. Cloning is
/// cheap; clones share the driver's pooled connections.
#[derive(Clone)]
pub struct StoryCollection {
    pub(crate) stories: Collection<Story>,
    pub(crate) raw: Collection<Document>,
    pub(crate) name: String,
}

impl StoryCollection {
    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying typed collection.
    pub fn inner(&self) -> &Collection<Story> {
        &self.stories
    }
}

/// Builder for StoreClient.
#[derive(Debug, Default)]
pub struct StoreClientBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<std::time::Duration>,
    direct_connection: Option<bool>,
}

impl StoreClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: std::time::Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the client.
    pub async fn build(self) -> StoreResult<StoreClient> {
        let mut config_builder = StoreConfig::builder();

        if let Some(uri) = self.uri {
            config_builder = config_builder.uri(uri);
        }

        if let Some(database) = self.database {
            config_builder = config_builder.database(database);
        }

        if let Some(app_name) = self.app_name {
            config_builder = config_builder.app_name(app_name);
        }

        if let Some(max_pool) = self.max_pool_size {
            config_builder = config_builder.max_pool_size(max_pool);
        }

        if let Some(timeout) = self.connect_timeout {
            config_builder = config_builder.connect_timeout(timeout);
        }

        if let Some(direct) = self.direct_connection {
            config_builder = config_builder.direct_connection(direct);
        }

        let config = config_builder.build()?;
        StoreClient::new(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let builder = StoreClientBuilder::new()
            .uri("mongodb://localhost:27017")
            .database("mongo_stories")
            .max_pool_size(20);

        assert_eq!(builder.uri, Some("mongodb://localhost:27017".to_string()));
        assert_eq!(builder.database, Some("mongo_stories".to_string()));
        assert_eq!(builder.max_pool_size, Some(20));
    }
}
