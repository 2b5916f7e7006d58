//! Story store connection configuration.

use std::time::Duration;

use mongodb::options::ClientOptions;

use crate::error::{StoreError, StoreResult};

/// Connection configuration for the story store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Retry reads.
    pub retry_reads: Option<bool>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: String::new(),
            app_name: Some("storyvault".to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            retry_reads: Some(true),
            retry_writes: Some(true),
            direct_connection: None,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration from a MongoDB URI and database name.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// Convert to MongoDB ClientOptions.
    pub async fn to_client_options(&self) -> StoreResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| StoreError::config(format!("failed to parse URI: {}", e)))?;

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }

        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }

        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            options.connect_timeout = Some(connect_timeout);
        }

        if let Some(selection_timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(selection_timeout);
        }

        if let Some(retry_reads) = self.retry_reads {
            options.retry_reads = Some(retry_reads);
        }

        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }

        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }

        Ok(options)
    }
}

/// Builder for story store configuration.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    retry_reads: Option<bool>,
    retry_writes: Option<bool>,
    direct_connection: Option<bool>,
}

impl StoreConfigBuilder {
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

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Enable or disable retry reads.
    pub fn retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = Some(enabled);
        self
    }

    /// Enable or disable retry writes.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StoreResult<StoreConfig> {
        let database = self
            .database
            .ok_or_else(|| StoreError::config("database name is required"))?;

        Ok(StoreConfig {
            uri: self
                .uri
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database,
            app_name: self.app_name.or(Some("storyvault".to_string())),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(Some(10)),
            connect_timeout: self.connect_timeout.or(Some(Duration::from_secs(10))),
            server_selection_timeout: self
                .server_selection_timeout
                .or(Some(Duration::from_secs(30))),
            retry_reads: self.retry_reads.or(Some(true)),
            retry_writes: self.retry_writes.or(Some(true)),
            direct_connection: self.direct_connection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_uri() {
        let config = StoreConfig::from_uri("mongodb://localhost:27017", "mongo_stories");
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "mongo_stories");
        assert_eq!(config.app_name, Some("storyvault".to_string()));
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::builder()
            .uri("mongodb://localhost:27017")
            .database("mongo_stories")
            .app_name("stories-loader")
            .max_pool_size(20)
            .build()
            .unwrap();

        assert_eq!(config.database, "mongo_stories");
        assert_eq!(config.app_name, Some("stories-loader".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
    }

    #[test]
    fn test_config_builder_missing_database() {
        let result = StoreConfig::builder().uri("mongodb://localhost:27017").build();

        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = StoreConfig::builder().database("mongo_stories").build().unwrap();

        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.max_pool_size, Some(10));
        assert_eq!(config.retry_writes, Some(true));
    }
}
