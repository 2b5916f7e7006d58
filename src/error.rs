//! Error types for story store operations.
//!
//! Empty query results and zero-match updates are ordinary outcomes in this
//! facade and never map to an error variant.

use thiserror::Error;

/// Result type for story store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// MongoDB driver error, surfaced unchanged.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Bulk-load file missing, unreadable, or not valid JSON.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// Loaded element does not have the required story shape.
    #[error("schema error: {0}")]
    Schema(String),

    /// Unexpected response shape from a query or pipeline.
    #[error("query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a malformed data error.
    pub fn malformed_data(message: impl Into<String>) -> Self {
        Self::MalformedData(message.into())
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a malformed data error.
    pub fn is_malformed_data(&self) -> bool {
        matches!(self, Self::MalformedData(_))
    }

    /// Check if this is a schema error.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StoreError::config("invalid URI");
        assert!(matches!(err, StoreError::Config(_)));

        let err = StoreError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = StoreError::malformed_data("not valid JSON");
        assert!(err.is_malformed_data());

        let err = StoreError::schema("missing field");
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::config("test error");
        assert_eq!(err.to_string(), "configuration error: test error");

        let err = StoreError::malformed_data("stories.json: no such file");
        assert_eq!(err.to_string(), "malformed data: stories.json: no such file");

        let err = StoreError::Schema("element 3 is not an object".to_string());
        assert_eq!(err.to_string(), "schema error: element 3 is not an object");
    }
}
