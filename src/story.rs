//! The story document model and aggregation row types.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A single story document.
///
/// `datetime` is stored as `YYYY-MM-DD` text so that lexical ordering
/// matches chronological ordering. The loader enforces this at the write
/// boundary; queries and pipelines rely on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Document id, assigned by the server on insert.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Human-readable title, not guaranteed unique.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Publication date in `YYYY-MM-DD` lexical format.
    pub datetime: String,
    /// Free-text story body.
    pub story: String,
}

impl Story {
    /// Create a story with no id (the server assigns one on insert).
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        datetime: impl Into<String>,
        story: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            datetime: datetime.into(),
            story: story.into(),
        }
    }

    /// Body length in Unicode code points, matching `$strLenCP`.
    pub fn length(&self) -> usize {
        self.story.chars().count()
    }
}

/// Story count for a single author.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorCount {
    /// Author name.
    #[serde(rename = "_id")]
    pub author: String,
    /// Number of stories by the author.
    pub count: i64,
}

/// Story count for a single `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthCount {
    /// Month key, the first seven characters of `datetime`.
    #[serde(rename = "_id")]
    pub month: String,
    /// Number of stories published in the month.
    pub count: i64,
}

/// Average body length statistics for a single author.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorLengthStats {
    /// Author name.
    #[serde(rename = "_id")]
    pub author: String,
    /// Mean body length in code points.
    pub average_length: f64,
    /// Number of stories contributing to the mean.
    pub total_stories: i64,
}

/// Story count for a single length category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LengthCategoryCount {
    /// Category label.
    #[serde(rename = "_id")]
    pub category: String,
    /// Number of stories in the category.
    pub count: i64,
}
