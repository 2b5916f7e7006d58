//! One-time bulk loading of story data from a JSON file.
//!
//! The load is split in two: [`load_from_file`] turns a JSON array file
//! into validated [`Story`] values, and [`StoryCollection::insert_all`]
//! performs a single unordered bulk insert. Neither step deduplicates, so
//! loading the same file twice duplicates every document.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use mongodb::options::InsertManyOptions;
use tracing::{debug, info};

use crate::client::StoryCollection;
use crate::error::{StoreError, StoreResult};
use crate::story::Story;

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReport {
    /// Number of documents the server acknowledged.
    pub inserted_count: u64,
}

/// Read a JSON array of stories from a file.
///
/// Fails with [`StoreError::MalformedData`] when the file is missing,
/// unreadable, or not valid JSON, and with [`StoreError::Schema`] when the
/// top level is not an array, an element is not an object, a required field
/// is missing or mistyped, or a `datetime` is not `YYYY-MM-DD`.
pub fn load_from_file(path: impl AsRef<Path>) -> StoreResult<Vec<Story>> {
    let path = path.as_ref();

    let text = fs::read_to_string(path).map_err(|e| {
        StoreError::malformed_data(format!("failed to read {}: {}", path.display(), e))
    })?;

    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        StoreError::malformed_data(format!("{} is not valid JSON: {}", path.display(), e))
    })?;

    let elements = value
        .as_array()
        .ok_or_else(|| StoreError::schema("top-level JSON value is not an array"))?;

    let stories = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(StoreError::schema(format!(
                    "element {} is not an object",
                    index
                )));
            }

            let story: Story = serde_json::from_value(element.clone())
                .map_err(|e| StoreError::schema(format!("element {}: {}", index, e)))?;

            validate_datetime(&story.datetime).map_err(|reason| {
                StoreError::schema(format!("element {}: {}", index, reason))
            })?;

            Ok(story)
        })
        .collect::<StoreResult<Vec<_>>>()?;

    debug!(path = %path.display(), count = stories.len(), "loaded stories from file");

    Ok(stories)
}

/// Dates must round-trip through `YYYY-MM-DD` exactly, otherwise lexical
/// ordering on `datetime` no longer matches chronological ordering.
fn validate_datetime(value: &str) -> Result<(), String> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) if date.format("%Y-%m-%d").to_string() == value => Ok(()),
        Ok(_) => Err(format!("datetime '{}' is not zero-padded YYYY-MM-DD", value)),
        Err(e) => Err(format!("datetime '{}' is not a valid date: {}", value, e)),
    }
}

impl StoryCollection {
    /// Insert all stories in one unordered bulk write.
    ///
    /// Unordered means the server keeps inserting after an individual
    /// document failure; any error is still surfaced unchanged. An empty
    /// input short-circuits because the driver rejects empty batches.
    pub async fn insert_all(&self, stories: Vec<Story>) -> StoreResult<InsertReport> {
        if stories.is_empty() {
            return Ok(InsertReport { inserted_count: 0 });
        }

        let options = InsertManyOptions::builder().ordered(false).build();

        let result = self
            .stories
            .insert_many(stories, options)
            .await
            .map_err(StoreError::from)?;

        let report = InsertReport {
            inserted_count: result.inserted_ids.len() as u64,
        };

        info!(
            collection = %self.name,
            inserted = report.inserted_count,
            "bulk insert finished"
        );

        Ok(report)
    }
}
