//! Read operations over the story collection.
//!
//! Every `find_*` call issues a fresh cursor; cursors are lazy, iterated at
//! most once, and never shared across tasks. An empty result is a valid
//! outcome everywhere and never an error.

use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::Cursor;
use mongodb::options::FindOptions;
use tracing::debug;

use crate::aggregate::random_sample_pipeline;
use crate::client::StoryCollection;
use crate::error::{StoreError, StoreResult};
use crate::story::Story;

impl StoryCollection {
    /// Find all stories, unordered.
    pub async fn find_all(&self) -> StoreResult<Cursor<Story>> {
        debug!(collection = %self.name, "find all");
        let cursor = self
            .stories
            .find(doc! {}, None)
            .await
            .map_err(StoreError::from)?;
        Ok(cursor)
    }

    /// Find stories whose `field` exactly equals `value`.
    pub async fn find_by_field(
        &self,
        field: &str,
        value: impl Into<Bson>,
    ) -> StoreResult<Cursor<Story>> {
        let filter = field_filter(field, value);
        debug!(collection = %self.name, filter = %filter, "find by field");
        let cursor = self
            .stories
            .find(filter, None)
            .await
            .map_err(StoreError::from)?;
        Ok(cursor)
    }

    /// Find stories with the given title.
    pub async fn find_by_title(&self, title: &str) -> StoreResult<Cursor<Story>> {
        self.find_by_field("title", title).await
    }

    /// Find stories by the given author.
    pub async fn find_by_author(&self, author: &str) -> StoreResult<Cursor<Story>> {
        self.find_by_field("author", author).await
    }

    /// The `limit` most recent stories, newest first.
    ///
    /// Order among stories sharing a `datetime` is store-defined.
    pub async fn find_recent(&self, limit: i64) -> StoreResult<Vec<Story>> {
        debug!(collection = %self.name, limit, "find recent");
        let cursor = self
            .stories
            .find(doc! {}, recent_options(limit))
            .await
            .map_err(StoreError::from)?;
        let stories = cursor.try_collect().await.map_err(StoreError::from)?;
        Ok(stories)
    }

    /// Stories strictly before `date` (lexical comparison on `datetime`).
    pub async fn find_before(&self, date: &str) -> StoreResult<Cursor<Story>> {
        let cursor = self
            .stories
            .find(doc! { "datetime": { "$lt": date } }, None)
            .await
            .map_err(StoreError::from)?;
        Ok(cursor)
    }

    /// Stories strictly after `date` (lexical comparison on `datetime`).
    pub async fn find_after(&self, date: &str) -> StoreResult<Cursor<Story>> {
        let cursor = self
            .stories
            .find(doc! { "datetime": { "$gt": date } }, None)
            .await
            .map_err(StoreError::from)?;
        Ok(cursor)
    }

    /// A uniformly-random sample of stories dated within `[start, end]`
    /// inclusive. Returns `min(count, matches)` stories; sampling is
    /// without replacement.
    pub async fn find_random_in_range(
        &self,
        start: &str,
        end: &str,
        count: i64,
    ) -> StoreResult<Vec<Story>> {
        debug!(collection = %self.name, start, end, count, "find random in range");

        let cursor = self
            .raw
            .aggregate(random_sample_pipeline(start, end, count), None)
            .await
            .map_err(StoreError::from)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(StoreError::from)?;

        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(StoreError::from))
            .collect()
    }

    /// Unique values of `field` across the whole collection, unordered.
    pub async fn distinct_values(&self, field: &str) -> StoreResult<Vec<Bson>> {
        let values = self
            .stories
            .distinct(field, None, None)
            .await
            .map_err(StoreError::from)?;
        Ok(values)
    }

    /// Unique author names across the whole collection.
    pub async fn distinct_authors(&self) -> StoreResult<Vec<String>> {
        let values = self.distinct_values("author").await?;
        Ok(values
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect())
    }

    /// Total number of stories in the collection.
    pub async fn count(&self) -> StoreResult<u64> {
        let count = self
            .stories
            .count_documents(doc! {}, None)
            .await
            .map_err(StoreError::from)?;
        Ok(count)
    }
}

/// Exact-match filter on a single field.
fn field_filter(field: &str, value: impl Into<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value.into());
    filter
}

/// Sort newest-first on `datetime`, truncated to `limit`.
fn recent_options(limit: i64) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "datetime": -1 })
        .limit(limit)
        .build()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_field_filter() {
        let filter = field_filter("title", "Belling the Cat");
        assert_eq!(filter, doc! { "title": "Belling the Cat" });

        let filter = field_filter("datetime", "2024-04-18");
        assert_eq!(filter.get_str("datetime").unwrap(), "2024-04-18");
    }

    #[test]
    fn test_recent_options() {
        let options = recent_options(5);
        assert_eq!(options.sort, Some(doc! { "datetime": -1 }));
        assert_eq!(options.limit, Some(5));
    }
}
