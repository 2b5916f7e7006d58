//! Single-document field updates.

use bson::{Document, doc};
use tracing::debug;

use crate::client::StoryCollection;
use crate::error::{StoreError, StoreResult};

/// Outcome of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    /// Documents the filter matched.
    pub matched_count: u64,
    /// Documents actually modified.
    pub modified_count: u64,
}

impl StoryCollection {
    /// Set the `author` of the story whose `title` matches.
    ///
    /// Titles are not guaranteed unique; when several documents share the
    /// title, exactly one is updated (single-document update semantics).
    /// Zero matches is a normal outcome, not an error.
    pub async fn update_author_by_title(
        &self,
        title: &str,
        new_author: &str,
    ) -> StoreResult<UpdateReport> {
        debug!(collection = %self.name, title, "update author by title");

        let result = self
            .stories
            .update_one(doc! { "title": title }, set_author(new_author), None)
            .await
            .map_err(StoreError::from)?;

        Ok(UpdateReport {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }
}

fn set_author(new_author: &str) -> Document {
    doc! { "$set": { "author": new_author } }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_set_author_update() {
        let update = set_author("Suzie Wolfgang");
        assert_eq!(update, doc! { "$set": { "author": "Suzie Wolfgang" } });
    }

    #[test]
    fn test_update_report_zero_match() {
        let report = UpdateReport {
            matched_count: 0,
            modified_count: 0,
        };
        assert_eq!(report.matched_count, 0);
        assert_eq!(report.modified_count, 0);
    }
}
