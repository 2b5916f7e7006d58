//! Fixed aggregation pipelines over the story collection.
//!
//! Pipeline construction is split from execution so the pipeline shapes can
//! be checked without a running server: each `*_pipeline` function is pure
//! and returns the stage documents the matching [`StoryCollection`] method
//! sends to the server. All pipelines are read-only and evaluated
//! server-side over the whole collection.

use std::collections::HashMap;

use bson::{Bson, Document, doc};
use chrono::NaiveDate;
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::StoryCollection;
use crate::error::{StoreError, StoreResult};
use crate::story::{AuthorCount, AuthorLengthStats, LengthCategoryCount, MonthCount};

/// One "published since" counting window.
///
/// Windows count documents with `datetime >= cutoff` independently, so they
/// overlap: a story from last week lands in the 30-day, 90-day, and 365-day
/// windows alike. Cutoffs are caller-supplied dates in `YYYY-MM-DD`, never
/// computed from the current clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyWindow {
    /// Facet label, also the key in the result map.
    pub label: String,
    /// Inclusive lower bound on `datetime`.
    pub cutoff: String,
}

impl RecencyWindow {
    /// Create a window with the given label and inclusive cutoff date.
    pub fn new(label: impl Into<String>, cutoff: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cutoff: cutoff.into(),
        }
    }

    /// Window covering the `days` days up to a caller-supplied reference
    /// date. The reference date is passed in explicitly; nothing here reads
    /// the clock.
    pub fn days_before(
        label: impl Into<String>,
        reference_date: &str,
        days: i64,
    ) -> StoreResult<Self> {
        let reference = NaiveDate::parse_from_str(reference_date, "%Y-%m-%d").map_err(|e| {
            StoreError::config(format!(
                "invalid reference date '{}': {}",
                reference_date, e
            ))
        })?;

        let cutoff = reference - chrono::Duration::days(days);

        Ok(Self {
            label: label.into(),
            cutoff: cutoff.format("%Y-%m-%d").to_string(),
        })
    }
}

/// One length-category boundary.
///
/// A story falls into the first threshold whose `upper_bound` (exclusive,
/// in code points) exceeds its body length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthThreshold {
    /// Exclusive upper bound on body length in code points.
    pub upper_bound: i64,
    /// Category label.
    pub label: String,
}

impl LengthThreshold {
    /// Create a threshold with the given exclusive upper bound and label.
    pub fn new(upper_bound: i64, label: impl Into<String>) -> Self {
        Self {
            upper_bound,
            label: label.into(),
        }
    }
}

impl StoryCollection {
    /// Count stories per author, most prolific first.
    pub async fn count_by_author(&self) -> StoreResult<Vec<AuthorCount>> {
        self.run_rows(count_by_author_pipeline()).await
    }

    /// Count stories per `YYYY-MM` month, newest month first.
    pub async fn count_by_month(&self) -> StoreResult<Vec<MonthCount>> {
        self.run_rows(count_by_month_pipeline()).await
    }

    /// Average body length per author, longest average first; ties broken
    /// by story count descending. Lengths are code points (`$strLenCP`).
    pub async fn average_length_by_author(&self) -> StoreResult<Vec<AuthorLengthStats>> {
        self.run_rows(average_length_by_author_pipeline()).await
    }

    /// Count stories per recency window.
    ///
    /// Each window is an independent facet; see [`RecencyWindow`] for the
    /// overlap semantics. A window with no matching stories yields 0.
    pub async fn count_by_recency_windows(
        &self,
        windows: &[RecencyWindow],
    ) -> StoreResult<HashMap<String, u64>> {
        // The server rejects a $facet stage with no sub-pipelines.
        if windows.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(collection = %self.name, windows = windows.len(), "count by recency windows");

        let cursor = self
            .raw
            .aggregate(recency_windows_pipeline(windows), None)
            .await
            .map_err(StoreError::from)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(StoreError::from)?;
        let facets = docs
            .first()
            .ok_or_else(|| StoreError::query("facet pipeline returned no document"))?;

        windows
            .iter()
            .map(|window| Ok((window.label.clone(), facet_count(facets, &window.label)?)))
            .collect()
    }

    /// Count stories per length category, largest category first.
    ///
    /// Every story falls into exactly one category: the first threshold
    /// whose bound exceeds its length, or `default_label` past the last.
    pub async fn count_by_length_category(
        &self,
        thresholds: &[LengthThreshold],
        default_label: &str,
    ) -> StoreResult<Vec<LengthCategoryCount>> {
        self.run_rows(length_category_pipeline(thresholds, default_label))
            .await
    }

    /// Run a pipeline and deserialize each result row.
    async fn run_rows<T: DeserializeOwned>(&self, pipeline: Vec<Document>) -> StoreResult<Vec<T>> {
        debug!(collection = %self.name, stages = pipeline.len(), "running aggregation");

        let cursor = self
            .raw
            .aggregate(pipeline, None)
            .await
            .map_err(StoreError::from)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(StoreError::from)?;

        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(StoreError::from))
            .collect()
    }
}

/// Pipeline for [`StoryCollection::count_by_author`].
pub fn count_by_author_pipeline() -> Vec<Document> {
    vec![
        stages::group("$author", doc! { "count": accumulators::count() }),
        stages::sort(doc! { "count": -1 }),
    ]
}

/// Pipeline for [`StoryCollection::count_by_month`].
///
/// The month key is the first seven code points of `datetime` ("YYYY-MM"),
/// so sorting by `_id` descending is newest-month-first.
pub fn count_by_month_pipeline() -> Vec<Document> {
    vec![
        stages::add_fields(doc! { "month": { "$substrCP": ["$datetime", 0, 7] } }),
        stages::group("$month", doc! { "count": accumulators::count() }),
        stages::sort(doc! { "_id": -1 }),
    ]
}

/// Pipeline for [`StoryCollection::average_length_by_author`].
pub fn average_length_by_author_pipeline() -> Vec<Document> {
    vec![
        stages::add_fields(doc! { "story_length": { "$strLenCP": "$story" } }),
        stages::group(
            "$author",
            doc! {
                "average_length": accumulators::avg("$story_length"),
                "total_stories": accumulators::count(),
            },
        ),
        stages::sort(doc! { "average_length": -1, "total_stories": -1 }),
    ]
}

/// Pipeline for [`StoryCollection::count_by_recency_windows`]: one $facet
/// sub-pipeline per window, each a $match on the cutoff followed by $count.
pub fn recency_windows_pipeline(windows: &[RecencyWindow]) -> Vec<Document> {
    let mut facets = Document::new();

    for window in windows {
        let sub_pipeline = vec![
            Bson::Document(stages::match_stage(
                doc! { "datetime": { "$gte": window.cutoff.as_str() } },
            )),
            Bson::Document(stages::count("count")),
        ];
        facets.insert(window.label.as_str(), Bson::Array(sub_pipeline));
    }

    vec![stages::facet(facets)]
}

/// Pipeline for [`StoryCollection::count_by_length_category`].
pub fn length_category_pipeline(
    thresholds: &[LengthThreshold],
    default_label: &str,
) -> Vec<Document> {
    // With no thresholds every story takes the default label; $switch
    // requires at least one branch, so emit the literal instead.
    let category: Bson = if thresholds.is_empty() {
        Bson::String(default_label.to_string())
    } else {
        let branches: Vec<Bson> = thresholds
            .iter()
            .map(|threshold| {
                Bson::Document(doc! {
                    "case": { "$lt": [{ "$strLenCP": "$story" }, threshold.upper_bound] },
                    "then": threshold.label.as_str(),
                })
            })
            .collect();

        Bson::Document(doc! {
            "$switch": { "branches": branches, "default": default_label }
        })
    };

    vec![
        stages::add_fields(doc! { "length_category": category }),
        stages::group("$length_category", doc! { "count": accumulators::count() }),
        stages::sort(doc! { "count": -1 }),
    ]
}

/// Pipeline for [`StoryCollection::find_random_in_range`]: inclusive
/// date-range $match, then $sample. The sample size caps at the match
/// count, so the result holds `min(count, matches)` documents.
pub fn random_sample_pipeline(start: &str, end: &str, count: i64) -> Vec<Document> {
    vec![
        stages::match_stage(doc! { "datetime": { "$gte": start, "$lte": end } }),
        stages::sample(count),
    ]
}

/// Read one window's count out of the $facet result document.
fn facet_count(facets: &Document, label: &str) -> StoreResult<u64> {
    let entries = facets
        .get_array(label)
        .map_err(|_| StoreError::query(format!("facet '{}' missing from response", label)))?;

    match entries.first() {
        // $count emits no document at all over an empty input.
        None => Ok(0),
        Some(Bson::Document(doc)) => match doc.get("count") {
            Some(Bson::Int32(n)) => Ok(*n as u64),
            Some(Bson::Int64(n)) => Ok(*n as u64),
            _ => Err(StoreError::query(format!(
                "facet '{}' has no numeric count",
                label
            ))),
        },
        Some(_) => Err(StoreError::query(format!(
            "facet '{}' is not a document array",
            label
        ))),
    }
}

/// Helper functions for the aggregation stages this facade issues.
pub mod stages {
    use bson::{Bson, Document, doc};

    /// Create a $match stage.
    pub fn match_stage(filter: Document) -> Document {
        doc! { "$match": filter }
    }

    /// Create a $group stage.
    pub fn group(id: impl Into<Bson>, accumulators: Document) -> Document {
        let mut group_doc = doc! { "_id": id.into() };
        group_doc.extend(accumulators);
        doc! { "$group": group_doc }
    }

    /// Create a $sort stage.
    pub fn sort(fields: Document) -> Document {
        doc! { "$sort": fields }
    }

    /// Create an $addFields stage.
    pub fn add_fields(fields: Document) -> Document {
        doc! { "$addFields": fields }
    }

    /// Create a $facet stage.
    pub fn facet(facets: Document) -> Document {
        doc! { "$facet": facets }
    }

    /// Create a $count stage.
    pub fn count(field: impl Into<String>) -> Document {
        doc! { "$count": field.into() }
    }

    /// Create a $sample stage.
    pub fn sample(size: i64) -> Document {
        doc! { "$sample": { "size": size } }
    }
}

/// Aggregation accumulators for use in $group stages.
pub mod accumulators {
    use bson::{Bson, doc};

    /// Average accumulator.
    pub fn avg(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$avg": expr.into() })
    }

    /// Count accumulator.
    pub fn count() -> Bson {
        Bson::Document(doc! { "$sum": 1 })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_count_by_author_pipeline() {
        let pipeline = count_by_author_pipeline();

        assert_eq!(
            pipeline,
            vec![
                doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
            ]
        );
    }

    #[test]
    fn test_count_by_month_pipeline() {
        let pipeline = count_by_month_pipeline();

        assert_eq!(
            pipeline,
            vec![
                doc! { "$addFields": { "month": { "$substrCP": ["$datetime", 0, 7] } } },
                doc! { "$group": { "_id": "$month", "count": { "$sum": 1 } } },
                doc! { "$sort": { "_id": -1 } },
            ]
        );
    }

    #[test]
    fn test_average_length_pipeline() {
        let pipeline = average_length_by_author_pipeline();

        assert_eq!(
            pipeline,
            vec![
                doc! { "$addFields": { "story_length": { "$strLenCP": "$story" } } },
                doc! { "$group": {
                    "_id": "$author",
                    "average_length": { "$avg": "$story_length" },
                    "total_stories": { "$sum": 1 },
                } },
                doc! { "$sort": { "average_length": -1, "total_stories": -1 } },
            ]
        );
    }

    #[test]
    fn test_recency_window_days_before() {
        let window = RecencyWindow::days_before("last30Days", "2024-03-16", 30).unwrap();
        assert_eq!(window.label, "last30Days");
        assert_eq!(window.cutoff, "2024-02-15");

        let window = RecencyWindow::days_before("last365Days", "2024-03-16", 365).unwrap();
        assert_eq!(window.cutoff, "2023-03-17");

        let err = RecencyWindow::days_before("bad", "March 2024", 30).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_recency_windows_pipeline() {
        let windows = vec![
            RecencyWindow::new("last30Days", "2024-02-15"),
            RecencyWindow::new("last90Days", "2023-12-15"),
        ];

        let pipeline = recency_windows_pipeline(&windows);
        assert_eq!(pipeline.len(), 1);

        let facets = pipeline[0].get_document("$facet").unwrap();
        assert_eq!(facets.len(), 2);

        let sub = facets.get_array("last30Days").unwrap();
        assert_eq!(
            sub,
            &vec![
                Bson::Document(doc! { "$match": { "datetime": { "$gte": "2024-02-15" } } }),
                Bson::Document(doc! { "$count": "count" }),
            ]
        );
        assert!(facets.contains_key("last90Days"));
    }

    #[test]
    fn test_length_category_pipeline() {
        let thresholds = vec![
            LengthThreshold::new(1000, "Short"),
            LengthThreshold::new(5000, "Medium"),
        ];

        let pipeline = length_category_pipeline(&thresholds, "Long");

        assert_eq!(
            pipeline[0],
            doc! { "$addFields": { "length_category": { "$switch": {
                "branches": [
                    { "case": { "$lt": [{ "$strLenCP": "$story" }, 1000_i64] }, "then": "Short" },
                    { "case": { "$lt": [{ "$strLenCP": "$story" }, 5000_i64] }, "then": "Medium" },
                ],
                "default": "Long",
            } } } }
        );
        assert_eq!(
            pipeline[1],
            doc! { "$group": { "_id": "$length_category", "count": { "$sum": 1 } } }
        );
        assert_eq!(pipeline[2], doc! { "$sort": { "count": -1 } });
    }

    #[test]
    fn test_length_category_pipeline_no_thresholds() {
        let pipeline = length_category_pipeline(&[], "All");

        assert_eq!(
            pipeline[0],
            doc! { "$addFields": { "length_category": "All" } }
        );
    }

    #[test]
    fn test_random_sample_pipeline() {
        let pipeline = random_sample_pipeline("2024-01-15", "2024-04-18", 1);

        assert_eq!(
            pipeline,
            vec![
                doc! { "$match": { "datetime": { "$gte": "2024-01-15", "$lte": "2024-04-18" } } },
                doc! { "$sample": { "size": 1_i64 } },
            ]
        );
    }

    #[test]
    fn test_facet_count() {
        let facets = doc! {
            "last30Days": [{ "count": 5_i32 }],
            "last90Days": [],
            "last365Days": [{ "count": 42_i64 }],
        };

        assert_eq!(facet_count(&facets, "last30Days").unwrap(), 5);
        assert_eq!(facet_count(&facets, "last90Days").unwrap(), 0);
        assert_eq!(facet_count(&facets, "last365Days").unwrap(), 42);

        let err = facet_count(&facets, "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_facet_count_bad_shape() {
        let facets = doc! { "window": [{ "count": "five" }] };
        assert!(facet_count(&facets, "window").is_err());

        let facets = doc! { "window": ["not a document"] };
        assert!(facet_count(&facets, "window").is_err());
    }

    #[test]
    fn test_stages_helpers() {
        let match_doc = stages::match_stage(doc! { "author": "Aesop" });
        assert!(match_doc.contains_key("$match"));

        let group_doc = stages::group("$author", doc! { "count": accumulators::count() });
        assert_eq!(
            group_doc,
            doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } }
        );

        let sample_doc = stages::sample(3);
        assert_eq!(sample_doc, doc! { "$sample": { "size": 3_i64 } });
    }

    #[test]
    fn test_accumulators() {
        let avg = accumulators::avg("$story_length");
        assert!(avg.as_document().unwrap().contains_key("$avg"));

        let count = accumulators::count();
        assert_eq!(count.as_document().unwrap().get_i32("$sum").unwrap(), 1);
    }
}
