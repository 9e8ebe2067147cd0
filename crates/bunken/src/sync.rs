//! # Sync Pipeline
//!
//! Full rebuild of the title collection from the relational store.
//!
//! A rebuild runs five steps: snapshot the `(id, title)` pairs, embed the
//! titles in batches, stage a fresh collection, insert and index the
//! vectors, and commit. The commit is atomic; until it happens the
//! previously committed collection keeps answering queries, and a failure
//! anywhere simply discards the staged build. Running the pipeline twice
//! over an unchanged store yields the same queryable collection, so a
//! rebuild is always safe to retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use bunken_core::Embedder;
use bunken_vecdb::{IndexKind, IndexParams, VectorStore};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::Result;
use crate::store::ArticleStore;

/// Progress events emitted during a rebuild, in stage order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The title snapshot was taken from the relational store.
    Fetched {
        /// Articles in the snapshot.
        articles: usize,
    },
    /// A batch of titles was embedded.
    Embedded {
        /// Titles embedded so far.
        done: usize,
        /// Titles in the snapshot.
        total: usize,
    },
    /// A fresh collection was staged.
    Recreated {
        /// Vector dimension of the staged collection.
        dimension: usize,
    },
    /// All vectors were inserted into the staged collection.
    Inserted {
        /// Vectors inserted.
        entries: usize,
    },
    /// The ANN structure was built.
    Indexed {
        /// Effective index structure (flat when the snapshot is small).
        kind: IndexKind,
    },
    /// The staged collection was committed and is now queryable.
    Loaded {
        /// Wall-clock duration of the whole rebuild.
        elapsed: Duration,
    },
}

/// Observer of rebuild progress.
///
/// [`LogObserver`] is the default and logs each stage; tests install
/// collecting observers to assert on the stage sequence.
pub trait SyncObserver: Send + Sync {
    /// Called once per stage transition, in order.
    fn notify(&self, event: &SyncEvent);
}

/// Default observer: forwards each stage to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SyncObserver for LogObserver {
    fn notify(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Fetched { articles } => {
                tracing::info!(articles = *articles, "title snapshot taken");
            }
            SyncEvent::Embedded { done, total } => {
                tracing::debug!(done = *done, total = *total, "titles embedded");
            }
            SyncEvent::Recreated { dimension } => {
                tracing::debug!(dimension = *dimension, "fresh collection staged");
            }
            SyncEvent::Inserted { entries } => {
                tracing::debug!(entries = *entries, "vectors inserted");
            }
            SyncEvent::Indexed { kind } => {
                tracing::debug!(kind = %kind, "index built");
            }
            SyncEvent::Loaded { elapsed } => {
                tracing::info!(elapsed = ?elapsed, "collection committed");
            }
        }
    }
}

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildReport {
    /// Articles embedded and indexed.
    pub articles: usize,
    /// Vector dimension of the committed collection.
    pub dimension: usize,
    /// Wall-clock duration of the rebuild.
    pub elapsed: Duration,
}

/// Rebuilds the title collection from the relational store.
pub struct SyncPipeline {
    embedder: Arc<dyn Embedder>,
    vectors: VectorStore,
    collection: String,
    index_params: IndexParams,
    batch_size: usize,
    observer: Arc<dyn SyncObserver>,
}

impl SyncPipeline {
    /// Creates a pipeline maintaining `collection` inside `vectors`.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: VectorStore,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            collection: collection.into(),
            index_params: IndexParams::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            observer: Arc::new(LogObserver),
        }
    }

    /// Sets the index build parameters.
    #[must_use]
    pub fn with_index_params(mut self, params: IndexParams) -> Self {
        self.index_params = params;
        self
    }

    /// Sets the embed batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replaces the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Collection name this pipeline maintains.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Runs one full rebuild and returns a report on success.
    ///
    /// The snapshot is taken once at the start; rows inserted while the
    /// rebuild runs are picked up by the next one. Articles whose title is
    /// blank cannot be embedded and are skipped with a warning. On failure
    /// the staged build is discarded and the previously committed collection,
    /// if any, keeps serving.
    pub fn rebuild(&self, store: &ArticleStore) -> Result<RebuildReport> {
        let started = Instant::now();

        let mut titles = store.fetch_titles()?;
        let snapshot = titles.len();
        titles.retain(|(_, title)| !title.trim().is_empty());
        let skipped = snapshot - titles.len();
        if skipped > 0 {
            tracing::warn!(skipped, "skipping articles with blank titles");
        }
        self.observer.notify(&SyncEvent::Fetched {
            articles: titles.len(),
        });

        let mut ids = Vec::with_capacity(titles.len());
        let mut vectors = Vec::with_capacity(titles.len());
        for batch in titles.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|(_, title)| title.as_str()).collect();
            let embedded = self.embedder.embed_batch(&texts)?;
            for ((id, _), vector) in batch.iter().zip(embedded) {
                ids.push(*id);
                vectors.push(vector);
            }
            self.observer.notify(&SyncEvent::Embedded {
                done: ids.len(),
                total: titles.len(),
            });
        }

        let mut build = self.vectors.recreate(
            &self.collection,
            self.embedder.dimension(),
            self.index_params.metric,
        )?;
        self.observer.notify(&SyncEvent::Recreated {
            dimension: build.dimension(),
        });

        build.bulk_insert(&ids, vectors)?;
        self.observer.notify(&SyncEvent::Inserted {
            entries: ids.len(),
        });

        build.build_index(&self.index_params)?;
        let kind = build.index_kind().unwrap_or(IndexKind::Flat);
        self.observer.notify(&SyncEvent::Indexed { kind });

        build.load()?;
        let elapsed = started.elapsed();
        self.observer.notify(&SyncEvent::Loaded { elapsed });

        Ok(RebuildReport {
            articles: ids.len(),
            dimension: self.embedder.dimension(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use bunken_core::{HashEmbedder, NewArticle};
    use bunken_vecdb::SearchParams;

    use super::*;

    const DIM: usize = 64;

    fn store_with_titles(titles: &[&str]) -> ArticleStore {
        let mut store = ArticleStore::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 14).unwrap();
        for title in titles {
            store
                .insert_article(&NewArticle::new(*title, "A. Author", date, "Abstract."))
                .unwrap();
        }
        store
    }

    fn pipeline(vectors: &VectorStore) -> SyncPipeline {
        SyncPipeline::new(
            Arc::new(HashEmbedder::new(DIM)),
            vectors.clone(),
            "titles",
        )
    }

    fn sorted_ids(vectors: &VectorStore) -> Vec<i64> {
        let mut ids = vectors.ids("titles").unwrap();
        ids.sort_unstable();
        ids
    }

    #[derive(Default)]
    struct RecordingObserver {
        stages: Mutex<Vec<&'static str>>,
    }

    impl SyncObserver for RecordingObserver {
        fn notify(&self, event: &SyncEvent) {
            let stage = match event {
                SyncEvent::Fetched { .. } => "fetched",
                SyncEvent::Embedded { .. } => "embedded",
                SyncEvent::Recreated { .. } => "recreated",
                SyncEvent::Inserted { .. } => "inserted",
                SyncEvent::Indexed { .. } => "indexed",
                SyncEvent::Loaded { .. } => "loaded",
            };
            self.stages.lock().unwrap().push(stage);
        }
    }

    /// Embedder that produces a short vector for one specific title, which
    /// makes the insert step fail mid-rebuild.
    struct WrongDimOn {
        inner: HashEmbedder,
        needle: &'static str,
    }

    impl Embedder for WrongDimOn {
        fn embed(&self, text: &str) -> bunken_core::Result<Vec<f32>> {
            let mut vector = self.inner.embed(text)?;
            if text.contains(self.needle) {
                vector.truncate(3);
            }
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_id(&self) -> &str {
            "wrong-dim-stub"
        }
    }

    #[test]
    fn rebuild_indexes_every_title() {
        let store = store_with_titles(&["Alpha study", "Beta study", "Gamma study"]);
        let vectors = VectorStore::new();
        let report = pipeline(&vectors).rebuild(&store).unwrap();
        assert_eq!(report.articles, 3);
        assert_eq!(report.dimension, DIM);
        assert_eq!(sorted_ids(&vectors), vec![1, 2, 3]);
    }

    #[test]
    fn snapshot_excludes_rows_inserted_after_it() {
        let mut store = store_with_titles(&["Alpha study", "Beta study"]);
        let vectors = VectorStore::new();
        let runner = pipeline(&vectors);
        runner.rebuild(&store).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        store
            .insert_article(&NewArticle::new("Late arrival", "A. Author", date, ""))
            .unwrap();
        assert_eq!(sorted_ids(&vectors), vec![1, 2]);

        runner.rebuild(&store).unwrap();
        assert_eq!(sorted_ids(&vectors), vec![1, 2, 3]);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let store = store_with_titles(&["Alpha study", "Beta study", "Gamma study"]);
        let vectors = VectorStore::new();
        let runner = pipeline(&vectors);
        runner.rebuild(&store).unwrap();

        let embedder = HashEmbedder::new(DIM);
        let query = embedder.embed("Beta study").unwrap();
        let first = vectors
            .search("titles", &query, 3, &SearchParams::default())
            .unwrap();
        runner.rebuild(&store).unwrap();
        let second = vectors
            .search("titles", &query, 3, &SearchParams::default())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].id, 2);
    }

    #[test]
    fn empty_store_commits_an_empty_queryable_collection() {
        let store = store_with_titles(&[]);
        let vectors = VectorStore::new();
        let report = pipeline(&vectors).rebuild(&store).unwrap();
        assert_eq!(report.articles, 0);

        let query = vec![0.5; DIM];
        let hits = vectors
            .search("titles", &query, 5, &SearchParams::default())
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn observer_sees_stages_in_order() {
        let store = store_with_titles(&["Alpha study", "Beta study"]);
        let vectors = VectorStore::new();
        let observer = Arc::new(RecordingObserver::default());
        pipeline(&vectors)
            .with_observer(observer.clone())
            .rebuild(&store)
            .unwrap();
        assert_eq!(
            *observer.stages.lock().unwrap(),
            vec![
                "fetched",
                "embedded",
                "recreated",
                "inserted",
                "indexed",
                "loaded"
            ]
        );
    }

    #[test]
    fn embedded_events_track_batches() {
        let store = store_with_titles(&["One", "Two", "Three", "Four", "Five"]);
        let vectors = VectorStore::new();
        let observer = Arc::new(RecordingObserver::default());
        pipeline(&vectors)
            .with_batch_size(2)
            .with_observer(observer.clone())
            .rebuild(&store)
            .unwrap();
        let stages = observer.stages.lock().unwrap();
        assert_eq!(stages.iter().filter(|s| **s == "embedded").count(), 3);
    }

    #[test]
    fn failed_rebuild_leaves_previous_version_serving() {
        let mut store = store_with_titles(&["Alpha study", "Beta study"]);
        let vectors = VectorStore::new();
        pipeline(&vectors).rebuild(&store).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        let poisoned = store
            .insert_article(&NewArticle::new("POISON pill", "A. Author", date, ""))
            .unwrap();
        let failing = SyncPipeline::new(
            Arc::new(WrongDimOn {
                inner: HashEmbedder::new(DIM),
                needle: "POISON",
            }),
            vectors.clone(),
            "titles",
        );
        assert!(failing.rebuild(&store).is_err());

        // The old two-entry version still answers.
        assert_eq!(sorted_ids(&vectors), vec![1, 2]);

        // Removing the bad row lets the next rebuild (same collection name)
        // succeed, which also shows the failed attempt released its slot.
        store.delete_article(poisoned).unwrap();
        pipeline(&vectors).rebuild(&store).unwrap();
        assert_eq!(sorted_ids(&vectors), vec![1, 2]);
    }

    #[test]
    fn blank_titles_are_skipped_with_the_rest_indexed() {
        let store = store_with_titles(&["Alpha study", "   ", "Gamma study"]);
        let vectors = VectorStore::new();
        let report = pipeline(&vectors).rebuild(&store).unwrap();
        assert_eq!(report.articles, 2);
        assert_eq!(sorted_ids(&vectors), vec![1, 3]);
    }
}
