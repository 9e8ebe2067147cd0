//! # Article Store
//!
//! SQLite-backed relational store for article metadata. This is the durable
//! source of truth; the vector collection is a derived artifact rebuilt from
//! it on demand.
//!
//! Identifiers are assigned by the store itself: each insert takes
//! `max(id) + 1` inside a transaction, so ids grow monotonically from 1 and
//! never change for the life of a row.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use bunken_core::{ArticleRecord, NewArticle};

use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    authors TEXT NOT NULL,
    published_date TEXT NOT NULL,
    abstract TEXT NOT NULL
)";

/// Row shape returned by [`ArticleStore::fetch_by_ids`]: the fields a search
/// result displays, keyed by id so callers can restore similarity order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRow {
    /// Article identifier.
    pub id: i64,
    /// Article title.
    pub title: String,
    /// Article abstract (empty when the source page had none).
    pub abstract_text: String,
}

/// SQLite store of article metadata.
pub struct ArticleStore {
    conn: Connection,
}

impl ArticleStore {
    /// Opens the store at `path`, creating the file and schema if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::bootstrap(Connection::open(path)?)
    }

    /// Opens an in-memory store. Used by tests and ephemeral runs; contents
    /// are lost when the store is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Largest assigned id, or `None` when the store is empty.
    pub fn max_id(&self) -> Result<Option<i64>> {
        let max = self
            .conn
            .query_row("SELECT MAX(id) FROM articles", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(max)
    }

    /// Number of stored articles.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Inserts a draft article and returns its assigned id.
    ///
    /// The id is `max(id) + 1` at the time of the call, computed and written
    /// inside one transaction so concurrent writers cannot collide.
    pub fn insert_article(&mut self, article: &NewArticle) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let next_id = tx
            .query_row("SELECT MAX(id) FROM articles", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?
            .map_or(1, |max| max + 1);
        tx.execute(
            "INSERT INTO articles (id, title, authors, published_date, abstract)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                next_id,
                article.title,
                article.authors,
                article.published_date,
                article.abstract_text
            ],
        )?;
        tx.commit()?;
        Ok(next_id)
    }

    /// Deletes an article row. Returns `true` if a row was removed.
    ///
    /// The vector collection is not touched; until the next rebuild, queries
    /// that hit the deleted id drop it from their results with a warning.
    pub fn delete_article(&mut self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Snapshot of all `(id, title)` pairs, ordered by id. This is the input
    /// of an index rebuild.
    pub fn fetch_titles(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM articles ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?)
    }

    /// Rows for the given ids, in store order (id ascending), not the
    /// caller's order. Ids without a row are silently absent; callers that
    /// care about ordering or missing ids re-join on `id`.
    pub fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<ArticleRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, title, abstract FROM articles WHERE id IN ({placeholders}) ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok(ArticleRow {
                id: row.get(0)?,
                title: row.get(1)?,
                abstract_text: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?)
    }

    /// Full record for one article, or `None` if the id is unknown.
    pub fn fetch_article(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, title, authors, published_date, abstract
                 FROM articles WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ArticleRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        authors: row.get(2)?,
                        published_date: row.get(3)?,
                        abstract_text: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// True if an article with exactly this title is already stored. Ingest
    /// uses this to skip articles seen on a previous run.
    pub fn contains_title(&self, title: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn draft(title: &str) -> NewArticle {
        NewArticle::new(
            title,
            "R. Tanaka, M. Silva",
            NaiveDate::from_ymd_opt(2026, 8, 14).unwrap(),
            "An abstract.",
        )
    }

    #[test]
    fn ids_grow_monotonically_from_one() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        assert_eq!(store.max_id().unwrap(), None);
        assert_eq!(store.insert_article(&draft("First")).unwrap(), 1);
        assert_eq!(store.insert_article(&draft("Second")).unwrap(), 2);
        assert_eq!(store.insert_article(&draft("Third")).unwrap(), 3);
        assert_eq!(store.max_id().unwrap(), Some(3));
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn ids_continue_after_a_delete() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        store.insert_article(&draft("First")).unwrap();
        store.insert_article(&draft("Second")).unwrap();
        assert!(store.delete_article(2).unwrap());
        // max(id) is 1 again, so the freed id gets reused.
        assert_eq!(store.insert_article(&draft("Third")).unwrap(), 2);
        assert!(!store.delete_article(99).unwrap());
    }

    #[test]
    fn titles_snapshot_is_ordered_by_id() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        store.insert_article(&draft("Alpha")).unwrap();
        store.insert_article(&draft("Beta")).unwrap();
        store.insert_article(&draft("Gamma")).unwrap();
        let titles = store.fetch_titles().unwrap();
        assert_eq!(
            titles,
            vec![
                (1, "Alpha".to_string()),
                (2, "Beta".to_string()),
                (3, "Gamma".to_string())
            ]
        );
    }

    #[test]
    fn fetch_by_ids_returns_store_order_not_request_order() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        for title in ["Alpha", "Beta", "Gamma"] {
            store.insert_article(&draft(title)).unwrap();
        }
        let rows = store.fetch_by_ids(&[3, 1]).unwrap();
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(rows[1].title, "Gamma");
    }

    #[test]
    fn fetch_by_ids_skips_unknown_ids() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        store.insert_article(&draft("Alpha")).unwrap();
        let rows = store.fetch_by_ids(&[1, 42]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert!(store.fetch_by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn full_record_round_trips_including_date() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        let article = NewArticle::new("Title", "Author", date, "Body");
        let id = store.insert_article(&article).unwrap();
        let record = store.fetch_article(id).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.title, "Title");
        assert_eq!(record.authors, "Author");
        assert_eq!(record.published_date, date);
        assert_eq!(record.abstract_text, "Body");
        assert!(store.fetch_article(999).unwrap().is_none());
    }

    #[test]
    fn contains_title_is_exact_match() {
        let mut store = ArticleStore::open_in_memory().unwrap();
        store.insert_article(&draft("CAR-T persistence")).unwrap();
        assert!(store.contains_title("CAR-T persistence").unwrap());
        assert!(!store.contains_title("car-t persistence").unwrap());
        assert!(!store.contains_title("CAR-T").unwrap());
    }
}
