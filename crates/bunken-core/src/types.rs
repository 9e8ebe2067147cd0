use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted journal article row.
///
/// The identifier is assigned by the relational store and is the key shared
/// with the vector index: every indexed title vector carries the `id` of the
/// article row it was embedded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Store-assigned identifier, monotonically increasing from 1.
    pub id: i64,

    /// Article title. The only field that is embedded and indexed.
    pub title: String,

    /// Comma-separated author names as published.
    pub authors: String,

    /// Publication date.
    pub published_date: NaiveDate,

    /// Article abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// An article that has not been persisted yet.
///
/// Produced by ingestion; the store assigns the identifier on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    /// Article title.
    pub title: String,

    /// Comma-separated author names as published.
    pub authors: String,

    /// Publication date.
    pub published_date: NaiveDate,

    /// Article abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl NewArticle {
    /// Creates a new article draft.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        authors: impl Into<String>,
        published_date: NaiveDate,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            authors: authors.into(),
            published_date,
            abstract_text: abstract_text.into(),
        }
    }

    /// Returns `true` if the draft has a non-blank title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

impl ArticleRecord {
    /// Builds a record from a draft and its store-assigned identifier.
    #[must_use]
    pub fn from_draft(id: i64, draft: NewArticle) -> Self {
        Self {
            id,
            title: draft.title,
            authors: draft.authors,
            published_date: draft.published_date,
            abstract_text: draft.abstract_text,
        }
    }
}

impl std::fmt::Display for ArticleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Article(id={}, {:?}, {})",
            self.id, self.title, self.published_date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 14).unwrap()
    }

    #[test]
    fn draft_to_record_keeps_fields() {
        let draft = NewArticle::new(
            "EP2-signaling blockade in glioblastoma",
            "A. Researcher, B. Author",
            sample_date(),
            "We study prostaglandin receptor signaling.",
        );
        assert!(draft.has_title());

        let record = ArticleRecord::from_draft(7, draft.clone());
        assert_eq!(record.id, 7);
        assert_eq!(record.title, draft.title);
        assert_eq!(record.published_date, sample_date());
    }

    #[test]
    fn blank_title_is_detected() {
        let draft = NewArticle::new("   ", "", sample_date(), "");
        assert!(!draft.has_title());
    }

    #[test]
    fn serde_uses_abstract_key() {
        let record = ArticleRecord::from_draft(
            1,
            NewArticle::new("T", "A", sample_date(), "Body"),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"abstract\":\"Body\""));
        assert!(!json.contains("abstract_text"));
    }

    #[test]
    fn display_is_compact() {
        let record = ArticleRecord::from_draft(3, NewArticle::new("T", "A", sample_date(), ""));
        assert_eq!(record.to_string(), "Article(id=3, \"T\", 2025-08-14)");
    }
}
