//! # Error Types
//!
//! Error handling for the search engine.
//!
//! Failures from the relational store, the embedding provider, and the
//! vector store are wrapped into a single [`BunkenError`] so callers can
//! handle the whole pipeline with one error type.

use thiserror::Error;

/// Errors that can occur in the search engine.
#[derive(Debug, Error)]
pub enum BunkenError {
    /// Relational store failure (connection, schema, or SQL).
    #[error("article store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embed(#[from] bunken_core::EmbedError),

    /// Vector store failure (includes dimension and metric mismatches).
    #[error("vector store error: {0}")]
    Index(#[from] bunken_vecdb::VecDbError),

    /// HTTP failure while talking to an article feed.
    #[error("feed request error: {0}")]
    Http(#[from] reqwest::Error),

    /// A feed page did not match the expected structure.
    #[error("feed parse error: {0}")]
    FeedParse(String),

    /// A static pattern failed to compile.
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, BunkenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        let err = BunkenError::FeedParse("section heading not found".to_string());
        assert_eq!(err.to_string(), "feed parse error: section heading not found");
    }

    #[test]
    fn embed_errors_convert() {
        let err: BunkenError = bunken_core::EmbedError::EmptyInput.into();
        assert!(matches!(err, BunkenError::Embed(_)));
        assert!(err.to_string().starts_with("embedding error:"));
    }

    #[test]
    fn vecdb_errors_convert() {
        let err: BunkenError =
            bunken_vecdb::VecDbError::CollectionMissing("article_titles".to_string()).into();
        assert!(matches!(err, BunkenError::Index(_)));
    }

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BunkenError>();
    }
}
