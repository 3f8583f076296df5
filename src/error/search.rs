// Search error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Search error code constants
///
/// Error code range: 3001-3003
pub struct SearchErrorCodes {}

impl SearchErrorCodes {
    /// Index resource could not be read
    pub const INDEX_UNAVAILABLE: i32 = 3001;

    /// Index resource was not a valid document array
    pub const INDEX_PARSE_FAILED: i32 = 3002;

    /// Ranked search was requested but no index is loaded
    pub const INDEX_NOT_LOADED: i32 = 3003;
}

/// Log a search error with structured context
pub fn log_search_error(err: &SearchError, context: &str) {
    error!(
        "Search error in {}: code={}, component=SearchIndex, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or querying the search index
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Reading the index resource failed
    IndexUnavailable { reason: String },

    /// The index JSON could not be parsed
    IndexParseFailed { reason: String },

    /// No index has been loaded
    IndexNotLoaded,
}

impl ErrorCode for SearchError {
    fn code(&self) -> i32 {
        match self {
            SearchError::IndexUnavailable { .. } => SearchErrorCodes::INDEX_UNAVAILABLE,
            SearchError::IndexParseFailed { .. } => SearchErrorCodes::INDEX_PARSE_FAILED,
            SearchError::IndexNotLoaded => SearchErrorCodes::INDEX_NOT_LOADED,
        }
    }

    fn message(&self) -> String {
        match self {
            SearchError::IndexUnavailable { reason } => {
                format!("Search index unavailable: {}", reason)
            }
            SearchError::IndexParseFailed { reason } => {
                format!("Search index is not a valid document list: {}", reason)
            }
            SearchError::IndexNotLoaded => "Search index not loaded".to_string(),
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SearchError {}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::IndexUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::IndexParseFailed {
            reason: err.to_string(),
        }
    }
}
