// Error types for the practice aids
//
// This module defines custom error types for audio output and search index
// operations, each carrying a stable numeric code for structured reporting.

mod audio;
mod search;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use search::{log_search_error, SearchError, SearchErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and library surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
