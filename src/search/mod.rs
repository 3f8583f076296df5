//! Tab search: ranked fuzzy/prefix index plus a substring list filter

pub mod fallback;
pub mod index;
pub mod service;
mod text;

pub use fallback::{filter_tab_list, TabItem};
pub use index::{load_documents, parse_documents, SearchDocument, SearchHit, SearchIndex};
pub use service::{ResultEntry, ResultsPanel, SearchOutcome, SearchService};
