//! Search lifecycle for a hosting application
//!
//! One [`SearchService`] per host: it owns the ranked index (when loading
//! succeeded) and the rendered tab list the substring fallback filters.
//! Index failures are logged and only disable the ranked panel.

use std::path::Path;

use serde::Serialize;

use super::fallback::{filter_tab_list, TabItem};
use super::index::{load_documents, parse_documents, SearchDocument, SearchHit, SearchIndex};
use crate::config::SearchConfig;
use crate::error::{log_search_error, SearchError};

/// A row of the results panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub title: String,
    pub artist: String,
    pub url: String,
    pub score: f64,
}

impl From<&SearchHit<'_>> for ResultEntry {
    fn from(hit: &SearchHit<'_>) -> Self {
        Self {
            title: hit.document.title.clone(),
            artist: hit.document.artist.clone(),
            url: hit.document.url.clone(),
            score: hit.score,
        }
    }
}

/// What the results panel shows after a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", content = "results", rename_all = "snake_case")]
pub enum ResultsPanel {
    /// Empty query: panel closed
    Hidden,
    NoResults,
    Hits(Vec<ResultEntry>),
    /// Ranked search disabled; only the list filter applies
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub panel: ResultsPanel,
    /// Tab list items left visible by the substring filter
    pub visible_items: usize,
}

#[derive(Debug)]
enum IndexState {
    NotLoaded,
    Ready(SearchIndex),
    Failed(SearchError),
}

#[derive(Debug)]
pub struct SearchService {
    config: SearchConfig,
    index: IndexState,
    items: Vec<TabItem>,
}

impl SearchService {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            index: IndexState::NotLoaded,
            items: Vec::new(),
        }
    }

    /// Replaces the rendered tab list used by the substring fallback.
    pub fn set_tab_list(&mut self, items: Vec<TabItem>) {
        self.items = items;
    }

    pub fn tab_list(&self) -> &[TabItem] {
        &self.items
    }

    /// Builds the ranked index from `documents`.
    pub fn init(&mut self, documents: Vec<SearchDocument>) -> usize {
        let mut index = SearchIndex::new(&self.config);
        index.add_all(documents);
        let count = index.len();
        log::info!("[SearchService] Indexed {} documents", count);
        self.index = IndexState::Ready(index);
        count
    }

    /// Parses and indexes a JSON document array. On failure ranked search is
    /// disabled and the error is logged and returned.
    pub fn init_from_json(&mut self, json: &str) -> Result<usize, SearchError> {
        let documents = parse_documents(json);
        self.init_or_disable(documents, "init_from_json")
    }

    /// Reads the index file at `path`; failures behave like `init_from_json`.
    pub fn load_index_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, SearchError> {
        let documents = load_documents(path.as_ref());
        self.init_or_disable(documents, "load_index_file")
    }

    fn init_or_disable(
        &mut self,
        documents: Result<Vec<SearchDocument>, SearchError>,
        context: &str,
    ) -> Result<usize, SearchError> {
        match documents {
            Ok(documents) => Ok(self.init(documents)),
            Err(err) => {
                log_search_error(&err, context);
                log::warn!("[SearchService] Ranked search disabled, list filter still active");
                self.index = IndexState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// The loaded index, if ranked search is available.
    pub fn index(&self) -> Option<&SearchIndex> {
        match &self.index {
            IndexState::Ready(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_ranked_available(&self) -> bool {
        matches!(self.index, IndexState::Ready(_))
    }

    /// Ranked hits for `query`, or why ranked search is unavailable.
    pub fn ranked(&self, query: &str) -> Result<Vec<SearchHit<'_>>, SearchError> {
        match &self.index {
            IndexState::Ready(index) => Ok(index.search(query)),
            IndexState::NotLoaded => Err(SearchError::IndexNotLoaded),
            IndexState::Failed(err) => Err(err.clone()),
        }
    }

    /// Handles a search box update: trims `raw`, fills the results panel and
    /// filters the tab list.
    pub fn query(&mut self, raw: &str) -> SearchOutcome {
        let query = raw.trim();
        if query.is_empty() {
            let visible_items = filter_tab_list(&mut self.items, "");
            return SearchOutcome {
                panel: ResultsPanel::Hidden,
                visible_items,
            };
        }

        let panel = match self.ranked(query) {
            Ok(hits) if hits.is_empty() => ResultsPanel::NoResults,
            Ok(hits) => ResultsPanel::Hits(
                hits.iter()
                    .take(self.config.max_results)
                    .map(ResultEntry::from)
                    .collect(),
            ),
            Err(_) => ResultsPanel::Unavailable,
        };

        let visible_items = filter_tab_list(&mut self.items, query);
        SearchOutcome {
            panel,
            visible_items,
        }
    }
}

impl Default for SearchService {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
