//! Ranked fuzzy/prefix search over tab metadata
//!
//! Terms from `title`, `artist` and `tags` go into one inverted index keyed
//! by term. A `BTreeMap` keeps terms sorted so prefix matches are a range
//! scan. Scores are BM25-style per field, scaled by the field boost and by
//! how the indexed term matched the query term (exact, prefix or fuzzy).
//! Documents reached through an exact or prefix term always rank above
//! documents reached only through fuzzy terms.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::text::{bounded_edit_distance, tokenize};
use crate::config::SearchConfig;
use crate::error::SearchError;

/// BM25 term-frequency saturation.
const BM25_K: f64 = 1.2;
/// BM25 length normalisation.
const BM25_B: f64 = 0.7;
/// BM25+ lower bound on the term-frequency component.
const BM25_DELTA: f64 = 0.5;

const PREFIX_WEIGHT: f64 = 0.75;
const PREFIX_FLOOR: f64 = 0.4;
const FUZZY_WEIGHT: f64 = 0.35;

/// One entry of the search index JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tempo from the tab's metadata, used to seed the metronome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
}

impl SearchDocument {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            artist: artist.into(),
            url: String::new(),
            tags: Vec::new(),
            bpm: None,
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_bpm(mut self, bpm: u32) -> Self {
        self.bpm = Some(bpm);
        self
    }
}

/// Indexed document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Title,
    Artist,
    Tags,
}

impl Field {
    const ALL: [Field; 3] = [Field::Title, Field::Artist, Field::Tags];

    fn slot(self) -> usize {
        match self {
            Field::Title => 0,
            Field::Artist => 1,
            Field::Tags => 2,
        }
    }
}

/// How an indexed term relates to a query term.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TermMatch {
    Exact,
    Prefix { extra: usize },
    Fuzzy { distance: usize },
}

impl TermMatch {
    fn weight(self, query_len: usize) -> f64 {
        let len = query_len as f64;
        match self {
            TermMatch::Exact => 1.0,
            TermMatch::Prefix { extra } => {
                (PREFIX_WEIGHT * len / (len + 0.3 * extra as f64)).max(PREFIX_FLOOR)
            }
            TermMatch::Fuzzy { distance } => FUZZY_WEIGHT * len / (len + 0.3 * distance as f64),
        }
    }

    fn is_fuzzy(self) -> bool {
        matches!(self, TermMatch::Fuzzy { .. })
    }
}

/// Per-document accumulator while scoring a query.
#[derive(Debug, Default)]
struct Candidate {
    score: f64,
    terms: Vec<String>,
    /// Matched through at least one exact or prefix term
    direct: bool,
}

#[derive(Debug, Clone)]
struct Posting {
    doc: usize,
    field: Field,
    term_frequency: u32,
}

/// A ranked match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub document: &'a SearchDocument,
    pub score: f64,
    /// Indexed terms that matched
    pub terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    boosts: [f64; 3],
    fuzzy: f64,
    prefix: bool,
    documents: Vec<SearchDocument>,
    field_lengths: Vec<[u32; 3]>,
    total_field_lengths: [u64; 3],
    terms: BTreeMap<String, Vec<Posting>>,
}

impl SearchIndex {
    /// Creates an empty index with the given ranking options.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            boosts: [config.title_boost, config.artist_boost, config.tags_boost],
            fuzzy: config.fuzzy,
            prefix: config.prefix,
            documents: Vec::new(),
            field_lengths: Vec::new(),
            total_field_lengths: [0; 3],
            terms: BTreeMap::new(),
        }
    }

    /// Builds an index with default ranking options.
    pub fn build<I: IntoIterator<Item = SearchDocument>>(documents: I) -> Self {
        let mut index = Self::new(&SearchConfig::default());
        index.add_all(documents);
        index
    }

    /// Parses the JSON document array and indexes it with default options.
    pub fn from_json(json: &str) -> Result<Self, SearchError> {
        Ok(Self::build(parse_documents(json)?))
    }

    pub fn add_all<I: IntoIterator<Item = SearchDocument>>(&mut self, documents: I) {
        for document in documents {
            self.add(document);
        }
    }

    fn add(&mut self, document: SearchDocument) {
        let doc = self.documents.len();
        let mut lengths = [0u32; 3];

        for field in Field::ALL {
            let tokens = match field {
                Field::Title => tokenize(&document.title),
                Field::Artist => tokenize(&document.artist),
                Field::Tags => document.tags.iter().flat_map(|tag| tokenize(tag)).collect(),
            };
            lengths[field.slot()] = tokens.len() as u32;

            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token).or_insert(0) += 1;
            }
            for (term, term_frequency) in frequencies {
                self.terms.entry(term).or_default().push(Posting {
                    doc,
                    field,
                    term_frequency,
                });
            }
        }

        for (total, length) in self.total_field_lengths.iter_mut().zip(lengths) {
            *total += length as u64;
        }
        self.field_lengths.push(lengths);
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[SearchDocument] {
        &self.documents
    }

    /// Ranks documents against `query`, best first.
    ///
    /// Query terms are OR-combined. Exact/prefix matches come before
    /// fuzzy-only matches, then higher scores first; equal scores keep
    /// insertion order. An empty or all-punctuation query returns nothing.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.documents.is_empty() {
            return Vec::new();
        }

        let mut candidates: BTreeMap<usize, Candidate> = BTreeMap::new();
        for query_term in &query_terms {
            let query_len = query_term.chars().count();
            for (term, matched) in self.matching_terms(query_term) {
                let weight = matched.weight(query_len);
                let Some(postings) = self.terms.get(term) else {
                    continue;
                };
                let idf = self.inverse_document_frequency(postings);

                for posting in postings {
                    let candidate = candidates.entry(posting.doc).or_default();
                    candidate.score += weight * idf * self.field_score(posting);
                    candidate.direct |= !matched.is_fuzzy();
                    if !candidate.terms.iter().any(|t| t == term) {
                        candidate.terms.push(term.to_string());
                    }
                }
            }
        }

        let mut ranked: Vec<(usize, Candidate)> = candidates.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.direct
                .cmp(&a.direct)
                .then_with(|| b.score.total_cmp(&a.score))
        });
        ranked
            .into_iter()
            .map(|(doc, candidate)| SearchHit {
                document: &self.documents[doc],
                score: candidate.score,
                terms: candidate.terms,
            })
            .collect()
    }

    /// Best match kind for every indexed term reachable from `query_term`.
    fn matching_terms(&self, query_term: &str) -> Vec<(&str, TermMatch)> {
        let query_len = query_term.chars().count();
        let mut matches: Vec<(&str, TermMatch)> = Vec::new();

        if let Some((term, _)) = self.terms.get_key_value(query_term) {
            matches.push((term.as_str(), TermMatch::Exact));
        }

        if self.prefix {
            for term in self
                .terms
                .range::<str, _>((Bound::Excluded(query_term), Bound::Unbounded))
                .map(|(term, _)| term)
                .take_while(|term| term.starts_with(query_term))
            {
                let extra = term.chars().count() - query_len;
                matches.push((term.as_str(), TermMatch::Prefix { extra }));
            }
        }

        let max_distance = (self.fuzzy * query_len as f64).round() as usize;
        if max_distance > 0 {
            for term in self.terms.keys() {
                if matches.iter().any(|(t, _)| *t == term.as_str()) {
                    continue;
                }
                if let Some(distance) = bounded_edit_distance(query_term, term, max_distance) {
                    matches.push((term.as_str(), TermMatch::Fuzzy { distance }));
                }
            }
        }

        matches
    }

    fn inverse_document_frequency(&self, postings: &[Posting]) -> f64 {
        let mut docs: Vec<usize> = postings.iter().map(|p| p.doc).collect();
        docs.dedup();
        let n = self.documents.len() as f64;
        let containing = docs.len() as f64;
        (1.0 + (n - containing + 0.5) / (containing + 0.5)).ln()
    }

    fn field_score(&self, posting: &Posting) -> f64 {
        let slot = posting.field.slot();
        let length = self.field_lengths[posting.doc][slot] as f64;
        let average = self.total_field_lengths[slot] as f64 / self.documents.len() as f64;
        let relative = if average > 0.0 { length / average } else { 1.0 };

        let tf = posting.term_frequency as f64;
        let saturated = tf * (BM25_K + 1.0) / (tf + BM25_K * (1.0 - BM25_B + BM25_B * relative));
        self.boosts[slot] * (BM25_DELTA + saturated)
    }
}

/// Parses the search index JSON array.
pub fn parse_documents(json: &str) -> Result<Vec<SearchDocument>, SearchError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a search index file.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<SearchDocument>, SearchError> {
    let contents = std::fs::read_to_string(path)?;
    parse_documents(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(hits: &[SearchHit<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.document.title.clone()).collect()
    }

    #[test]
    fn test_prefix_query_finds_title_and_artist_matches() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("The Trooper", "Iron Maiden"),
            SearchDocument::new("Iron Man", "Black Sabbath"),
            SearchDocument::new("Ironclad", "X"),
        ]);

        let hits = index.search("iron");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits.last().unwrap().document.title, "The Trooper");
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = SearchIndex::build(vec![SearchDocument::new("Iron Man", "Black Sabbath")]);
        assert!(index.search("").is_empty());
        assert!(index.search("  - ").is_empty());
    }

    #[test]
    fn test_exact_outranks_prefix() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Ironclad", "A"),
            SearchDocument::new("Iron", "B"),
        ]);
        assert_eq!(titles(&index.search("iron")), vec!["Iron", "Ironclad"]);
    }

    #[test]
    fn test_prefix_outranks_fuzzy() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Bro", "A"),
            SearchDocument::new("Ironclad", "B"),
        ]);
        assert_eq!(titles(&index.search("iro")), vec!["Ironclad", "Bro"]);
    }

    #[test]
    fn test_prefix_hit_on_common_term_outranks_fuzzy_hit_on_rare_term() {
        let mut documents = vec![SearchDocument::new("Rick", "Solo")];
        documents.extend(
            (0..20).map(|i| SearchDocument::new(format!("Song {}", i), "Band").with_tags(["rocks"])),
        );
        let index = SearchIndex::build(documents);

        let hits = index.search("rock");
        assert_eq!(hits.len(), 21);
        assert_eq!(hits[0].document.title, "Song 0");
        assert_eq!(hits[0].terms, vec!["rocks".to_string()]);
        let last = hits.last().unwrap();
        assert_eq!(last.document.title, "Rick");
        assert!(last.score > hits[0].score);
    }

    #[test]
    fn test_fuzzy_tolerates_typo() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Paranoid", "Black Sabbath"),
            SearchDocument::new("Wonderwall", "Oasis"),
        ]);
        let hits = index.search("sabath");
        assert_eq!(titles(&hits), vec!["Paranoid"]);
        assert_eq!(hits[0].terms, vec!["sabbath".to_string()]);
    }

    #[test]
    fn test_short_terms_have_no_fuzzy_tolerance() {
        let index = SearchIndex::build(vec![SearchDocument::new("Cat Scratch Fever", "Ted")]);
        // round(0.2 * 2) = 0 edits
        assert!(index.search("ca").iter().all(|h| h.terms == vec!["cat".to_string()]));
        assert!(index.search("xa").is_empty());
    }

    #[test]
    fn test_title_boost_outranks_artist() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Anthem", "Rush"),
            SearchDocument::new("Rush", "Anthem"),
        ]);
        assert_eq!(titles(&index.search("rush")), vec!["Rush", "Anthem"]);
    }

    #[test]
    fn test_tags_are_searchable() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Blackbird", "The Beatles").with_tags(["fingerstyle", "acoustic"]),
            SearchDocument::new("Back in Black", "AC/DC").with_tags(["riff"]),
        ]);
        assert_eq!(titles(&index.search("fingerstyle")), vec!["Blackbird"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = SearchIndex::build(vec![
            SearchDocument::new("Song", "Alpha"),
            SearchDocument::new("Song", "Beta"),
        ]);
        let hits = index.search("song");
        assert_eq!(hits[0].document.artist, "Alpha");
        assert_eq!(hits[1].document.artist, "Beta");
    }

    #[test]
    fn test_add_all_extends_index() {
        let mut index = SearchIndex::build(vec![SearchDocument::new("One", "A")]);
        index.add_all(vec![SearchDocument::new("Two", "B")]);
        assert_eq!(index.len(), 2);
        assert_eq!(titles(&index.search("two")), vec!["Two"]);
    }

    #[test]
    fn test_from_json_reads_document_array() {
        let json = r#"[
            {"id": "black-sabbath/iron-man", "title": "Iron Man", "artist": "Black Sabbath",
             "url": "/tabs/black-sabbath/iron-man.html", "tags": ["riff"]},
            {"title": "Ironclad", "artist": "X", "url": "/tabs/x/ironclad.html", "tags": [],
             "bpm": 140}
        ]"#;
        let index = SearchIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.documents()[0].id.as_deref(),
            Some("black-sabbath/iron-man")
        );
        assert!(index.documents()[1].id.is_none());
        assert_eq!(index.documents()[0].bpm, None);
        assert_eq!(index.documents()[1].bpm, Some(140));
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = SearchIndex::from_json(r#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, SearchError::IndexParseFailed { .. }));
    }
}
