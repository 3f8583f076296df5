//! Substring filter over the rendered tab list
//!
//! Works without an index: case-insensitive substring match on title or
//! artist, no fuzziness.

use serde::{Deserialize, Serialize};

use super::index::SearchDocument;

/// One entry of the rendered tab list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabItem {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub hidden: bool,
}

impl TabItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            hidden: false,
        }
    }

    fn matches(&self, lower_query: &str) -> bool {
        self.title.to_lowercase().contains(lower_query)
            || self.artist.to_lowercase().contains(lower_query)
    }
}

impl From<&SearchDocument> for TabItem {
    fn from(document: &SearchDocument) -> Self {
        let id = document
            .id
            .clone()
            .unwrap_or_else(|| document.url.clone());
        TabItem::new(id, document.title.clone(), document.artist.clone())
    }
}

/// Toggles `hidden` on every item; returns how many remain visible.
///
/// An empty query shows everything.
pub fn filter_tab_list(items: &mut [TabItem], query: &str) -> usize {
    let lower_query = query.to_lowercase();
    let mut visible = 0;
    for item in items.iter_mut() {
        item.hidden = !(query.is_empty() || item.matches(&lower_query));
        if !item.hidden {
            visible += 1;
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<TabItem> {
        vec![
            TabItem::new("black-sabbath/iron-man", "Iron Man", "Black Sabbath"),
            TabItem::new("x/ironclad", "Ironclad", "X"),
            TabItem::new("oasis/wonderwall", "Wonderwall", "Oasis"),
        ]
    }

    #[test]
    fn test_empty_query_shows_all() {
        let mut items = list();
        items[0].hidden = true;
        assert_eq!(filter_tab_list(&mut items, ""), 3);
        assert!(items.iter().all(|item| !item.hidden));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let mut items = list();
        assert_eq!(filter_tab_list(&mut items, "IRON"), 2);
        assert!(items[2].hidden);

        assert_eq!(filter_tab_list(&mut items, "sabb"), 1);
        assert!(!items[0].hidden);
    }

    #[test]
    fn test_no_fuzziness() {
        let mut items = list();
        assert_eq!(filter_tab_list(&mut items, "wonderwal1"), 0);
    }

    #[test]
    fn test_from_document_falls_back_to_url_for_id() {
        let doc = SearchDocument::new("Iron Man", "Black Sabbath").with_url("/tabs/iron-man.html");
        assert_eq!(TabItem::from(&doc).id, "/tabs/iron-man.html");
    }
}
